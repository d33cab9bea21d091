//! Logarithmic frequency sweep
use {
    crate::result::{SweepError, SweepResult},
    serde::{Deserialize, Serialize},
};

/// Milliseconds between frequency updates
pub const UPDATE_MS: u64 = 25;
/// Highest frequency a sweep may reach
pub const MAX_SWEEP_FREQ: f64 = 42_000_000.0;

/// Sweep limits and timing
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Lowest frequency, Hz
    pub min_freq: f64,
    /// Highest frequency, Hz
    pub max_freq: f64,
    /// Seconds from lowest to highest
    pub rise_secs: f64,
    /// Seconds from highest to lowest
    pub fall_secs: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_freq: 20.0,
            max_freq: 20_000.0,
            rise_secs: 20.0,
            fall_secs: 20.0,
        }
    }
}

impl SweepConfig {
    /// Check that the sweep would go anywhere
    pub fn validate(&self) -> SweepResult {
        let limits = [self.min_freq, self.max_freq, self.rise_secs, self.fall_secs];
        if !limits.into_iter().all(f64::is_finite) {
            return Err(SweepError::NotFinite);
        }
        if self.min_freq <= 0.0 {
            return Err(SweepError::ZeroMinimum);
        }
        if self.max_freq > MAX_SWEEP_FREQ {
            return Err(SweepError::FrequencyOutOfRange(self.max_freq));
        }
        if self.min_freq >= self.max_freq {
            return Err(SweepError::InvertedRange);
        }
        if self.rise_secs + self.fall_secs <= 0.0 {
            return Err(SweepError::ZeroDuration);
        }
        Ok(())
    }
}

/// A running sweep
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sweep {
    cfg: SweepConfig,
    rise: f64,
    fall: f64,
    rising: bool,
    freq: f64,
    due_ms: u64,
}

fn ratio_per_update(from: f64, to: f64, secs: f64) -> f64 {
    if secs <= 0.0 {
        return 1.0;
    }
    let updates = secs / (UPDATE_MS as f64 * 0.001);
    (to / from).powf(1.0 / updates)
}

impl Sweep {
    /// Start sweeping up from the lowest frequency at `now_ms`
    pub fn start(cfg: SweepConfig, now_ms: u64) -> SweepResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            rise: ratio_per_update(cfg.min_freq, cfg.max_freq, cfg.rise_secs),
            fall: ratio_per_update(cfg.max_freq, cfg.min_freq, cfg.fall_secs),
            rising: true,
            freq: cfg.min_freq,
            due_ms: now_ms + UPDATE_MS,
        })
    }
    /// Current frequency
    #[must_use]
    pub const fn freq(&self) -> f64 {
        self.freq
    }
    /// The configuration being swept
    #[must_use]
    pub const fn config(&self) -> &SweepConfig {
        &self.cfg
    }
    /// The next frequency, if an update is due at `now_ms`
    pub fn poll(&mut self, now_ms: u64) -> Option<f64> {
        if now_ms < self.due_ms {
            return None;
        }
        self.due_ms = now_ms + UPDATE_MS;
        let cfg = &self.cfg;
        if self.freq >= cfg.max_freq {
            self.rising = false;
        } else if self.freq <= cfg.min_freq {
            self.rising = true;
        }
        self.freq = if cfg.fall_secs <= 0.0 && self.freq >= cfg.max_freq {
            cfg.min_freq
        } else if cfg.rise_secs <= 0.0 && self.freq <= cfg.min_freq {
            cfg.max_freq
        } else if self.rising {
            self.freq * self.rise
        } else {
            self.freq * self.fall
        };
        Some(self.freq)
    }
}
