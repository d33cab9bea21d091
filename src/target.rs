//! What the user asked for: frequency, duty and which outputs the request applies to
use serde::{Deserialize, Serialize};

/// Lowest accepted frequency, Hz
pub const MIN_FREQ: f64 = 0.000_02;
/// Highest frequency of the analogue wave and the synced square wave, Hz
pub const MAX_WAVE_FREQ: f64 = 100_961.54;
/// Highest frequency of the unsynced square wave, Hz
pub const MAX_SQUARE_FREQ: f64 = 42_000_000.0;

/// Outputs that frequency and duty requests apply to
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Control {
    /// The analogue wave and the square wave synced to it
    Synced,
    /// The independent square wave
    Unsynced,
    /// All of them
    #[default]
    Both,
}

impl Control {
    /// Whether requests reach the analogue wave
    #[must_use]
    pub const fn synced(self) -> bool {
        !matches!(self, Self::Unsynced)
    }
    /// Whether requests reach the unsynced square wave
    #[must_use]
    pub const fn unsynced(self) -> bool {
        !matches!(self, Self::Synced)
    }
}

/// A frequency request
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Frequency {
    /// In Hz
    Hz(f64),
    /// As a period in milliseconds
    PeriodMs(f64),
}

impl Frequency {
    /// The requested frequency in Hz
    #[must_use]
    pub fn hz(self) -> f64 {
        match self {
            Self::Hz(hz) => hz,
            Self::PeriodMs(ms) => 1000.0 / ms,
        }
    }
}

/// A duty cycle request
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DutyCycle {
    /// Percentage of the cycle spent in the first half
    Percent(f64),
    /// Length of the first half in microseconds, kept when the frequency changes
    PulseWidthUs(f64),
}

/// Frequency and duty targets of one group of outputs
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Target {
    /// Frequency, Hz
    pub freq: f64,
    /// Period the frequency was given as, if it was given as one
    pub period_ms: Option<f64>,
    /// Duty cycle, percent
    pub duty: f64,
    /// Pulse width the duty follows, if one was set
    pub pulse_width_us: Option<f64>,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            freq: 1000.0,
            period_ms: None,
            duty: 50.0,
            pulse_width_us: None,
        }
    }
}

/// Duty cycle in percent of a `pulse_us` microsecond pulse at `freq` Hz, at most 100
#[must_use]
pub fn pulse_duty(pulse_us: f64, freq: f64) -> f64 {
    (100.0 * pulse_us / (1e6 / freq)).clamp(0.0, 100.0)
}

impl Target {
    /// Retarget to `freq`, limited to `max` Hz.
    ///
    /// A pulse width target recomputes the duty for the new frequency. Returns `false`
    /// (and changes nothing) for a frequency that isn't a number.
    pub fn set_frequency(&mut self, freq: Frequency, max: f64) -> bool {
        let hz = freq.hz();
        if hz.is_nan() {
            return false;
        }
        let hz = hz.clamp(MIN_FREQ, max);
        if hz != freq.hz() {
            log::debug!("Frequency {} Hz clamped to {hz} Hz", freq.hz());
        }
        self.period_ms = match freq {
            Frequency::Hz(_) => None,
            Frequency::PeriodMs(ms) => Some(ms),
        };
        if let Some(pulse) = self.pulse_width_us {
            self.duty = pulse_duty(pulse, hz);
        }
        self.freq = hz;
        true
    }
    /// Retarget the duty cycle. A pulse width is converted at `actual_freq`.
    pub fn set_duty(&mut self, duty: DutyCycle, actual_freq: f64) {
        match duty {
            DutyCycle::Percent(pct) => {
                self.pulse_width_us = None;
                self.duty = if pct.is_nan() { 50.0 } else { pct.clamp(0.0, 100.0) };
            }
            DutyCycle::PulseWidthUs(pulse) => {
                let pulse = if pulse.is_nan() { 0.0 } else { pulse.max(0.0) };
                self.pulse_width_us = Some(pulse);
                self.duty = pulse_duty(pulse, actual_freq);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_and_clamp() {
        let mut t = Target::default();
        assert!(t.set_frequency(Frequency::PeriodMs(4.0), MAX_WAVE_FREQ));
        assert!((t.freq - 250.0).abs() < 1e-9);
        assert_eq!(t.period_ms, Some(4.0));
        assert!(t.set_frequency(Frequency::Hz(1e9), MAX_WAVE_FREQ));
        assert!((t.freq - MAX_WAVE_FREQ).abs() < 1e-9);
        assert_eq!(t.period_ms, None);
        assert!(t.set_frequency(Frequency::Hz(0.0), MAX_SQUARE_FREQ));
        assert!((t.freq - MIN_FREQ).abs() < 1e-12);
        assert!(!t.set_frequency(Frequency::Hz(f64::NAN), MAX_SQUARE_FREQ));
    }

    #[test]
    fn pulse_width_follows_frequency() {
        let mut t = Target::default();
        t.set_duty(DutyCycle::PulseWidthUs(100.0), 1000.0);
        assert!((t.duty - 10.0).abs() < 1e-9);
        t.set_frequency(Frequency::Hz(2000.0), MAX_WAVE_FREQ);
        assert!((t.duty - 20.0).abs() < 1e-9);
        t.set_frequency(Frequency::Hz(20_000.0), MAX_WAVE_FREQ);
        assert!((t.duty - 100.0).abs() < 1e-9);
        t.set_duty(DutyCycle::Percent(130.0), 1000.0);
        assert_eq!(t.pulse_width_us, None);
        assert!((t.duty - 100.0).abs() < 1e-9);
    }

    #[test]
    fn control_targets() {
        assert!(Control::Both.synced() && Control::Both.unsynced());
        assert!(Control::Synced.synced() && !Control::Synced.unsynced());
        assert!(!Control::Unsynced.synced() && Control::Unsynced.unsynced());
    }
}
