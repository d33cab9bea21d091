use serde::{Deserialize, Serialize};

/// Empirically tuned constants of a particular board.
///
/// Nothing in here is an invariant of the synthesis itself, so a board that measures
/// differently can load its own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Multiplier applied to the phase step in exact frequency mode
    pub exact_accuracy: f64,
    /// Correction applied when reporting the frequency of the phase accumulator path
    pub slow_measure_factor: f64,
    /// Sync square wave delay compensation
    pub sync_delay: SyncDelayCal,
    /// Lower frequency bounds (Hz) of tiers 0, 1, 2 and 3.
    ///
    /// Tier 0 is used from its bound inclusive, the others strictly above theirs.
    pub tier_thresholds: [f64; 4],
    /// Lower frequency bounds (Hz) of the 1x, 2x, 4x and 8x PWM clock divisors
    pub pwm_thresholds: [f64; 4],
    /// Interval between dither steps, in milliseconds
    pub dither_interval_ms: u64,
    /// Upper limit of dither points
    pub max_dither_points: u32,
    /// Frequency below which the phase step is dithered, in Hz
    pub dither_below_hz: f64,
}

/// Constants of the sync square wave delay compensation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncDelayCal {
    /// Fixed latency subtracted from the tier divisor
    pub high_rate_delay: f64,
    /// Scale of the delay at low sample rates
    pub low_rate_factor: f64,
    /// Duty cycle dependent falloff of the delay
    pub low_duty_factor: f64,
}

impl Default for SyncDelayCal {
    fn default() -> Self {
        Self {
            high_rate_delay: 10.0,
            low_rate_factor: 0.55,
            low_duty_factor: 110.0,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            exact_accuracy: 0.999_992_5,
            slow_measure_factor: 1.000_007_5,
            sync_delay: SyncDelayCal::default(),
            tier_thresholds: [1000.0, 10_000.0, 20_000.0, 40_000.0],
            pwm_thresholds: [1300.0, 650.0, 325.0, 163.0],
            dither_interval_ms: 100,
            max_dither_points: 1000,
            dither_below_hz: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cal: Calibration = toml::from_str("exact_accuracy = 1.0\n").unwrap();
        assert!((cal.exact_accuracy - 1.0).abs() < f64::EPSILON);
        assert_eq!(cal.max_dither_points, 1000);
        assert_eq!(cal.sync_delay, SyncDelayCal::default());
    }
}
