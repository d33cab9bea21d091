//! Flat set of every user setting, for saving and restoring
use {
    crate::{
        SweepConfig, TimerPeriod, Waypoints,
        phase_accumulator::UNITY_GAIN,
        shape::{ShapeParams, WaveShape},
        target::{Control, Target},
    },
    serde::{Deserialize, Serialize},
};

/// Every setting of the engine that survives a power cycle.
///
/// The storage format is up to the caller; anything serde can write will do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Selected wave shape
    pub shape: WaveShape,
    /// Parameters of every wave family
    pub params: ShapeParams,
    /// Targets of the analogue wave and the synced square wave
    pub wave: Target,
    /// Targets of the unsynced square wave
    pub square: Target,
    /// Outputs that frequency and duty requests apply to
    pub control: Control,
    /// Exact frequency mode
    pub exact: bool,
    /// Whether the square wave is synced to the analogue wave
    pub synced: bool,
    /// Amplitude modulation from the analogue input
    pub modulation: bool,
    /// Output gain, 16.16 fixed point
    pub gain: u32,
    /// Sweep limits and timing
    pub sweep: SweepConfig,
    /// Output timer period
    pub timer: TimerPeriod,
    /// Output timer drives its pin inverted
    pub timer_invert: bool,
    /// Points of the arbitrary wave
    pub waypoints: Waypoints,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            shape: WaveShape::default(),
            params: ShapeParams::default(),
            wave: Target::default(),
            square: Target::default(),
            control: Control::default(),
            exact: false,
            synced: false,
            modulation: false,
            gain: UNITY_GAIN,
            sweep: SweepConfig::default(),
            timer: TimerPeriod::default(),
            timer_invert: false,
            waypoints: Waypoints::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::target::DutyCycle};

    #[test]
    fn toml_round_trip() {
        let mut snap = Snapshot {
            shape: WaveShape::Composite,
            exact: true,
            synced: true,
            control: Control::Synced,
            ..Snapshot::default()
        };
        snap.params.composite.arbitrary = 0.0;
        snap.wave.set_duty(DutyCycle::PulseWidthUs(250.0), 1000.0);
        let text = toml::to_string_pretty(&snap).unwrap();
        let back: Snapshot = toml::from_str(&text).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn missing_fields_default() {
        let snap: Snapshot = toml::from_str("shape = \"Triangle\"\nexact = true\n").unwrap();
        assert_eq!(snap.shape, WaveShape::Triangle);
        assert!(snap.exact);
        assert_eq!(snap.gain, UNITY_GAIN);
        assert_eq!(snap.waypoints, Waypoints::default());
    }
}
