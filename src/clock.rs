//! Fixed point clock math: sample-rate timer divisors and the frequencies they produce
use {
    crate::Calibration,
    serde::{Deserialize, Serialize},
};

/// Frequency of the clock feeding the sample-rate timers, in Hz
pub const TIMER_CLOCK_HZ: f64 = 42_000_000.0;
/// Frequency of the clock feeding the PWM unit at a 1x divisor, in Hz
pub const PWM_CLOCK_HZ: f64 = 84_000_000.0;
/// Samples per cycle used by the phase accumulator path for timer math
pub const SLOW_SAMPLES_PER_CYCLE: u32 = 160;
/// Tick rate of the slow phase accumulator path, in Hz
pub const SLOW_TICK_HZ: u32 = 400_000;
/// Tick rate of the noise generator, in Hz
pub const NOISE_TICK_HZ: u32 = 150_000;
/// Tick rate of the unsynced square wave interrupt path, in Hz
pub const UNSYNCED_TICK_HZ: u32 = 100_000;
/// Divisor returned for a zero frequency
const ZERO_FREQ_TC: u32 = 25;
/// Frequency reported for a zero divisor
const ZERO_TC_FREQ: f64 = 1000.0;

/// One of the four DMA sampling tiers
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Tier {
    /// 160 samples per cycle
    T0 = 0,
    /// 80 samples per cycle
    T1 = 1,
    /// 40 samples per cycle
    T2 = 2,
    /// 16 samples per cycle
    T3 = 3,
}

impl Tier {
    /// All tiers in ascending order of sample rate
    pub const ALL: [Self; 4] = [Self::T0, Self::T1, Self::T2, Self::T3];
    /// Samples per cycle of each tier, indexed by [`Tier::idx`]
    pub const SAMPLES_PER_CYCLE: [u32; 4] = [160, 80, 40, 16];

    /// Samples one full cycle is made of at this tier
    #[must_use]
    pub const fn samples_per_cycle(self) -> u32 {
        Self::SAMPLES_PER_CYCLE[self as usize]
    }
    /// Index into per-tier tables
    #[must_use]
    pub const fn idx(self) -> usize {
        self as usize
    }
}

/// Which sampling path produces the analogue output
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TierSelector {
    /// Phase accumulator driven by a fixed rate tick
    Slow,
    /// DMA streamed tier buffers
    Fast(Tier),
}

impl TierSelector {
    /// Pick the sampling path for `freq`.
    ///
    /// Exact frequency mode always runs on the phase accumulator.
    #[must_use]
    pub fn for_frequency(freq: f64, exact: bool, cal: &Calibration) -> Self {
        let [t0, t1, t2, t3] = cal.tier_thresholds;
        if exact {
            Self::Slow
        } else if freq > t3 {
            Self::Fast(Tier::T3)
        } else if freq > t2 {
            Self::Fast(Tier::T2)
        } else if freq > t1 {
            Self::Fast(Tier::T1)
        } else if freq >= t0 {
            Self::Fast(Tier::T0)
        } else {
            Self::Slow
        }
    }
    /// Samples per cycle used for timer math on this path
    #[must_use]
    pub const fn samples_per_cycle(self) -> u32 {
        match self {
            Self::Slow => SLOW_SAMPLES_PER_CYCLE,
            Self::Fast(tier) => tier.samples_per_cycle(),
        }
    }
    /// The fast tier, if any
    #[must_use]
    pub const fn tier(self) -> Option<Tier> {
        match self {
            Self::Slow => None,
            Self::Fast(tier) => Some(tier),
        }
    }
}

/// Timer divisor that makes `samples_per_cycle` samples play at `freq` Hz.
///
/// The division truncates, so the produced frequency is never below `freq`.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn freq_to_tc(freq: f64, samples_per_cycle: u32) -> u32 {
    if freq <= 0.0 {
        return ZERO_FREQ_TC;
    }
    let tc = TIMER_CLOCK_HZ / (freq * f64::from(samples_per_cycle));
    (tc as u32).max(1)
}

/// Frequency produced by timer divisor `tc` at `samples_per_cycle` samples per cycle
#[must_use]
pub fn tc_to_freq(tc: u32, samples_per_cycle: u32) -> f64 {
    if tc == 0 {
        return ZERO_TC_FREQ;
    }
    TIMER_CLOCK_HZ / (f64::from(tc) * f64::from(samples_per_cycle))
}

/// Timer divisor for a fixed tick rate
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tick_divisor(tick_hz: u32) -> u32 {
    (TIMER_CLOCK_HZ / f64::from(tick_hz)) as u32
}

#[test]
fn test_round_trip_quantization() {
    for tier in Tier::ALL {
        let s = tier.samples_per_cycle();
        for freq in [1000.0, 1234.5, 10_001.0, 33_333.0, 40_001.0, 99_999.0] {
            let tc = freq_to_tc(freq, s);
            let actual = tc_to_freq(tc, s);
            assert!(actual >= freq);
            assert!((actual - freq) / freq <= 1.0 / f64::from(tc), "{tier:?} {freq}");
        }
    }
}

#[test]
fn test_zero_edges() {
    assert_eq!(freq_to_tc(0.0, 160), 25);
    assert!((tc_to_freq(0, 160) - 1000.0).abs() < f64::EPSILON);
    assert_eq!(tick_divisor(SLOW_TICK_HZ), 105);
    assert_eq!(tick_divisor(NOISE_TICK_HZ), 280);
    assert_eq!(tick_divisor(UNSYNCED_TICK_HZ), 420);
}

#[test]
fn test_tier_select() {
    let cal = Calibration::default();
    let sel = |f| TierSelector::for_frequency(f, false, &cal);
    assert_eq!(sel(999.0), TierSelector::Slow);
    assert_eq!(sel(1000.0), TierSelector::Fast(Tier::T0));
    assert_eq!(sel(10_000.0), TierSelector::Fast(Tier::T0));
    assert_eq!(sel(10_001.0), TierSelector::Fast(Tier::T1));
    assert_eq!(sel(20_001.0), TierSelector::Fast(Tier::T2));
    assert_eq!(sel(50_000.0), TierSelector::Fast(Tier::T3));
    assert_eq!(
        TierSelector::for_frequency(50_000.0, true, &cal),
        TierSelector::Slow
    );
}
