//! DMA sample buffers of the four fast tiers
use crate::{
    clock::Tier,
    wave_table::{Half, HalfCycleTable, TABLE_LEN},
};

/// Samples per half of the reduced table
pub const REDUCED_LEN: usize = 160;

/// The half cycle tables decimated to [`REDUCED_LEN`] samples per half
#[derive(Clone, Debug)]
pub struct ReducedTable {
    halves: [[u16; REDUCED_LEN]; 2],
}

impl Default for ReducedTable {
    fn default() -> Self {
        Self {
            halves: [[2048; REDUCED_LEN]; 2],
        }
    }
}

impl ReducedTable {
    /// Take every 25.6th sample (rounded) of `table`
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn reduce(&mut self, table: &HalfCycleTable) {
        let step = TABLE_LEN as f32 / REDUCED_LEN as f32;
        for half in Half::BOTH {
            for (i, out) in self.halves[half.idx()].iter_mut().enumerate() {
                let src = (i as f32 * step).round() as usize;
                *out = table.sample(half, src).clamp(0, 4095) as u16;
            }
        }
    }
    /// Sample `index` of `half`, index clamped
    #[must_use]
    pub fn sample(&self, half: Half, index: usize) -> u16 {
        self.halves[half.idx()][index.min(REDUCED_LEN - 1)]
    }
}

/// Sample counts of each half per tier.
///
/// For every tier the two counts add up to the tier's samples per cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DutyTable {
    counts: [[u16; 4]; 2],
}

impl DutyTable {
    /// Split each tier's cycle for `duty` percent.
    ///
    /// Each half keeps at least `min_half` samples, except at 0 and 100 percent where a
    /// single half spans the whole cycle.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(duty: f64, min_half: u16) -> Self {
        let mut counts = [[0; 4]; 2];
        for tier in Tier::ALL {
            let s = tier.samples_per_cycle() as u16;
            let first = if duty <= 0.0 {
                0
            } else if duty >= 100.0 {
                s
            } else {
                let raw = (duty * f64::from(s) / 100.0).round() as u16;
                raw.clamp(min_half, s - min_half)
            };
            counts[0][tier.idx()] = first;
            counts[1][tier.idx()] = s - first;
        }
        Self { counts }
    }
    /// Sample count of `half` at `tier`
    #[must_use]
    pub const fn count(&self, half: Half, tier: Tier) -> u16 {
        self.counts[half.idx()][tier.idx()]
    }
    /// Half that spans the whole cycle at `tier`, at 0 or 100 percent duty
    #[must_use]
    pub const fn held(&self, tier: Tier) -> Option<Half> {
        if self.count(Half::First, tier) == 0 {
            Some(Half::Second)
        } else if self.count(Half::Second, tier) == 0 {
            Some(Half::First)
        } else {
            None
        }
    }
    /// Duty cycle in percent actually produced at `tier`
    #[must_use]
    pub fn actual_duty(&self, tier: Tier) -> f64 {
        100.0 * f64::from(self.count(Half::First, tier)) / f64::from(tier.samples_per_cycle())
    }
}

/// Both halves of one tier
#[derive(Clone, Debug)]
pub struct TierBuffer<const N: usize> {
    halves: [[u16; N]; 2],
}

impl<const N: usize> Default for TierBuffer<N> {
    fn default() -> Self {
        Self {
            halves: [[2048; N]; 2],
        }
    }
}

impl<const N: usize> TierBuffer<N> {
    fn fill(&mut self, half: Half, count: usize, inc: f32, src: &ReducedTable, held: bool) {
        let mut x = 0.0f32;
        for (index, out) in self.halves[half.idx()].iter_mut().take(count).enumerate() {
            // A held half starts on the very first sample so it includes both extremes
            if !held || index != 0 {
                x = (x + inc).min((REDUCED_LEN - 1) as f32);
            }
            *out = src.sample(half, round_index(x));
        }
    }
    fn half(&self, half: Half, count: u16) -> &[u16] {
        &self.halves[half.idx()][..usize::from(count).min(N)]
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_index(x: f32) -> usize {
    x.round() as usize
}

/// The buffers of all four tiers
#[derive(Clone, Debug, Default)]
pub struct TierBuffers {
    t0: TierBuffer<160>,
    t1: TierBuffer<80>,
    t2: TierBuffer<40>,
    t3: TierBuffer<16>,
}

impl TierBuffers {
    /// Rebuild every tier from `src` split by `duty`, starting with `first_tier`.
    ///
    /// Within a tier the half that is read next (`next`) is rebuilt before the half being
    /// read. A half with no samples is left alone.
    #[expect(clippy::cast_precision_loss)]
    pub fn rebuild(&mut self, src: &ReducedTable, duty: &DutyTable, first_tier: Tier, next: Half) {
        let start = first_tier.idx();
        for tier in (0..4).map(|i| Tier::ALL[(start + i) % 4]) {
            let counts = [duty.count(Half::First, tier), duty.count(Half::Second, tier)];
            let held = counts.contains(&0);
            let dv = if held { 1.0 } else { 0.0 };
            let len = REDUCED_LEN as f32;
            let incs = [
                (len - dv) / (f32::from(counts[0]) - dv),
                len / (f32::from(counts[1]) - dv),
            ];
            for half in [next, next.other()] {
                let count = counts[half.idx()];
                if count == 0 {
                    continue;
                }
                let inc = incs[half.idx()];
                let count = usize::from(count);
                match tier {
                    Tier::T0 => self.t0.fill(half, count, inc, src, held),
                    Tier::T1 => self.t1.fill(half, count, inc, src, held),
                    Tier::T2 => self.t2.fill(half, count, inc, src, held),
                    Tier::T3 => self.t3.fill(half, count, inc, src, held),
                }
            }
        }
    }
    /// The samples of `half` at `tier`, as many as `duty` assigns it
    #[must_use]
    pub fn half(&self, tier: Tier, half: Half, duty: &DutyTable) -> &[u16] {
        let count = duty.count(half, tier);
        match tier {
            Tier::T0 => self.t0.half(half, count),
            Tier::T1 => self.t1.half(half, count),
            Tier::T2 => self.t2.half(half, count),
            Tier::T3 => self.t3.half(half, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            shape::{ShapeParams, WaveShape},
            wave_table::ArbTable,
        },
    };

    #[test]
    fn duty_counts_sum_to_cycle() {
        for min_half in [1, 4] {
            for d in 0..=1000 {
                let duty = f64::from(d) / 10.0;
                let tbl = DutyTable::new(duty, min_half);
                for tier in Tier::ALL {
                    let s = tier.samples_per_cycle();
                    let a = tbl.count(Half::First, tier);
                    let b = tbl.count(Half::Second, tier);
                    assert_eq!(u32::from(a + b), s);
                    if d != 0 && d != 1000 {
                        assert!(a >= min_half && b >= min_half, "{duty} {tier:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn extreme_duty_holds_one_half() {
        let zero = DutyTable::new(0.0, 1);
        let full = DutyTable::new(100.0, 1);
        for tier in Tier::ALL {
            assert_eq!(zero.count(Half::First, tier), 0);
            assert_eq!(u32::from(zero.count(Half::Second, tier)), tier.samples_per_cycle());
            assert_eq!(full.count(Half::Second, tier), 0);
            assert_eq!(zero.held(tier), Some(Half::Second));
            assert_eq!(full.held(tier), Some(Half::First));
            assert_eq!(DutyTable::new(50.0, 4).held(tier), None);
        }
    }

    fn sine_reduced() -> ReducedTable {
        let mut tbl = HalfCycleTable::boxed();
        tbl.build(
            WaveShape::Sine,
            &ShapeParams::default(),
            &ArbTable::default(),
        );
        let mut r = ReducedTable::default();
        r.reduce(&tbl);
        r
    }

    #[test]
    fn reduce_picks_rounded_positions() {
        let mut tbl = HalfCycleTable::boxed();
        tbl.build(WaveShape::Sine, &ShapeParams::default(), &ArbTable::default());
        let r = sine_reduced();
        assert_eq!(r.sample(Half::First, 0), tbl.sample(Half::First, 0).unsigned_abs());
        // 3 * 25.6 = 76.8
        assert_eq!(r.sample(Half::First, 3), tbl.sample(Half::First, 77).unsigned_abs());
        assert_eq!(r.sample(Half::Second, 159), tbl.sample(Half::Second, 4070).unsigned_abs());
    }

    #[test]
    fn buffers_follow_duty() {
        let r = sine_reduced();
        let duty = DutyTable::new(25.0, 1);
        let mut bufs = TierBuffers::default();
        bufs.rebuild(&r, &duty, Tier::T2, Half::First);
        for tier in Tier::ALL {
            let a = bufs.half(tier, Half::First, &duty);
            let b = bufs.half(tier, Half::Second, &duty);
            assert_eq!(a.len() + b.len(), tier.samples_per_cycle() as usize);
            // Both halves end on the last reduced sample
            assert_eq!(*a.last().unwrap(), r.sample(Half::First, 159));
            assert_eq!(*b.last().unwrap(), r.sample(Half::Second, 159));
        }
    }

    #[test]
    fn held_half_spans_full_range() {
        let r = sine_reduced();
        let duty = DutyTable::new(0.0, 1);
        let mut bufs = TierBuffers::default();
        bufs.rebuild(&r, &duty, Tier::T0, Half::Second);
        let b = bufs.half(Tier::T3, Half::Second, &duty);
        assert_eq!(b.len(), 16);
        assert_eq!(b[0], r.sample(Half::Second, 0));
        assert_eq!(b[15], r.sample(Half::Second, 159));
        assert!(bufs.half(Tier::T3, Half::First, &duty).is_empty());
    }
}
