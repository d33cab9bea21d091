//! Half cycle wave tables and the wave families that render them
use crate::shape::{ShapeParams, WaveShape};

mod arbitrary;
mod composite;
mod sine;
mod triangle;

pub use {
    arbitrary::{ArbTable, Arbitrary},
    composite::Composite,
    sine::Sine,
    triangle::Triangle,
};

/// Samples per half cycle
pub const TABLE_LEN: usize = 4096;
/// Highest DAC level
pub const MAX_LEVEL: i32 = 4095;
/// Level of the vertical centre
pub const CENTRE: i32 = 2048;

/// Scale `level` about the centre by `depth`, out of a full scale of 4096
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn modulate(level: u16, depth: u16) -> u16 {
    let swing = i32::from(level) - CENTRE;
    (swing * i32::from(depth) / (MAX_LEVEL + 1) + CENTRE).clamp(0, MAX_LEVEL) as u16
}

/// One half of a wave cycle
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Half {
    /// Rising (positive) half, the square wave is high
    First = 0,
    /// Falling (negative) half, the square wave is low
    Second = 1,
}

impl Half {
    /// Both halves, in playing order
    pub const BOTH: [Self; 2] = [Self::First, Self::Second];

    /// The other half
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
    /// Index into per-half tables
    #[must_use]
    pub const fn idx(self) -> usize {
        self as usize
    }
}

/// Anything that can produce the samples of a half cycle table
pub trait Render {
    /// Zero centred level of sample `index` (`0..TABLE_LEN`) of `half`.
    ///
    /// The result is not clamped; the table builder clamps it to the DAC range.
    fn render(&self, half: Half, index: usize) -> i32;
}

/// Two half cycle tables of DAC levels (`0..=4095`)
#[derive(Clone)]
pub struct HalfCycleTable {
    halves: [[i16; TABLE_LEN + 1]; 2],
}

impl Default for HalfCycleTable {
    fn default() -> Self {
        Self {
            halves: [[2048; TABLE_LEN + 1]; 2],
        }
    }
}

impl HalfCycleTable {
    /// Table in a heap allocation, it's rather large
    #[must_use]
    pub fn boxed() -> Box<Self> {
        Box::default()
    }
    /// Overwrite both halves with the output of `r`
    #[expect(clippy::cast_possible_truncation)]
    pub fn fill(&mut self, r: &impl Render) {
        for half in Half::BOTH {
            let tbl = &mut self.halves[half.idx()];
            for (i, out) in tbl.iter_mut().take(TABLE_LEN).enumerate() {
                *out = (r.render(half, i) + CENTRE).clamp(0, MAX_LEVEL) as i16;
            }
            tbl[TABLE_LEN] = tbl[TABLE_LEN - 1];
        }
    }
    /// Render `shape` into the table. Returns `false` for shapes without a table (noise).
    pub fn build(&mut self, shape: WaveShape, params: &ShapeParams, arb: &ArbTable) -> bool {
        match WaveRender::new(shape, params, arb) {
            Some(r) => {
                self.fill(&r);
                true
            }
            None => false,
        }
    }
    /// Sample `index` of `half`, with the index clamped to the table
    #[must_use]
    pub fn sample(&self, half: Half, index: usize) -> i16 {
        self.halves[half.idx()][index.min(TABLE_LEN - 1)]
    }
    /// The used samples of `half`
    #[must_use]
    pub fn half(&self, half: Half) -> &[i16] {
        &self.halves[half.idx()][..TABLE_LEN]
    }
}

/// One of the table based wave families, ready to render
pub enum WaveRender<'a> {
    /// Sine
    Sine(Sine),
    /// Triangle
    Triangle(Triangle),
    /// Arbitrary
    Arbitrary(Arbitrary<'a>),
    /// Composite
    Composite(Composite<'a>),
}

impl<'a> WaveRender<'a> {
    /// Prepare the renderer of `shape`. `None` for noise, which has no table.
    #[must_use]
    pub fn new(shape: WaveShape, params: &ShapeParams, arb: &'a ArbTable) -> Option<Self> {
        Some(match shape {
            WaveShape::Sine => Self::Sine(Sine::new(&params.sine)),
            WaveShape::Triangle => Self::Triangle(Triangle::new(&params.triangle)),
            WaveShape::Arbitrary => Self::Arbitrary(Arbitrary::new(&params.arb, arb)),
            WaveShape::Composite => Self::Composite(Composite::new(params, arb)),
            WaveShape::Noise => return None,
        })
    }
}

impl Render for WaveRender<'_> {
    fn render(&self, half: Half, index: usize) -> i32 {
        match self {
            Self::Sine(r) => r.render(half, index),
            Self::Triangle(r) => r.render(half, index),
            Self::Arbitrary(r) => r.render(half, index),
            Self::Composite(r) => r.render(half, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::waypoint::Waypoints};

    #[test]
    fn tables_in_range_and_idempotent() {
        let arb = ArbTable::build(&Waypoints::default(), 1000.0);
        let mut params = ShapeParams::default();
        params.sine.add_mix = 30.0;
        params.sine.mul_mix = 60.0;
        params.triangle.steps = 7;
        for shape in [
            WaveShape::Sine,
            WaveShape::Triangle,
            WaveShape::Arbitrary,
            WaveShape::Composite,
        ] {
            let mut a = HalfCycleTable::boxed();
            let mut b = HalfCycleTable::boxed();
            assert!(a.build(shape, &params, &arb));
            assert!(b.build(shape, &params, &arb));
            for half in Half::BOTH {
                assert_eq!(a.half(half), b.half(half), "{shape:?}");
                assert!(a.half(half).iter().all(|&s| (0..=4095).contains(&s)));
            }
        }
        assert!(!HalfCycleTable::boxed().build(WaveShape::Noise, &params, &arb));
    }

    #[test]
    fn sample_clamps_index() {
        let t = HalfCycleTable::default();
        assert_eq!(t.sample(Half::Second, usize::MAX), 2048);
    }

    #[test]
    fn modulation_scales_about_centre() {
        assert_eq!(modulate(4095, 4096), 4095);
        assert_eq!(modulate(0, 4096), 0);
        assert_eq!(modulate(4095, 2048), 3071);
        assert_eq!(modulate(0, 2048), 1024);
        assert_eq!(modulate(4095, 0), 2048);
        assert_eq!(modulate(2048, 4095), 2048);
        assert_eq!(modulate(1000, 1024), 1786);
    }
}
