/// Small deterministic pseudo random generator.
///
/// Sums the two previous outputs and swaps the low bytes of the result.
/// Good enough for shape randomization and host side stand-ins of the hardware random source.
#[derive(Clone, Debug)]
pub struct Rng {
    buf: [i32; 2],
}

impl Default for Rng {
    fn default() -> Self {
        Self {
            buf: [0x4444, 0x8888],
        }
    }
}

impl Rng {
    /// Generator seeded from `seed`. A zero seed yields the default sequence.
    #[must_use]
    #[expect(clippy::cast_possible_wrap)]
    pub fn new(seed: u32) -> Self {
        if seed == 0 {
            return Self::default();
        }
        Self {
            buf: [(seed & 0xFFFF) as i32 | 1, (seed >> 16) as i32 | 0x100],
        }
    }
    /// Next 16 bit output
    #[expect(clippy::cast_possible_truncation)]
    pub fn next_i16(&mut self) -> i16 {
        let mut w1 = self.buf[0].wrapping_add(self.buf[1]);
        let mut w2: i32 = 0;
        let p1: &mut [i8; 4] = bytemuck::cast_mut(&mut w1);
        let p2: &mut [i8; 4] = bytemuck::cast_mut(&mut w2);
        p2[0] = p1[1];
        p2[1] = p1[0];
        self.buf[1] = self.buf[0];
        self.buf[0] = w2;
        w2 as i16
    }
    /// Next 32 bit output, built from two 16 bit outputs
    #[expect(clippy::cast_sign_loss)]
    pub fn next_u32(&mut self) -> u32 {
        let hi = u32::from(self.next_i16() as u16);
        let lo = u32::from(self.next_i16() as u16);
        (hi << 16) | lo
    }
    /// Uniform-ish value in `0..bound`. Returns 0 for a zero bound.
    pub fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u32() % bound
    }
    /// Value in `lo..hi`, or `lo` when the range is empty
    #[expect(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        lo + self.below((hi - lo) as u32) as i32
    }
}

#[test]
fn test_rng_ranges() {
    let mut rng = Rng::new(1234);
    for _ in 0..1000 {
        let v = rng.range(-5, 5);
        assert!((-5..5).contains(&v));
        assert!(rng.below(7) < 7);
    }
    assert_eq!(rng.range(3, 3), 3);
    assert_eq!(rng.below(0), 0);
}

#[test]
fn test_rng_deterministic() {
    let mut a = Rng::new(99);
    let mut b = Rng::new(99);
    for _ in 0..100 {
        assert_eq!(a.next_u32(), b.next_u32());
    }
}
