use {
    super::{Half, Render, TABLE_LEN},
    crate::shape::SineParams,
    std::f32::consts::PI,
};

/// Largest positive centred level
const HALF_RESOL: f32 = 2047.0;
const HALF_RESOL_I: i32 = 2047;

/// Sine, optionally mixed with a second sine by weighted addition and/or multiplication
#[derive(Clone, Copy, Debug)]
pub struct Sine {
    amp: f32,
    phase: f32,
    freq2: f32,
    vshift: i32,
    add1: f32,
    add2: f32,
    mul1: f32,
    mul2: f32,
    bias1: f32,
    bias2: f32,
}

enum Mix {
    Single,
    Both,
    Add,
    Mul,
}

impl Sine {
    /// Prepare rendering with `params`
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn new(params: &SineParams) -> Self {
        let add1 = (100.0 - params.add_mix) / 100.0;
        let mul1 = ((100.0 - params.mul_mix) / 50.0).min(1.0);
        let mul2 = (params.mul_mix / 50.0).min(1.0);
        Self {
            amp: params.amplitude,
            phase: params.phase,
            freq2: f32::from(params.freq2),
            vshift: (params.amplitude * (0.5 - params.vshift) * 4096.0) as i32,
            add1,
            add2: 1.0 - add1,
            mul1,
            mul2,
            bias1: 1.0 - mul1,
            bias2: 1.0 - mul2,
        }
    }
    fn mix(&self) -> Mix {
        match (self.add2 > 0.0, self.mul2 > 0.0) {
            (false, false) => Mix::Single,
            (true, true) => Mix::Both,
            (true, false) => Mix::Add,
            (false, true) => Mix::Mul,
        }
    }
    /// Unclamped level at position `x` of the full cycle (`0..2 * TABLE_LEN`)
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn level(&self, x: usize) -> i32 {
        let n = TABLE_LEN as f32;
        let x = x as f32;
        let s1 = ((PI / n) * (x + self.phase * n)).sin();
        let s2 = ((self.freq2 * PI / n) * x).sin();
        let mul = (s1 * self.mul1 + self.bias1) * (s2 * self.mul2 + self.bias2);
        let v = match self.mix() {
            Mix::Single => self.amp * s1 * self.mul1,
            Mix::Both => (self.amp / 2.0) * (s1 * self.add1 + s2 * self.add2 + mul),
            Mix::Add => self.amp * (s1 * self.add1 + s2 * self.add2),
            Mix::Mul => self.amp * mul,
        };
        (v * HALF_RESOL) as i32 + self.vshift
    }
}

impl Render for Sine {
    fn render(&self, half: Half, index: usize) -> i32 {
        let clamp = |v: i32| v.clamp(-HALF_RESOL_I - 1, HALF_RESOL_I);
        match (half, self.mix()) {
            (Half::First, _) => clamp(self.level(index)),
            // A lone sine is symmetric, its falling half is the rising one inverted
            (Half::Second, Mix::Single) => clamp(2 * self.vshift - self.level(index)),
            (Half::Second, _) => clamp(self.level(index + TABLE_LEN)),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::shape::SineParams};

    #[test]
    fn default_sine_is_symmetric() {
        let s = Sine::new(&SineParams::default());
        for i in (0..TABLE_LEN).step_by(97) {
            let a = s.render(Half::First, i);
            let b = s.render(Half::Second, i);
            assert_eq!(a, -b);
        }
        // Phase 0.5 starts at the positive peak
        assert_eq!(s.render(Half::First, 0), 2047);
    }

    #[test]
    fn centred_with_zero_phase() {
        let s = Sine::new(&SineParams {
            phase: 0.0,
            ..SineParams::default()
        });
        assert_eq!(s.render(Half::First, 0), 0);
        assert!((s.render(Half::First, 2048) - 2047).abs() <= 1);
        assert!((s.render(Half::Second, 2048) + 2047).abs() <= 1);
    }

    #[test]
    fn mixed_second_half_is_evaluated() {
        let s = Sine::new(&SineParams {
            add_mix: 50.0,
            freq2: 3,
            ..SineParams::default()
        });
        for i in (0..TABLE_LEN).step_by(101) {
            let v = s.render(Half::Second, i);
            assert!((-2048..=2047).contains(&v));
        }
    }
}
