//! Phase accumulator path for low frequencies and exact frequency mode
use crate::{
    Calibration,
    hal::PinAction,
    wave_table::{Half, HalfCycleTable, MAX_LEVEL},
};

/// Phase step per Hz of wave frequency at the slow tick rate.
///
/// A half cycle spans the whole 32 bit accumulator, the slow tick runs at 400 kHz.
pub const STEP_PER_HZ: f64 = 21475.0;
/// Unity output gain in 16.16 fixed point
pub const UNITY_GAIN: u32 = 65536;

/// Accumulator and active half
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PhaseState {
    /// Position within the active half, a full half spans the whole range
    pub acc: u32,
    /// Half being played
    pub active: Half,
}

impl PhaseState {
    /// Start of `half`
    #[must_use]
    pub const fn at(half: Half) -> Self {
        Self {
            acc: 0,
            active: half,
        }
    }
}

/// Output of one slow tick
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SlowSample {
    /// DAC level
    pub level: u16,
    /// Half cycle boundary, if one was crossed
    pub edge: Option<PinAction>,
}

/// Per-half parameters of the phase accumulator
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SlowParams {
    /// Accumulator step of each half
    pub step: [u32; 2],
    /// Unrounded steps, the dither works from these
    pub fine_step: [f64; 2],
    /// Residual multiplier (per mille) applied when entering each half in exact mode
    pub rebase: [u32; 2],
    /// Half held for the whole cycle at 0 or 100 percent duty
    pub held: Option<Half>,
    /// Exact frequency mode
    pub exact: bool,
    /// Exact frequency mode at a duty other than 50 percent
    pub exact_not_50: bool,
    /// Duty cycle after limiting, in percent
    pub duty: f64,
    /// Output gain, 16.16 fixed point
    pub gain: u32,
}

impl Default for SlowParams {
    fn default() -> Self {
        Self::new(1.0, 50.0, false, &Calibration::default())
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_step(f: f64) -> u32 {
    f.clamp(0.0, f64::from(u32::MAX)) as u32
}

impl SlowParams {
    /// Steps for a `freq` Hz wave at `duty` percent.
    ///
    /// The duty cycle is limited to what the tick rate can resolve at this frequency.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(freq: f64, duty: f64, exact: bool, cal: &Calibration) -> Self {
        let mut freq_step = freq * STEP_PER_HZ;
        if exact {
            freq_step *= cal.exact_accuracy;
        }
        let limit = (freq / 4000.0).min(50.0);
        let duty = if duty <= 0.0 {
            0.0
        } else if duty >= 100.0 {
            100.0
        } else {
            duty.clamp(limit, 100.0 - limit)
        };
        let fine_step = [
            if duty == 0.0 {
                freq_step / 2.0
            } else {
                freq_step / (duty / 50.0)
            },
            if duty == 100.0 {
                freq_step / 2.0
            } else {
                freq_step / ((100.0 - duty) / 50.0)
            },
        ];
        let step = fine_step.map(to_step);
        let rebase = if fine_step[0] > 0.0 && fine_step[1] > 0.0 {
            [
                (fine_step[0] / fine_step[1] * 1000.0) as u32,
                (fine_step[1] / fine_step[0] * 1000.0) as u32,
            ]
        } else {
            [1000; 2]
        };
        let held = if duty == 0.0 {
            Some(Half::Second)
        } else if duty == 100.0 {
            Some(Half::First)
        } else {
            None
        };
        Self {
            step,
            fine_step,
            rebase,
            held,
            exact,
            exact_not_50: exact && (duty - 50.0).abs() > f64::EPSILON,
            duty,
            gain: UNITY_GAIN,
        }
    }
    /// Half the accumulator should start in
    #[must_use]
    pub fn first_half(&self) -> Half {
        self.held.unwrap_or(Half::First)
    }
}

impl PhaseState {
    /// Advance by one tick, producing the sample to write and the state after it.
    ///
    /// Crossing the end of a half (the accumulator wrapping) flips to the other half, or
    /// restarts the held half at 0 and 100 percent duty. Outside exact mode the accumulator
    /// restarts from 1; in exact mode the residual is kept, rescaled to the new half's step
    /// if the halves differ.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tick(self, p: &SlowParams, table: &HalfCycleTable) -> (SlowSample, Self) {
        let step = p.step[self.active.idx()];
        let mut next = Self {
            acc: self.acc.wrapping_add(step),
            active: self.active,
        };
        let mut edge = None;
        if next.acc < step {
            let entering = p.held.unwrap_or_else(|| self.active.other());
            if p.exact_not_50 {
                let scaled = u64::from(next.acc / 1000) * u64::from(p.rebase[entering.idx()]);
                next.acc = scaled.min(u64::from(u32::MAX)) as u32;
            } else if !p.exact {
                next.acc = 1;
            }
            edge = Some(match p.held {
                Some(held) => PinAction::Pulse(held == Half::Second),
                None => PinAction::Level(entering == Half::First),
            });
            next.active = entering;
        }
        let raw = i64::from(table.sample(next.active, (next.acc >> 20) as usize));
        let level = ((raw * i64::from(p.gain)) >> 16).clamp(0, i64::from(MAX_LEVEL)) as u16;
        (SlowSample { level, edge }, next)
    }
}

/// Sub-step dithering of very low frequencies.
///
/// Integer steps can't represent the frequency exactly when it is tiny; alternating between
/// the two nearest steps over a number of dither points averages out to the fine step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dither {
    point: u32,
    due_ms: Option<u64>,
}

impl Dither {
    /// Stop dithering
    pub const fn disarm(&mut self) {
        self.due_ms = None;
    }
    /// Start dithering at `now_ms`
    pub const fn arm(&mut self, now_ms: u64) {
        self.due_ms = Some(now_ms);
    }
    /// Whether dithering runs
    #[must_use]
    pub const fn armed(&self) -> bool {
        self.due_ms.is_some()
    }
    /// If due at `now_ms`, move to the next dither point and return the steps to use
    pub fn poll(
        &mut self,
        now_ms: u64,
        freq: f64,
        fine_step: [f64; 2],
        cal: &Calibration,
    ) -> Option<[u32; 2]> {
        let due = self.due_ms?;
        if now_ms < due {
            return None;
        }
        self.due_ms = Some(now_ms + cal.dither_interval_ms);
        Some(self.advance(freq, fine_step, cal.max_dither_points))
    }
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn advance(&mut self, freq: f64, fine_step: [f64; 2], max_points: u32) -> [u32; 2] {
        let points = if freq > 0.0 {
            (1.0 / freq).min(f64::from(max_points)) as u32
        } else {
            max_points
        }
        .max(1);
        self.point = (self.point + 1) % points;
        let n = i64::from(points);
        fine_step.map(|f| {
            let whole = to_step(f);
            let frac = (f * n as f64).round() as i64 % n;
            if frac + i64::from(self.point) > n - 1 {
                whole.saturating_add(1)
            } else {
                whole
            }
        })
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

    fn table() -> Box<HalfCycleTable> {
        let mut t = HalfCycleTable::boxed();
        t.build(WaveShape::Sine, &ShapeParams::default(), &ArbTable::default());
        t
    }

    fn ticks_between_wraps(p: &SlowParams, n: usize) -> Vec<u64> {
        let t = table();
        let mut st = PhaseState::at(p.first_half());
        let mut out = Vec::new();
        let mut count = 0;
        while out.len() < n {
            let (s, next) = st.tick(p, &t);
            st = next;
            count += 1;
            if s.edge.is_some() {
                out.push(count);
                count = 0;
            }
        }
        out
    }

    #[test]
    fn wrap_interval() {
        let cal = Calibration::default();
        for freq in [0.37, 3.0, 123.4, 999.0] {
            let p = SlowParams::new(freq, 50.0, false, &cal);
            let s = u64::from(p.step[0]);
            let expect = (1u64 << 32).div_ceil(s);
            // The first interval starts from zero, the rest from one
            for n in ticks_between_wraps(&p, 6) {
                assert!(n.abs_diff(expect) <= 1, "{freq}: {n} vs {expect}");
            }
        }
    }

    #[test]
    fn duty_limited_by_tick_rate() {
        let cal = Calibration::default();
        let p = SlowParams::new(400.0, 0.01, false, &cal);
        assert!((p.duty - 0.1).abs() < 1e-9);
        assert_eq!(p.held, None);
        let p = SlowParams::new(400.0, 0.0, false, &cal);
        assert_eq!(p.held, Some(Half::Second));
        assert_eq!(p.step[1], to_step(400.0 * STEP_PER_HZ / 2.0));
    }

    #[test]
    fn halves_alternate_with_square_edges() {
        let p = SlowParams::new(500.0, 25.0, false, &Calibration::default());
        let t = table();
        let mut st = PhaseState::at(Half::First);
        let mut edges = Vec::new();
        for _ in 0..4000 {
            let (s, next) = st.tick(&p, &t);
            st = next;
            if let Some(e) = s.edge {
                edges.push(e);
            }
        }
        assert!(edges.len() >= 4);
        for pair in edges.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(edges[0], PinAction::Level(false));
    }

    #[test]
    fn held_half_pulses() {
        let p = SlowParams::new(700.0, 100.0, false, &Calibration::default());
        let t = table();
        let mut st = PhaseState::at(p.first_half());
        for _ in 0..2000 {
            let (s, next) = st.tick(&p, &t);
            st = next;
            assert_eq!(st.active, Half::First);
            if let Some(e) = s.edge {
                assert_eq!(e, PinAction::Pulse(false));
            }
        }
    }

    #[test]
    fn exact_mode_rebases_residual() {
        let cal = Calibration::default();
        let p = SlowParams::new(250.0, 20.0, true, &cal);
        assert!(p.exact_not_50);
        let t = table();
        let st = PhaseState {
            acc: u32::MAX - 10,
            active: Half::First,
        };
        let (_, next) = st.tick(&p, &t);
        assert_eq!(next.active, Half::Second);
        let residual = (u32::MAX - 10).wrapping_add(p.step[0]);
        assert_eq!(next.acc, residual / 1000 * p.rebase[1]);
    }

    #[test]
    fn gain_scales_output() {
        let mut p = SlowParams::new(100.0, 50.0, false, &Calibration::default());
        let t = table();
        let st = PhaseState::at(Half::First);
        let (full, _) = st.tick(&p, &t);
        p.gain = UNITY_GAIN / 2;
        let (half, _) = st.tick(&p, &t);
        assert_eq!(half.level, full.level / 2);
    }

    #[test]
    fn dither_averages_fine_step() {
        let cal = Calibration::default();
        let freq = 0.05;
        let p = SlowParams::new(freq, 50.0, false, &cal);
        let mut d = Dither::default();
        d.arm(0);
        let points = 20;
        let mut sum = 0u64;
        for k in 0..points {
            let steps = d.poll(k * cal.dither_interval_ms, freq, p.fine_step, &cal).unwrap();
            sum += u64::from(steps[0]);
        }
        let avg = sum as f64 / points as f64;
        assert!((avg - p.fine_step[0]).abs() < 0.1, "{avg} vs {}", p.fine_step[0]);
        assert!(d.poll(points * cal.dither_interval_ms - 1, freq, p.fine_step, &cal).is_none());
    }
}
