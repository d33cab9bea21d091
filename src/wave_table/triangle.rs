use {
    super::{CENTRE, Half, MAX_LEVEL, Render, TABLE_LEN},
    crate::shape::TriangleParams,
    arrayvec::ArrayVec,
};

/// Enough for the most steps a half cycle can take
const MAX_STAIRS: usize = 128;

/// Triangle, or a staircase approximating one.
///
/// The first half is a ramp that reverses slope once, at an index determined by the phase.
/// The second half is the first inverted about the vertical shift.
#[derive(Clone, Debug)]
pub struct Triangle {
    vshift: i32,
    shape: Slope,
}

#[derive(Clone, Debug)]
enum Slope {
    Ramp {
        base: i32,
        amp: f32,
        dir: i32,
        turn: usize,
        turn_offset: i32,
    },
    Stairs {
        start: i32,
        /// `(index, level)` of every step, ascending by index
        stairs: ArrayVec<(u16, i32), MAX_STAIRS>,
    },
}

impl Triangle {
    /// Prepare rendering with `params`
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(params: &TriangleParams) -> Self {
        let amp = params.amplitude;
        let n = i32::from(params.steps);
        let calc = (params.phase + 0.5).floor() as i32;
        let dir = if calc % 2 == 0 { 1 } else { -1 };
        let ph_start = dir as f32 * (params.phase - calc as f32);
        let start_dir = -dir;
        let turn_at = ((start_dir as f32 * ph_start + 0.5) * TABLE_LEN as f32) as i32;
        let turn = (turn_at + n.min(1)) as usize;
        let turn_offset =
            dir * ((start_dir as f32 * ph_start + 0.5) * (TABLE_LEN * 2) as f32 * amp) as i32;
        let vshift = ((0.5 + amp * (0.5 - params.vshift)) * 4096.0) as i32;
        if n == 0 {
            return Self {
                vshift,
                shape: Slope::Ramp {
                    base: (vshift as f32 + ph_start * amp * MAX_LEVEL as f32) as i32,
                    amp,
                    dir,
                    turn,
                    turn_offset,
                },
            };
        }
        let level = |volts: i32| (vshift as f32 + amp * (volts - CENTRE) as f32) as i32;
        let spacing = TABLE_LEN as f32 / (n + 1) as f32;
        // Walk back from the first reversal to find the step we start on
        let mut step_num = 0;
        let mut volts = 0;
        let mut step_time = 0;
        for i in 0..=n + 1 {
            let before_turn = spacing * (n + 1 - i) as f32;
            if before_turn < turn_at as f32 {
                step_time = (turn_at as f32 - before_turn) as i32;
                break;
            } else if step_num <= n {
                volts = (CENTRE as f32 - (start_dir * CENTRE) as f32
                    + start_dir as f32 * ((TABLE_LEN as f32 / n as f32) * (n - i) as f32))
                    as i32;
            }
            step_num += 1;
        }
        step_num = step_num.min(n);
        let start = level(volts);
        let rise = (TABLE_LEN as f32 / n as f32).round() as i32;
        let mut slope = dir;
        let mut stairs = ArrayVec::new();
        for index in 0..TABLE_LEN as i32 {
            if index as usize == turn {
                step_num = 0;
                slope = -slope;
            }
            if index == step_time {
                step_time = (step_time as f32 + spacing) as i32;
                if step_num <= n {
                    volts += slope * rise;
                }
                volts = volts.clamp(0, MAX_LEVEL);
                step_num += 1;
                if stairs.try_push((index as u16, level(volts))).is_err() {
                    break;
                }
            }
        }
        Self {
            vshift,
            shape: Slope::Stairs { start, stairs },
        }
    }
    /// Unclamped first half level at `index`
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn level(&self, index: usize) -> i32 {
        match &self.shape {
            Slope::Ramp {
                base,
                amp,
                dir,
                turn,
                turn_offset,
            } => {
                let (dir, offset) = if index >= *turn {
                    (-dir, *turn_offset)
                } else {
                    (*dir, 0)
                };
                (*base as f32 + dir as f32 * amp * index as f32 + offset as f32) as i32
            }
            Slope::Stairs { start, stairs } => {
                let taken = stairs.partition_point(|&(at, _)| usize::from(at) <= index);
                taken.checked_sub(1).map_or(*start, |i| stairs[i].1)
            }
        }
    }
}

impl Render for Triangle {
    fn render(&self, half: Half, index: usize) -> i32 {
        let w = self.level(index);
        match half {
            Half::First => w - CENTRE,
            Half::Second => 2 * self.vshift - w - CENTRE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_phase_ramps_up_then_down() {
        let t = Triangle::new(&TriangleParams {
            phase: 0.0,
            ..TriangleParams::default()
        });
        assert_eq!(t.render(Half::First, 0), 0);
        assert_eq!(t.render(Half::First, 1024), 1024);
        assert_eq!(t.render(Half::First, 2048), 2048);
        assert_eq!(t.render(Half::First, 3072), 1024);
        assert_eq!(t.render(Half::Second, 1024), -1024);
    }

    #[test]
    fn default_phase_starts_at_peak() {
        let t = Triangle::new(&TriangleParams::default());
        assert_eq!(t.render(Half::First, 0), 2047);
        assert_eq!(t.render(Half::First, 4095), -2048);
        assert_eq!(t.render(Half::Second, 0), -2047);
    }

    #[test]
    fn staircase_is_stepped() {
        let t = Triangle::new(&TriangleParams {
            steps: 4,
            ..TriangleParams::default()
        });
        let levels: Vec<i32> = (0..TABLE_LEN).map(|i| t.render(Half::First, i)).collect();
        let mut distinct = levels.clone();
        distinct.dedup();
        assert!(distinct.len() <= 6, "{distinct:?}");
        assert!(distinct.len() >= 4, "{distinct:?}");
        // Monotonic within the half for the default phase
        assert!(levels.windows(2).all(|w| w[1] <= w[0]));
    }
}
