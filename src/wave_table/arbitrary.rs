use {
    super::{CENTRE, Half, MAX_LEVEL, Render, TABLE_LEN},
    crate::{
        shape::ArbParams,
        waypoint::{Waypoint, Waypoints},
    },
};

/// Longest plateau held at a sharp reversal
const MAX_PEAK_HOLD: i32 = 12;

/// Waypoints interpolated over a full cycle of [`TABLE_LEN`] zero centred samples
#[derive(Clone)]
pub struct ArbTable {
    samples: [i16; TABLE_LEN],
}

impl Default for ArbTable {
    fn default() -> Self {
        Self {
            samples: [0; TABLE_LEN],
        }
    }
}

/// Direction of travel between two levels, in coarse units
fn trend(from: i32, to: i32) -> i32 {
    ((to - from) / 100).clamp(-2, 2)
}

impl ArbTable {
    /// Interpolate `points` over the cycle.
    ///
    /// Points are spread evenly; the segment after each point is a straight line to the next
    /// one (the last point joins the first). Sharp reversals hold their level for a few
    /// samples so they stay visible at high frequencies, `freq` being the wave frequency.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn build(points: &Waypoints, freq: f64) -> Self {
        let mut this = Self::default();
        let pts = points.as_slice();
        let count = pts.len();
        if count == 0 {
            return this;
        }
        let spacing = TABLE_LEN as f32 / count as f32;
        let hold = ((freq / 100.0) as i32).min(MAX_PEAK_HOLD.min(spacing as i32)).max(0);
        let level_of = |p: usize| i32::from(pts[p].level());
        let mut next_loc = 0;
        for (p, &point) in pts.iter().enumerate() {
            let value = level_of(p);
            let next = i32::from(pts.get(p + 1).unwrap_or(&pts[0]).entry());
            let prev = match point {
                Waypoint::Step { from, .. } if p != 0 => i32::from(from),
                _ => level_of(p.saturating_sub(1)),
            };
            let mut step_peak = match point {
                Waypoint::Step { from, to } => {
                    let before = level_of(p.saturating_sub(1));
                    let (from, to) = (i32::from(from), i32::from(to));
                    if (trend(before, from) - trend(from, to)).abs() > 1 {
                        hold
                    } else {
                        0
                    }
                }
                Waypoint::Level(_) => 0,
            };
            let mut peak = if (trend(prev, value) - trend(value, next)).abs() > 1 {
                hold
            } else {
                0
            };
            let run = spacing - f32::from(u8::from(point.is_step())) - peak as f32;
            let inc = (next - value) as f32 / run;
            if step_peak > 0 && peak > 0 {
                step_peak /= 2;
                peak -= step_peak;
            }
            let cur_loc = next_loc;
            next_loc = (((p + 1) as f32 / count as f32 * TABLE_LEN as f32).round() as usize)
                .min(TABLE_LEN);
            if cur_loc >= next_loc {
                continue;
            }
            let mut level = value as f32;
            let mut i = cur_loc;
            if let Waypoint::Step { from, .. } = point
                && p != 0
            {
                let plateau = (cur_loc + step_peak as usize).min(TABLE_LEN - 1);
                while i < plateau {
                    this.put(i, i32::from(from));
                    i += 1;
                }
                this.put(i, i32::from(from));
                i += 1;
            }
            if peak > 0 {
                let plateau = (i + peak as usize).min(next_loc - 1);
                while i < plateau {
                    this.put(i, level.round() as i32);
                    i += 1;
                }
            }
            // The first sample after the plateaus is written even if it spills into the next
            // segment, which overwrites it
            loop {
                this.put(i, level.round() as i32);
                level += inc;
                i += 1;
                if i >= next_loc {
                    break;
                }
            }
        }
        this
    }
    #[expect(clippy::cast_possible_truncation)]
    fn put(&mut self, i: usize, level: i32) {
        if let Some(s) = self.samples.get_mut(i) {
            *s = (level.clamp(0, MAX_LEVEL) - CENTRE) as i16;
        }
    }
    /// Zero centred sample at `index`, clamped to the table
    #[must_use]
    #[expect(clippy::cast_sign_loss)]
    pub fn sample(&self, index: i32) -> i32 {
        i32::from(self.samples[index.clamp(0, MAX_LEVEL) as usize])
    }
}

/// Position in the arbitrary cycle that table position `index` of `half` shows
#[must_use]
pub fn source_pos(params: &ArbParams, half: Half, index: usize) -> usize {
    if params.mirror {
        match half {
            Half::First => TABLE_LEN - 1 - index,
            Half::Second => index,
        }
    } else {
        // The arbitrary cycle is spread over both halves, two table samples per point
        match half {
            Half::First => index / 2,
            Half::Second => TABLE_LEN / 2 + index / 2,
        }
    }
}

/// Index into the arbitrary table after horizontal shift and zoom
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn zoomed(params: &ArbParams, k: usize) -> i32 {
    let shift = (params.hshift * TABLE_LEN as f32) as i32;
    let zoom = (params.hzoom * (k as f32 - (TABLE_LEN / 2) as f32)) as i32;
    shift + zoom
}

/// Arbitrary wave family
pub struct Arbitrary<'a> {
    params: ArbParams,
    table: &'a ArbTable,
}

impl<'a> Arbitrary<'a> {
    /// Prepare rendering `table` with `params`
    #[must_use]
    pub const fn new(params: &ArbParams, table: &'a ArbTable) -> Self {
        Self {
            params: *params,
            table,
        }
    }
}

impl Render for Arbitrary<'_> {
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn render(&self, half: Half, index: usize) -> i32 {
        let p = &self.params;
        let src = zoomed(p, source_pos(p, half, index));
        let v = (0.5 + p.amplitude * (0.5 - p.vshift)) * TABLE_LEN as f32
            + p.amplitude * self.table.sample(src) as f32;
        v as i32 - CENTRE
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::waypoint::{WaypointUpload, Waypoints},
    };

    fn upload(levels: impl IntoIterator<Item = i32>) -> Waypoints {
        let mut up = WaypointUpload::new();
        for l in levels {
            up.push_level(l).unwrap();
        }
        up.finish().unwrap()
    }

    #[test]
    fn waypoints_round_trip() {
        let n = 256;
        let levels: Vec<i32> = (0..n).map(|i| (i * 37 + 100) % 4000).collect();
        let pts = upload(levels.iter().copied());
        let tbl = ArbTable::build(&pts, 1000.0);
        for (p, &lvl) in levels.iter().enumerate() {
            let loc = p * TABLE_LEN / n as usize;
            let got = tbl.sample(i32::try_from(loc).unwrap()) + CENTRE;
            assert!((got - lvl).abs() <= 1, "point {p}: {got} != {lvl}");
        }
    }

    #[test]
    fn full_resolution_round_trip() {
        let levels: Vec<i32> = (0..4096).map(|i| (i * 7) % 4096).collect();
        let pts = upload(levels.iter().copied());
        let tbl = ArbTable::build(&pts, 1000.0);
        for (i, &lvl) in levels.iter().enumerate() {
            let got = tbl.sample(i32::try_from(i).unwrap()) + CENTRE;
            assert!((got - lvl).abs() <= 1, "index {i}");
        }
    }

    #[test]
    fn linear_between_points() {
        let pts = upload([0, 4000]);
        let tbl = ArbTable::build(&pts, 0.0);
        // Rising from 0 to 4000 over the first half, back down over the second
        assert_eq!(tbl.sample(0) + CENTRE, 0);
        assert!((tbl.sample(1024) + CENTRE - 2000).abs() <= 2);
        assert!((tbl.sample(2048) + CENTRE - 4000).abs() <= 2);
        assert!((tbl.sample(3072) + CENTRE - 2000).abs() <= 2);
    }

    #[test]
    fn step_jumps() {
        let mut up = WaypointUpload::new();
        up.push_level(1000).unwrap();
        up.push_step(1000, 3000).unwrap();
        let tbl = ArbTable::build(&up.finish().unwrap(), 0.0);
        assert_eq!(tbl.sample(2047) + CENTRE, 1000);
        assert_eq!(tbl.sample(2048) + CENTRE, 1000);
        assert_eq!(tbl.sample(2049) + CENTRE, 3000);
    }

    #[test]
    fn default_mapping_spreads_cycle() {
        let pts = upload([0, 4000]);
        let tbl = ArbTable::build(&pts, 0.0);
        let r = Arbitrary::new(&ArbParams::default(), &tbl);
        // hshift 0.5 with zoom 1 maps table position 0 of the first half to point 0
        assert_eq!(r.render(Half::First, 0), tbl.sample(0));
        assert_eq!(r.render(Half::Second, 0), tbl.sample(2048));
    }
}
