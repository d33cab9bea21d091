//! Arbitrary wave waypoints and their upload
use {
    crate::{
        Rng,
        result::{UploadError, UploadResult},
    },
    arrayvec::ArrayVec,
    serde::{Deserialize, Serialize},
};

/// Most waypoints an arbitrary wave can have
pub const MAX_WAYPOINTS: usize = 4096;
/// Highest waypoint level
pub const MAX_LEVEL: u16 = 4095;
/// Points of a randomly generated wave
const RANDOM_POINTS: usize = 300;

/// A defined point of an arbitrary wave
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Waypoint {
    /// The wave passes through this level
    Level(u16),
    /// The wave arrives at `from`, then jumps straight to `to`
    Step {
        /// Level the wave arrives at
        from: u16,
        /// Level the wave continues from
        to: u16,
    },
}

impl Waypoint {
    /// Level the wave continues from after this point
    #[must_use]
    pub const fn level(self) -> u16 {
        match self {
            Self::Level(v) | Self::Step { to: v, .. } => v,
        }
    }
    /// Level the wave arrives at when reaching this point
    #[must_use]
    pub const fn entry(self) -> u16 {
        match self {
            Self::Level(v) | Self::Step { from: v, .. } => v,
        }
    }
    /// Whether this is a vertical step
    #[must_use]
    pub const fn is_step(self) -> bool {
        matches!(self, Self::Step { .. })
    }
}

/// Ordered waypoints of an arbitrary wave
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waypoints {
    points: ArrayVec<Waypoint, MAX_WAYPOINTS>,
}

impl Default for Waypoints {
    fn default() -> Self {
        let mut points = ArrayVec::new();
        points.extend([
            Waypoint::Level(2048),
            Waypoint::Level(4095),
            Waypoint::Step { from: 3072, to: 1024 },
            Waypoint::Level(0),
            Waypoint::Level(1024),
        ]);
        Self { points }
    }
}

impl Waypoints {
    /// The points
    #[must_use]
    pub fn as_slice(&self) -> &[Waypoint] {
        &self.points
    }
    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    /// Whether there are no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    /// Generate a random 300 point wave.
    ///
    /// A random number of leading points follow the start value, then points are placed at
    /// random gaps. Points in between are linearly filled in.
    #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn random(style: RandomStyle, rng: &mut Rng) -> Self {
        const N: usize = RANDOM_POINTS;
        let mut level: [Option<u16>; N + 1] = [None; N + 1];
        let mut step: [Option<u16>; N + 1] = [None; N + 1];
        let rand_level = |rng: &mut Rng| rng.below(u32::from(MAX_LEVEL) + 1) as u16;
        level[0] = Some(rand_level(rng));
        let mut prev = level[0].unwrap_or_default();
        let start = rng.below(N as u32);
        let mut i = rng.below(start) as usize;
        while i < N {
            let stepped = match style {
                RandomStyle::Smooth => false,
                RandomStyle::Stepped => true,
                RandomStyle::Mixed => rng.below(2) == 0,
            };
            if stepped {
                step[i] = Some(prev);
            }
            prev = rand_level(rng);
            level[i] = Some(prev);
            let divisor = rng.range(1, 15) as usize;
            let lo = i as i32 + 1;
            let hi = (i + N / divisor) as i32;
            i = (rng.range(lo, hi) as usize).min(N);
            if i >= N {
                if stepped {
                    step[N] = Some(prev);
                }
                level[N] = level[0];
            }
        }
        // Fill the gaps between set points
        let mut last = i32::from(level[0].unwrap_or_default());
        let mut unfilled = 0;
        for point in 1..=N {
            let Some(value) = level[point] else {
                unfilled += 1;
                continue;
            };
            if unfilled > 0 {
                let target = i32::from(step[point].unwrap_or(value));
                let inc = (target - last) as f32 / (unfilled + 1) as f32;
                let mut lvl = last as f32;
                for slot in &mut level[point - unfilled..point] {
                    lvl += inc;
                    *slot = Some(lvl.round().clamp(0.0, f32::from(MAX_LEVEL)) as u16);
                }
                unfilled = 0;
            }
            last = i32::from(value);
        }
        let mut points = ArrayVec::new();
        for (lvl, stp) in level.iter().zip(&step).take(N) {
            let to = lvl.unwrap_or_default();
            points.push(match stp {
                Some(from) => Waypoint::Step { from: *from, to },
                None => Waypoint::Level(to),
            });
        }
        Self { points }
    }
}

/// How a random arbitrary wave connects its points
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RandomStyle {
    /// Only sloped lines
    Smooth,
    /// Every set point is a vertical step
    Stepped,
    /// Randomly either
    Mixed,
}

/// Collects waypoints until they are committed as a new arbitrary wave.
///
/// Problems are reported but never fatal: out of range values are clamped and points past
/// [`MAX_WAYPOINTS`] are dropped.
#[derive(Debug)]
pub struct WaypointUpload {
    points: Waypoints,
    dropped: usize,
}

impl Default for WaypointUpload {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointUpload {
    /// Start an empty upload
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: Waypoints {
                points: ArrayVec::new(),
            },
            dropped: 0,
        }
    }
    /// Start an upload that appends to existing points
    #[must_use]
    pub const fn extend(points: Waypoints) -> Self {
        Self { points, dropped: 0 }
    }
    /// Append a plain point
    pub fn push_level(&mut self, level: i32) -> UploadResult {
        let (level, res) = clamp_level(level);
        self.push(Waypoint::Level(level)).and(res)
    }
    /// Append a stepped point
    pub fn push_step(&mut self, from: i32, to: i32) -> UploadResult {
        let (from, res_from) = clamp_level(from);
        let (to, res_to) = clamp_level(to);
        self.push(Waypoint::Step { from, to }).and(res_from).and(res_to)
    }
    /// Append a point
    pub fn push(&mut self, point: Waypoint) -> UploadResult {
        if self.points.points.try_push(point).is_err() {
            self.dropped += 1;
            return Err(UploadError::Truncated(MAX_WAYPOINTS));
        }
        Ok(())
    }
    /// Number of points dropped because the upload was full
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
    /// Finish the upload
    pub fn finish(self) -> UploadResult<Waypoints> {
        if self.points.is_empty() {
            return Err(UploadError::Empty);
        }
        if self.dropped > 0 {
            log::warn!(
                "Arbitrary wave upload truncated, {} points dropped",
                self.dropped
            );
        }
        Ok(self.points)
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_level(level: i32) -> (u16, UploadResult) {
    let clamped = level.clamp(0, i32::from(MAX_LEVEL)) as u16;
    if i32::from(clamped) == level {
        (clamped, Ok(()))
    } else {
        (clamped, Err(UploadError::ValueOutOfRange(level)))
    }
}
