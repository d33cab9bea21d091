//! Wave families and their user facing parameters
use serde::{Deserialize, Serialize};

/// Shape of the analogue output
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum WaveShape {
    /// Sine, optionally mixed with a second sine
    #[default]
    Sine = 0,
    /// Triangle, optionally a staircase
    Triangle = 1,
    /// User defined waypoints
    Arbitrary = 2,
    /// Weighted mix of sine, triangle and arbitrary
    Composite = 3,
    /// Filtered random noise
    Noise = 4,
}

impl WaveShape {
    /// Shape from its numeric id (`0..=4`)
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Self::Sine,
            1 => Self::Triangle,
            2 => Self::Arbitrary,
            3 => Self::Composite,
            4 => Self::Noise,
            _ => return None,
        })
    }
}

/// A single adjustable shape parameter.
///
/// Which parameters apply depends on the [`WaveShape`], see [`ShapeParams::set`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShapeParam {
    /// Amplitude, `0..=1` (noise: `0..=2000` percent)
    Amplitude,
    /// Vertical shift, `0..=1`, `0.5` is centred
    VerticalShift,
    /// Phase shift in cycles, `0..=1`
    Phase,
    /// Multiple of the main frequency of the second sine, `1..=100`
    SecondFrequency,
    /// Percentage of the second sine added to the first, `0..=100`
    AddMix,
    /// Percentage of the second sine multiplied with the first, `0..=100`
    MulMix,
    /// Number of staircase steps per half cycle, `0..=100`, 0 disables the staircase
    Steps,
    /// Horizontal zoom, `0.01..=100`
    HorizontalZoom,
    /// Horizontal shift, `0..=1`
    HorizontalShift,
    /// Mirror the first half cycle into the second, non-zero enables
    Mirror,
    /// Composite weight of the sine, `0..=1`
    SineWeight,
    /// Composite weight of the triangle, `0..=1`
    TriangleWeight,
    /// Composite weight of the arbitrary wave, `0..=1`
    ArbitraryWeight,
    /// Noise colour, `0..=1000` (brown to white)
    Colour,
}

/// Sine family parameters
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct SineParams {
    /// Amplitude, `0..=1`
    pub amplitude: f32,
    /// Vertical shift, `0..=1`
    pub vshift: f32,
    /// Phase shift in cycles
    pub phase: f32,
    /// Frequency multiple of the second sine
    pub freq2: u8,
    /// Addition mix percentage
    pub add_mix: f32,
    /// Multiplication mix percentage
    pub mul_mix: f32,
}

impl Default for SineParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            vshift: 0.5,
            phase: 0.5,
            freq2: 8,
            add_mix: 0.0,
            mul_mix: 0.0,
        }
    }
}

/// Triangle family parameters
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct TriangleParams {
    /// Amplitude, `0..=1`
    pub amplitude: f32,
    /// Vertical shift, `0..=1`
    pub vshift: f32,
    /// Phase shift in cycles
    pub phase: f32,
    /// Staircase steps per half cycle, 0 for a plain ramp
    pub steps: u8,
}

impl Default for TriangleParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            vshift: 0.5,
            phase: 0.5,
            steps: 0,
        }
    }
}

/// Arbitrary family parameters
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ArbParams {
    /// Amplitude, `0..=1`
    pub amplitude: f32,
    /// Vertical shift, `0..=1`
    pub vshift: f32,
    /// Horizontal zoom
    pub hzoom: f32,
    /// Horizontal shift, `0..=1`
    pub hshift: f32,
    /// Play the first half cycle mirrored in the second
    pub mirror: bool,
}

impl Default for ArbParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            vshift: 0.5,
            hzoom: 1.0,
            hshift: 0.5,
            mirror: false,
        }
    }
}

/// Composite weights
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompositeParams {
    /// Weight of the sine
    pub sine: f32,
    /// Weight of the triangle
    pub triangle: f32,
    /// Weight of the arbitrary wave
    pub arbitrary: f32,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            sine: 0.5,
            triangle: 0.5,
            arbitrary: 0.5,
        }
    }
}

/// Noise parameters
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Amplitude percentage, `0..=2000`
    pub amplitude: u16,
    /// Colour, `0..=1000`. White is around 1000, pink 500, brown 30.
    pub colour: u16,
}

impl NoiseParams {
    /// Colour of white noise
    pub const WHITE: u16 = 1000;
    /// Colour of pink noise
    pub const PINK: u16 = 500;
    /// Colour of brown noise
    pub const BROWN: u16 = 30;
    /// Highest amplitude percentage
    pub const MAX_AMPLITUDE: u16 = 2000;
    /// Highest colour
    pub const MAX_COLOUR: u16 = 1000;

    /// Conventional name of the colour, if it is close enough to one
    #[must_use]
    pub const fn colour_name(&self) -> Option<&'static str> {
        match self.colour {
            820.. => Some("white"),
            480..=520 => Some("pink"),
            20..=40 => Some("brown"),
            _ => None,
        }
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            amplitude: 0,
            colour: Self::PINK,
        }
    }
}

/// Parameters of every wave family
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Sine
    pub sine: SineParams,
    /// Triangle
    pub triangle: TriangleParams,
    /// Arbitrary
    pub arb: ArbParams,
    /// Composite
    pub composite: CompositeParams,
    /// Noise
    pub noise: NoiseParams,
}

impl ShapeParams {
    /// Set `param` of `shape` to `value`, clamped to the parameter's range.
    ///
    /// Returns `false` if the shape has no such parameter.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set(&mut self, shape: WaveShape, param: ShapeParam, value: f32) -> bool {
        let unit = value.clamp(0.0, 1.0);
        let pct = value.clamp(0.0, 100.0);
        match (shape, param) {
            (WaveShape::Sine, ShapeParam::Amplitude) => self.sine.amplitude = unit,
            (WaveShape::Sine, ShapeParam::VerticalShift) => self.sine.vshift = unit,
            (WaveShape::Sine, ShapeParam::Phase) => self.sine.phase = unit,
            (WaveShape::Sine, ShapeParam::SecondFrequency) => {
                self.sine.freq2 = value.round().clamp(1.0, 100.0) as u8;
            }
            (WaveShape::Sine, ShapeParam::AddMix) => self.sine.add_mix = pct,
            (WaveShape::Sine, ShapeParam::MulMix) => self.sine.mul_mix = pct,
            (WaveShape::Triangle, ShapeParam::Amplitude) => self.triangle.amplitude = unit,
            (WaveShape::Triangle, ShapeParam::VerticalShift) => self.triangle.vshift = unit,
            (WaveShape::Triangle, ShapeParam::Phase) => self.triangle.phase = unit,
            (WaveShape::Triangle, ShapeParam::Steps) => self.triangle.steps = pct.ceil() as u8,
            (WaveShape::Arbitrary, ShapeParam::Amplitude) => self.arb.amplitude = unit,
            (WaveShape::Arbitrary, ShapeParam::VerticalShift) => self.arb.vshift = unit,
            (WaveShape::Arbitrary, ShapeParam::HorizontalZoom) => {
                self.arb.hzoom = value.clamp(0.01, 100.0);
            }
            (WaveShape::Arbitrary, ShapeParam::HorizontalShift) => self.arb.hshift = unit,
            (WaveShape::Arbitrary, ShapeParam::Mirror) => self.arb.mirror = value != 0.0,
            (WaveShape::Composite, ShapeParam::SineWeight) => self.composite.sine = unit,
            (WaveShape::Composite, ShapeParam::TriangleWeight) => self.composite.triangle = unit,
            (WaveShape::Composite, ShapeParam::ArbitraryWeight) => {
                self.composite.arbitrary = unit;
            }
            (WaveShape::Noise, ShapeParam::Amplitude) => {
                self.noise.amplitude =
                    value.round().clamp(0.0, f32::from(NoiseParams::MAX_AMPLITUDE)) as u16;
            }
            (WaveShape::Noise, ShapeParam::Colour) => {
                self.noise.colour =
                    value.round().clamp(0.0, f32::from(NoiseParams::MAX_COLOUR)) as u16;
            }
            _ => return false,
        }
        true
    }
}
