//! Coloured noise from the hardware random source
use crate::wave_table::{CENTRE, MAX_LEVEL};

/// Filter coefficients derived from a noise colour
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NoiseFilter {
    /// Main averaging factor, per ten thousand
    pub colour: i32,
    /// Low frequency boost
    pub lf_boost: i32,
    /// Low frequency cutoff, percent per update
    pub lf_cutoff: i32,
    /// High frequency boost
    pub hf_boost: i32,
    /// Gain of the main filtered signal, percent
    pub main: i32,
}

/// Linearly map `x` from `in_lo..in_hi` to `out_lo..out_hi`, in integer math
const fn map(x: i32, in_lo: i32, in_hi: i32, out_lo: i32, out_hi: i32) -> i32 {
    (x - in_lo) * (out_hi - out_lo) / (in_hi - in_lo) + out_lo
}

impl NoiseFilter {
    /// Coefficients for `colour` (`0..=1000`; white is 1000, pink 500, brown 30)
    #[must_use]
    pub fn from_colour(colour: u16) -> Self {
        let col = (i32::from(colour) * 10).clamp(0, 10_000);
        let colour = match col {
            7501.. => map(col, 10_000, 7500, 10_000, 4500),
            5001.. => map(col, 7500, 5000, 4500, 3500),
            _ => map(col, 5000, 0, 3500, 0),
        };
        let lf_boost = match colour {
            6001.. => map(colour, 10_000, 6000, 0, 10),
            4001.. => map(colour, 6000, 4000, 10, 150),
            1501.. => map(colour, 4000, 1500, 150, 250),
            151.. => map(colour, 1500, 150, 250, 0),
            _ => 0,
        };
        let lf_cutoff = map(colour, 5500, 3800, 15, 2).clamp(2, 15);
        let hf_boost = match colour {
            6001.. => map(colour, 10_000, 6000, 0, 350),
            4001.. => map(colour, 6000, 4000, 350, 250),
            2001.. => map(colour, 4000, 2000, 250, 80),
            151.. => map(colour, 4000, 150, 80, 0),
            _ => 0,
        };
        let main = match colour {
            6501.. => map(colour, 10_000, 6500, 100, 66),
            4001.. => map(colour, 6500, 4000, 66, 75),
            1501.. => map(colour, 4000, 1500, 75, 120),
            701.. => map(colour, 1500, 700, 120, 500),
            301.. => map(colour, 700, 300, 500, 1500),
            _ => map(colour, 300, 0, 1500, 4000),
        };
        Self {
            colour,
            lf_boost,
            lf_cutoff,
            hf_boost,
            main,
        }
    }
}

/// Noise generator state.
///
/// Three exponential filters run on the random input: a fast one whose residual carries
/// the high frequencies, the main averaging filter and a slow one for the low frequencies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NoiseSynth {
    filter: NoiseFilter,
    /// Amplitude percentage
    amplitude: i32,
    fast: i16,
    fast_residual: i16,
    avg: i16,
    slow: i16,
    ticks: u8,
}

impl NoiseSynth {
    /// Generator for `colour` at `amplitude` percent
    #[must_use]
    pub fn new(colour: u16, amplitude: u16) -> Self {
        Self {
            filter: NoiseFilter::from_colour(colour),
            amplitude: i32::from(amplitude),
            fast: 0,
            fast_residual: 0,
            avg: 0,
            slow: 0,
            ticks: 0,
        }
    }
    /// Change colour and amplitude, keeping the filter state
    pub fn configure(&mut self, colour: u16, amplitude: u16) {
        self.filter = NoiseFilter::from_colour(colour);
        self.amplitude = i32::from(amplitude);
    }
    /// Current coefficients
    #[must_use]
    pub const fn filter(&self) -> &NoiseFilter {
        &self.filter
    }
    /// Feed one random word and produce a DAC level
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tick(&mut self, random: u32) -> u16 {
        let f = &self.filter;
        let new = i32::from(random as u16 as i16);
        let fast = i32::from(self.fast);
        self.fast = (fast + (new - fast) * 2 / 10) as i16;
        self.fast_residual = (new - i32::from(self.fast)) as i16;
        let avg = i32::from(self.avg);
        let next = avg + (new - avg) * f.colour / 10_000;
        self.avg = (avg + (next - avg) * f.colour / 10_000) as i16;
        self.ticks = (self.ticks + 1) % 4;
        if self.ticks == 0 {
            let slow = i32::from(self.slow);
            self.slow = (slow + (new - slow) * f.lf_cutoff / 100) as i16;
        }
        let mixed = (i32::from(self.avg) / 16 * f.main / 100)
            + (i32::from(self.slow) / 16 * f.lf_boost / 70)
            + (i32::from(self.fast_residual) / 16 * f.hf_boost / 1000);
        (mixed * self.amplitude / 100 + CENTRE).clamp(0, MAX_LEVEL) as u16
    }
}
