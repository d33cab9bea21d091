//! Boundary between the synthesis core and the output hardware
use serde::{Deserialize, Serialize};

pub mod sim;

bitflags::bitflags! {
    /// Interrupt sources the engine switches on and off
    #[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
    pub struct IrqSources: u8 {
        /// DMA half-buffer completion
        const DMA           = 0b0001;
        /// Phase accumulator tick
        const SLOW_TICK     = 0b0010;
        /// Noise generator tick
        const NOISE_TICK    = 0b0100;
        /// Unsynced square wave tick
        const UNSYNCED_TICK = 0b1000;
    }
}

/// Timers that pace the different output paths
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SampleTimer {
    /// Triggers DAC conversions of DMA streamed tier buffers
    Dma = 0,
    /// Phase accumulator tick
    Slow = 1,
    /// Noise generator tick
    Noise = 2,
    /// Unsynced square wave tick
    Unsynced = 3,
}

impl SampleTimer {
    /// Every timer
    pub const ALL: [Self; 4] = [Self::Dma, Self::Slow, Self::Noise, Self::Unsynced];
}

/// Clock divisor of the PWM unit
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PwmDivisor {
    /// Full PWM clock
    X1 = 1,
    /// Half PWM clock
    X2 = 2,
    /// Quarter PWM clock
    X4 = 4,
    /// Eighth PWM clock
    X8 = 8,
}

/// What to do with the square wave pin
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PinAction {
    /// Drive the pin to a level
    Level(bool),
    /// Pulse the pin to a level and back
    Pulse(bool),
}

/// Hardware PWM programming of the unsynced square wave
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PwmSetting {
    /// Clock divisor
    pub divisor: PwmDivisor,
    /// Period in divided clock counts
    pub period: u32,
    /// Compare value. The output is low for this many counts of the period.
    pub duty: u32,
}

/// Everything the engine needs from the board.
///
/// All methods are non-blocking and must be callable from interrupt context.
pub trait Hardware {
    /// Program `timer` with clock `divisor` (counts of the 42 MHz timer clock)
    fn program_timer(&mut self, timer: SampleTimer, divisor: u32);
    /// Unmask interrupt sources
    fn enable_irq(&mut self, irqs: IrqSources);
    /// Mask interrupt sources
    fn disable_irq(&mut self, irqs: IrqSources);
    /// Start streaming `current` to the DAC, followed by `next`
    fn arm_dma(&mut self, current: &[u16], next: &[u16]);
    /// Queue `next` to follow the buffer that is currently streaming
    fn queue_dma(&mut self, next: &[u16]);
    /// Stop DMA streaming; the DAC is written directly afterwards
    fn stop_dma(&mut self);
    /// Write a sample straight to the DAC
    fn write_dac(&mut self, value: u16);
    /// Drive the square wave pin
    fn set_square(&mut self, high: bool);
    /// Briefly drive the square wave pin to `level`, then back
    fn pulse_square(&mut self, level: bool);
    /// Hand the square wave pin to the PWM unit
    fn configure_pwm(&mut self, setting: PwmSetting);
    /// Take the square wave pin back from the PWM unit
    fn disable_pwm(&mut self);
    /// Read the hardware random source
    fn read_random(&mut self) -> u32;
    /// Read the modulation input, 12 bits
    fn read_analog(&mut self) -> u16;
    /// Busy wait for roughly `cycles` loop iterations
    fn spin(&mut self, cycles: u32);
    /// Apply `action` to the square wave pin
    fn drive_square(&mut self, action: PinAction) {
        match action {
            PinAction::Level(high) => self.set_square(high),
            PinAction::Pulse(level) => self.pulse_square(level),
        }
    }
}
