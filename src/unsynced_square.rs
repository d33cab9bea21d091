//! Square wave independent of the analogue output
use crate::{
    Calibration,
    clock::PWM_CLOCK_HZ,
    hal::{PinAction, PwmDivisor, PwmSetting},
};

/// Counting units per second of the interrupt path
pub const UNITS_PER_SEC: f64 = 200_000.0;
/// Units the interrupt path counts per tick
pub const UNITS_PER_TICK: u64 = 2;
/// Microseconds per PWM clock count at a 1x divisor
const MICROS_PER_COUNT: f64 = 1e6 / PWM_CLOCK_HZ;
/// PWM count equivalent of one interrupt path unit
const UNIT_MULTIPLIER: f64 = PWM_CLOCK_HZ / UNITS_PER_SEC;
/// Reported pulse width at 0 percent, microseconds
const MIN_PULSE_MICROS: f64 = 0.096;
/// Reported gap at 100 percent, microseconds
const MIN_GAP_MICROS: f64 = 0.12;

/// How the square wave is produced
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SquareDrive {
    /// Hardware PWM
    Pwm(PwmSetting),
    /// Counted by the unsynced tick interrupt
    Interrupt(IrqSquare),
}

/// State of the interrupt driven square wave
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IrqSquare {
    /// Length of the high part and of the whole period, in units
    limits: [u64; 2],
    /// 0 while high, 1 while low. Stays put at 0 and 100 percent.
    part: usize,
    /// Units counted in the current period
    count: u64,
    held: bool,
}

impl IrqSquare {
    /// Advance one tick, returning what to do with the pin
    pub const fn tick(&mut self) -> Option<PinAction> {
        self.count += UNITS_PER_TICK;
        if self.count < self.limits[self.part] {
            return None;
        }
        if self.held {
            self.count = 0;
            // 0 percent pulses high, 100 percent pulses low
            return Some(PinAction::Pulse(self.part == 0));
        }
        let action = if self.part == 1 {
            self.count = 0;
            PinAction::Level(true)
        } else {
            PinAction::Level(false)
        };
        self.part ^= 1;
        Some(action)
    }
}

/// Programming of the unsynced square wave for a frequency and duty
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct UnsyncedSquare {
    /// Drive method and its state
    pub drive: SquareDrive,
    /// Frequency actually produced, in Hz
    pub actual_freq: f64,
    /// Duty cycle actually produced, in percent
    pub actual_duty: f64,
}

impl UnsyncedSquare {
    /// Work out the programming for `freq` Hz at `duty` percent
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(freq: f64, duty: f64, cal: &Calibration) -> Self {
        let freq = freq.max(f64::MIN_POSITIVE);
        let [t1, t2, t4, t8] = cal.pwm_thresholds;
        let pwm = if freq >= t1 {
            Some(PwmDivisor::X1)
        } else if freq >= t2 {
            Some(PwmDivisor::X2)
        } else if freq >= t4 {
            Some(PwmDivisor::X4)
        } else if freq >= t8 {
            Some(PwmDivisor::X8)
        } else {
            None
        };
        let (clock, mult) = match pwm {
            Some(div) => {
                let d = f64::from(div as u8);
                (PWM_CLOCK_HZ / d, d)
            }
            None => (UNITS_PER_SEC, UNIT_MULTIPLIER),
        };
        let period = (clock / freq).round().max(2.0) as u64;
        let pulse = (duty / 100.0 * period as f64).round().clamp(1.0, (period - 1) as f64) as u64;
        let micro_period = period as f64 * MICROS_PER_COUNT * mult;
        let mut micro_pulse = pulse as f64 * MICROS_PER_COUNT * mult;
        let drive = match pwm {
            Some(divisor) => SquareDrive::Pwm(PwmSetting {
                divisor,
                period: period.min(u64::from(u32::MAX)) as u32,
                duty: (period - pulse).min(u64::from(u32::MAX)) as u32,
            }),
            None => {
                let held = duty <= 0.0 || duty >= 100.0;
                if duty <= 0.0 {
                    micro_pulse = MIN_PULSE_MICROS;
                } else if duty >= 100.0 {
                    micro_pulse = micro_period - MIN_GAP_MICROS;
                }
                SquareDrive::Interrupt(IrqSquare {
                    limits: if held { [period; 2] } else { [pulse, period] },
                    part: usize::from(duty >= 100.0),
                    count: 0,
                    held,
                })
            }
        };
        Self {
            drive,
            actual_freq: 1e6 / micro_period,
            actual_duty: micro_pulse * 100.0 / micro_period,
        }
    }
    /// Whether the interrupt path is used
    #[must_use]
    pub const fn uses_interrupt(&self) -> bool {
        matches!(self.drive, SquareDrive::Interrupt(_))
    }
}
