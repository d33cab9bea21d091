//! Square wave locked to the half cycles of the analogue output
use crate::{
    calibration::SyncDelayCal,
    hal::{Hardware, PinAction},
    wave_table::Half,
};

/// Fewest samples per half while the square wave is synced, so its edges stay visible
pub const SYNC_MIN_HALF: u16 = 4;
/// Fewest samples per half otherwise
pub const FREE_MIN_HALF: u16 = 1;

/// Synced square wave settings
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SyncSquare {
    /// Whether the square wave follows the analogue output
    pub enabled: bool,
    /// Busy wait before toggling on DMA completion, lining the edge up with the DAC output
    pub delay: u32,
}

impl SyncSquare {
    /// Pin action when `playing` starts. With a held half (0 or 100 percent duty) the pin
    /// only pulses once per cycle.
    #[must_use]
    pub fn edge(playing: Half, held: Option<Half>) -> PinAction {
        match held {
            Some(held) => PinAction::Pulse(held == Half::Second),
            None => PinAction::Level(playing == Half::First),
        }
    }
    /// Fewest samples per half the fast tiers may use
    #[must_use]
    pub const fn min_half(&self) -> u16 {
        if self.enabled {
            SYNC_MIN_HALF
        } else {
            FREE_MIN_HALF
        }
    }
    /// Apply `action` right away, if synced
    pub fn emit(&self, hw: &mut impl Hardware, action: PinAction) {
        if self.enabled {
            hw.drive_square(action);
        }
    }
    /// Apply `action` after the delay compensation, if synced
    pub fn emit_delayed(&self, hw: &mut impl Hardware, action: PinAction) {
        if self.enabled {
            if self.delay > 0 {
                hw.spin(self.delay);
            }
            hw.drive_square(action);
        }
    }
}

/// Delay compensation for a fast tier running at timer divisor `tc`.
///
/// Slow sample rates need a longer wait. Duty cycles away from 50 percent shorten it, but
/// a held half keeps the full delay.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sync_delay(tc: u32, actual_duty: f64, held: bool, cal: &SyncDelayCal) -> u32 {
    let duty_factor = cal.low_duty_factor / ((actual_duty - 50.0).abs() + cal.low_duty_factor);
    let factor = duty_factor.max(f64::from(u8::from(held)));
    let delay = (f64::from(tc) - cal.high_rate_delay) * cal.low_rate_factor * factor;
    delay.max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use {super::*, crate::hal::sim::SimHardware};

    #[test]
    fn delay_shrinks_away_from_half_duty() {
        let cal = SyncDelayCal::default();
        let at_50 = sync_delay(262, 50.0, false, &cal);
        assert_eq!(at_50, ((262.0 - 10.0) * 0.55) as u32);
        assert!(sync_delay(262, 10.0, false, &cal) < at_50);
        assert_eq!(sync_delay(262, 0.0, true, &cal), at_50);
        assert_eq!(sync_delay(5, 50.0, false, &cal), 0);
    }

    #[test]
    fn edges() {
        assert_eq!(SyncSquare::edge(Half::First, None), PinAction::Level(true));
        assert_eq!(SyncSquare::edge(Half::Second, None), PinAction::Level(false));
        assert_eq!(
            SyncSquare::edge(Half::Second, Some(Half::Second)),
            PinAction::Pulse(true)
        );
        assert_eq!(
            SyncSquare::edge(Half::First, Some(Half::First)),
            PinAction::Pulse(false)
        );
    }

    #[test]
    fn emit_only_when_synced() {
        let mut hw = SimHardware::default();
        let mut sq = SyncSquare::default();
        sq.emit(&mut hw, PinAction::Level(true));
        assert!(hw.pin_events.is_empty());
        sq.enabled = true;
        sq.delay = 30;
        sq.emit_delayed(&mut hw, PinAction::Level(true));
        assert_eq!(hw.pin_events, [PinAction::Level(true)]);
        assert_eq!(hw.spun, 30);
    }
}
