//! Period of the countdown output timer
use {
    crate::result::{TimerError, TimerResult},
    serde::{Deserialize, Serialize},
};

/// How long the output timer counts before its output goes active
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimerPeriod {
    /// Days
    pub days: u16,
    /// Hours, `0..=23`
    pub hours: u8,
    /// Minutes, `0..=59`
    pub minutes: u8,
    /// Seconds, `0..=59`
    pub seconds: u8,
}

impl Default for TimerPeriod {
    fn default() -> Self {
        Self {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 10,
        }
    }
}

impl TimerPeriod {
    /// Check that every component is in range and the period isn't zero
    pub fn validate(&self) -> TimerResult {
        if self.hours > 23 || self.minutes > 59 || self.seconds > 59 {
            return Err(TimerError::OutOfRange);
        }
        if self.total_secs() == 0 {
            return Err(TimerError::ZeroPeriod);
        }
        Ok(())
    }
    /// Length in seconds
    #[must_use]
    pub fn total_secs(&self) -> u64 {
        u64::from(self.days) * 86_400
            + u64::from(self.hours) * 3600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds)
    }
}

#[test]
fn test_timer_period_validation() {
    assert_eq!(TimerPeriod::default().validate(), Ok(()));
    assert_eq!(TimerPeriod::default().total_secs(), 10);
    let zero = TimerPeriod {
        seconds: 0,
        ..TimerPeriod::default()
    };
    assert_eq!(zero.validate(), Err(TimerError::ZeroPeriod));
    let bad = TimerPeriod {
        minutes: 60,
        ..TimerPeriod::default()
    };
    assert_eq!(bad.validate(), Err(TimerError::OutOfRange));
    let long = TimerPeriod {
        days: 2,
        hours: 23,
        minutes: 59,
        seconds: 59,
    };
    assert_eq!(long.validate(), Ok(()));
    assert_eq!(long.total_secs(), 2 * 86_400 + 86_399);
}
