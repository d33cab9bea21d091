use thiserror::Error;

/// Error that can happen while uploading arbitrary wave waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The waypoint list is full. Points past the limit were dropped, the ones before it
    /// were kept.
    #[error("Waypoint upload truncated at {0} points")]
    Truncated(usize),
    /// A waypoint value was outside of the DAC range.
    ///
    /// The value is clamped and kept, the error is purely informative.
    #[error("Waypoint value {0} out of range (should be between 0 and 4095)")]
    ValueOutOfRange(i32),
    /// Commit was requested without any waypoints.
    #[error("No waypoints to commit")]
    Empty,
}

/// Error that can happen when configuring a frequency sweep
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SweepError {
    /// Minimum frequency is zero
    #[error("Sweep minimum frequency can't be zero")]
    ZeroMinimum,
    /// Minimum frequency is not below the maximum
    #[error("Sweep minimum frequency must be lower than the maximum")]
    InvertedRange,
    /// Both the rise and fall times are zero, nothing would ever move
    #[error("Sweep rise and fall times can't both be zero")]
    ZeroDuration,
    /// A sweep limit is outside of the representable frequency range
    #[error("Sweep frequency {0} Hz out of range")]
    FrequencyOutOfRange(f64),
    /// A sweep limit or time is NaN or infinite
    #[error("Sweep frequencies and times must be finite")]
    NotFinite,
    /// The output timer holds the square wave pin
    #[error("Sweep can't run while the timer is active")]
    TimerActive,
}

/// Error that can happen when configuring the output timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The timer period is zero
    #[error("Timer period can't be zero")]
    ZeroPeriod,
    /// Hours, minutes or seconds out of range
    #[error("Timer period out of range (hours <= 23, minutes <= 59, seconds <= 59)")]
    OutOfRange,
    /// A frequency sweep is running
    #[error("Timer can't start while a sweep is running")]
    SweepActive,
}

/// Result of uploading waypoints
pub type UploadResult<T = ()> = Result<T, UploadError>;

/// Result of configuring a sweep
pub type SweepResult<T = ()> = Result<T, SweepError>;

/// Result of configuring the output timer
pub type TimerResult<T = ()> = Result<T, TimerError>;
