use std::time::Duration;
use thiserror::Error;
use time::{Date, OffsetDateTime, UtcOffset};

/// Source of the current local date and time
pub(crate) trait Clock {
    fn now(&self) -> Result<OffsetDateTime, ClockError>;

    fn today(&self) -> Result<Date, ClockError> {
        self.now().map(OffsetDateTime::date)
    }

    /// Time left until the local date next changes
    fn until_midnight(&self) -> Result<Duration, ClockError> {
        let now = self.now()?;
        let tomorrow = now.date().next_day().ok_or(ClockError::EndOfTime)?;
        let midnight = tomorrow.midnight().assume_offset(now.offset());
        Duration::try_from(midnight - now)
            .map_err(|_| ClockError::EndOfTime)
    }
}

/// The system clock, read in the local UTC offset in effect at startup.
///
/// The local offset can only be looked up while the process has a single
/// thread, so it must be created before logging starts its flusher thread.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub(crate) fn new() -> Result<SystemClock, ClockError> {
        Ok(SystemClock {
            offset: UtcOffset::current_local_offset()?,
        })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<OffsetDateTime, ClockError> {
        Ok(OffsetDateTime::now_utc().to_offset(self.offset))
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum ClockError {
    #[error("failed to determine local time offset")]
    Offset(#[from] time::error::IndeterminateOffset),
    #[error("no tomorrow after the last representable date")]
    EndOfTime,
}
