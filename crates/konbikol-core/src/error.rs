//! Calendar building errors.

use thiserror::Error;

use crate::time::LocalDateTime;

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Errors that can occur while turning an event into a calendar payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The wall-clock fields do not name a real date/time.
    #[error("invalid date/time: {value}")]
    InvalidDateTime { value: LocalDateTime },

    /// The serialized calendar has no `VERSION:2.0` line to anchor the
    /// timezone block on.
    #[error("serialized calendar has no VERSION:2.0 line")]
    MissingVersionLine,
}
