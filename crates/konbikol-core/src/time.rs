//! Wall-clock time for ticket events.
//!
//! [`LocalDateTime`] is the naive date/time the application layer hands over
//! for an event. It carries no UTC offset: the fields are interpreted in the
//! single timezone embedded into every generated calendar (see
//! [`crate::timezone`]).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

/// A wall-clock date and time with a 1-based month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalDateTime {
    pub year: i32,
    /// Month of the year, 1 (January) to 12 (December).
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub min: u32,
}

impl LocalDateTime {
    /// Creates a new local date/time.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, min: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            min,
        }
    }

    /// Zero-based month index, the convention of the underlying date primitive
    /// (`chrono::Datelike::month0`).
    ///
    /// Returns `None` for month 0, which has no index.
    pub fn month_index(&self) -> Option<u32> {
        self.month.checked_sub(1)
    }

    /// Converts to a [`NaiveDateTime`] without applying any timezone
    /// conversion. Seconds are always zero.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDateTime`] if the fields do not form a
    /// real calendar date/time (e.g. February 30th or hour 24).
    pub fn to_naive(&self) -> CalendarResult<NaiveDateTime> {
        let invalid = || CalendarError::InvalidDateTime { value: *self };

        // chrono takes a 1-based month and exposes the 0-based index via month0()
        self.month_index().ok_or_else(invalid)?;
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, self.min, 0))
            .ok_or_else(invalid)
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        use chrono::{Datelike, Timelike};

        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            min: dt.minute(),
        }
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.min
        )
    }
}
