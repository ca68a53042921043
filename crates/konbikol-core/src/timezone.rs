//! The fixed VTIMEZONE block embedded into every generated calendar.

/// A named timezone together with its RFC 5545 `VTIMEZONE` component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneDefinition {
    /// The `TZID` event times are bound to.
    pub tzid: &'static str,
    /// The complete `BEGIN:VTIMEZONE` .. `END:VTIMEZONE` block, CRLF separated,
    /// without a trailing line break.
    pub block: &'static str,
}

/// Europe/Warsaw, the only timezone tickets are interpreted in.
pub const EUROPE_WARSAW: TimezoneDefinition = TimezoneDefinition {
    tzid: "Europe/Warsaw",
    block: "BEGIN:VTIMEZONE\r\n\
            TZID:Europe/Warsaw\r\n\
            BEGIN:DAYLIGHT\r\n\
            DTSTART:19770101T000000\r\n\
            TZOFFSETFROM:+0100\r\n\
            TZOFFSETTO:+0100\r\n\
            RRULE:FREQ=YEARLY;BYDAY=1SA;BYMONTH=1\r\n\
            TZNAME:CET\r\n\
            END:DAYLIGHT\r\n\
            BEGIN:STANDARD\r\n\
            DTSTART:19640927T010000\r\n\
            TZOFFSETFROM:+0200\r\n\
            TZOFFSETTO:+0100\r\n\
            RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=9\r\n\
            TZNAME:CET\r\n\
            END:STANDARD\r\n\
            END:VTIMEZONE",
};

impl TimezoneDefinition {
    /// Iterates over the lines of the block.
    pub fn lines(&self) -> impl Iterator<Item = &'static str> {
        self.block.split("\r\n")
    }
}
