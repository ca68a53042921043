//! Event-to-calendar conversion.
//!
//! Builds an RFC 5545 calendar holding a single VEVENT with the `icalendar`
//! crate, then embeds the fixed [`TimezoneDefinition`] right after the
//! `VERSION:2.0` header line. `icalendar` has no VTIMEZONE component builder,
//! so the block is spliced into the serialized text on a verified anchor.
//!
//! Event times are bound to the embedded zone with a `TZID` parameter, so
//! calendar consumers read the naive wall-clock fields as Warsaw time.

use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike, Property};
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};
use crate::event::CalendarEvent;
use crate::time::LocalDateTime;
use crate::timezone::{EUROPE_WARSAW, TimezoneDefinition};

/// `PRODID` of every generated calendar.
pub const PRODUCT_ID: &str = "konbikol";

/// The mandatory header line the timezone block is anchored on.
const VERSION_LINE: &str = "VERSION:2.0\r\n";

/// Builds the downloadable calendar payload for `event`, in Europe/Warsaw.
///
/// # Errors
///
/// Returns [`CalendarError::InvalidDateTime`] if `start` or `end` is not a
/// real date/time, and [`CalendarError::MissingVersionLine`] if the
/// serialized calendar cannot be anchored.
pub fn build_calendar_payload(event: &CalendarEvent) -> CalendarResult<Vec<u8>> {
    build_calendar_payload_in(event, &EUROPE_WARSAW)
}

/// Builds the calendar payload for `event` in the given timezone.
pub fn build_calendar_payload_in(
    event: &CalendarEvent,
    tz: &TimezoneDefinition,
) -> CalendarResult<Vec<u8>> {
    let calendar = build_calendar(event, tz)?;
    let ics = embed_timezone(&calendar.to_string(), tz)?;

    debug!(
        uid = %event.uid,
        subject = %event.subject,
        tzid = tz.tzid,
        bytes = ics.len(),
        "Built calendar payload"
    );

    Ok(ics.into_bytes())
}

/// Builds the calendar object (without the timezone block).
///
/// The calendar is scoped by the event's `uid`: the single entry gets the UID
/// `0@<uid>`, its index within the calendar followed by the scope.
pub fn build_calendar(event: &CalendarEvent, tz: &TimezoneDefinition) -> CalendarResult<Calendar> {
    let start = zoned(&event.start, tz)?;
    let end = zoned(&event.end, tz)?;

    let mut calendar = Calendar::empty();
    calendar.append_property(Property::new("VERSION", "2.0"));
    calendar.append_property(Property::new("PRODID", PRODUCT_ID));

    let entry = Event::new()
        .uid(&scoped_uid(0, &event.uid))
        .summary(&event.subject)
        .description(&event.description)
        .location(&event.location)
        .starts(start)
        .ends(end)
        .done();
    calendar.push(entry);

    Ok(calendar)
}

/// Inserts `tz.block` on its own lines right after the first `VERSION:2.0`
/// line of `ics`.
///
/// # Errors
///
/// Returns [`CalendarError::MissingVersionLine`] if `ics` has no such line.
pub fn embed_timezone(ics: &str, tz: &TimezoneDefinition) -> CalendarResult<String> {
    let anchor = find_version_line(ics).ok_or(CalendarError::MissingVersionLine)?;
    let (head, tail) = ics.split_at(anchor + VERSION_LINE.len());

    let mut out = String::with_capacity(ics.len() + tz.block.len() + 2);
    out.push_str(head);
    out.push_str(tz.block);
    out.push_str("\r\n");
    out.push_str(tail);
    Ok(out)
}

/// Byte offset of the first line that is exactly `VERSION:2.0`.
fn find_version_line(ics: &str) -> Option<usize> {
    if ics.starts_with(VERSION_LINE) {
        return Some(0);
    }
    ics.find("\r\nVERSION:2.0\r\n").map(|pos| pos + 2)
}

fn scoped_uid(index: usize, scope: &str) -> String {
    format!("{index}@{scope}")
}

fn zoned(dt: &LocalDateTime, tz: &TimezoneDefinition) -> CalendarResult<CalendarDateTime> {
    Ok(CalendarDateTime::WithTimezone {
        date_time: dt.to_naive()?,
        tzid: tz.tzid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight() -> CalendarEvent {
        CalendarEvent::new(
            "abc",
            "Flight AB123",
            LocalDateTime::new(2024, 5, 1, 10, 0),
            LocalDateTime::new(2024, 5, 1, 12, 30),
        )
        .with_description("Seat 12A")
        .with_location("Warszawa Chopin")
    }

    fn payload_text(event: &CalendarEvent) -> String {
        String::from_utf8(build_calendar_payload(event).unwrap()).unwrap()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.split("\r\n").filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn payload_has_single_version_line_followed_by_timezone() {
        let text = payload_text(&flight());
        let lines = lines(&text);

        let versions: Vec<_> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == "VERSION:2.0")
            .collect();
        assert_eq!(versions.len(), 1);

        let after_version = versions[0].0 + 1;
        let tz_lines: Vec<_> = EUROPE_WARSAW.lines().collect();
        assert_eq!(&lines[after_version..after_version + tz_lines.len()], &tz_lines[..]);
        assert_eq!(text.matches("BEGIN:VTIMEZONE").count(), 1);
        assert_eq!(text.matches("END:VTIMEZONE").count(), 1);
    }

    #[test]
    fn payload_has_exactly_one_event() {
        let text = payload_text(&flight());
        let lines = lines(&text);

        assert_eq!(lines.iter().filter(|l| **l == "BEGIN:VEVENT").count(), 1);
        assert_eq!(lines.iter().filter(|l| **l == "END:VEVENT").count(), 1);
    }

    #[test]
    fn payload_blocks_are_balanced() {
        let text = payload_text(&flight());
        let mut stack = Vec::new();
        for line in lines(&text) {
            if let Some(name) = line.strip_prefix("BEGIN:") {
                stack.push(name);
            } else if let Some(name) = line.strip_prefix("END:") {
                assert_eq!(stack.pop(), Some(name));
            }
        }
        assert!(stack.is_empty());
        assert!(text.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTIMEZONE\r\n"));
        assert!(text.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn event_times_match_wall_clock_fields() {
        let text = payload_text(&flight());
        let lines = lines(&text);

        assert!(lines.contains(&"DTSTART;TZID=Europe/Warsaw:20240501T100000"));
        assert!(lines.contains(&"DTEND;TZID=Europe/Warsaw:20240501T123000"));
    }

    #[test]
    fn event_fields_are_serialized() {
        let text = payload_text(&flight());
        let lines = lines(&text);

        assert!(lines.contains(&"PRODID:konbikol"));
        assert!(lines.contains(&"UID:0@abc"));
        assert!(lines.contains(&"SUMMARY:Flight AB123"));
        assert!(lines.contains(&"DESCRIPTION:Seat 12A"));
        assert!(lines.contains(&"LOCATION:Warszawa Chopin"));
    }

    #[test]
    fn event_block_snapshot() {
        let text = payload_text(&flight());
        let mut event: Vec<String> = lines(&text)
            .into_iter()
            .skip_while(|l| *l != "BEGIN:VEVENT")
            .take_while(|l| *l != "END:VCALENDAR")
            .map(|l| {
                if l.starts_with("DTSTAMP:") {
                    "DTSTAMP:[redacted]".to_string()
                } else {
                    l.to_string()
                }
            })
            .collect();
        event.sort();

        insta::assert_snapshot!(event.join("\n"), @r"
        BEGIN:VEVENT
        DESCRIPTION:Seat 12A
        DTEND;TZID=Europe/Warsaw:20240501T123000
        DTSTAMP:[redacted]
        DTSTART;TZID=Europe/Warsaw:20240501T100000
        END:VEVENT
        LOCATION:Warszawa Chopin
        SUMMARY:Flight AB123
        UID:0@abc
        ");
    }

    #[test]
    fn january_and_december_keep_their_months() {
        let event = CalendarEvent::new(
            "new-year",
            "Night train",
            LocalDateTime::new(2024, 12, 31, 22, 15),
            LocalDateTime::new(2025, 1, 1, 6, 40),
        );
        let text = payload_text(&event);

        assert!(text.contains("DTSTART;TZID=Europe/Warsaw:20241231T221500\r\n"));
        assert!(text.contains("DTEND;TZID=Europe/Warsaw:20250101T064000\r\n"));
    }

    #[test]
    fn end_before_start_is_not_validated() {
        let event = CalendarEvent::new(
            "backwards",
            "Bus",
            LocalDateTime::new(2024, 5, 1, 12, 0),
            LocalDateTime::new(2024, 5, 1, 10, 0),
        );
        assert!(build_calendar_payload(&event).is_ok());
    }

    #[test]
    fn impossible_date_is_rejected() {
        let event = CalendarEvent::new(
            "bad",
            "Bus",
            LocalDateTime::new(2024, 2, 30, 12, 0),
            LocalDateTime::new(2024, 3, 1, 10, 0),
        );
        assert!(matches!(
            build_calendar_payload(&event),
            Err(CalendarError::InvalidDateTime { .. })
        ));
    }

    #[test]
    fn embed_timezone_requires_version_anchor() {
        let ics = "BEGIN:VCALENDAR\r\nPRODID:x\r\nEND:VCALENDAR\r\n";
        assert_eq!(
            embed_timezone(ics, &EUROPE_WARSAW),
            Err(CalendarError::MissingVersionLine)
        );
    }

    #[test]
    fn embed_timezone_ignores_version_text_inside_other_lines() {
        let ics = "BEGIN:VCALENDAR\r\nX-NOTE:VERSION:2.0\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";
        let out = embed_timezone(ics, &EUROPE_WARSAW).unwrap();

        assert!(out.starts_with("BEGIN:VCALENDAR\r\nX-NOTE:VERSION:2.0\r\nVERSION:2.0\r\nBEGIN:VTIMEZONE\r\n"));
        assert_eq!(out.matches("BEGIN:VTIMEZONE").count(), 1);
    }

    #[test]
    fn embed_timezone_only_touches_first_version_line() {
        let ics = "VERSION:2.0\r\nVERSION:2.0\r\n";
        let out = embed_timezone(ics, &EUROPE_WARSAW).unwrap();

        assert_eq!(out, format!("VERSION:2.0\r\n{}\r\nVERSION:2.0\r\n", EUROPE_WARSAW.block));
    }
}
