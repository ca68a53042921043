//! The structured event the application layer builds from ticket text.

use serde::{Deserialize, Serialize};

use crate::time::LocalDateTime;

/// A single journey, ready to be turned into a calendar file.
///
/// `start <= end` is the caller's responsibility and is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Caller-supplied identifier, unique per event.
    pub uid: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start: LocalDateTime,
    pub end: LocalDateTime,
}

impl CalendarEvent {
    /// Creates an event with an empty description and location.
    pub fn new(
        uid: impl Into<String>,
        subject: impl Into<String>,
        start: LocalDateTime,
        end: LocalDateTime,
    ) -> Self {
        Self {
            uid: uid.into(),
            subject: subject.into(),
            description: String::new(),
            location: String::new(),
            start,
            end,
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// The filename (without extension) the calendar file is offered under.
    pub fn download_name(&self) -> &str {
        &self.subject
    }
}
