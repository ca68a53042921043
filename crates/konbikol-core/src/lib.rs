//! Core types: ticket events, calendar payloads, downloads, tracing

pub mod calendar;
pub mod download;
pub mod error;
pub mod event;
pub mod time;
pub mod timezone;
pub mod tracing;

pub use calendar::{PRODUCT_ID, build_calendar, build_calendar_payload, embed_timezone};
pub use download::{
    CALENDAR_EXTENSION, CALENDAR_MIME_TYPE, DirectorySink, Download, DownloadSink, RecordingSink,
    data_uri, sanitize_file_name, trigger_download,
};
pub use error::{CalendarError, CalendarResult};
pub use event::CalendarEvent;
pub use time::LocalDateTime;
pub use timezone::{EUROPE_WARSAW, TimezoneDefinition};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
