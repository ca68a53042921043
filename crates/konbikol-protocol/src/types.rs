//! Messages exchanged with the application layer.

use std::path::{Path, PathBuf};

use konbikol_core::CalendarEvent;
use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// The `request_id` is chosen by the application layer and echoed unchanged
/// on every outcome, so that concurrent extractions can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// Caller-supplied correlation identifier.
    pub request_id: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope with the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    /// Creates a request envelope.
    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    /// Creates a response envelope.
    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// A user-selected file, referenced by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// Display name, echoed back in results.
    pub name: String,
    pub mime_type: String,
    pub path: PathBuf,
}

impl FileHandle {
    /// Creates a handle with an explicit name and MIME type.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            path: path.into(),
        }
    }

    /// Creates a handle named after the file, guessing the MIME type from the
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let mime_type = if is_pdf {
            "application/pdf"
        } else {
            "application/octet-stream"
        };

        Self::new(name, mime_type, path)
    }
}

/// Requests from the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Extract the text fragments of the file's first page.
    ParsePdf { file: FileHandle },

    /// Build a calendar file for the event and offer it for download.
    /// Never answered.
    DownloadEvent { event: CalendarEvent },

    /// Liveness check.
    Ping,
}

impl Request {
    /// Creates a ParsePdf request.
    pub fn parse_pdf(file: FileHandle) -> Self {
        Self::ParsePdf { file }
    }

    /// Creates a DownloadEvent request.
    pub fn download_event(event: CalendarEvent) -> Self {
        Self::DownloadEvent { event }
    }
}

/// Messages sent back to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Fragments of page 1, in engine order.
    ExtractedText {
        file_name: String,
        fragments: Vec<String>,
    },

    /// Extraction failed; `message` is the classified, user-facing text.
    ExtractionError { file_name: String, message: String },

    /// The request could not be handled at all.
    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },

    /// Pong response to Ping.
    Pong,
}

impl Response {
    /// Creates an ExtractedText response.
    pub fn extracted_text(file_name: impl Into<String>, fragments: Vec<String>) -> Self {
        Self::ExtractedText {
            file_name: file_name.into(),
            fragments,
        }
    }

    /// Creates an ExtractionError response.
    pub fn extraction_error(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtractionError {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// Creates an Error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }
}

/// Error codes for requests the server could not process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The frame did not hold a valid request envelope.
    InvalidRequest,

    /// Envelope carries a protocol version this server does not speak.
    UnsupportedVersion,
}

impl ErrorCode {
    /// Returns a human-readable description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request was invalid",
            Self::UnsupportedVersion => "Unsupported protocol version",
        }
    }
}

/// Error response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}
