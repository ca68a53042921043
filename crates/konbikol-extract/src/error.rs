//! Extraction errors and their user-facing classification.
//!
//! Engine failures are modelled the way the engine reports them: a `name`
//! (the exception type) and an optional `message`. Every failure is turned
//! into exactly one of three message shapes by [`classify_message`]:
//!
//! | failure                          | surfaced message        |
//! |----------------------------------|-------------------------|
//! | name `InvalidPDFException`       | `Not a valid PDF file`  |
//! | name `N`, non-empty message `M`  | `N (M)`                 |
//! | name `N`, no message             | `N`                     |

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Engine exception name for input that is not a well-formed PDF.
pub const INVALID_PDF_EXCEPTION: &str = "InvalidPDFException";

/// Message surfaced for [`ExtractError::InvalidDocument`].
pub const INVALID_DOCUMENT_MESSAGE: &str = "Not a valid PDF file";

/// Exception name surfaced when the file cannot be read.
pub const READ_ERROR_NAME: &str = "NotReadableError";

/// Exception name surfaced when the engine failed to load.
pub const LOAD_ERROR_NAME: &str = "LoadError";

/// The stage-level category of an extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractErrorKind {
    /// The file could not be read into memory.
    ReadError,
    /// The engine rejected the input as malformed.
    InvalidDocument,
    /// Any other engine-side failure.
    EngineError,
    /// The engine failed to load; terminal for the loader.
    LoadError,
}

impl ExtractErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadError => "read_error",
            Self::InvalidDocument => "invalid_document",
            Self::EngineError => "engine_error",
            Self::LoadError => "load_error",
        }
    }
}

impl fmt::Display for ExtractErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the text engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct EngineFailure {
    /// Exception type, e.g. `InvalidPDFException` or `FormatError`.
    pub name: String,
    /// Descriptive message, when the engine provides one.
    pub message: Option<String>,
}

impl EngineFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: Some(message.into()),
        }
    }

    /// A failure that carries only its name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: None,
        }
    }

    /// The input is not a well-formed PDF.
    pub fn invalid_pdf(message: impl Into<String>) -> Self {
        Self::new(INVALID_PDF_EXCEPTION, message)
    }

    pub fn is_invalid_pdf(&self) -> bool {
        self.name == INVALID_PDF_EXCEPTION
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => write!(f, "{}: {}", self.name, message),
            _ => f.write_str(&self.name),
        }
    }
}

/// The engine could not be loaded. Shared by every caller of the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load text engine from {origin}: {reason}")]
pub struct LoadError {
    /// The requested engine source.
    pub origin: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while extracting text from a file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("not a valid document: {0}")]
    InvalidDocument(EngineFailure),

    #[error("engine error: {0}")]
    Engine(EngineFailure),
}

impl ExtractError {
    /// Classifies a failure of the document-open stage.
    pub fn from_open(failure: EngineFailure) -> Self {
        if failure.is_invalid_pdf() {
            Self::InvalidDocument(failure)
        } else {
            Self::Engine(failure)
        }
    }

    pub fn kind(&self) -> ExtractErrorKind {
        match self {
            Self::Read { .. } => ExtractErrorKind::ReadError,
            Self::Load(_) => ExtractErrorKind::LoadError,
            Self::InvalidDocument(_) => ExtractErrorKind::InvalidDocument,
            Self::Engine(_) => ExtractErrorKind::EngineError,
        }
    }

    /// The exception name surfaced to the user.
    pub fn name(&self) -> &str {
        match self {
            Self::Read { .. } => READ_ERROR_NAME,
            Self::Load(_) => LOAD_ERROR_NAME,
            Self::InvalidDocument(failure) | Self::Engine(failure) => &failure.name,
        }
    }

    /// The descriptive message, if any. A load failure's detail is the
    /// requested source.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Read { source, .. } => Some(source.to_string()),
            Self::Load(err) => Some(err.origin.clone()),
            Self::InvalidDocument(failure) | Self::Engine(failure) => failure.message.clone(),
        }
    }

    /// The classified, user-facing message.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidDocument(_) => INVALID_DOCUMENT_MESSAGE.to_string(),
            _ => classify_message(self.name(), self.detail().as_deref()),
        }
    }
}

/// Maps an engine-style `(name, message)` pair to the user-facing text.
pub fn classify_message(name: &str, message: Option<&str>) -> String {
    if name == INVALID_PDF_EXCEPTION {
        return INVALID_DOCUMENT_MESSAGE.to_string();
    }
    match message {
        Some(message) if !message.is_empty() => format!("{name} ({message})"),
        _ => name.to_string(),
    }
}

/// A specialized Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
