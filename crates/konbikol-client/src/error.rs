//! Client error types.

use std::fmt;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// Connection to server failed.
    Connection(String),
    /// Protocol/framing error.
    Protocol(String),
    /// Request timed out.
    Timeout(String),
    /// The event could not be turned into a calendar file.
    Calendar(konbikol_core::CalendarError),
    /// The server could not extract text; carries the classified message.
    Extraction(String),
    /// The server rejected the request.
    Server(String),
    /// The server could not be started or stopped unexpectedly.
    Daemon(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::Calendar(err) => write!(f, "calendar error: {}", err),
            Self::Extraction(msg) => f.write_str(msg),
            Self::Server(msg) => write!(f, "server error: {}", msg),
            Self::Daemon(msg) => write!(f, "server failed: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<konbikol_core::CalendarError> for ClientError {
    fn from(err: konbikol_core::CalendarError) -> Self {
        Self::Calendar(err)
    }
}

impl From<konbikol_protocol::ProtocolError> for ClientError {
    fn from(err: konbikol_protocol::ProtocolError) -> Self {
        match err {
            konbikol_protocol::ProtocolError::Io(e) => Self::Io(e),
            other => Self::Protocol(other.to_string()),
        }
    }
}

impl From<konbikol_server::ServerError> for ClientError {
    fn from(err: konbikol_server::ServerError) -> Self {
        Self::Daemon(err.to_string())
    }
}
