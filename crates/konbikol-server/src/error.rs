//! Server error types.

use std::io;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error (framing, encoding, etc.).
    #[error("Protocol error: {0}")]
    Protocol(#[from] konbikol_protocol::ProtocolError),

    /// Socket path already in use.
    #[error("Socket path already in use: {path}")]
    SocketInUse { path: String },

    /// Socket path parent directory does not exist.
    #[error("Socket path parent directory does not exist: {path}")]
    SocketPathInvalid { path: String },

    /// The connection limiter was closed.
    #[error("Server is no longer accepting connections")]
    Closed,
}

impl ServerError {
    /// Creates a socket in use error.
    pub fn socket_in_use(path: impl Into<String>) -> Self {
        Self::SocketInUse { path: path.into() }
    }

    /// Creates a socket path invalid error.
    pub fn socket_path_invalid(path: impl Into<String>) -> Self {
        Self::SocketPathInvalid { path: path.into() }
    }

    /// Whether a whole frame arrived but did not decode as a request. The
    /// stream is still aligned on the next frame.
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            Self::Protocol(konbikol_protocol::ProtocolError::Serialization(_))
        )
    }

    /// Whether this error only means the peer went quiet.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Protocol(konbikol_protocol::ProtocolError::Timeout { .. })
        )
    }
}
