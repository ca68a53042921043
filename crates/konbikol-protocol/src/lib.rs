//! Message boundary between konbikol and the application layer.
//!
//! The application layer sends requests to extract a ticket's text or to
//! download an event as a calendar file; extraction outcomes come back
//! tagged with the caller's request identifier.
//!
//! # Framing
//!
//! Messages are sent as length-prefixed JSON:
//! - 4 bytes: message length (u32, big-endian)
//! - N bytes: JSON payload
//!
//! # Envelope Structure
//!
//! Every message is wrapped in an [`Envelope`] containing:
//! - `protocol_version`: Always "1" for this version
//! - `request_id`: opaque caller identifier, echoed on every outcome
//! - `payload`: The actual request or response
//!
//! # Example
//!
//! ```rust
//! use konbikol_protocol::{Envelope, FileHandle, Request, encode_message, decode_message};
//!
//! let request = Envelope::request("0", Request::parse_pdf(FileHandle::from_path("ticket.pdf")));
//! let bytes = encode_message(&request).unwrap();
//! let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! ```

mod error;
mod framing;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_message, encode_message, read_frame, write_frame};
pub use types::{Envelope, ErrorCode, ErrorResponse, FileHandle, Request, Response};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
