//! Daemon: socket server, request routing, shutdown.
//!
//! This crate provides the konbikol server that handles:
//! - Unix socket IPC with the application layer
//! - Routing `parse_pdf` requests to the text extractor
//! - Routing `download_event` requests to the calendar converter and the
//!   download directory
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use konbikol_server::{Router, ServerConfig, SocketServer, make_connection_handler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let router = Arc::new(Router::from_config(&config));
//!     let server = SocketServer::new(config).await?;
//!
//!     server.run(make_connection_handler(router)).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod router;
mod signals;
mod socket;

pub use config::{ServerConfig, default_download_dir, default_socket_path};
pub use error::{ServerError, ServerResult};
pub use router::{Router, make_connection_handler};
pub use signals::{ShutdownSignal, SignalHandler};
pub use socket::{Connection, RequestReader, ResponseWriter, SocketServer};
