//! Unix socket listener for IPC.
//!
//! This module provides an async Unix socket server that handles
//! application connections using the konbikol protocol.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use konbikol_protocol::{
    Envelope, PROTOCOL_VERSION, ProtocolError, Request, Response, read_frame, write_frame,
};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Unix socket server for handling application connections.
pub struct SocketServer {
    config: ServerConfig,
    listener: UnixListener,
    /// Limits concurrent connections.
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds to the socket path in `config`.
    ///
    /// If `cleanup_stale_socket` is true, a leftover socket file that nobody
    /// is listening on is removed before binding.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let socket_path = &config.socket_path;

        if let Some(parent) = socket_path.parent()
            && !parent.exists()
        {
            return Err(ServerError::socket_path_invalid(
                parent.to_string_lossy().to_string(),
            ));
        }

        if config.cleanup_stale_socket && socket_path.exists() {
            match UnixStream::connect(socket_path).await {
                Ok(_) => {
                    return Err(ServerError::socket_in_use(
                        socket_path.to_string_lossy().to_string(),
                    ));
                }
                Err(_) => {
                    info!(path = %socket_path.display(), "Removing stale socket");
                    std::fs::remove_file(socket_path)?;
                }
            }
        } else if socket_path.exists() {
            return Err(ServerError::socket_in_use(
                socket_path.to_string_lossy().to_string(),
            ));
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(path = %socket_path.display(), "Socket server listening");

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Accepts a single connection, waiting for a free slot first.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = Arc::clone(&self.connection_semaphore)
            .acquire_owned()
            .await
            .map_err(|_| ServerError::Closed)?;

        let (stream, _addr) = self.listener.accept().await?;
        debug!("Accepted new connection");

        Ok(Connection::new(stream, self.config.connection_timeout, permit))
    }

    /// Runs the accept loop, spawning `handler` for each connection.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler(connection));
                }
                Err(ServerError::Closed) => return Err(ServerError::Closed),
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(
                    path = %self.config.socket_path.display(),
                    error = %e,
                    "Failed to remove socket file"
                );
            } else {
                debug!(path = %self.config.socket_path.display(), "Removed socket file");
            }
        }
    }
}

/// An accepted application connection.
pub struct Connection {
    requests: RequestReader,
    responses: ResponseWriter,
}

impl Connection {
    fn new(stream: UnixStream, timeout: Duration, permit: OwnedSemaphorePermit) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            requests: RequestReader {
                reader,
                timeout,
                _permit: permit,
            },
            responses: ResponseWriter { writer, timeout },
        }
    }

    /// Reads the next request envelope.
    ///
    /// Returns `Ok(None)` if the connection was closed cleanly.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        self.requests.read_request().await
    }

    /// Writes a response envelope.
    pub async fn write_response(&mut self, envelope: &Envelope<Response>) -> ServerResult<()> {
        self.responses.write_response(envelope).await
    }

    /// Separates the read and write sides so requests can be read while
    /// earlier ones are still being answered.
    pub fn into_split(self) -> (RequestReader, ResponseWriter) {
        (self.requests, self.responses)
    }
}

/// Read side of a [`Connection`]. Holds the connection slot.
pub struct RequestReader {
    reader: OwnedReadHalf,
    timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl RequestReader {
    /// Reads the next request envelope.
    ///
    /// Returns `Ok(None)` if the connection was closed cleanly.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        let envelope: Option<Envelope<Request>> =
            match tokio::time::timeout(self.timeout, read_frame(&mut self.reader)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ServerError::Protocol(ProtocolError::Timeout {
                        operation: "read request".to_string(),
                    }));
                }
            };

        if let Some(ref envelope) = envelope
            && !envelope.is_compatible()
        {
            warn!(
                version = %envelope.protocol_version,
                expected = %PROTOCOL_VERSION,
                "Incompatible protocol version"
            );
        }

        Ok(envelope)
    }
}

/// Write side of a [`Connection`].
pub struct ResponseWriter {
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl ResponseWriter {
    /// Writes a response envelope.
    pub async fn write_response(&mut self, envelope: &Envelope<Response>) -> ServerResult<()> {
        match tokio::time::timeout(self.timeout, write_frame(&mut self.writer, envelope)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServerError::Protocol(ProtocolError::Timeout {
                operation: "write response".to_string(),
            })),
        }
    }
}
