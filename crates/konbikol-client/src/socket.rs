//! Unix socket client for talking to the konbikol server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;
use tracing::{debug, warn};
use uuid::Uuid;

use konbikol_protocol::{Envelope, Request, Response, read_frame, write_frame};

use crate::error::{ClientError, ClientResult};

/// Client for the konbikol server's Unix socket.
pub struct SocketClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    /// Creates a new socket client.
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    /// Creates a socket client with the default socket path.
    pub fn with_defaults() -> Self {
        Self::new(konbikol_server::default_socket_path(), Duration::from_secs(5))
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Checks if the server socket exists.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends a request under a fresh request id and waits for the answer.
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        self.send_with_id(Uuid::new_v4().to_string(), request).await
    }

    /// Sends a request under `request_id` and waits for the answer.
    pub async fn send_with_id(
        &self,
        request_id: impl Into<String>,
        request: Request,
    ) -> ClientResult<Response> {
        let request_id = request_id.into();
        let envelope = Envelope::request(&request_id, request);

        let mut stream = self.connect(&request_id).await?;
        self.write(&mut stream, &envelope).await?;
        debug!("request sent, waiting for response");

        let response: Envelope<Response> =
            tokio::time::timeout(self.timeout, read_frame(&mut stream))
                .await
                .map_err(|_| ClientError::Timeout("reading response".into()))??
                .ok_or_else(|| {
                    ClientError::Connection("server closed the connection without answering".into())
                })?;

        debug!(request_id = %response.request_id, "response received");
        if response.request_id != request_id {
            warn!(
                expected = %request_id,
                received = %response.request_id,
                "response request_id mismatch"
            );
        }

        Ok(response.payload)
    }

    /// Sends a request the server never answers, such as a download.
    pub async fn notify(&self, request: Request) -> ClientResult<()> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(&request_id, request);

        let mut stream = self.connect(&request_id).await?;
        self.write(&mut stream, &envelope).await
    }

    /// Pings the server to check if it's alive.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }

    async fn connect(&self, request_id: &str) -> ClientResult<UnixStream> {
        debug!(
            socket = %self.socket_path.display(),
            request_id = %request_id,
            "connecting to server"
        );

        tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| {
                ClientError::Connection(format!(
                    "connection timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                ClientError::Connection(format!(
                    "failed to connect to {}: {}",
                    self.socket_path.display(),
                    e
                ))
            })
    }

    async fn write(&self, stream: &mut UnixStream, envelope: &Envelope<Request>) -> ClientResult<()> {
        tokio::time::timeout(self.timeout, write_frame(stream, envelope))
            .await
            .map_err(|_| ClientError::Timeout("sending request".into()))??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use konbikol_core::{CalendarEvent, LocalDateTime, RecordingSink};
    use konbikol_extract::{Extractor, LOPDF_ENGINE};
    use konbikol_protocol::FileHandle;
    use konbikol_server::{Router, ServerConfig, SocketServer, make_connection_handler};

    async fn start_server(dir: &Path, sink: Arc<RecordingSink>) -> PathBuf {
        let socket_path = dir.join("konbikol.sock");
        let server = SocketServer::new(ServerConfig::new(&socket_path))
            .await
            .unwrap();
        let router = Arc::new(Router::new(Extractor::for_engine(LOPDF_ENGINE), sink));

        tokio::spawn(async move {
            let _ = server.run(make_connection_handler(router)).await;
        });
        socket_path
    }

    #[test]
    fn socket_client_creation() {
        let client = SocketClient::new("/tmp/test.sock", Duration::from_secs(10));
        assert_eq!(client.socket_path(), Path::new("/tmp/test.sock"));
        assert!(!client.socket_exists());
    }

    #[test]
    fn default_client() {
        let client = SocketClient::with_defaults();
        assert!(client.socket_path().to_string_lossy().contains("konbikol"));
    }

    #[tokio::test]
    async fn missing_server_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = SocketClient::new(dir.path().join("none.sock"), Duration::from_secs(1));

        assert!(!client.ping().await);
        assert!(matches!(
            client.send(Request::Ping).await,
            Err(ClientError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn talks_to_a_running_server() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let socket_path = start_server(dir.path(), Arc::clone(&sink)).await;
        let client = SocketClient::new(&socket_path, Duration::from_secs(5));

        assert!(client.ping().await);

        let response = client
            .send_with_id(
                "ticket-1",
                Request::parse_pdf(FileHandle::from_path(dir.path().join("missing.pdf"))),
            )
            .await
            .unwrap();
        assert!(matches!(response, Response::ExtractionError { ref file_name, .. } if file_name == "missing.pdf"));

        let event = CalendarEvent::new(
            "abc",
            "Flight AB123",
            LocalDateTime::new(2024, 5, 1, 10, 0),
            LocalDateTime::new(2024, 5, 1, 12, 30),
        );
        client.notify(Request::download_event(event)).await.unwrap();

        // The download has no answer; poll until the sink has it.
        for _ in 0..100 {
            if !sink.downloads().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let downloads = sink.downloads();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].file_name, "Flight AB123.ics");
    }
}
