//! Routes application messages to the extraction pipeline and the calendar
//! converter.
//!
//! Every answer carries the `request_id` of the request it answers. Requests
//! on one connection are handled concurrently and answered as they finish,
//! so answers may arrive in a different order than the requests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Span, debug, info, warn};

use konbikol_core::{CalendarEvent, DirectorySink, DownloadSink, build_calendar_payload, trigger_download};
use konbikol_extract::Extractor;
use konbikol_protocol::{Envelope, ErrorCode, FileHandle, PROTOCOL_VERSION, Request, Response};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::socket::Connection;

/// Answers waiting to be written, per connection.
const RESPONSE_QUEUE: usize = 32;

/// Dispatches requests from the application layer.
pub struct Router {
    extractor: Extractor,
    sink: Arc<dyn DownloadSink>,
}

impl Router {
    pub fn new(extractor: Extractor, sink: Arc<dyn DownloadSink>) -> Self {
        Self { extractor, sink }
    }

    /// Builds the extractor and download directory from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let sink = DirectorySink::new(&config.download_dir)
            .with_open_after(config.open_after_download);
        Self::new(Extractor::for_engine(&config.engine_source), Arc::new(sink))
    }

    /// Starts loading the text engine without waiting for a request.
    pub fn preload(&self) {
        self.extractor.loader().preload();
    }

    /// Handles one envelope. `None` means the request is not answered.
    pub async fn handle(&self, envelope: Envelope<Request>) -> Option<Envelope<Response>> {
        let Envelope {
            protocol_version,
            request_id,
            payload,
        } = envelope;

        if protocol_version != PROTOCOL_VERSION {
            return Some(Envelope::response(
                request_id,
                Response::error(
                    ErrorCode::UnsupportedVersion,
                    format!("expected {PROTOCOL_VERSION}, got {protocol_version}"),
                ),
            ));
        }

        self.dispatch(&request_id, payload)
            .await
            .map(|response| Envelope::response(request_id, response))
    }

    #[tracing::instrument(skip(self, request), fields(request_type, duration_ms))]
    async fn dispatch(&self, request_id: &str, request: Request) -> Option<Response> {
        let start = std::time::Instant::now();
        let span = Span::current();

        let response = match request {
            Request::ParsePdf { file } => {
                span.record("request_type", "parse_pdf");
                Some(self.parse_pdf(file).await)
            }
            Request::DownloadEvent { event } => {
                span.record("request_type", "download_event");
                self.download_event(event).await;
                None
            }
            Request::Ping => {
                span.record("request_type", "ping");
                Some(Response::Pong)
            }
        };

        let duration = start.elapsed();
        if tracing::enabled!(tracing::Level::DEBUG) {
            span.record("duration_ms", duration.as_millis());
            debug!(duration_ms = duration.as_millis(), "Request handled");
        }

        response
    }

    async fn parse_pdf(&self, file: FileHandle) -> Response {
        debug!(file = %file.name, mime_type = %file.mime_type, "Extracting text");

        match self.extractor.extract_text(&file.path).await {
            Ok(fragments) => {
                info!(file = %file.name, fragments = fragments.len(), "Extracted text");
                Response::extracted_text(file.name, fragments)
            }
            Err(e) => {
                warn!(file = %file.name, kind = %e.kind(), error = %e, "Extraction failed");
                Response::extraction_error(file.name, e.user_message())
            }
        }
    }

    async fn download_event(&self, event: CalendarEvent) {
        let payload = match build_calendar_payload(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(uid = %event.uid, error = %e, "Could not build calendar file");
                return;
            }
        };

        let sink = Arc::clone(&self.sink);
        let file_name = event.download_name().to_string();
        let offered =
            tokio::task::spawn_blocking(move || trigger_download(sink.as_ref(), payload, &file_name))
                .await;
        if let Err(e) = offered {
            warn!(uid = %event.uid, error = %e, "Download task failed");
        }
    }

    /// Serves a connection until the peer closes it or goes quiet.
    ///
    /// Each request runs on its own task; answers are funnelled through one
    /// writer so frames never interleave.
    pub async fn handle_connection(self: Arc<Self>, conn: Connection) -> ServerResult<()> {
        let (mut requests, mut responses) = conn.into_split();
        let (tx, mut rx) = mpsc::channel::<Envelope<Response>>(RESPONSE_QUEUE);

        let writer = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                if let Err(e) = responses.write_response(&envelope).await {
                    warn!(request_id = %envelope.request_id, error = %e, "Failed to write response");
                    break;
                }
            }
        });

        let result = loop {
            match requests.read_request().await {
                Ok(Some(envelope)) => {
                    let router = Arc::clone(&self);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(reply) = router.handle(envelope).await {
                            let _ = tx.send(reply).await;
                        }
                    });
                }
                Ok(None) => {
                    debug!("Client disconnected");
                    break Ok(());
                }
                Err(e) if e.is_malformed_request() => {
                    warn!(error = %e, "Malformed request");
                    // The request id is inside the undecodable payload.
                    let reply = Envelope::response(
                        "",
                        Response::error(ErrorCode::InvalidRequest, e.to_string()),
                    );
                    if tx.send(reply).await.is_err() {
                        break Ok(());
                    }
                }
                Err(e) if e.is_timeout() => {
                    debug!("Connection idle, closing");
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };

        // Pending answers still hold senders; the writer drains them first.
        drop(tx);
        if let Err(e) = writer.await {
            warn!(error = %e, "Response writer failed");
        }
        result
    }
}

/// Creates a connection handler for [`SocketServer::run`](crate::SocketServer::run).
pub fn make_connection_handler(
    router: Arc<Router>,
) -> impl Fn(Connection) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
    move |conn| {
        let router = Arc::clone(&router);
        Box::pin(async move {
            if let Err(e) = router.handle_connection(conn).await {
                warn!(error = %e, "Connection handler error");
            }
        })
    }
}
