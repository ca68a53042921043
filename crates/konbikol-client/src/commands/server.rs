//! `konbikol server` - runs the server in the foreground.
//!
//! Startup order: signal handler, socket, engine preload, accept loop. Runs
//! until SIGTERM/SIGINT.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use konbikol_server::{
    Router, ServerConfig, SignalHandler, SocketServer, default_socket_path,
    make_connection_handler,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Command-line overrides for the server.
#[derive(Debug, Default)]
pub struct ServerOverrides {
    pub socket_path: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub open: bool,
    pub engine: Option<String>,
}

/// Merges file settings and command-line overrides.
pub fn server_config(config: &ClientConfig, overrides: ServerOverrides) -> ServerConfig {
    let socket_path = overrides
        .socket_path
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(default_socket_path);

    let mut server_config = ServerConfig::new(socket_path)
        .with_open_after_download(overrides.open || config.download.open);

    if let Some(dir) = overrides
        .download_dir
        .or_else(|| config.download.resolved_directory())
    {
        server_config = server_config.with_download_dir(dir);
    }
    if let Some(engine) = overrides.engine.or_else(|| config.server.engine.clone()) {
        server_config = server_config.with_engine_source(engine);
    }
    server_config
}

/// Starts the server and blocks until a shutdown signal arrives.
pub async fn run(server_config: ServerConfig) -> ClientResult<()> {
    let signal_handler = SignalHandler::new();
    signal_handler
        .spawn_listener()
        .map_err(|e| ClientError::Daemon(format!("failed to install signal handlers: {}", e)))?;

    let router = Arc::new(Router::from_config(&server_config));
    let download_dir = server_config.download_dir.clone();
    let server = SocketServer::new(server_config).await?;

    router.preload();
    info!(
        path = %server.socket_path().display(),
        download_dir = %download_dir.display(),
        "Server listening"
    );

    server
        .run_until_shutdown(make_connection_handler(router), signal_handler.shutdown().wait())
        .await?;

    info!("Server stopped");
    Ok(())
}
