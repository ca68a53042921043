//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use konbikol_extract::LOPDF_ENGINE;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the Unix socket.
    pub socket_path: PathBuf,

    /// How long a connection may stay silent before it is closed.
    pub connection_timeout: Duration,

    /// Maximum concurrent connections.
    pub max_connections: usize,

    /// Whether to remove stale socket on startup.
    pub cleanup_stale_socket: bool,

    /// Name of the text engine to load.
    pub engine_source: String,

    /// Where calendar files are saved.
    pub download_dir: PathBuf,

    /// Open each saved calendar file with the desktop's default handler.
    pub open_after_download: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            connection_timeout: Duration::from_secs(30),
            max_connections: 100,
            cleanup_stale_socket: true,
            engine_source: LOPDF_ENGINE.to_string(),
            download_dir: default_download_dir(),
            open_after_download: false,
        }
    }
}

impl ServerConfig {
    /// Creates a new server configuration with the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Default::default()
        }
    }

    /// Builder: set connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Builder: set cleanup stale socket.
    pub fn with_cleanup_stale_socket(mut self, cleanup: bool) -> Self {
        self.cleanup_stale_socket = cleanup;
        self
    }

    /// Builder: set the text engine name.
    pub fn with_engine_source(mut self, source: impl Into<String>) -> Self {
        self.engine_source = source.into();
        self
    }

    /// Builder: set the download directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Builder: open calendar files after saving them.
    pub fn with_open_after_download(mut self, open: bool) -> Self {
        self.open_after_download = open;
        self
    }
}

/// Returns the default socket path.
///
/// Uses `$XDG_RUNTIME_DIR/konbikol.sock` if available,
/// otherwise falls back to `/tmp/konbikol-$UID.sock`.
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("konbikol.sock")
    } else {
        #[cfg(unix)]
        let uid = unsafe { libc::getuid() };
        #[cfg(not(unix))]
        let uid = 0;
        PathBuf::from(format!("/tmp/konbikol-{}.sock", uid))
    }
}

/// Returns the user's download directory, or the system temp dir.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert!(config.socket_path.to_string_lossy().contains("konbikol"));
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert_eq!(config.max_connections, 100);
        assert!(config.cleanup_stale_socket);
        assert_eq!(config.engine_source, "lopdf");
        assert!(!config.open_after_download);
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::new("/custom/path.sock")
            .with_connection_timeout(Duration::from_secs(60))
            .with_max_connections(50)
            .with_cleanup_stale_socket(false)
            .with_engine_source("pdfium")
            .with_download_dir("/home/me/Tickets")
            .with_open_after_download(true);

        assert_eq!(config.socket_path, PathBuf::from("/custom/path.sock"));
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
        assert_eq!(config.max_connections, 50);
        assert!(!config.cleanup_stale_socket);
        assert_eq!(config.engine_source, "pdfium");
        assert_eq!(config.download_dir, PathBuf::from("/home/me/Tickets"));
        assert!(config.open_after_download);
    }

    #[test]
    fn default_socket_path_format() {
        let path = default_socket_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("konbikol"));
        assert!(path_str.ends_with(".sock"));
    }
}
