//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/konbikol/config.toml` by default:
//!
//! ```toml
//! [server]
//! socket_path = "/run/user/1000/konbikol.sock"
//! timeout = 5
//! engine = "lopdf"
//!
//! [download]
//! directory = "~/Tickets"
//! open = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the konbikol client and the server it starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Server/connection settings.
    pub server: ServerSettings,

    /// Where calendar files go.
    pub download: DownloadSettings,
}

/// Server/connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Path to the server socket.
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds.
    pub timeout: u64,

    /// Text engine the server loads.
    pub engine: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout: 5,
            engine: None,
        }
    }
}

/// Download settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory calendar files are saved to. Defaults to the user's
    /// download directory. A leading `~/` is expanded.
    pub directory: Option<PathBuf>,

    /// Open each saved file with the default calendar application.
    pub open: bool,
}

impl DownloadSettings {
    /// The configured directory with `~/` expanded.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory.as_deref().map(expand_home)
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("konbikol")
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.server.timeout, 5);
        assert!(!config.download.open);
    }

    #[test]
    fn full_file() {
        let config: ClientConfig = toml::from_str(
            r#"
            debug = true

            [server]
            socket_path = "/run/user/1000/konbikol.sock"
            timeout = 10
            engine = "lopdf"

            [download]
            directory = "/srv/tickets"
            open = true
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(
            config.server.socket_path,
            Some(PathBuf::from("/run/user/1000/konbikol.sock"))
        );
        assert_eq!(config.server.timeout, 10);
        assert_eq!(config.server.engine.as_deref(), Some("lopdf"));
        assert_eq!(
            config.download.resolved_directory(),
            Some(PathBuf::from("/srv/tickets"))
        );
        assert!(config.download.open);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let result: Result<ClientConfig, _> = toml::from_str("[server]\ntimeout = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[download]\nopen = true\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert!(config.download.open);
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.starts_with("failed to read config"));
    }

    #[test]
    fn tilde_is_expanded() {
        let settings = DownloadSettings {
            directory: Some(PathBuf::from("~/Tickets")),
            open: false,
        };
        let resolved = settings.resolved_directory().unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolved, home.join("Tickets"));
        }
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        let path = ClientConfig::default_path();
        assert!(path.ends_with("konbikol/config.toml"));
    }

    #[test]
    fn dump_round_trips_through_toml() {
        let config = ClientConfig {
            download: DownloadSettings {
                directory: Some(PathBuf::from("/srv/tickets")),
                open: true,
            },
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
