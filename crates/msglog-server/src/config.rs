use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server configuration. Every field has a default, so a TOML file only
/// needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Holds `messages.json` and the `attachments/` tree.
    pub data_dir: PathBuf,
    /// Largest accepted request body, attachments included.
    pub max_body_bytes: usize,
    /// Page size used when a request does not name one.
    pub default_page_size: usize,
    /// Per-subscriber push buffer.
    pub channel_capacity: usize,
    pub allow_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7070)),
            data_dir: PathBuf::from("data"),
            max_body_bytes: 100 * 1024 * 1024,
            default_page_size: 3,
            channel_capacity: 256,
            allow_cors: true,
        }
    }
}

impl ServerConfig {
    /// Defaults with a different data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("messages.json")
    }

    pub fn attachments_root(&self) -> PathBuf {
        self.data_dir.join("attachments")
    }

    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    fn check(&self) -> ServerResult<()> {
        if self.default_page_size == 0 {
            return Err(ServerError::Config("default_page_size must be positive".into()));
        }
        if self.channel_capacity == 0 {
            return Err(ServerError::Config("channel_capacity must be positive".into()));
        }
        Ok(())
    }
}
