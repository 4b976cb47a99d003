use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use jotter_store::{PersistPolicy, StoreOptions};

use crate::error::{ServerError, ServerResult};

/// Server settings. Every field has a default, so a TOML file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Where the full-state JSON snapshot is written.
    pub snapshot_path: PathBuf,
    /// Append-only log file that mirrors stdout.
    pub log_file: PathBuf,
    pub persistence: PersistPolicy,
    /// Delete a post's comments along with the post.
    pub cascade_post_delete: bool,
    /// Load the snapshot file into memory before serving.
    pub restore_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 7070)),
            snapshot_path: PathBuf::from("DB/db.json"),
            log_file: PathBuf::from("server.log"),
            persistence: PersistPolicy::BestEffort,
            cascade_post_delete: false,
            restore_on_start: false,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            policy: self.persistence,
            cascade_post_delete: self.cascade_post_delete,
        }
    }
}
