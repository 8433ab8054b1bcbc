use std::net::SocketAddr;
use std::path::PathBuf;

use common::prelude::{KeyPolicy, WriteMode};
use serde::{Deserialize, Serialize};

/// What startup does when the snapshot exists but cannot be loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotRecovery {
    /// Refuse to start
    #[default]
    Fail,
    /// Log the error and start with an empty registry.
    ///  The next upload overwrites the unreadable snapshot.
    Empty,
}

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on
    pub api_listen_addr: SocketAddr,
    /// largest accepted request body in bytes
    pub max_upload_size_bytes: usize,

    // registry configuration
    /// path to the registry snapshot file
    pub snapshot_path: PathBuf,
    pub write_mode: WriteMode,
    pub key_policy: KeyPolicy,
    pub snapshot_recovery: SnapshotRecovery,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// A config listening on `api_listen_addr` with every other
    ///  setting at its default
    pub fn new(api_listen_addr: SocketAddr, snapshot_path: PathBuf) -> Self {
        Self {
            api_listen_addr,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_BYTES,
            snapshot_path,
            write_mode: WriteMode::default(),
            key_policy: KeyPolicy::default(),
            snapshot_recovery: SnapshotRecovery::default(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}

/// Default maximum upload size in bytes (500 MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;
