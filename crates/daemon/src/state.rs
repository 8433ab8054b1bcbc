use std::fs;
use std::path::{Path, PathBuf};

use common::prelude::{KeyPolicy, WriteMode};
use common::registry::snapshot::DEFAULT_SNAPSHOT_FILE;
use serde::{Deserialize, Serialize};

use crate::service_config::SnapshotRecovery;

pub const APP_NAME: &str = "hashdrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Port the API listens on when neither config nor flags say otherwise
pub const DEFAULT_API_PORT: u16 = 5050;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Snapshot file, relative paths resolve against the app directory
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: PathBuf,
    /// What an upload to an already used file key does
    #[serde(default)]
    pub key_policy: KeyPolicy,
    /// How snapshots replace the previous file
    #[serde(default)]
    pub write_mode: WriteMode,
    /// What startup does with an unreadable snapshot
    #[serde(default)]
    pub snapshot_recovery: SnapshotRecovery,
    /// Largest accepted request body, in megabytes
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: usize,
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_snapshot_file() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_FILE)
}

fn default_max_upload_size_mb() -> usize {
    500
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            snapshot_file: default_snapshot_file(),
            key_policy: KeyPolicy::default(),
            write_mode: WriteMode::default(),
            snapshot_recovery: SnapshotRecovery::default(),
            max_upload_size_mb: default_max_upload_size_mb(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the app directory (~/.hashdrop)
    pub app_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Resolved path to the registry snapshot
    pub snapshot_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the app directory path (custom or default ~/.hashdrop)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new app directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;

        let config = config.unwrap_or_default();
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // the snapshot itself is written by the first upload
        let snapshot_path = snapshot_path(&app_dir, &config)?;

        Ok(Self {
            app_dir,
            config_path,
            snapshot_path,
            config,
        })
    }

    /// Load existing state from the app directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        let snapshot_path = snapshot_path(&app_dir, &config)?;

        Ok(Self {
            app_dir,
            config_path,
            snapshot_path,
            config,
        })
    }
}

/// Resolve the snapshot file against `app_dir` and make sure the
///  directory it lives in exists, so readiness holds before the first upload
fn snapshot_path(app_dir: &Path, config: &AppConfig) -> Result<PathBuf, StateError> {
    let path = app_dir.join(&config.snapshot_file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("hashdrop directory not initialized. Run 'hashdrop init' first")]
    NotInitialized,

    #[error("hashdrop directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
