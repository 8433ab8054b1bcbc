use std::sync::Arc;

use common::prelude::{Registry, RegistryError, Snapshot};

use super::service_config::{Config, SnapshotRecovery};

/// Main service state, shared by every request handler
#[derive(Clone, Debug)]
pub struct State {
    registry: Arc<Registry>,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let snapshot = Snapshot::new(&config.snapshot_path).with_write_mode(config.write_mode);
        let registry = Registry::new(snapshot).with_key_policy(config.key_policy);

        tracing::debug!(
            path = %config.snapshot_path.display(),
            "ServiceState::from_config - loading registry snapshot"
        );
        let (registry, loaded) = tokio::task::spawn_blocking(move || {
            let loaded = registry.load_snapshot();
            (registry, loaded)
        })
        .await?;

        match (loaded, config.snapshot_recovery) {
            (Ok(()), _) => {}
            (Err(e), SnapshotRecovery::Fail) => return Err(StateSetupError::Snapshot(e)),
            (Err(e), SnapshotRecovery::Empty) => {
                tracing::warn!(
                    path = %config.snapshot_path.display(),
                    "snapshot could not be loaded, starting with an empty registry: {}",
                    e
                );
            }
        }

        tracing::info!(
            snapshot = %registry.snapshot_path().display(),
            records = registry.len(),
            key_policy = ?registry.key_policy(),
            write_mode = ?config.write_mode,
            "registry ready"
        );

        Ok(Self::from_registry(registry))
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl AsRef<Registry> for State {
    fn as_ref(&self) -> &Registry {
        &self.registry
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to load registry snapshot: {0}")]
    Snapshot(#[source] RegistryError),
    #[error("snapshot loading task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn config(dir: &tempfile::TempDir) -> Config {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        Config::new(addr, dir.path().join("snap.json"))
    }

    #[tokio::test]
    async fn test_from_config_without_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = State::from_config(&config(&dir)).await.unwrap();
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_recovery_policy() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config(&dir);
        std::fs::write(&config.snapshot_path, b"garbage").unwrap();

        let err = State::from_config(&config).await.unwrap_err();
        assert!(matches!(err, StateSetupError::Snapshot(_)));

        config.snapshot_recovery = SnapshotRecovery::Empty;
        let state = State::from_config(&config).await.unwrap();
        assert!(state.registry().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_loads_records() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = config(&dir);
        let registry = Registry::new(Snapshot::new(&config.snapshot_path));
        registry.ingest("b", "k", "a.txt", b"hello".to_vec()).unwrap();

        let state = State::from_config(&config).await.unwrap();
        assert_eq!(state.registry().fetch("k").unwrap().display_name, "a.txt");
    }
}
