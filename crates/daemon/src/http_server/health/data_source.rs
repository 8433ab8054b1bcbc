use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;
use serde::Serialize;

use common::prelude::Registry;

use crate::ServiceState;

/// What a ready service reports about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub records: usize,
}

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<Readiness, DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("snapshot directory is not available")]
    DependencyFailure,
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready while the directory the snapshot is written to exists
struct RegistrySource {
    registry: Arc<Registry>,
}

#[async_trait]
impl DataSource for RegistrySource {
    async fn is_ready(&self) -> Result<Readiness, DataSourceError> {
        let dir = self.registry.snapshot().dir();
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(Readiness {
                records: self.registry.len(),
            }),
            _ => Err(DataSourceError::DependencyFailure),
        }
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(RegistrySource {
            registry: state.registry().clone(),
        })))
    }
}
