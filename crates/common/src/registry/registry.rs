use std::path::Path;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::content_store::is_duplicate;

use super::error::{RegistryError, ValidationError};
use super::record::{sanitize_display_name, FileRecord};
use super::snapshot::{Records, Snapshot};

/// What ingest does when a file key is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Replace the record stored under the key
    #[default]
    Overwrite,
    /// Fail with [`RegistryError::KeyConflict`]
    Reject,
}

/// Result of a successful ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub key: String,
    pub display_name: String,
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub content: Bytes,
    pub display_name: String,
}

/// Key -> record map with write-through persistence.
///
/// One lock guards the map. Ingest holds it exclusively across the
///  duplicate check, the insert and the snapshot write, so two uploads
///  of the same content can never both pass the check.
#[derive(Debug)]
pub struct Registry {
    records: RwLock<Records>,
    snapshot: Snapshot,
    key_policy: KeyPolicy,
}

impl Registry {
    /// Create an empty registry backed by `snapshot`.
    ///  Nothing is read from disk; see [`Registry::load_snapshot`].
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            records: RwLock::new(Records::new()),
            snapshot,
            key_policy: KeyPolicy::default(),
        }
    }

    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Create a registry and populate it from its snapshot
    pub fn open(snapshot: Snapshot) -> Result<Self, RegistryError> {
        let registry = Self::new(snapshot);
        registry.load_snapshot()?;
        Ok(registry)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshot.path()
    }

    pub fn key_policy(&self) -> KeyPolicy {
        self.key_policy
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.read().contains_key(key)
    }

    /// Store an upload under `key`.
    ///
    /// Fails without touching the map if the bucket or key is empty, if
    ///  the bucket already holds identical content, or (under
    ///  [`KeyPolicy::Reject`]) if the key is taken. The full map is
    ///  persisted before returning; a failed write undoes the insert.
    pub fn ingest(
        &self,
        bucket: &str,
        key: &str,
        display_name: &str,
        content: impl Into<Bytes>,
    ) -> Result<Ingested, RegistryError> {
        ValidationError::check(bucket, key)?;

        let display_name = sanitize_display_name(display_name);
        let record = FileRecord::new(bucket, key, display_name.clone(), content);
        let hash = *record.content_hash();
        let size = record.size();

        let mut records = self.records.write();

        if is_duplicate(records.values(), bucket, &hash) {
            tracing::debug!(bucket, key, %hash, "rejecting duplicate content");
            return Err(RegistryError::DuplicateContent {
                bucket: bucket.to_string(),
                hash,
            });
        }

        if self.key_policy == KeyPolicy::Reject && records.contains_key(key) {
            return Err(RegistryError::KeyConflict(key.to_string()));
        }

        let previous = records.insert(key.to_string(), record);

        if let Err(e) = self.snapshot.write(&records) {
            tracing::error!(key, "failed to persist snapshot, rolling back ingest: {}", e);
            match previous {
                Some(previous) => records.insert(key.to_string(), previous),
                None => records.remove(key),
            };
            return Err(e.into());
        }

        if previous.is_some() {
            tracing::info!(bucket, key, %hash, size, "replaced file");
        } else {
            tracing::info!(bucket, key, %hash, size, "stored file");
        }

        Ok(Ingested {
            key: key.to_string(),
            display_name,
        })
    }

    /// Look up the bytes and display name stored under `key`
    pub fn fetch(&self, key: &str) -> Result<Fetched, RegistryError> {
        let records = self.records.read();
        let record = records
            .get(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;

        Ok(Fetched {
            content: record.content().clone(),
            display_name: record.display_name().to_string(),
        })
    }

    /// Replace the in-memory map with the snapshot on disk.
    ///  A missing snapshot loads as an empty map. On any other
    ///  failure the current map is left as it was.
    pub fn load_snapshot(&self) -> Result<(), RegistryError> {
        let loaded = self.snapshot.read()?;
        let mut records = self.records.write();

        match loaded {
            Some(loaded) => {
                tracing::info!(
                    path = %self.snapshot.path().display(),
                    records = loaded.len(),
                    "loaded snapshot"
                );
                *records = loaded;
            }
            None => {
                tracing::info!(
                    path = %self.snapshot.path().display(),
                    "no snapshot found, starting empty"
                );
                records.clear();
            }
        }

        Ok(())
    }

    /// Write the full in-memory map to the snapshot
    pub fn save_snapshot(&self) -> Result<(), RegistryError> {
        // write lock so concurrent ingests cannot interleave older maps
        let records = self.records.write();
        self.snapshot.write(&records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Registry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(Snapshot::new(dir.path().join("snap.json")));
        (registry, dir)
    }

    #[test]
    fn test_ingest_returns_sanitized_name() {
        let (registry, _dir) = registry();
        let ingested = registry
            .ingest("b", "k", "../../etc/passwd", b"root".to_vec())
            .unwrap();
        assert_eq!(
            ingested,
            Ingested {
                key: "k".to_string(),
                display_name: "passwd".to_string(),
            }
        );
        assert_eq!(registry.fetch("k").unwrap().display_name, "passwd");
    }

    #[test]
    fn test_ingest_persists_before_returning() {
        let (registry, _dir) = registry();
        assert!(!registry.snapshot().path().exists());
        registry.ingest("b", "k", "n", b"x".to_vec()).unwrap();
        assert!(registry.snapshot().path().exists());
    }

    #[test]
    fn test_overwrite_replaces_record() {
        let (registry, _dir) = registry();
        registry.ingest("b", "k", "old.txt", b"old".to_vec()).unwrap();
        registry.ingest("b", "k", "new.txt", b"new".to_vec()).unwrap();

        let fetched = registry.fetch("k").unwrap();
        assert_eq!(fetched.content, Bytes::from_static(b"new"));
        assert_eq!(fetched.display_name, "new.txt");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_key_same_content_is_duplicate() {
        let (registry, _dir) = registry();
        registry.ingest("b", "k", "a.txt", b"same".to_vec()).unwrap();
        let err = registry
            .ingest("b", "k", "a.txt", b"same".to_vec())
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateContent { .. }));
    }
}
