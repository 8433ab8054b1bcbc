//! JSON snapshot of the full registry map.
//!
//! The file holds one object keyed by file key, each value a
//! serialized [`FileRecord`]. Records are written in key order so
//! successive snapshots diff cleanly.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::record::FileRecord;

/// Default snapshot file name inside the app directory
pub const DEFAULT_SNAPSHOT_FILE: &str = "file_metadata.json";

pub(crate) type Records = HashMap<String, FileRecord>;

/// How a snapshot replaces the previous file on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Write a temporary file next to the target, fsync it and rename it over the target
    #[default]
    Atomic,
    /// Truncate and rewrite the target in place
    Overwrite,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to move snapshot into place: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("corrupt snapshot entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Backing file for a registry
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
    mode: WriteMode,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::default(),
        }
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_mode(&self) -> WriteMode {
        self.mode
    }

    /// Directory the snapshot lives in
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Read every record from disk.
    ///  Returns `None` if the file does not exist yet.
    pub(crate) fn read(&self) -> Result<Option<Records>, SnapshotError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let records: Records =
            serde_json::from_reader(BufReader::new(file)).map_err(SnapshotError::Decode)?;

        let mut seen = HashSet::new();
        // key order, so the same entry is reported on every load
        let ordered: BTreeMap<&String, &FileRecord> = records.iter().collect();
        for (key, record) in ordered {
            if record.key() != key {
                return Err(SnapshotError::Corrupt {
                    key: key.clone(),
                    reason: format!("entry is stored under key {}", record.key()),
                });
            }
            if !record.verify() {
                return Err(SnapshotError::Corrupt {
                    key: key.clone(),
                    reason: "content does not match its hash".to_string(),
                });
            }
            if !seen.insert((record.bucket(), *record.content_hash())) {
                return Err(SnapshotError::Corrupt {
                    key: key.clone(),
                    reason: format!(
                        "content duplicates another entry in bucket {}",
                        record.bucket()
                    ),
                });
            }
        }

        Ok(Some(records))
    }

    /// Write every record to disk, replacing the previous snapshot.
    pub(crate) fn write(&self, records: &Records) -> Result<(), SnapshotError> {
        let ordered: BTreeMap<&String, &FileRecord> = records.iter().collect();
        let encoded = serde_json::to_vec(&ordered).map_err(SnapshotError::Encode)?;

        fs::create_dir_all(self.dir())?;

        match self.mode {
            WriteMode::Atomic => {
                let mut tmp = NamedTempFile::new_in(self.dir())?;
                tmp.write_all(&encoded)?;
                tmp.as_file().sync_all()?;
                tmp.persist(&self.path)?;
            }
            WriteMode::Overwrite => {
                fs::write(&self.path, &encoded)?;
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            bytes = encoded.len(),
            "snapshot written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(entries: &[(&str, &str, &[u8])]) -> Records {
        entries
            .iter()
            .map(|(bucket, key, content)| {
                (
                    key.to_string(),
                    FileRecord::new(*bucket, *key, format!("{key}.bin"), content.to_vec()),
                )
            })
            .collect()
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::new(dir.path().join("absent.json"));
        assert!(snapshot.read().unwrap().is_none());
    }

    #[test]
    fn test_write_modes_produce_same_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let data = records(&[("b", "one", b"1"), ("b", "two", &[0xff, 0x00, 0xfe])]);

        for mode in [WriteMode::Atomic, WriteMode::Overwrite] {
            let snapshot =
                Snapshot::new(dir.path().join(format!("{mode:?}.json"))).with_write_mode(mode);
            snapshot.write(&data).unwrap();
            // rewriting must replace, not append
            snapshot.write(&data).unwrap();
            assert_eq!(snapshot.read().unwrap().unwrap(), data);
        }
    }

    #[test]
    fn test_atomic_write_leaves_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::new(dir.path().join("snap.json"));
        snapshot.write(&records(&[("b", "k", b"x")])).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("snap.json")]);
    }

    #[test]
    fn test_write_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = records(&[("b", "k", b"x")]);

        for mode in [WriteMode::Atomic, WriteMode::Overwrite] {
            let path = dir.path().join(format!("{mode:?}")).join("data").join("snap.json");
            let snapshot = Snapshot::new(&path).with_write_mode(mode);
            snapshot.write(&data).unwrap();
            assert_eq!(snapshot.read().unwrap().unwrap(), data);
        }
    }

    #[test]
    fn test_relative_path_dir() {
        assert_eq!(Snapshot::new("snap.json").dir(), Path::new("."));
        assert_eq!(Snapshot::new("a/snap.json").dir(), Path::new("a"));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = Snapshot::new(&path).read().unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }

    #[test]
    fn test_misfiled_entry_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let record = FileRecord::new("b", "real-key", "n", b"x".to_vec());
        let body = serde_json::json!({ "other-key": record });
        fs::write(&path, serde_json::to_vec(&body).unwrap()).unwrap();

        let err = Snapshot::new(&path).read().unwrap_err();
        assert!(matches!(err, SnapshotError::Corrupt { ref key, .. } if key == "other-key"));
    }

    #[test]
    fn test_duplicate_content_in_bucket_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let body = serde_json::json!({
            "a": FileRecord::new("b", "a", "a.txt", b"same".to_vec()),
            "z": FileRecord::new("b", "z", "z.txt", b"same".to_vec()),
        });
        fs::write(&path, serde_json::to_vec(&body).unwrap()).unwrap();

        let err = Snapshot::new(&path).read().unwrap_err();
        assert!(matches!(err, SnapshotError::Corrupt { ref key, .. } if key == "z"));
    }

    #[test]
    fn test_same_content_across_buckets_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let data = records(&[("b1", "k1", b"same"), ("b2", "k2", b"same")]);
        Snapshot::new(&path).write(&data).unwrap();

        assert_eq!(Snapshot::new(&path).read().unwrap().unwrap(), data);
    }
}
