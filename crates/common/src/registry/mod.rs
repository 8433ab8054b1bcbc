//! File registry
//!
//! The registry is the single owner of the key -> [`FileRecord`] map:
//!
//! - **[`FileRecord`]**: one stored upload (bucket, key, display name, hash, bytes)
//! - **[`Registry`]**: ingest / fetch entry points guarded by one lock
//! - **[`Snapshot`]**: the backing JSON file the whole map is written to
//!
//! # Duplicate scope
//!
//! Keys are unique across the whole registry, but content is only
//! deduplicated within a bucket: the same bytes may be stored once per
//! bucket. See [`crate::content_store::is_duplicate`].
//!
//! # Durability
//!
//! Every successful [`Registry::ingest`] has written the full map to the
//! snapshot before it returns. If that write fails the in-memory insert is
//! rolled back, so the map never holds a record the snapshot does not.

mod error;
mod record;
#[allow(clippy::module_inception)]
mod registry;
pub mod snapshot;

pub use error::{RegistryError, ValidationError};
pub use record::{sanitize_display_name, FileRecord, UNNAMED_FILE};
pub use registry::{Fetched, Ingested, KeyPolicy, Registry};
pub use snapshot::{Snapshot, SnapshotError, WriteMode};
