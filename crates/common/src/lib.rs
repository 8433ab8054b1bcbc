/**
 * Content fingerprinting and per-bucket
 *  duplicate detection.
 */
pub mod content_store;
/**
 * The authoritative key -> file record map.
 * Owns ingestion, retrieval and persistence
 *  of the map to a snapshot file on disk.
 */
pub mod registry;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::build_info;
    pub use crate::content_store::{fingerprint, is_duplicate, ContentHash, ContentHashError};
    pub use crate::registry::{
        sanitize_display_name, Fetched, FileRecord, Ingested, KeyPolicy, Registry,
        RegistryError, Snapshot, SnapshotError, ValidationError, WriteMode,
    };
    pub use crate::version::BuildInfo;
}
