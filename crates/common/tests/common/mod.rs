//! Shared test utilities for registry integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use ::common::registry::{KeyPolicy, Registry, Snapshot};
use tempfile::TempDir;

/// Set up an empty registry whose snapshot lives in a fresh temp dir
pub fn setup_registry() -> (Registry, TempDir) {
    setup_registry_with_policy(KeyPolicy::Overwrite)
}

pub fn setup_registry_with_policy(policy: KeyPolicy) -> (Registry, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let registry = Registry::new(Snapshot::new(snapshot_path(&temp_dir))).with_key_policy(policy);
    (registry, temp_dir)
}

pub fn snapshot_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("file_metadata.json")
}

/// Every byte value, so encodings that assume text would mangle it
pub fn binary_payload() -> Vec<u8> {
    (0..=255u8).rev().chain(0..=255u8).collect()
}

/// Route registry logs to the test harness; `RUST_LOG=debug` shows them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
