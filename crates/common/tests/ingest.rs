//! Integration tests for ingest / fetch behavior

mod common;

use ::common::prelude::*;
use bytes::Bytes;

#[test]
fn test_ingest_fetch_round_trip() {
    let (registry, _temp) = common::setup_registry();
    let payload = common::binary_payload();

    let ingested = registry
        .ingest("bucket", "key-1", "report.bin", payload.clone())
        .unwrap();
    assert_eq!(ingested.key, "key-1");
    assert_eq!(ingested.display_name, "report.bin");

    let fetched = registry.fetch("key-1").unwrap();
    assert_eq!(fetched.content, Bytes::from(payload));
    assert_eq!(fetched.display_name, "report.bin");
}

#[test]
fn test_duplicate_content_scoped_to_bucket() {
    let (registry, _temp) = common::setup_registry();

    registry
        .ingest("photos", "first", "cat.jpg", b"meow".to_vec())
        .unwrap();

    let err = registry
        .ingest("photos", "second", "cat-copy.jpg", b"meow".to_vec())
        .unwrap_err();
    match err {
        RegistryError::DuplicateContent { bucket, hash } => {
            assert_eq!(bucket, "photos");
            assert_eq!(hash, fingerprint(b"meow"));
        }
        other => panic!("expected duplicate content, got {other:?}"),
    }
    assert!(!registry.contains_key("second"));

    // same bytes in another bucket are fine
    registry
        .ingest("archive", "third", "cat.jpg", b"meow".to_vec())
        .unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_validation_rejects_empty_fields() {
    let (registry, _temp) = common::setup_registry();

    let err = registry.ingest("", "k", "n", b"data".to_vec()).unwrap_err();
    assert!(
        matches!(err, RegistryError::Validation(ref v) if v.missing == vec!["bucket_id"])
    );

    let err = registry.ingest("b", "", "n", b"data".to_vec()).unwrap_err();
    assert!(matches!(err, RegistryError::Validation(ref v) if v.missing == vec!["file_key"]));

    assert!(registry.is_empty());
    assert!(!registry.snapshot().path().exists());
}

#[test]
fn test_display_name_is_sanitized() {
    let (registry, _temp) = common::setup_registry();

    let ingested = registry
        .ingest("b", "k", "../../etc/passwd", b"x".to_vec())
        .unwrap();
    assert_eq!(ingested.display_name, "passwd");
    assert_eq!(registry.fetch("k").unwrap().display_name, "passwd");
}

#[test]
fn test_fetch_unknown_key() {
    let (registry, _temp) = common::setup_registry();
    let err = registry.fetch("missing").unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref key) if key == "missing"));
}

#[test]
fn test_key_reuse_overwrites_by_default() {
    let (registry, _temp) = common::setup_registry();

    registry.ingest("a", "shared", "one.txt", b"1".to_vec()).unwrap();
    registry.ingest("b", "shared", "two.txt", b"2".to_vec()).unwrap();

    let fetched = registry.fetch("shared").unwrap();
    assert_eq!(fetched.content, Bytes::from_static(b"2"));
    assert_eq!(fetched.display_name, "two.txt");
    assert_eq!(registry.len(), 1);

    // the replaced record no longer blocks its content in bucket a
    registry.ingest("a", "other", "one.txt", b"1".to_vec()).unwrap();
}

#[test]
fn test_key_reuse_rejected_under_reject_policy() {
    let (registry, _temp) = common::setup_registry_with_policy(KeyPolicy::Reject);

    registry.ingest("a", "shared", "one.txt", b"1".to_vec()).unwrap();
    let err = registry
        .ingest("b", "shared", "two.txt", b"2".to_vec())
        .unwrap_err();
    assert!(matches!(err, RegistryError::KeyConflict(ref key) if key == "shared"));

    let fetched = registry.fetch("shared").unwrap();
    assert_eq!(fetched.display_name, "one.txt");
}

#[test]
fn test_persistence_failure_rolls_back() {
    let (registry, temp) = common::setup_registry();
    registry.ingest("b", "kept", "kept.txt", b"kept".to_vec()).unwrap();

    // a directory at the snapshot path makes every write fail
    let path = common::snapshot_path(&temp);
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = registry
        .ingest("b", "lost", "lost.txt", b"lost".to_vec())
        .unwrap_err();
    assert!(matches!(err, RegistryError::Persistence(_)));
    assert!(!registry.contains_key("lost"));

    // an overwrite that fails to persist restores the old record
    let err = registry
        .ingest("b", "kept", "new.txt", b"new".to_vec())
        .unwrap_err();
    assert!(matches!(err, RegistryError::Persistence(_)));
    let fetched = registry.fetch("kept").unwrap();
    assert_eq!(fetched.display_name, "kept.txt");
    assert_eq!(fetched.content, Bytes::from_static(b"kept"));

    // the rolled back content can still be stored once the disk recovers
    std::fs::remove_dir(&path).unwrap();
    registry.ingest("b", "lost", "lost.txt", b"lost".to_vec()).unwrap();
}
