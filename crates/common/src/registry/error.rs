use crate::content_store::ContentHash;

use super::snapshot::SnapshotError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("file with the same content already exists in bucket {bucket} ({hash})")]
    DuplicateContent { bucket: String, hash: ContentHash },
    #[error("file key {0} is already in use")]
    KeyConflict(String),
    #[error("file with key {0} does not exist")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(#[from] SnapshotError),
}

/// Rejected ingest input. Lists every missing field,
///  using the names callers submit them under.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

impl ValidationError {
    pub(crate) fn check(bucket: &str, key: &str) -> Result<(), Self> {
        let mut missing = Vec::new();
        if bucket.is_empty() {
            missing.push("bucket_id");
        }
        if key.is_empty() {
            missing.push("file_key");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Self { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_lists_missing_fields() {
        assert!(ValidationError::check("b", "k").is_ok());

        let err = ValidationError::check("", "").unwrap_err();
        assert_eq!(err.missing, vec!["bucket_id", "file_key"]);
        assert_eq!(
            err.to_string(),
            "missing required fields: bucket_id, file_key"
        );

        let err = ValidationError::check("b", "").unwrap_err();
        assert_eq!(err.missing, vec!["file_key"]);
    }
}
