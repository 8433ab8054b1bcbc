use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;

use crate::content_store::{fingerprint, ContentHash};

/// Display name used when an upload carries no usable filename
pub const UNNAMED_FILE: &str = "unnamed";

/// One stored upload.
///  Records are immutable once built; the hash is
///  always computed from the bytes they carry.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    bucket: String,
    key: String,
    display_name: String,
    content_hash: ContentHash,
    // base64 so arbitrary binary content survives the JSON snapshot
    #[serde_as(as = "Base64")]
    content: Bytes,
}

impl FileRecord {
    /// Build a record, fingerprinting `content`.
    ///  `display_name` is stored as given; callers sanitize it first.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        display_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            bucket: bucket.into(),
            key: key.into(),
            display_name: display_name.into(),
            content_hash: fingerprint(&content),
            content,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Whether the stored hash still matches the stored bytes.
    ///  Only a deserialized record can fail this.
    pub fn verify(&self) -> bool {
        fingerprint(&self.content) == self.content_hash
    }
}

impl std::fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecord")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("content_hash", &self.content_hash)
            .field("size", &self.content.len())
            .finish()
    }
}

/// Reduce a client supplied filename to its final path segment.
///
/// Both `/` and `\` count as separators, since browsers on Windows
/// may submit the full local path. Names that reduce to nothing,
/// `.` or `..` become [`UNNAMED_FILE`].
pub fn sanitize_display_name(name: &str) -> String {
    let segment = name
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match segment {
        "" | "." | ".." => UNNAMED_FILE.to_string(),
        segment => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize_display_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_display_name("/abs/path/report.pdf"), "report.pdf");
        assert_eq!(sanitize_display_name("dir/nested/"), "nested");
    }

    #[test]
    fn test_sanitize_windows_paths() {
        assert_eq!(
            sanitize_display_name("C:\\Users\\me\\Desktop\\photo.jpg"),
            "photo.jpg"
        );
        assert_eq!(sanitize_display_name("..\\..\\boot.ini"), "boot.ini");
    }

    #[test]
    fn test_sanitize_plain_and_degenerate_names() {
        assert_eq!(sanitize_display_name("notes.txt"), "notes.txt");
        assert_eq!(sanitize_display_name("with space.txt"), "with space.txt");
        assert_eq!(sanitize_display_name(""), UNNAMED_FILE);
        assert_eq!(sanitize_display_name("/"), UNNAMED_FILE);
        assert_eq!(sanitize_display_name(".."), UNNAMED_FILE);
        assert_eq!(sanitize_display_name("a/b/.."), UNNAMED_FILE);
    }

    #[test]
    fn test_record_hash_tracks_content() {
        let record = FileRecord::new("b", "k", "n.bin", vec![0u8, 159, 146, 150]);
        assert_eq!(record.content_hash(), &fingerprint(&[0u8, 159, 146, 150]));
        assert_eq!(record.size(), 4);
        assert!(record.verify());
    }

    #[test]
    fn test_record_serialized_field_names() {
        let record = FileRecord::new("b", "k", "n.txt", b"hi".to_vec());
        let value = serde_json::to_value(&record).unwrap();
        let mut fields: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        fields.sort();
        assert_eq!(
            fields,
            vec!["bucket", "content", "contentHash", "displayName", "key"]
        );
        assert_eq!(value["content"], "aGk=");
    }

    #[test]
    fn test_tampered_record_fails_verify() {
        let record = FileRecord::new("b", "k", "n.txt", b"hi".to_vec());
        let mut value = serde_json::to_value(&record).unwrap();
        value["content"] = serde_json::Value::String("aGo=".to_string());
        let tampered: FileRecord = serde_json::from_value(value).unwrap();
        assert!(!tampered.verify());
    }
}
