use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::{Digest, Sha256};

use crate::registry::FileRecord;

/// Size of a content fingerprint in bytes
pub const HASH_SIZE: usize = 32;

/// SHA-256 digest of a file's raw bytes.
///  Rendered and serialized as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct ContentHash([u8; HASH_SIZE]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for ContentHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ContentHashError {
    #[error("invalid hex in content hash: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("content hash must be 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for ContentHash {
    type Err = ContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let bytes: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| ContentHashError::Length(len))?;
        Ok(Self(bytes))
    }
}

/// Compute the fingerprint of a byte sequence.
pub fn fingerprint(bytes: &[u8]) -> ContentHash {
    ContentHash(Sha256::digest(bytes).into())
}

/// Whether any of `records` already holds content with `hash` in `bucket`.
/// Scans the full record set; only existence is reported.
pub fn is_duplicate<'a, I>(records: I, bucket: &str, hash: &ContentHash) -> bool
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    records
        .into_iter()
        .any(|record| record.bucket() == bucket && record.content_hash() == hash)
}
