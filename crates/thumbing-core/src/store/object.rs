//! Stored object references and create-events.

use blake3::Hasher as Blake3Hasher;
use serde::{Deserialize, Serialize};

/// Reference to an object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Bucket holding the object
    pub bucket: String,

    /// Full key, prefix included
    pub key: String,

    /// Content length in bytes
    pub size: u64,

    /// BLAKE3 hex digest of the content
    pub etag: String,
}

impl StoredObject {
    /// Describe `bytes` stored at `bucket/key`.
    pub fn describe(bucket: &str, key: &str, bytes: &[u8]) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: bytes.len() as u64,
            etag: etag(bytes),
        }
    }

    /// `bucket/key`, the resource name access policies match against.
    pub fn resource(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

/// Event emitted once per successful `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreated {
    pub object: StoredObject,
}

impl ObjectCreated {
    pub fn new(object: StoredObject) -> Self {
        Self { object }
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }
}

/// Generate a BLAKE3 hash of object contents.
///
/// Equal content always yields an equal etag, which is how rewrites of the
/// same derivative are recognized as identical.
pub fn etag(data: &[u8]) -> String {
    let mut hasher = Blake3Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}
