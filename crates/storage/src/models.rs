//! Storage models.

use crate::UploadKey;

/// What the store reports back after a file has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// Key the object was stored under
    pub key: UploadKey,
    /// Number of bytes transferred
    pub bytes: u64,
    /// Entity tag returned by the service, if any
    pub etag: Option<String>,
    /// Number of parts the object was split into (1 for a single request)
    pub parts: usize,
}
impl PutReceipt {
    pub fn new(key: UploadKey, bytes: u64) -> Self {
        Self { key, bytes, etag: None, parts: 1 }
    }

    pub fn with_etag(mut self, etag: impl Into<Option<String>>) -> Self {
        self.etag = etag.into();
        self
    }

    pub fn with_parts(mut self, parts: usize) -> Self {
        self.parts = parts;
        self
    }
}
