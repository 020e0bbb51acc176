//! Object store trait and implementations.
//!

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
#[cfg(feature = "s3")]
pub use self::s3::{S3Settings, S3Store};
use crate::error::Result;
use crate::{PutReceipt, UploadKey};
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for object stores.
///
/// Implementations must be safe to share between many concurrently running
/// upload tasks: all methods take `&self`, and a single instance is expected
/// to be wrapped in a [`StoreHandle`](crate::StoreHandle).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use bucketeer_storage::{ObjectStore, UploadKey, error::Result};
///
/// async fn upload_readme(store: &dyn ObjectStore) -> Result<u64> {
///     let key = UploadKey::derive("docs/", "README.md")?;
///     let receipt = store.put_file(Path::new("/srv/project/README.md"), &key).await?;
///     Ok(receipt.bytes)
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Bucket (container) that objects are written to.
    fn bucket(&self) -> &str;

    /// Store the contents of the local file at `path` under `key`.
    ///
    /// Overwrites any existing object with the same key. Large files may be
    /// split into parts and transferred concurrently; that is an internal
    /// detail of the implementation.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the local
    /// file does not exist.
    async fn put_file(&self, path: &Path, key: &UploadKey) -> Result<PutReceipt>;
}
