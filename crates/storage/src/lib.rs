//! Object store abstraction for bulk uploads.
//!
//! The uploader only ever needs one capability from a remote service: store
//! the bytes of a local file under a key. [`ObjectStore`] captures exactly
//! that, with an S3-compatible implementation behind the `s3` feature and an
//! in-memory one for tests behind the `mock` feature.

pub mod backend;
pub mod error;
mod key;
mod models;

pub use crate::backend::ObjectStore;
pub use crate::key::UploadKey;
pub use crate::models::PutReceipt;
use std::sync::Arc;

/// Shared handle to a store. Constructed once per invocation and passed
/// explicitly to every upload task.
pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
