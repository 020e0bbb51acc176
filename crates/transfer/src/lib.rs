//! Uploading a local directory tree to an object store.
//!
//! - [`discover`] walks the upload root and yields every regular file.
//! - [`upload`] transfers discovered files with bounded concurrency and
//!   reports one outcome per file.
//! - [`relocate`] optionally moves successfully uploaded files aside.

pub mod discover;
pub mod error;
pub mod relocate;
pub mod upload;

/// Default maximum number of uploads in flight.
pub const DEFAULT_CONCURRENCY: usize = 32;
