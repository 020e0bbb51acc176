//! Bounded concurrent upload of a directory tree.
//!
//! [`upload`] drives the whole operation as a stream of [`UploadEvent`]s:
//! files are discovered, then handed to the store with at most
//! [`UploadOptions::concurrency`] transfers in flight. Each file ends in
//! exactly one [`UploadOutcome`]; a failing file never stops the others.

mod file;
mod outcome;
mod stream;

pub use self::file::upload_file;
pub use self::outcome::{UploadOutcome, UploadSummary};
pub use self::stream::{UploadEvent, upload, upload_all};
use std::path::PathBuf;

/// Tuning for a single upload run.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Maximum number of files transferred at once. Zero is treated as one.
    pub concurrency: usize,
    /// File and directory names that are never uploaded.
    pub exclude: Vec<String>,
    /// Where successfully uploaded files are moved to, if anywhere.
    pub processed_dir: Option<PathBuf>,
    /// Report the keys that would be written without contacting the store.
    pub dry_run: bool,
}
impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            concurrency: crate::DEFAULT_CONCURRENCY,
            exclude: vec![".git".to_string()],
            processed_dir: None,
            dry_run: false,
        }
    }
}
