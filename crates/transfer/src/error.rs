//! Transfer Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A transfer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a transfer failure.
///
/// Per-file upload failures are never errors: they are reported as
/// [`UploadOutcome::Failed`](crate::upload::UploadOutcome::Failed) values.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The upload root could not be enumerated.
    #[display("could not discover files to upload")]
    Discover,
    /// An uploaded file could not be moved to the processed directory.
    #[display("could not move uploaded file: {}", _0.display())]
    Relocate(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Discover => false,
            Self::Relocate(_) => true,
        }
    }
}
