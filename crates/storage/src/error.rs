//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Local source file does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied (local permissions or remote credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (connection reset, DNS, timeouts, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The remote service asked us to slow down.
    #[display("throttled: {_0}")]
    Throttled(#[error(not(source))] String),
    /// Key cannot be derived from the path, or was rejected by the service.
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Classify a local filesystem error against the file it happened on.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.display().to_string()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::Throttled(_) | Self::BackendError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::Network("connection reset by peer".to_string()).to_string(),
            "network error: connection reset by peer"
        );
        assert_eq!(ErrorKind::NotFound(PathBuf::from("a/b.txt")).to_string(), "file not found: a/b.txt");
        assert_eq!(ErrorKind::InvalidKey("../x".to_string()).to_string(), "invalid key: ../x");
    }

    #[rstest]
    #[case(std::io::ErrorKind::NotFound, "file not found: sub/y.txt")]
    #[case(std::io::ErrorKind::PermissionDenied, "permission denied: sub/y.txt")]
    #[case(std::io::ErrorKind::UnexpectedEof, "I/O error: boom")]
    fn error_kind_from_io(#[case] kind: std::io::ErrorKind, #[case] expected: &str) {
        let err = IoError::new(kind, "boom");
        assert_eq!(ErrorKind::from_io(err, Path::new("sub/y.txt")).to_string(), expected);
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Network(String::new()).is_retryable());
        assert!(ErrorKind::Throttled(String::new()).is_retryable());
        assert!(!ErrorKind::NotFound(PathBuf::new()).is_retryable());
        assert!(!ErrorKind::PermissionDenied(String::new()).is_retryable());
        assert!(!ErrorKind::InvalidKey(String::new()).is_retryable());
    }
}
