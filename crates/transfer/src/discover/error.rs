//! Error types for the [`discover`](super) module.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A discovery error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The root (or a directory found while walking) doesn't exist.
    #[display("no such directory: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// The root exists but isn't a directory.
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    #[display("I/O error reading {}: {_1}", _0.display())]
    Io(#[error(not(source))] PathBuf, #[error(source)] IoError),
    /// A walked entry is not inside the root it was found under.
    #[display("path escapes upload root: {}", _0.display())]
    OutsideRoot(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    pub(crate) fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotADirectory => Self::NotADirectory(path.to_path_buf()),
            _ => Self::Io(path.to_path_buf(), err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_, _))
    }
}
