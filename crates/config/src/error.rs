//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Config file extension isn't one of `toml`, `yaml`, `yml` or `json`.
    #[display("unsupported config format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The merged configuration could not be parsed into settings.
    #[display("invalid configuration")]
    Invalid,
    /// A numeric setting is outside its allowed range.
    #[display("{_0} must be at least 1")]
    OutOfRange(#[error(not(source))] &'static str),
    #[display(
        "invalid prefix `{_0}`: use one or more segments of letters, digits, underscores or hyphens, each ending with '/' (e.g. 'my-folder/')"
    )]
    InvalidPrefix(#[error(not(source))] String),
    #[display("invalid bucket name `{_0}`: {_1}")]
    InvalidBucket(#[error(not(source))] String, #[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
