//! Object key derivation.
//!
//! Keys are built by concatenating a caller-supplied prefix with a path
//! relative to the upload root, with every component joined by `/` no matter
//! which separator the host platform uses.

use crate::error::{ErrorKind, Result};
use std::fmt;
use std::path::{Component, Path};

/// Destination key of a single uploaded file.
///
/// The prefix is prepended verbatim: no separator is inserted, so a prefix
/// that should act as a directory must end with `/`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use bucketeer_storage::UploadKey;
///
/// let key = UploadKey::derive("out/", Path::new("sub/y.txt")).unwrap();
/// assert_eq!(key.as_str(), "out/sub/y.txt");
/// // No separator is inserted between the prefix and the path.
/// let key = UploadKey::derive("backup-", Path::new("x.txt")).unwrap();
/// assert_eq!(key.as_str(), "backup-x.txt");
/// // Paths escaping the root never become keys.
/// assert!(UploadKey::derive("out/", Path::new("../etc/passwd")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadKey(String);

impl UploadKey {
    /// Derive the key for `relative` (a path relative to the upload root).
    ///
    /// Returns [`InvalidKey`](ErrorKind::InvalidKey) if the path is empty,
    /// absolute, leaves the root, or isn't valid UTF-8.
    pub fn derive(prefix: &str, relative: impl AsRef<Path>) -> Result<Self> {
        let relative = relative.as_ref();
        let invalid = || ErrorKind::InvalidKey(relative.display().to_string());
        let mut segments: Vec<&str> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(s) => {
                    // Null bytes pass through Path::components() on Unix.
                    if s.as_encoded_bytes().contains(&0) {
                        exn::bail!(invalid());
                    }
                    match s.to_str() {
                        Some(s) => segments.push(s),
                        None => exn::bail!(invalid()),
                    }
                },
                Component::CurDir => {},
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
            }
        }
        if segments.is_empty() {
            exn::bail!(invalid());
        }
        Ok(Self(format!("{prefix}{}", segments.join("/"))))
    }

    /// Same derivation as [`derive()`](Self::derive), but never fails.
    ///
    /// Used to name a file in reports when its strict key could not be
    /// derived. Non-UTF-8 bytes are replaced and separators normalized.
    pub fn derive_lossy(prefix: &str, relative: impl AsRef<Path>) -> Self {
        let rendered: Vec<_> = relative.as_ref().components().map(|c| c.as_os_str().to_string_lossy()).collect();
        Self(format!("{prefix}{}", rendered.join("/").trim_start_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
impl fmt::Display for UploadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for UploadKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl From<UploadKey> for String {
    fn from(key: UploadKey) -> Self {
        key.0
    }
}
