use bucketeer_storage::error::Error as StorageError;
use bucketeer_storage::{PutReceipt, UploadKey};
use std::fmt;
use std::path::{Path, PathBuf};

/// The terminal result of uploading a single file.
///
/// Failures keep the store's structured error (kind and error tree) so that
/// callers can decide what to do programmatically; [`Display`](fmt::Display)
/// renders the one-line human readable form.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The file's bytes are stored under the receipt's key.
    Uploaded { path: PathBuf, receipt: PutReceipt },
    /// The transfer failed; nothing was retried at this level.
    Failed { path: PathBuf, key: UploadKey, error: StorageError },
}
impl UploadOutcome {
    pub fn key(&self) -> &UploadKey {
        match self {
            Self::Uploaded { receipt, .. } => &receipt.key,
            Self::Failed { key, .. } => key,
        }
    }

    /// Local file the outcome is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Uploaded { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }

    pub fn error(&self) -> Option<&StorageError> {
        match self {
            Self::Uploaded { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}
impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploaded { receipt, .. } => write!(f, "Uploaded: {}", receipt.key),
            Self::Failed { key, error, .. } => write!(f, "Failed upload for {key}: {}", **error),
        }
    }
}

/// Totals derived from a collection of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: u64,
    pub failed: u64,
    /// Bytes transferred by successful uploads
    pub bytes: u64,
}
impl UploadSummary {
    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded { receipt, .. } => {
                self.uploaded += 1;
                self.bytes += receipt.bytes;
            },
            UploadOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.uploaded + self.failed
    }
}
impl<'a> FromIterator<&'a UploadOutcome> for UploadSummary {
    fn from_iter<I: IntoIterator<Item = &'a UploadOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        iter.into_iter().for_each(|outcome| summary.record(outcome));
        summary
    }
}
impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} uploaded, {} failed, {} bytes", self.uploaded, self.failed, self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketeer_storage::error::ErrorKind as StorageErrorKind;

    fn uploaded(relative: &str, bytes: u64) -> UploadOutcome {
        let key = UploadKey::derive("out/", relative).unwrap();
        UploadOutcome::Uploaded {
            path: PathBuf::from(relative),
            receipt: PutReceipt::new(key, bytes),
        }
    }

    fn failed(relative: &str, message: &str) -> UploadOutcome {
        UploadOutcome::Failed {
            path: PathBuf::from(relative),
            key: UploadKey::derive("out/", relative).unwrap(),
            error: exn::Exn::from(StorageErrorKind::Network(message.to_string())),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(uploaded("x.txt", 3).to_string(), "Uploaded: out/x.txt");
        assert_eq!(
            failed("sub/y.txt", "connection reset").to_string(),
            "Failed upload for out/sub/y.txt: network error: connection reset"
        );
    }

    #[test]
    fn test_accessors() {
        let ok = uploaded("x.txt", 3);
        assert!(ok.is_success());
        assert!(ok.error().is_none());
        assert_eq!(ok.key().as_str(), "out/x.txt");
        assert_eq!(ok.path(), Path::new("x.txt"));

        let bad = failed("sub/y.txt", "connection reset");
        assert!(!bad.is_success());
        assert!(matches!(bad.error().map(|e| &**e), Some(StorageErrorKind::Network(_))));
        assert_eq!(bad.key().as_str(), "out/sub/y.txt");
    }

    #[test]
    fn test_summary() {
        let outcomes = [uploaded("a", 10), failed("b", "boom"), uploaded("c", 5)];
        let summary: UploadSummary = outcomes.iter().collect();
        assert_eq!(summary, UploadSummary { uploaded: 2, failed: 1, bytes: 15 });
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "2 uploaded, 1 failed, 15 bytes");
    }
}
