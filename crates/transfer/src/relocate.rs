//! Moving uploaded source files out of the way.
//!
//! Only files whose upload was confirmed are ever moved. A failed upload
//! leaves its source file exactly where it was so that the next run picks it
//! up again.

use crate::discover::DiscoveredFile;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// What happened to an uploaded file after its upload succeeded.
#[derive(Debug)]
pub enum Relocation {
    Moved { from: PathBuf, to: PathBuf },
    /// The upload stands; only the move failed.
    Failed { path: PathBuf, error: Error },
}

/// Moves `file` to `processed_dir`, keeping its path relative to the root.
pub async fn relocate(file: &DiscoveredFile, processed_dir: &Path) -> Relocation {
    let to = processed_dir.join(&file.relative);
    match move_file(&file.path, &to).await {
        Ok(()) => {
            tracing::debug!(from = %file.path.display(), to = %to.display(), "Moved uploaded file");
            Relocation::Moved { from: file.path.clone(), to }
        },
        Err(error) => {
            tracing::warn!(path = %file.path.display(), error = ?error, "Could not move uploaded file");
            Relocation::Failed { path: file.path.clone(), error }
        },
    }
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Relocate(from.to_path_buf()))?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        // Renames can't cross filesystems: copy, then remove the original.
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).await.or_raise(|| ErrorKind::Relocate(from.to_path_buf()))?;
            fs::remove_file(from).await.or_raise(|| ErrorKind::Relocate(from.to_path_buf()))
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Relocate(from.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relocate_keeps_relative_path() {
        let root = tempfile::tempdir().unwrap();
        let processed = tempfile::tempdir().unwrap();
        let path = root.path().join("sub/y.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"why").unwrap();
        let file = DiscoveredFile {
            path: path.clone(),
            relative: PathBuf::from("sub/y.txt"),
            size: 3,
        };

        let relocation = relocate(&file, processed.path()).await;
        let expected = processed.path().join("sub/y.txt");
        assert!(matches!(&relocation, Relocation::Moved { to, .. } if to == &expected));
        assert!(!path.exists());
        assert_eq!(std::fs::read(&expected).unwrap(), b"why");
    }

    #[tokio::test]
    async fn test_relocate_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let processed = tempfile::tempdir().unwrap();
        let file = DiscoveredFile {
            path: root.path().join("gone.txt"),
            relative: PathBuf::from("gone.txt"),
            size: 0,
        };
        match relocate(&file, processed.path()).await {
            Relocation::Failed { error, .. } => assert!(matches!(&*error, ErrorKind::Relocate(_))),
            Relocation::Moved { .. } => panic!("missing file cannot be moved"),
        }
    }
}
