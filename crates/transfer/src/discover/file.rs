use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A regular file found under the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path as walked (the root joined with the relative path)
    pub path: PathBuf,
    /// Path relative to the root, used to derive the upload key
    pub relative: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
}

/// Entries that discovery never yields or descends into.
///
/// Names are compared against the final component of every entry, so
/// `.git` matches both a `.git` directory and the `.git` file of a worktree
/// or submodule, but not `.gitignore`.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    names: HashSet<OsString>,
    dirs: Vec<PathBuf>,
}
impl Exclusions {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            dirs: Vec::new(),
        }
    }

    /// Also skip a specific directory (e.g. the processed directory when it
    /// lives inside the root). Directories that don't exist yet can't be
    /// walked into, so they are ignored.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        // Use non-async here; it only happens once per run.
        if let Ok(canonical) = std::fs::canonicalize(dir.as_ref()) {
            self.dirs.push(canonical);
        }
        self
    }

    pub(crate) fn excludes_name(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.names.contains(name))
    }

    pub(crate) async fn excludes_dir(&self, path: &Path) -> bool {
        if self.dirs.is_empty() {
            return false;
        }
        match tokio::fs::canonicalize(path).await {
            Ok(canonical) => self.dirs.contains(&canonical),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_name() {
        let exclusions = Exclusions::names([".git", "node_modules"]);
        assert!(exclusions.excludes_name(Path::new("/root/.git")));
        assert!(exclusions.excludes_name(Path::new("/root/web/node_modules")));
        assert!(!exclusions.excludes_name(Path::new("/root/.gitignore")));
        assert!(!exclusions.excludes_name(Path::new("/root/.github")));
        assert!(!exclusions.excludes_name(Path::new("/root/my.git.txt")));
    }

    #[tokio::test]
    async fn test_excludes_dir() {
        let root = tempfile::tempdir().unwrap();
        let processed = root.path().join("processed");
        std::fs::create_dir(&processed).unwrap();
        let exclusions = Exclusions::default().with_dir(&processed);
        assert!(exclusions.excludes_dir(&processed).await);
        assert!(exclusions.excludes_dir(&root.path().join("processed/../processed")).await);
        assert!(!exclusions.excludes_dir(root.path()).await);
    }

    #[tokio::test]
    async fn test_missing_dir_ignored() {
        let root = tempfile::tempdir().unwrap();
        let exclusions = Exclusions::default().with_dir(root.path().join("not-yet"));
        assert!(!exclusions.excludes_dir(root.path()).await);
    }
}
