use crate::discover::error::{ErrorKind, Result};
use crate::discover::{DiscoveredFile, Exclusions};
use async_stream::stream;
use exn::OptionExt;
use futures::{Stream, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(DiscoveredFile),
    Descend(PathBuf),
    Skip,
}

/// Streams every regular file reachable from `root`, in no particular order.
///
/// The root is checked before anything is walked: if it doesn't exist, can't
/// be read or isn't a directory, that error is the first and only item.
/// Errors on nested directories are yielded in place and the walk carries on
/// with the remaining directories.
///
/// Symbolic links are never followed, and anything that isn't a regular file
/// or a directory is silently skipped.
pub fn discover<'a>(root: &'a Path, exclusions: &'a Exclusions) -> impl Stream<Item = Result<DiscoveredFile>> + 'a {
    stream!({
        match fs::metadata(root).await {
            Ok(metadata) if metadata.is_dir() => {},
            Ok(_) => {
                yield Err(exn::Exn::from(ErrorKind::NotADirectory(root.to_path_buf())));
                return;
            },
            Err(e) => {
                yield Err(exn::Exn::from(ErrorKind::from_io(e, root)));
                return;
            },
        }
        // The root itself must be readable; below it, unreadable directories
        // are reported without ending the walk.
        if let Err(e) = fs::read_dir(root).await {
            yield Err(exn::Exn::from(ErrorKind::from_io(e, root)));
            return;
        }

        let mut stack = vec![root.to_path_buf()];
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(exn::Exn::from(ErrorKind::from_io(e, &current)));
                    continue 'dirs;
                },
            };
            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(e, &current)));
                        continue 'dirs;
                    },
                };
                match process_entry(root, entry, exclusions).await {
                    Ok(WalkEntry::File(f)) => yield Ok(f),
                    Ok(WalkEntry::Descend(d)) => stack.push(d),
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
        }
    })
}

/// Collects [`discover()`] into a [`Vec`], failing on the first error.
pub async fn discover_all(root: &Path, exclusions: &Exclusions) -> Result<Vec<DiscoveredFile>> {
    let files: Vec<_> = discover(root, exclusions).try_collect().await?;
    tracing::debug!(root = %root.display(), files = files.len(), "Discovery complete");
    Ok(files)
}

async fn process_entry(root: &Path, entry: DirEntry, exclusions: &Exclusions) -> Result<WalkEntry> {
    let path = entry.path();
    if exclusions.excludes_name(&path) {
        tracing::trace!(path = %path.display(), "Excluded by name");
        return Ok(WalkEntry::Skip);
    }
    // DirEntry metadata does not traverse symlinks.
    let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &path))?;
    if metadata.is_dir() {
        if exclusions.excludes_dir(&path).await {
            tracing::trace!(path = %path.display(), "Excluded directory");
            return Ok(WalkEntry::Skip);
        }
        return Ok(WalkEntry::Descend(path));
    }
    if metadata.is_file() {
        let relative = path
            .strip_prefix(root)
            .ok()
            .map(Path::to_path_buf)
            .ok_or_raise(|| ErrorKind::OutsideRoot(path.clone()))?;
        return Ok(WalkEntry::File(DiscoveredFile {
            path,
            relative,
            size: metadata.len(),
        }));
    }
    tracing::debug!(path = %path.display(), "Skipping entry that is not a regular file");
    Ok(WalkEntry::Skip)
}
