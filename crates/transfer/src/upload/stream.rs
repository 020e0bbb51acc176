use crate::discover::{DiscoveredFile, Exclusions, discover_all};
use crate::error::{ErrorKind, Result};
use crate::relocate::{Relocation, relocate};
use crate::upload::file::upload_discovered;
use crate::upload::{UploadOptions, UploadOutcome};
use async_stream::stream;
use bucketeer_storage::{StoreHandle, UploadKey};
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};

/// Progress events emitted by [`upload`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of files found.
/// 3. One [`Uploaded`](Self::Uploaded) per file (or one
///    [`Planned`](Self::Planned) per file on a dry run), each optionally
///    followed by a [`Relocated`](Self::Relocated) for the same file.
/// 4. [`Complete`](Self::Complete): exactly once.
///
/// A discovery failure is yielded as an `Err` item and ends the stream; no
/// other error is ever yielded.
#[derive(Debug)]
pub enum UploadEvent {
    Started,
    DiscoveryComplete(u64),
    Uploaded(UploadOutcome),
    /// Dry run only: the file would have been uploaded under `key`.
    Planned { path: PathBuf, key: UploadKey },
    Relocated(Relocation),
    Complete,
}

/// Streams [`UploadEvent`]s while uploading every file under `root` to
/// `store`, each under `prefix` followed by its path relative to `root`.
///
/// Discovery runs to completion first so the total is known up front. Files
/// are then uploaded concurrently, at most `options.concurrency` at a time;
/// further files are started, in discovery order, as in-flight uploads
/// finish. Outcomes arrive in completion order.
pub fn upload<'a>(
    store: &'a StoreHandle,
    root: &'a Path,
    prefix: &'a str,
    options: &'a UploadOptions,
) -> impl Stream<Item = Result<UploadEvent>> + 'a {
    stream!({
        yield Ok(UploadEvent::Started);

        let mut exclusions = Exclusions::names(&options.exclude);
        if let Some(processed) = &options.processed_dir {
            exclusions = exclusions.with_dir(processed);
        }
        let files = match discover_all(root, &exclusions).await.or_raise(|| ErrorKind::Discover) {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        tracing::info!(
            store = store.name(),
            bucket = store.bucket(),
            root = %root.display(),
            files = files.len(),
            "Files gathered and ready for upload"
        );
        let total = u64::try_from(files.len()).unwrap_or(u64::MAX);
        yield Ok(UploadEvent::DiscoveryComplete(total));

        if options.dry_run {
            for file in files {
                let key = UploadKey::derive_lossy(prefix, &file.relative);
                yield Ok(UploadEvent::Planned { path: file.path, key });
            }
            yield Ok(UploadEvent::Complete);
            return;
        }

        let processed = options.processed_dir.as_deref();
        let mut pending = files.into_iter().map(|file| process_file(store, prefix, processed, file));
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.by_ref().take(options.concurrency.max(1)));
        while let Some((outcome, relocation)) = processing.next().await {
            yield Ok(UploadEvent::Uploaded(outcome));
            if let Some(relocation) = relocation {
                yield Ok(UploadEvent::Relocated(relocation));
            }
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }

        yield Ok(UploadEvent::Complete);
    })
}

/// Uploads every file under `root` and returns one outcome per file, in
/// completion order.
///
/// Only a discovery failure makes this return an error. Per-file failures
/// are [`UploadOutcome::Failed`] values in the returned collection. A dry run
/// returns no outcomes.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use bucketeer_storage::StoreHandle;
/// use bucketeer_transfer::upload::{UploadOptions, UploadSummary, upload_all};
/// # async fn example(store: StoreHandle) -> bucketeer_transfer::error::Result<()> {
///
/// let outcomes = upload_all(&store, Path::new("./footage"), "videos/", &UploadOptions::default()).await?;
/// for outcome in &outcomes {
///     println!("{outcome}");
/// }
/// let summary: UploadSummary = outcomes.iter().collect();
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
pub async fn upload_all(
    store: &StoreHandle,
    root: &Path,
    prefix: &str,
    options: &UploadOptions,
) -> Result<Vec<UploadOutcome>> {
    let mut outcomes = Vec::new();
    let mut events = std::pin::pin!(upload(store, root, prefix, options));
    while let Some(event) = events.try_next().await? {
        if let UploadEvent::Uploaded(outcome) = event {
            outcomes.push(outcome);
        }
    }
    Ok(outcomes)
}

async fn process_file(
    store: &StoreHandle,
    prefix: &str,
    processed_dir: Option<&Path>,
    file: DiscoveredFile,
) -> (UploadOutcome, Option<Relocation>) {
    let outcome = upload_discovered(store, prefix, &file).await;
    let relocation = match processed_dir {
        Some(dir) if outcome.is_success() => Some(relocate(&file, dir).await),
        _ => None,
    };
    (outcome, relocation)
}
