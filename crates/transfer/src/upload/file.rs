use crate::discover::DiscoveredFile;
use crate::upload::UploadOutcome;
use bucketeer_storage::{StoreHandle, UploadKey};
use tracing::instrument;

/// Uploads a single file under `key`.
///
/// Never fails: any error from the store is captured in
/// [`UploadOutcome::Failed`] so that one broken transfer cannot abort or
/// block the uploads running alongside it. No retries and no timeout are
/// applied here; both are left to the store's own client.
#[instrument(skip_all, fields(store = store.name(), key = %key))]
pub async fn upload_file(store: &StoreHandle, file: &DiscoveredFile, key: UploadKey) -> UploadOutcome {
    tracing::debug!(path = %file.path.display(), bytes = file.size, "Uploading file");
    match store.put_file(&file.path, &key).await {
        Ok(receipt) => {
            tracing::debug!(bytes = receipt.bytes, parts = receipt.parts, "Uploaded");
            UploadOutcome::Uploaded { path: file.path.clone(), receipt }
        },
        Err(error) => {
            tracing::warn!(path = %file.path.display(), error = %*error, retryable = error.is_retryable(), "Upload failed");
            UploadOutcome::Failed { path: file.path.clone(), key, error }
        },
    }
}

/// Derives the key for `file` and uploads it.
///
/// A path that can't be turned into a key (e.g. not valid UTF-8) becomes a
/// failed outcome, named by its lossy key.
pub(crate) async fn upload_discovered(store: &StoreHandle, prefix: &str, file: &DiscoveredFile) -> UploadOutcome {
    match UploadKey::derive(prefix, &file.relative) {
        Ok(key) => upload_file(store, file, key).await,
        Err(error) => {
            let key = UploadKey::derive_lossy(prefix, &file.relative);
            tracing::warn!(path = %file.path.display(), error = %*error, "Cannot derive upload key");
            UploadOutcome::Failed { path: file.path.clone(), key, error }
        },
    }
}
