//! S3-compatible object store.
//!
//! This module provides an object store implementation for S3-compatible
//! services including AWS S3, Backblaze B2, Tigris (Fly.io), MinIO and others.
//!
//! # Credentials
//!
//! When a `key_id`/`key_secret` pair is configured the client is built
//! explicitly from it. Otherwise the default AWS credential chain is used
//! (environment, `~/.aws/credentials` profiles, instance metadata...).
//!
//! # Multipart
//!
//! Files at or above the multipart threshold are uploaded as a multipart
//! upload, with parts transferred concurrently. A failed part aborts the
//! whole upload so that no orphaned parts are left behind in the bucket.

use crate::{
    ObjectStore, PutReceipt, UploadKey,
    error::{ErrorKind, Result},
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::{ByteStream, Length},
    types::{CompletedMultipartUpload, CompletedPart},
};
use exn::OptionExt;
use futures::{StreamExt, TryStreamExt};
use std::fmt::Debug;
use std::io::Error as IoError;
use std::path::Path;
use tracing::instrument;

/// S3 rejects parts smaller than this (except the last one).
const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
/// S3 rejects multipart uploads with more parts than this.
const MAX_PARTS: u64 = 10_000;

/// Connection and transfer settings for an [`S3Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    /// Bucket name (already validated by the caller)
    pub bucket: String,
    /// AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    pub region: String,
    /// Custom endpoint URL for S3-compatible services
    pub endpoint: Option<String>,
    /// Static access key ID; the default credential chain is used when absent
    pub key_id: Option<String>,
    /// Static secret access key
    pub key_secret: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`)
    pub path_style: bool,
    /// Files of at least this many bytes use multipart upload
    pub multipart_threshold: u64,
    /// Size of each multipart part in bytes
    pub part_size: u64,
    /// Maximum parts of a single file in flight at once
    pub part_concurrency: usize,
    /// Total attempts per request (1 initial + retries) made by the SDK
    pub max_attempts: u32,
}
impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            key_id: None,
            key_secret: None,
            path_style: false,
            multipart_threshold: 8 * 1024 * 1024,
            part_size: 8 * 1024 * 1024,
            part_concurrency: 16,
            max_attempts: 4,
        }
    }
}

/// S3-compatible object store.
///
/// Holds a single SDK [`Client`]; the client owns its own connection pool and
/// is safe to use from many upload tasks at once.
///
/// # Examples
///
/// ```no_run
/// use bucketeer_storage::backend::{S3Settings, S3Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = S3Store::new("backblaze", S3Settings {
///     bucket: "my-bucket".to_string(),
///     region: "us-west-004".to_string(),
///     endpoint: Some("https://s3.us-west-004.backblazeb2.com".to_string()),
///     key_id: Some("access_key_id".to_string()),
///     key_secret: Some("secret_access_key".to_string()),
///     path_style: true,
///     ..Default::default()
/// }).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    name: String,
    client: Client,
    bucket: String,
    multipart_threshold: u64,
    part_size: u64,
    part_concurrency: usize,
}

impl S3Store {
    /// Create a new S3 object store, building the SDK client from `settings`.
    pub async fn new(name: impl Into<String>, settings: S3Settings) -> Self {
        let region = Region::new(settings.region.clone());
        // Configure retry policy with exponential backoff.
        let retry = RetryConfig::standard().with_max_attempts(settings.max_attempts.max(1));
        let mut config_builder = match (&settings.key_id, &settings.key_secret) {
            (Some(key_id), Some(key_secret)) => {
                let credentials = Credentials::new(key_id, key_secret, None, None, "bucketeer-config");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .region(region)
            },
            _ => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region).load().await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        }
        .retry_config(retry)
        .force_path_style(settings.path_style);
        // Set custom endpoint for non-AWS services
        if let Some(endpoint_url) = &settings.endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(config_builder.build());
        Self::from_client(name, client, settings)
    }

    /// Wrap an already-configured SDK client.
    pub fn from_client(name: impl Into<String>, client: Client, settings: S3Settings) -> Self {
        Self {
            name: name.into(),
            client,
            bucket: settings.bucket,
            multipart_threshold: settings.multipart_threshold,
            part_size: settings.part_size,
            part_concurrency: settings.part_concurrency.max(1),
        }
    }

    async fn put_single(&self, path: &Path, key: &UploadKey, size: u64) -> Result<PutReceipt> {
        let body = ByteStream::from_path(path).await.map_err(|e| ErrorKind::Io(IoError::other(e)))?;
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_length(size as i64)
            .body(body)
            .send()
            .await
            .map_err(classify)?;
        Ok(PutReceipt::new(key.clone(), size).with_etag(output.e_tag().map(str::to_string)))
    }

    async fn put_multipart(&self, path: &Path, key: &UploadKey, size: u64) -> Result<PutReceipt> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(classify)?;
        let upload_id = created
            .upload_id()
            .ok_or_raise(|| ErrorKind::BackendError("multipart upload created without an upload ID".to_string()))?
            .to_string();

        let parts = match self.upload_parts(path, key, &upload_id, size).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(key, &upload_id).await;
                return Err(e);
            },
        };
        let count = parts.len();
        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(&upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
            .send()
            .await;
        match completed {
            Ok(output) => Ok(PutReceipt::new(key.clone(), size)
                .with_etag(output.e_tag().map(str::to_string))
                .with_parts(count)),
            Err(e) => {
                self.abort(key, &upload_id).await;
                exn::bail!(classify(e))
            },
        }
    }

    async fn upload_parts(&self, path: &Path, key: &UploadKey, upload_id: &str, size: u64) -> Result<Vec<CompletedPart>> {
        let plan = plan_parts(size, self.part_size);
        tracing::debug!(key = %key, parts = plan.len(), "Uploading multipart object");
        let mut parts: Vec<CompletedPart> = futures::stream::iter(plan)
            .map(|(number, offset, length)| self.upload_part(path, key, upload_id, number, offset, length))
            .buffer_unordered(self.part_concurrency)
            .try_collect()
            .await?;
        // Parts complete in any order; S3 wants them ascending.
        parts.sort_by_key(|part| part.part_number());
        Ok(parts)
    }

    async fn upload_part(
        &self,
        path: &Path,
        key: &UploadKey,
        upload_id: &str,
        number: i32,
        offset: u64,
        length: u64,
    ) -> Result<CompletedPart> {
        let body = ByteStream::read_from()
            .path(path)
            .offset(offset)
            .length(Length::Exact(length))
            .build()
            .await
            .map_err(|e| ErrorKind::Io(IoError::other(e)))?;
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .part_number(number)
            .content_length(length as i64)
            .body(body)
            .send()
            .await
            .map_err(classify)?;
        Ok(CompletedPart::builder().part_number(number).set_e_tag(output.e_tag().map(str::to_string)).build())
    }

    /// Best-effort cleanup of an unfinished multipart upload. Failure is only
    /// logged: the caller is already returning the error that caused it.
    async fn abort(&self, key: &UploadKey, upload_id: &str) {
        let aborted = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key.as_str())
            .upload_id(upload_id)
            .send()
            .await;
        if let Err(e) = aborted {
            tracing::warn!(key = %key, upload_id, error = %DisplayErrorContext(&e), "Could not abort multipart upload");
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        &self.name
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip_all, fields(store = %self.name, bucket = %self.bucket, key = %key))]
    async fn put_file(&self, path: &Path, key: &UploadKey) -> Result<PutReceipt> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        if !metadata.is_file() {
            exn::bail!(ErrorKind::BackendError(format!("not a regular file: {}", path.display())));
        }
        let size = metadata.len();
        if size > 0 && size >= self.multipart_threshold {
            self.put_multipart(path, key, size).await
        } else {
            self.put_single(path, key, size).await
        }
    }
}

/// Split `size` bytes into `(part number, offset, length)` triples.
///
/// The part size is raised to the S3 minimum, and further if needed to stay
/// within the maximum part count.
fn plan_parts(size: u64, part_size: u64) -> Vec<(i32, u64, u64)> {
    let part_size = part_size.max(MIN_PART_SIZE).max(size.div_ceil(MAX_PARTS));
    (0..size.div_ceil(part_size))
        .map(|index| {
            let offset = index * part_size;
            // Infallible: index never exceeds MAX_PARTS.
            (index as i32 + 1, offset, part_size.min(size - offset))
        })
        .collect()
}

/// Map an SDK failure onto an actionable [`ErrorKind`].
fn classify<E, R>(err: SdkError<E, R>) -> ErrorKind
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug + 'static,
{
    tracing::debug!(error = %DisplayErrorContext(&err), "S3 request failed");
    // The full context embeds the raw response; service errors only keep the
    // code and message the service sent.
    let message = match err.as_service_error() {
        Some(service) => match (service.code(), service.message()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.to_string(),
            (None, Some(message)) => message.to_string(),
            (None, None) => "unhandled service error".to_string(),
        },
        None => DisplayErrorContext(&err).to_string(),
    };
    if matches!(err, SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) {
        return ErrorKind::Network(message);
    }
    match err.as_service_error().and_then(|e| e.code()) {
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "AllAccessDisabled") => {
            ErrorKind::PermissionDenied(message)
        },
        Some("SlowDown" | "Throttling" | "ThrottlingException" | "RequestLimitExceeded" | "ServiceUnavailable") => {
            ErrorKind::Throttled(message)
        },
        Some("KeyTooLongError" | "InvalidObjectName") => ErrorKind::InvalidKey(message),
        _ => ErrorKind::BackendError(message),
    }
}
