//! In-memory object store for testing.

use crate::error::{ErrorKind, Result};
use crate::{ObjectStore, PutReceipt, UploadKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory object store for testing.
///
/// Objects are stored in a `HashMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Failures
/// can be scripted per key to simulate a broken transfer, and the highest
/// number of simultaneous in-flight puts is recorded so tests can assert on
/// concurrency limits.
///
/// # Examples
///
/// ```
/// use bucketeer_storage::backend::MockStore;
/// use bucketeer_storage::{ObjectStore, UploadKey};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("x.txt"), b"data")?;
///
/// let store = MockStore::default().failing("out/broken.txt", "connection reset");
/// let key = UploadKey::derive("out/", "x.txt")?;
/// store.put_file(&dir.path().join("x.txt"), &key).await?;
/// assert_eq!(store.get("out/x.txt").await.as_deref(), Some(&b"data"[..]));
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
    failures: HashMap<String, String>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl MockStore {
    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Change the bucket reported by the mock store.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Every put to `key` fails with a simulated network error.
    pub fn failing(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(key.into(), message.into());
        self
    }

    /// Every put sleeps for `latency` before completing, so that concurrent
    /// puts actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Contents stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    /// All keys stored so far, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of `put_file` calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `put_file` calls that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            bucket: "mock-bucket".to_string(),
            objects: RwLock::new(HashMap::new()),
            failures: HashMap::new(),
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

/// Decrements the in-flight counter however the put ends.
struct InFlight<'a>(&'a AtomicUsize);
impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_file(&self, path: &Path, key: &UploadKey) -> Result<PutReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let data = tokio::fs::read(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        if let Some(message) = self.failures.get(key.as_str()) {
            exn::bail!(ErrorKind::Network(message.clone()));
        }
        let bytes = data.len() as u64;
        self.objects.write().await.insert(key.to_string(), data);
        Ok(PutReceipt::new(key.clone(), bytes))
    }
}
