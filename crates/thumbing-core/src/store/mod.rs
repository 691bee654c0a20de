//! Key-addressed object storage with prefix-scoped event emission.
//!
//! - **object**: `StoredObject` references and `ObjectCreated` events
//! - **keys**: key validation and prefix arithmetic
//! - **events**: the prefix router handlers register with
//! - **retry**: redelivery backoff
//! - **memory** / **local**: backends
//! - **scoped**: policy-enforcing wrapper handed to the worker

pub mod events;
pub mod keys;
pub mod local;
pub mod memory;
pub mod object;
pub mod retry;
pub mod scoped;

pub use events::{EventRouter, HandlerError, ObjectEventHandler};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use object::{ObjectCreated, StoredObject};
pub use retry::RetryPolicy;
pub use scoped::ScopedStore;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StoreBackend};
use crate::error::{StoreError, StoreResult};

/// Object storage interface shared by every backend.
///
/// `put` emits an `ObjectCreated` to every route registered on `events()`
/// whose prefix the key starts with. Every operation is bounded by the
/// backend's timeout.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store serves.
    fn bucket(&self) -> &str;

    /// Register-handler capability for create-events.
    fn events(&self) -> &EventRouter;

    /// Write `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> StoreResult<StoredObject>;

    /// Read the object at `key`.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Object metadata without the content.
    async fn head(&self, key: &str) -> StoreResult<StoredObject>;

    /// Remove the object at `key`; absent keys are not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Objects whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<StoredObject>>;
}

/// Build the store named by `config.store`.
pub async fn from_config(config: &Config) -> StoreResult<Arc<dyn ObjectStore>> {
    let timeout = Duration::from_millis(config.limits.store_timeout_ms);
    let store: Arc<dyn ObjectStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(&config.bucket.name).with_timeout(timeout)),
        StoreBackend::Local => Arc::new(
            LocalStore::open(config.store_root(), &config.bucket.name)
                .await?
                .with_timeout(timeout),
        ),
    };
    tracing::debug!(
        backend = ?config.store.backend,
        bucket = %config.bucket.name,
        "Object store ready"
    );
    Ok(store)
}

/// Run a backend operation under a deadline.
pub(crate) async fn with_timeout<T, F>(
    operation: &str,
    key: &str,
    limit: Duration,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation: operation.to_string(),
            key: key.to_string(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

/// Default per-operation deadline when a backend is built without config.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
