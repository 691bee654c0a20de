//! In-memory object store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::events::EventRouter;
use super::keys::validate_key;
use super::object::{ObjectCreated, StoredObject};
use super::{with_timeout, ObjectStore, DEFAULT_TIMEOUT};
use crate::error::{StoreError, StoreResult};

struct Entry {
    object: StoredObject,
    bytes: Vec<u8>,
}

/// Object store backed by a `HashMap`. Contents vanish with the process.
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<HashMap<String, Entry>>,
    events: EventRouter,
    timeout: Duration,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            events: EventRouter::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn not_found(&self, key: &str) -> StoreError {
        StoreError::NotFound {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn events(&self) -> &EventRouter {
        &self.events
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> StoreResult<StoredObject> {
        validate_key(key)?;
        let object = with_timeout("put", key, self.timeout, async {
            let object = StoredObject::describe(&self.bucket, key, &bytes);
            self.objects.write().await.insert(
                key.to_string(),
                Entry {
                    object: object.clone(),
                    bytes,
                },
            );
            Ok(object)
        })
        .await?;

        tracing::debug!(bucket = %self.bucket, key, size = object.size, "Stored object");
        self.events.dispatch(ObjectCreated::new(object.clone())).await;
        Ok(object)
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key)?;
        with_timeout("get", key, self.timeout, async {
            self.objects
                .read()
                .await
                .get(key)
                .map(|e| e.bytes.clone())
                .ok_or_else(|| self.not_found(key))
        })
        .await
    }

    async fn head(&self, key: &str) -> StoreResult<StoredObject> {
        validate_key(key)?;
        with_timeout("head", key, self.timeout, async {
            self.objects
                .read()
                .await
                .get(key)
                .map(|e| e.object.clone())
                .ok_or_else(|| self.not_found(key))
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        with_timeout("delete", key, self.timeout, async {
            self.objects.write().await.remove(key);
            Ok(())
        })
        .await
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        with_timeout("list", prefix, self.timeout, async {
            let mut objects: Vec<StoredObject> = self
                .objects
                .read()
                .await
                .values()
                .filter(|e| e.object.key.starts_with(prefix))
                .map(|e| e.object.clone())
                .collect();
            objects.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(objects)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new("b");
        let object = store.put("input/a.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(object.bucket, "b");
        assert_eq!(object.size, 3);
        assert_eq!(store.get("input/a.png").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.head("input/a.png").await.unwrap(), object);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new("b");
        let err = store.get("output/a.png").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_key() {
        let store = MemoryStore::new("b");
        let err = store.put("../escape", vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new("b");
        store.put("input/a.png", vec![1]).await.unwrap();
        store.delete("input/a.png").await.unwrap();
        store.delete("input/a.png").await.unwrap();
        assert!(store.get("input/a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let store = MemoryStore::new("b");
        store.put("input/b.png", vec![1]).await.unwrap();
        store.put("input/a.png", vec![1]).await.unwrap();
        store.put("output/a.png", vec![1]).await.unwrap();
        let keys: Vec<String> = store
            .list("input/")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["input/a.png", "input/b.png"]);
    }
}
