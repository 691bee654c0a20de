//! Local filesystem object store.
//!
//! Objects live at `<root>/<bucket>/<key>`. Writes land in a hidden temp file
//! next to the target and are renamed into place, so a concurrent reader sees
//! either the old object or the new one, never a partial write.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use walkdir::WalkDir;

use super::events::EventRouter;
use super::keys::validate_key;
use super::object::{ObjectCreated, StoredObject};
use super::{with_timeout, ObjectStore, DEFAULT_TIMEOUT};
use crate::error::{StoreError, StoreResult};

const TEMP_MARKER: &str = ".tmp-";

pub struct LocalStore {
    bucket: String,
    base_path: PathBuf,
    events: EventRouter,
    timeout: Duration,
    temp_counter: AtomicU64,
}

impl LocalStore {
    /// Open (creating if needed) the bucket directory under `root`.
    pub async fn open(root: impl Into<PathBuf>, bucket: &str) -> StoreResult<Self> {
        validate_key(bucket)?;
        let base_path = root.into().join(bucket);
        fs::create_dir_all(&base_path).await?;

        Ok(Self {
            bucket: bucket.to_string(),
            base_path,
            events: EventRouter::new(),
            timeout: DEFAULT_TIMEOUT,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory holding this bucket's objects.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}{TEMP_MARKER}{}-{n}", std::process::id()))
    }

    fn map_read_error(&self, key: &str, e: std::io::Error) -> StoreError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            }
        } else {
            StoreError::Io(e)
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn events(&self) -> &EventRouter {
        &self.events
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> StoreResult<StoredObject> {
        let path = self.key_to_path(key)?;
        let object = StoredObject::describe(&self.bucket, key, &bytes);

        with_timeout("put", key, self.timeout, async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let temp = self.temp_path(&path);
            fs::write(&temp, &bytes).await?;
            if let Err(e) = fs::rename(&temp, &path).await {
                let _ = fs::remove_file(&temp).await;
                return Err(StoreError::Io(e));
            }
            Ok(())
        })
        .await?;

        tracing::debug!(bucket = %self.bucket, key, size = object.size, "Stored object");
        self.events.dispatch(ObjectCreated::new(object.clone())).await;
        Ok(object)
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        with_timeout("get", key, self.timeout, async {
            fs::read(&path).await.map_err(|e| self.map_read_error(key, e))
        })
        .await
    }

    async fn head(&self, key: &str) -> StoreResult<StoredObject> {
        let bytes = self.get(key).await?;
        Ok(StoredObject::describe(&self.bucket, key, &bytes))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.key_to_path(key)?;
        with_timeout("delete", key, self.timeout, async {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Io(e)),
            }
        })
        .await
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        let base = self.base_path.clone();
        let bucket = self.bucket.clone();
        let prefix_owned = prefix.to_string();

        let listing = tokio::task::spawn_blocking(move || list_sync(&base, &bucket, &prefix_owned));
        with_timeout("list", prefix, self.timeout, async {
            listing.await.map_err(|e| StoreError::Backend {
                key: prefix.to_string(),
                message: format!("List task failed: {e}"),
            })?
        })
        .await
    }
}

/// Walk the bucket directory (runs in spawn_blocking).
fn list_sync(base: &Path, bucket: &str, prefix: &str) -> StoreResult<Vec<StoredObject>> {
    let mut objects = Vec::new();
    for entry in WalkDir::new(base).follow_links(false) {
        let entry = entry.map_err(|e| StoreError::Backend {
            key: prefix.to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') && name.contains(TEMP_MARKER) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !key.starts_with(prefix) {
            continue;
        }
        let bytes = std::fs::read(entry.path())?;
        objects.push(StoredObject::describe(bucket, &key, &bytes));
    }
    objects.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_under_bucket_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path(), "b").await.unwrap();
        let object = store.put("input/a.png", vec![9, 9]).await.unwrap();
        assert_eq!(object.size, 2);
        assert_eq!(std::fs::read(dir.path().join("b/input/a.png")).unwrap(), vec![9, 9]);
        assert_eq!(store.get("input/a.png").await.unwrap(), vec![9, 9]);
        assert_eq!(store.head("input/a.png").await.unwrap().etag, object.etag);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path(), "b").await.unwrap();
        let err = store.get("output/missing.png").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_put_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path(), "b").await.unwrap();
        store.put("output/a.png", vec![1]).await.unwrap();
        store.put("output/a.png", vec![2, 2]).await.unwrap();
        assert_eq!(store.get("output/a.png").await.unwrap(), vec![2, 2]);

        let names: Vec<String> = std::fs::read_dir(dir.path().join("b/output"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png"]);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path(), "b").await.unwrap();
        store.put("input/x/b.png", vec![1]).await.unwrap();
        store.put("input/a.png", vec![1]).await.unwrap();
        store.put("output/a.png", vec![1]).await.unwrap();

        let keys: Vec<String> = store.list("input/").await.unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["input/a.png", "input/x/b.png"]);

        store.delete("input/a.png").await.unwrap();
        store.delete("input/a.png").await.unwrap();
        assert_eq!(store.list("input/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path(), "b").await.unwrap();
        assert!(matches!(
            store.put("../outside.png", vec![1]).await,
            Err(StoreError::InvalidKey { .. })
        ));
    }
}
