//! Policy-enforcing store wrapper.

use async_trait::async_trait;
use std::sync::Arc;

use super::events::EventRouter;
use super::object::StoredObject;
use super::ObjectStore;
use crate::access::{AccessPolicy, Action};
use crate::error::{StoreError, StoreResult};

/// A view of a store limited to what an `AccessPolicy` allows.
///
/// Every call is checked against the policy before it reaches the inner
/// store; denied calls fail with `StoreError::AccessDenied` and have no side
/// effects.
pub struct ScopedStore {
    inner: Arc<dyn ObjectStore>,
    policy: Arc<AccessPolicy>,
}

impl ScopedStore {
    pub fn new(inner: Arc<dyn ObjectStore>, policy: Arc<AccessPolicy>) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn authorize(&self, action: Action, key: &str) -> StoreResult<()> {
        let resource = format!("{}/{}", self.inner.bucket(), key);
        if self.policy.allows(action, &resource) {
            Ok(())
        } else {
            tracing::warn!(
                principal = self.policy.principal(),
                %action,
                resource = %resource,
                "Access denied"
            );
            Err(StoreError::AccessDenied {
                principal: self.policy.principal().to_string(),
                action: action.to_string(),
                resource,
            })
        }
    }
}

#[async_trait]
impl ObjectStore for ScopedStore {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn events(&self) -> &EventRouter {
        self.inner.events()
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> StoreResult<StoredObject> {
        self.authorize(Action::PutObject, key)?;
        self.inner.put(key, bytes).await
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.authorize(Action::GetObject, key)?;
        self.inner.get(key).await
    }

    async fn head(&self, key: &str) -> StoreResult<StoredObject> {
        self.authorize(Action::GetObject, key)?;
        self.inner.head(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.authorize(Action::DeleteObject, key)?;
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<StoredObject>> {
        self.authorize(Action::ListBucket, prefix)?;
        self.inner.list(prefix).await
    }
}
