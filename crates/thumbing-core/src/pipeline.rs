//! Pipeline wiring: store → resize worker → notifier.
//!
//! `Pipeline::wire` validates configuration before creating anything, issues
//! the worker its read/write policy, and registers the input- and
//! output-prefix routes on the store. The returned `Pipeline` is the only
//! holder of wiring state.

use std::sync::Arc;
use std::time::Duration;

use crate::access::AccessPolicy;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::notify::{Notifier, Subscriber, WebhookSubscriber};
use crate::resize::{ResizeWorker, WORKER_PRINCIPAL};
use crate::store::keys::{public_url, validate_key};
use crate::store::{self, ObjectStore, RetryPolicy, ScopedStore, StoredObject};

/// Builder for pipelines with an injected store or extra subscribers.
pub struct PipelineBuilder {
    config: Config,
    store: Option<Arc<dyn ObjectStore>>,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl PipelineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            subscribers: Vec::new(),
        }
    }

    /// Use `store` instead of building one from `config.store`.
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach a subscriber to the notifier topic in addition to the webhook.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validate, create, and register everything.
    pub async fn wire(self) -> Result<Pipeline> {
        let config = self.config;
        config.validate()?;
        if config.notify.topic_name.is_none() && !self.subscribers.is_empty() {
            return Err(ConfigError::ValidationError(
                "subscribers require notify.topic_name".to_string(),
            )
            .into());
        }

        let store = match self.store {
            Some(store) => {
                if store.bucket() != config.bucket.name {
                    return Err(ConfigError::ValidationError(format!(
                        "store serves bucket {:?} but bucket.name is {:?}",
                        store.bucket(),
                        config.bucket.name
                    ))
                    .into());
                }
                store
            }
            None => store::from_config(&config).await?,
        };

        let policy = Arc::new(AccessPolicy::read_write(
            WORKER_PRINCIPAL,
            &config.bucket.name,
        ));

        let worker = if config.resize.enabled {
            let scoped: Arc<dyn ObjectStore> =
                Arc::new(ScopedStore::new(Arc::clone(&store), Arc::clone(&policy)));
            let worker = Arc::new(ResizeWorker::new(scoped, &config));
            store
                .events()
                .register(
                    config.bucket.input_prefix.clone(),
                    worker.clone(),
                    RetryPolicy::from_config(&config.pipeline),
                )
                .await;
            Some(worker)
        } else {
            None
        };

        let notifier = match &config.notify.topic_name {
            Some(topic) => {
                let timeout = Duration::from_millis(config.notify.delivery_timeout_ms);
                let mut notifier = Notifier::new(topic.clone(), timeout);
                if let Some(url) = &config.notify.webhook_url {
                    notifier.subscribe(Arc::new(WebhookSubscriber::new(url.clone(), timeout)?));
                }
                for subscriber in self.subscribers {
                    notifier.subscribe(subscriber);
                }
                let notifier = Arc::new(notifier);
                store
                    .events()
                    .register(
                        config.bucket.output_prefix.clone(),
                        notifier.clone(),
                        RetryPolicy::none(),
                    )
                    .await;
                Some(notifier)
            }
            None => None,
        };

        tracing::info!(
            bucket = %config.bucket.name,
            input = %config.bucket.input_prefix,
            output = %config.bucket.output_prefix,
            resize = worker.is_some(),
            topic = notifier.as_ref().map(|n| n.topic()).unwrap_or("-"),
            "Pipeline wired"
        );

        Ok(Pipeline {
            config,
            store,
            policy,
            worker,
            notifier,
        })
    }
}

/// A wired pipeline.
///
/// Owns the route handlers; the store's router only refers to them weakly, so
/// dropping the pipeline unwires it and releases the store.
pub struct Pipeline {
    config: Config,
    store: Arc<dyn ObjectStore>,
    policy: Arc<AccessPolicy>,
    worker: Option<Arc<ResizeWorker>>,
    notifier: Option<Arc<Notifier>>,
}

impl Pipeline {
    /// Wire a pipeline with the store described by `config.store`.
    pub async fn wire(config: Config) -> Result<Self> {
        PipelineBuilder::new(config).wire().await
    }

    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying store, with full access.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// The policy issued to the resize worker.
    pub fn worker_policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn worker(&self) -> Option<&Arc<ResizeWorker>> {
        self.worker.as_ref()
    }

    pub fn notifier(&self) -> Option<&Arc<Notifier>> {
        self.notifier.as_ref()
    }

    /// Upload an original under the input prefix.
    ///
    /// `name` is the identifier, e.g. `user-1.png`. Since the prefixes never
    /// nest, an upload can't land under the output prefix; only the worker
    /// writes there.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<StoredObject> {
        let key = format!("{}{}", self.config.bucket.input_prefix, name);
        validate_key(&key)?;
        Ok(self.store.put(&key, bytes).await?)
    }

    /// Read any object in the bucket.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        Ok(self.store.get(key).await?)
    }

    /// Key of the resized object for an uploaded name.
    pub fn output_key(&self, name: &str) -> String {
        format!("{}{}", self.config.bucket.output_prefix, name)
    }

    /// Public URL of a processed avatar, by identifier without extension.
    pub fn public_url(&self, id: &str) -> String {
        public_url(
            &self.config.public.asset_host,
            &self.config.bucket.output_prefix,
            id,
        )
    }

    /// Wait until every in-flight event (and the events it triggers) is handled.
    pub async fn wait_idle(&self) {
        self.store.events().wait_idle().await;
    }
}
