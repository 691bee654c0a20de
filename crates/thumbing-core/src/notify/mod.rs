//! Topic fan-out for newly written derivatives.
//!
//! A `Notifier` owns a topic name and a fixed list of subscribers. Each
//! publish delivers to every subscriber concurrently, at most once, with no
//! retry. One subscriber failing or timing out never blocks or rolls back
//! delivery to the others.

pub mod channel;
pub mod webhook;

pub use channel::{subscription_channel, ChannelSubscriber};
pub use webhook::WebhookSubscriber;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::NotifyError;
use crate::store::{HandlerError, ObjectCreated, ObjectEventHandler, StoredObject};

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub topic: String,
    pub object: StoredObject,
}

/// An endpoint attached to a topic.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Endpoint description for logging (URL, channel name).
    fn endpoint(&self) -> &str;

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Named channel with zero or more subscribers.
pub struct Notifier {
    topic: String,
    subscribers: Vec<Arc<dyn Subscriber>>,
    delivery_timeout: Duration,
}

impl Notifier {
    pub fn new(topic: impl Into<String>, delivery_timeout: Duration) -> Self {
        Self {
            topic: topic.into(),
            subscribers: Vec::new(),
            delivery_timeout,
        }
    }

    /// Attach a subscriber. Subscribers are fixed once the notifier is wired.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber>) {
        tracing::debug!(topic = %self.topic, endpoint = subscriber.endpoint(), "Subscribed");
        self.subscribers.push(subscriber);
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every current subscriber.
    pub async fn publish(&self, event: &ObjectCreated) -> PublishReport {
        let notification = Notification {
            topic: self.topic.clone(),
            object: event.object.clone(),
        };

        let deliveries = self
            .subscribers
            .iter()
            .map(|s| self.deliver_one(s.as_ref(), &notification));
        let results = join_all(deliveries).await;

        let mut report = PublishReport::default();
        for result in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(topic = %self.topic, key = event.key(), "{}", e);
                }
            }
        }
        tracing::debug!(
            topic = %self.topic,
            key = event.key(),
            delivered = report.delivered,
            failed = report.failed,
            "Published"
        );
        report
    }

    async fn deliver_one(
        &self,
        subscriber: &dyn Subscriber,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        match tokio::time::timeout(self.delivery_timeout, subscriber.deliver(notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout {
                endpoint: subscriber.endpoint().to_string(),
                timeout_ms: self.delivery_timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl ObjectEventHandler for Notifier {
    fn name(&self) -> &str {
        "notifier"
    }

    /// Fire-and-forget: delivery failures are reported by `publish` and never
    /// trigger redelivery.
    async fn on_object_created(&self, event: &ObjectCreated) -> Result<(), HandlerError> {
        self.publish(event).await;
        Ok(())
    }
}
