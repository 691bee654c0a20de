//! HTTP webhook subscriber.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Notification, Subscriber};
use crate::error::NotifyError;

/// JSON body POSTed to webhook endpoints.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    topic: &'a str,
    bucket: &'a str,
    key: &'a str,
    size: u64,
    etag: &'a str,
}

/// Posts each notification as JSON to a fixed URL. Any 2xx is success.
pub struct WebhookSubscriber {
    url: String,
    client: reqwest::Client,
}

impl WebhookSubscriber {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("thumbing/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifyError::Delivery {
                endpoint: url.clone(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Subscriber for WebhookSubscriber {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            event: "object.created",
            topic: &notification.topic,
            bucket: &notification.object.bucket,
            key: &notification.object.key,
            size: notification.object.size,
            etag: &notification.object.etag,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery {
                endpoint: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        tracing::debug!(endpoint = %self.url, key = %notification.object.key, "Webhook delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredObject;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> Notification {
        Notification {
            topic: "thumbs".to_string(),
            object: StoredObject::describe("b", "output/a.png", b"png"),
        }
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/thumbs"))
            .and(body_partial_json(serde_json::json!({
                "event": "object.created",
                "topic": "thumbs",
                "bucket": "b",
                "key": "output/a.png",
                "size": 3
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let subscriber =
            WebhookSubscriber::new(format!("{}/hooks/thumbs", server.uri()), Duration::from_secs(2))
                .unwrap();
        subscriber.deliver(&notification()).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let subscriber = WebhookSubscriber::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = subscriber.deliver(&notification()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_delivery_error() {
        let subscriber =
            WebhookSubscriber::new("http://127.0.0.1:9/unreachable", Duration::from_millis(500)).unwrap();
        let err = subscriber.deliver(&notification()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Delivery { .. }));
    }
}
