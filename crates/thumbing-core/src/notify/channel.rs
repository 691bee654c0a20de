//! In-process subscribers backed by bounded channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Notification, Subscriber};
use crate::error::NotifyError;

/// Create a bounded subscriber/receiver pair.
///
/// When the buffer is full, `deliver` waits for room; the notifier's
/// delivery timeout bounds that wait, so a stalled consumer only loses its
/// own notifications.
pub fn subscription_channel(
    name: impl Into<String>,
    buffer: usize,
) -> (ChannelSubscriber, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (
        ChannelSubscriber {
            name: name.into(),
            tx,
        },
        rx,
    )
}

/// Subscriber that forwards notifications into an `mpsc` channel.
pub struct ChannelSubscriber {
    name: String,
    tx: mpsc::Sender<Notification>,
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    fn endpoint(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification.clone())
            .await
            .map_err(|_| NotifyError::Delivery {
                endpoint: self.name.clone(),
                message: "receiver dropped".to_string(),
            })
    }
}
