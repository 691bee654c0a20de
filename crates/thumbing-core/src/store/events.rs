//! Prefix-routed object-created events.
//!
//! A store owns one `EventRouter`. Handlers are registered against a key
//! prefix; every successful `put` spawns one delivery per matching route.
//! Deliveries run independently, so a slow or failing handler never holds up
//! the writer or other events. Spawned deliveries are never aborted.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::{Notify, RwLock};

use super::object::ObjectCreated;
use super::retry::RetryPolicy;

/// Failure reported by a handler for one event.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    /// Whether the router should redeliver the event
    pub retryable: bool,
}

impl HandlerError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Receives object-created events for a registered prefix.
///
/// Delivery is at-least-once: implementations must tolerate the same event
/// more than once.
#[async_trait]
pub trait ObjectEventHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    async fn on_object_created(&self, event: &ObjectCreated) -> Result<(), HandlerError>;
}

// Handlers usually hold the store that owns this router, so routes keep
// them weakly and the registrant owns them.
struct Route {
    prefix: String,
    handler: Weak<dyn ObjectEventHandler>,
    retry: RetryPolicy,
}

/// Count of running deliveries, with a wakeup when it drops to zero.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when a delivery ends, panics included.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Routes create-events to handlers by exact key prefix.
#[derive(Default)]
pub struct EventRouter {
    routes: RwLock<Vec<Route>>,
    in_flight: Arc<InFlight>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for keys starting with `prefix`.
    ///
    /// The router only keeps a weak reference: the route goes quiet once the
    /// caller drops its last `Arc` to the handler. Registering the same prefix
    /// again replaces the earlier handler.
    pub async fn register(
        &self,
        prefix: impl Into<String>,
        handler: Arc<dyn ObjectEventHandler>,
        retry: RetryPolicy,
    ) {
        let prefix = prefix.into();
        tracing::debug!(prefix = %prefix, handler = handler.name(), "Registering event route");
        let mut routes = self.routes.write().await;
        routes.retain(|r| r.prefix != prefix && r.handler.strong_count() > 0);
        routes.push(Route {
            prefix,
            handler: Arc::downgrade(&handler),
            retry,
        });
    }

    /// Prefixes with a live handler, in registration order.
    pub async fn routes(&self) -> Vec<String> {
        self.routes
            .read()
            .await
            .iter()
            .filter(|r| r.handler.strong_count() > 0)
            .map(|r| r.prefix.clone())
            .collect()
    }

    /// Spawn one delivery per live route matching the event's key.
    ///
    /// Returns the number of deliveries started; zero for keys outside every
    /// registered prefix.
    pub async fn dispatch(&self, event: ObjectCreated) -> usize {
        let targets: Vec<(Arc<dyn ObjectEventHandler>, RetryPolicy)> = self
            .routes
            .read()
            .await
            .iter()
            .filter(|r| event.key().starts_with(&r.prefix))
            .filter_map(|r| r.handler.upgrade().map(|h| (h, r.retry)))
            .collect();

        if targets.is_empty() {
            tracing::trace!(key = event.key(), "No route for key");
            return 0;
        }

        let count = targets.len();
        for (handler, retry) in targets {
            let event = event.clone();
            let guard = InFlightGuard::enter(&self.in_flight);
            tokio::spawn(async move {
                let name = handler.name().to_string();
                let key = event.key().to_string();
                let delivery = AssertUnwindSafe(deliver(handler, event, retry)).catch_unwind();
                if delivery.await.is_err() {
                    tracing::error!(handler = %name, key = %key, "Event delivery panicked");
                }
                drop(guard);
            });
        }
        count
    }

    /// Wait until every delivery, including ones started by other deliveries,
    /// has finished.
    ///
    /// Any number of callers may wait at once. Dropping the returned future
    /// only stops waiting; deliveries keep running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            tokio::pin!(notified);
            // Register before checking the count so a concurrent finish isn't missed.
            notified.as_mut().enable();
            if self.in_flight.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

async fn deliver(handler: Arc<dyn ObjectEventHandler>, event: ObjectCreated, retry: RetryPolicy) {
    let mut attempt = 0;
    loop {
        match handler.on_object_created(&event).await {
            Ok(()) => return,
            Err(e) if e.retryable && attempt < retry.max_retries => {
                let delay = retry.delay(attempt);
                tracing::warn!(
                    handler = handler.name(),
                    key = event.key(),
                    attempt = attempt + 1,
                    "Redelivering in {:?}: {}",
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    handler = handler.name(),
                    key = event.key(),
                    attempts = attempt + 1,
                    "Dropping event: {}",
                    e
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::object::StoredObject;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting {
        calls: AtomicU32,
        fail_first: u32,
        retryable: bool,
    }

    impl Counting {
        fn new(fail_first: u32, retryable: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_first,
                retryable,
            })
        }
    }

    #[async_trait]
    impl ObjectEventHandler for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_object_created(&self, _event: &ObjectCreated) -> Result<(), HandlerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(HandlerError {
                    message: "boom".to_string(),
                    retryable: self.retryable,
                });
            }
            Ok(())
        }
    }

    fn event(key: &str) -> ObjectCreated {
        ObjectCreated::new(StoredObject::describe("b", key, b"x"))
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_dispatch_matches_prefix_only() {
        let router = EventRouter::new();
        let input = Counting::new(0, false);
        let output = Counting::new(0, false);
        router.register("input/", input.clone(), RetryPolicy::none()).await;
        router.register("output/", output.clone(), RetryPolicy::none()).await;

        assert_eq!(router.dispatch(event("input/a.png")).await, 1);
        assert_eq!(router.dispatch(event("output/a.png")).await, 1);
        assert_eq!(router.dispatch(event("elsewhere/a.png")).await, 0);
        assert_eq!(router.dispatch(event("inputs/a.png")).await, 0);
        router.wait_idle().await;

        assert_eq!(input.calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_same_prefix_replaces() {
        let router = EventRouter::new();
        let first = Counting::new(0, false);
        let second = Counting::new(0, false);
        router.register("input/", first.clone(), RetryPolicy::none()).await;
        router.register("input/", second.clone(), RetryPolicy::none()).await;
        assert_eq!(router.routes().await, vec!["input/".to_string()]);

        router.dispatch(event("input/a.png")).await;
        router.wait_idle().await;
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retryable_failures_are_redelivered() {
        let router = EventRouter::new();
        let handler = Counting::new(2, true);
        router.register("input/", handler.clone(), fast_retry(3)).await;

        router.dispatch(event("input/a.png")).await;
        router.wait_idle().await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_redelivery_gives_up_after_max_retries() {
        let router = EventRouter::new();
        let handler = Counting::new(u32::MAX, true);
        router.register("input/", handler.clone(), fast_retry(2)).await;

        router.dispatch(event("input/a.png")).await;
        router.wait_idle().await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_failures_are_not_redelivered() {
        let router = EventRouter::new();
        let handler = Counting::new(1, false);
        router.register("input/", handler.clone(), fast_retry(3)).await;

        router.dispatch(event("input/a.png")).await;
        router.wait_idle().await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_on_empty_router_returns() {
        EventRouter::new().wait_idle().await;
    }

    struct Slow {
        delay: std::time::Duration,
        done: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ObjectEventHandler for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn on_object_created(&self, _event: &ObjectCreated) -> Result<(), HandlerError> {
            tokio::time::sleep(self.delay).await;
            self.done.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn slow(millis: u64) -> Arc<Slow> {
        Arc::new(Slow {
            delay: std::time::Duration::from_millis(millis),
            done: std::sync::atomic::AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn test_concurrent_waiters_both_see_delivery_finish() {
        let router = Arc::new(EventRouter::new());
        let handler = slow(300);
        router.register("input/", handler.clone(), RetryPolicy::none()).await;
        router.dispatch(event("input/a.png")).await;

        let first = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.wait_idle().await })
        };
        tokio::task::yield_now().await;
        router.wait_idle().await;
        assert!(handler.done.load(Ordering::SeqCst));
        first.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_wait_does_not_abort_delivery() {
        let router = EventRouter::new();
        let handler = slow(200);
        router.register("input/", handler.clone(), RetryPolicy::none()).await;
        router.dispatch(event("input/a.png")).await;

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(10), router.wait_idle()).await;
        assert!(waited.is_err());

        router.wait_idle().await;
        assert!(handler.done.load(Ordering::SeqCst));
    }

    struct Panicking;

    #[async_trait]
    impl ObjectEventHandler for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn on_object_created(&self, _event: &ObjectCreated) -> Result<(), HandlerError> {
            panic!("handler bug");
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_still_settles() {
        let router = EventRouter::new();
        let handler: Arc<dyn ObjectEventHandler> = Arc::new(Panicking);
        router.register("input/", handler.clone(), RetryPolicy::none()).await;

        assert_eq!(router.dispatch(event("input/a.png")).await, 1);
        router.wait_idle().await;
        assert_eq!(router.in_flight.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropped_handler_route_goes_quiet() {
        let router = EventRouter::new();
        let handler = Counting::new(0, false);
        router.register("input/", handler.clone(), RetryPolicy::none()).await;
        drop(handler);

        assert!(router.routes().await.is_empty());
        assert_eq!(router.dispatch(event("input/a.png")).await, 0);
    }
}
