//! Thumbing Core - event-driven image thumbnailing.
//!
//! Originals uploaded under an input prefix of an object store are resized by
//! a stateless worker and written back under an output prefix. Writes to the
//! output prefix fan out to the subscribers of a notification topic.
//!
//! # Architecture
//!
//! ```text
//! put(input/<id>) → EventRouter → ResizeWorker → put(output/<id>) → EventRouter → Notifier → subscribers
//! ```
//!
//! The worker reaches the store through a `ScopedStore` limited to
//! `GetObject`/`PutObject` on `<bucket>/*`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use thumbing_core::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> thumbing_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::wire(config).await?;
//!
//!     pipeline.upload("user-1.png", std::fs::read("user-1.png")?).await?;
//!     pipeline.wait_idle().await;
//!     let resized = pipeline.get(&pipeline.output_key("user-1.png")).await?;
//!     println!("{} bytes at {}", resized.len(), pipeline.public_url("user-1"));
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod access;
pub mod config;
pub mod discovery;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod resize;
pub mod store;

// Re-exports for convenient access
pub use access::{AccessPolicy, Action};
pub use config::Config;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use error::{ConfigError, NotifyError, ResizeError, Result, StoreError, ThumbingError};
pub use notify::{Notification, Notifier, PublishReport, Subscriber};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use resize::{HandleOutcome, ResizeJob, ResizeWorker};
pub use store::{ObjectCreated, ObjectStore, StoredObject};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
