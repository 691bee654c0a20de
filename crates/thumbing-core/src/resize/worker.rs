//! The resize worker: one input object in, one resized output object out.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ResizeError;
use crate::store::keys::swap_prefix;
use crate::store::{HandlerError, ObjectCreated, ObjectEventHandler, ObjectStore, StoredObject};

use super::dead_letter::{DeadLetter, DeadLetterPolicy};
use super::decode::{format_to_string, ImageDecoder};
use super::resizer::Resizer;
use super::validate::Validator;

/// Principal name the worker's access policy is issued to.
pub const WORKER_PRINCIPAL: &str = "resize-worker";

/// A single resize, built from a create-event under the input prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeJob {
    pub source_key: String,
    pub target_key: String,
    pub target_width: u32,
    pub target_height: u32,
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The key was not under the input prefix; nothing was read or written
    Skipped,
    /// The derivative was written
    Resized(StoredObject),
}

/// Stateless resize worker.
///
/// Holds only configuration and a store handle, so any number of events can
/// be handled concurrently. Reprocessing an event overwrites the output key
/// with byte-identical content.
pub struct ResizeWorker {
    store: Arc<dyn ObjectStore>,
    input_prefix: String,
    output_prefix: String,
    validator: Validator,
    decoder: ImageDecoder,
    resizer: Arc<Resizer>,
    dead_letter: DeadLetterPolicy,
}

impl ResizeWorker {
    /// Create a worker writing through `store`.
    ///
    /// The pipeline controller passes a `ScopedStore` limited to the worker's
    /// read/write policy.
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        let dead_letter = if config.dead_letter.enabled {
            DeadLetterPolicy::Record {
                prefix: config.dead_letter.prefix.clone(),
            }
        } else {
            DeadLetterPolicy::Drop
        };

        Self {
            store,
            input_prefix: config.bucket.input_prefix.clone(),
            output_prefix: config.bucket.output_prefix.clone(),
            validator: Validator::new(config.limits.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            resizer: Arc::new(Resizer::new(config.resize.clone())),
            dead_letter,
        }
    }

    /// Build the job for an event, or `None` if the key is not an input.
    pub fn job_for(&self, event: &ObjectCreated) -> Option<ResizeJob> {
        let source_key = event.key();
        let target_key = swap_prefix(source_key, &self.input_prefix, &self.output_prefix)?;
        let (target_width, target_height) = self.resizer.dimensions();
        Some(ResizeJob {
            source_key: source_key.to_string(),
            target_key,
            target_width,
            target_height,
        })
    }

    /// Process one create-event.
    ///
    /// Exactly one `put` on success, none on any failure path.
    pub async fn handle(&self, event: &ObjectCreated) -> Result<HandleOutcome, ResizeError> {
        let Some(job) = self.job_for(event) else {
            tracing::debug!(key = event.key(), "Not under input prefix, skipping");
            return Ok(HandleOutcome::Skipped);
        };
        self.run(&job).await.map(HandleOutcome::Resized)
    }

    async fn run(&self, job: &ResizeJob) -> Result<StoredObject, ResizeError> {
        let start = std::time::Instant::now();
        tracing::debug!(source = %job.source_key, target = %job.target_key, "Resizing");

        let bytes = self.store.get(&job.source_key).await?;
        self.validator.validate(&job.source_key, &bytes)?;

        let decoded = self.decoder.decode(bytes, &job.source_key).await?;
        let decode_time = start.elapsed();
        tracing::trace!("  Decode: {:?}", decode_time);
        let source = format!(
            "{}x{} {}",
            decoded.width,
            decoded.height,
            format_to_string(decoded.format)
        );

        let resizer = Arc::clone(&self.resizer);
        let source_key = job.source_key.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            resizer.resize_and_encode(&decoded.image, decoded.format, &source_key)
        })
        .await
        .map_err(|e| ResizeError::Encode {
            key: job.source_key.clone(),
            message: format!("Task join error: {}", e),
        })??;
        tracing::trace!("  Resize+encode: {:?}", start.elapsed() - decode_time);

        let object = self.store.put(&job.target_key, encoded).await?;
        tracing::info!(
            source = %job.source_key,
            target = %object.key,
            from = %source,
            to = %format!("{}x{}", job.target_width, job.target_height),
            "Resized in {:?}",
            start.elapsed()
        );
        Ok(object)
    }

    async fn record_dead_letter(&self, event: &ObjectCreated, error: &ResizeError) {
        let Some(record_key) = self.dead_letter.record_key(event.key(), &self.input_prefix) else {
            return;
        };
        let target_key = swap_prefix(event.key(), &self.input_prefix, &self.output_prefix)
            .unwrap_or_default();
        let record = DeadLetter::new(self.store.bucket(), event.key(), &target_key, error);
        let result = match serde_json::to_vec_pretty(&record) {
            Ok(body) => self.store.put(&record_key, body).await.map(|_| ()),
            Err(e) => {
                tracing::error!(key = event.key(), "Cannot serialize dead letter: {}", e);
                return;
            }
        };
        match result {
            Ok(()) => tracing::warn!(key = event.key(), record = %record_key, "Dead-lettered"),
            Err(e) => tracing::error!(key = event.key(), "Failed to write dead letter: {}", e),
        }
    }
}

#[async_trait]
impl ObjectEventHandler for ResizeWorker {
    fn name(&self) -> &str {
        WORKER_PRINCIPAL
    }

    async fn on_object_created(&self, event: &ObjectCreated) -> Result<(), HandlerError> {
        match self.handle(event).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_retryable() => Err(HandlerError::retryable(e.to_string())),
            Err(e) => {
                self.record_dead_letter(event, &e).await;
                Err(HandlerError::fatal(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn config() -> Config {
        let mut config = Config::default();
        config.bucket.name = "b".to_string();
        config.bucket.input_prefix = "input/".to_string();
        config.bucket.output_prefix = "output/".to_string();
        config.resize.width = 32;
        config.resize.height = 24;
        config
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgb([x as u8, y as u8, 200]);
        }
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    // The worker is exercised directly here, with no routes registered.
    fn worker(config: &Config) -> (Arc<dyn ObjectStore>, ResizeWorker) {
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new("b"));
        let worker = ResizeWorker::new(Arc::clone(&store), config);
        (store, worker)
    }

    #[test]
    fn test_job_for_swaps_prefix() {
        let (_, worker) = worker(&config());
        let event = ObjectCreated::new(StoredObject::describe("b", "input/a.png", b""));
        let job = worker.job_for(&event).unwrap();
        assert_eq!(job.target_key, "output/a.png");
        assert_eq!((job.target_width, job.target_height), (32, 24));
    }

    #[tokio::test]
    async fn test_handle_writes_exact_dimensions() {
        let (store, worker) = worker(&config());
        let source = store.put("input/a.png", png(100, 50)).await.unwrap();

        let outcome = worker.handle(&ObjectCreated::new(source)).await.unwrap();
        let HandleOutcome::Resized(object) = outcome else {
            panic!("expected a resize");
        };
        assert_eq!(object.key, "output/a.png");

        let bytes = store.get("output/a.png").await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[tokio::test]
    async fn test_handle_skips_foreign_keys() {
        let (store, worker) = worker(&config());
        let other = store.put("elsewhere/a.png", png(8, 8)).await.unwrap();
        let outcome = worker.handle(&ObjectCreated::new(other)).await.unwrap();
        assert_eq!(outcome, HandleOutcome::Skipped);
        assert!(store.list("output/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_is_idempotent() {
        let (store, worker) = worker(&config());
        let event = ObjectCreated::new(store.put("input/a.png", png(64, 64)).await.unwrap());

        let first = worker.handle(&event).await.unwrap();
        let first_bytes = store.get("output/a.png").await.unwrap();
        let second = worker.handle(&event).await.unwrap();
        let second_bytes = store.get("output/a.png").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[tokio::test]
    async fn test_non_image_is_unsupported_and_writes_nothing() {
        let (store, worker) = worker(&config());
        let event = ObjectCreated::new(store.put("input/a.txt", b"just text".to_vec()).await.unwrap());

        let err = worker.handle(&event).await.unwrap_err();
        assert!(matches!(err, ResizeError::UnsupportedFormat { .. }));
        assert!(matches!(
            store.get("output/a.txt").await,
            Err(StoreError::NotFound { .. })
        ));

        let handler_err = worker.on_object_created(&event).await.unwrap_err();
        assert!(!handler_err.retryable);
        assert!(store.list("").await.unwrap().iter().all(|o| o.key == "input/a.txt"));
    }

    #[tokio::test]
    async fn test_truncated_png_is_unsupported_and_writes_nothing() {
        let (store, worker) = worker(&config());
        let mut bytes = png(64, 64);
        bytes.truncate(60);
        let event = ObjectCreated::new(store.put("input/a.png", bytes).await.unwrap());

        let err = worker.handle(&event).await.unwrap_err();
        assert!(matches!(err, ResizeError::UnsupportedFormat { .. }));
        assert!(!err.is_retryable());
        assert!(store.list("output/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_is_not_retryable() {
        let (_, worker) = worker(&config());
        let event = ObjectCreated::new(StoredObject::describe("b", "input/gone.png", b""));
        let err = worker.on_object_created(&event).await.unwrap_err();
        assert!(!err.retryable);
    }

    #[tokio::test]
    async fn test_dead_letter_records_failure() {
        let mut config = config();
        config.dead_letter.enabled = true;
        let (store, worker) = worker(&config);
        let event = ObjectCreated::new(store.put("input/a.txt", b"just text".to_vec()).await.unwrap());

        assert!(worker.on_object_created(&event).await.is_err());

        let body = store.get("failed/a.txt.json").await.unwrap();
        let record: DeadLetter = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.source_key, "input/a.txt");
        assert_eq!(record.target_key, "output/a.txt");
        assert_eq!(record.kind, "unsupported_format");
        assert!(store.get("output/a.txt").await.is_err());
    }
}
