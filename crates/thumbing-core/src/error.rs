//! Error types for the Thumbing pipeline.
//!
//! Errors are organized by component so a failure names the key, topic or
//! config field it concerns. Per-event errors (`ResizeError`, `NotifyError`)
//! stay contained to the event that raised them; `ConfigError` aborts wiring.

use thiserror::Error;

/// Top-level error type for Thumbing operations.
#[derive(Error, Debug)]
pub enum ThumbingError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Object store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Resize worker errors
    #[error("Resize error: {0}")]
    Resize(#[from] ResizeError),

    /// Notification delivery errors
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Object store errors.
///
/// `Timeout`, `Backend` and `Io` are transient storage failures; the event
/// router may redeliver the event that hit them.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No object at the key
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Key is empty, absolute or escapes the bucket
    #[error("Invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The caller's access policy does not allow the operation
    #[error("Access denied: {principal} may not {action} on {resource}")]
    AccessDenied {
        principal: String,
        action: String,
        resource: String,
    },

    /// Backend operation exceeded its deadline
    #[error("Store {operation} timed out for {key} after {timeout_ms}ms")]
    Timeout {
        operation: String,
        key: String,
        timeout_ms: u64,
    },

    /// Backend reported a failure
    #[error("Storage backend error for {key}: {message}")]
    Backend { key: String, message: String },

    /// Filesystem error from a local backend
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether a retry of the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout { .. } | StoreError::Backend { .. } | StoreError::Io(_)
        )
    }
}

/// Resize worker errors, organized by stage.
#[derive(Error, Debug)]
pub enum ResizeError {
    /// Source bytes are not a recognized image, or fail to decode
    #[error("Unsupported format for {key}: {message}")]
    UnsupportedFormat { key: String, message: String },

    /// Re-encoding the resized image failed
    #[error("Encode error for {key}: {message}")]
    Encode { key: String, message: String },

    /// Source object exceeds the size limit
    #[error("Object too large: {key} ({size_mb}MB > {max_mb}MB)")]
    TooLarge { key: String, size_mb: u64, max_mb: u64 },

    /// Image dimensions exceed the limit
    #[error("Image too large: {key} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        key: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// A processing stage exceeded its deadline
    #[error("Timeout in {stage} stage for {key} after {timeout_ms}ms")]
    Timeout {
        key: String,
        stage: String,
        timeout_ms: u64,
    },

    /// Reading the source or writing the derivative failed
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ResizeError {
    /// Determine whether redelivering the event could succeed.
    ///
    /// Only transient storage failures are retryable. Stage timeouts depend
    /// on the source bytes, so they repeat on redelivery like any other bad
    /// input (unsupported or oversized images, missing sources).
    pub fn is_retryable(&self) -> bool {
        match self {
            ResizeError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Short machine-readable kind, used in dead-letter records.
    pub fn kind(&self) -> &'static str {
        match self {
            ResizeError::UnsupportedFormat { .. } => "unsupported_format",
            ResizeError::Encode { .. } => "encode",
            ResizeError::TooLarge { .. } => "too_large",
            ResizeError::ImageTooLarge { .. } => "image_too_large",
            ResizeError::Timeout { .. } => "timeout",
            ResizeError::Storage(StoreError::NotFound { .. }) => "not_found",
            ResizeError::Storage(_) => "storage",
        }
    }
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport-level failure reaching the subscriber
    #[error("Delivery to {endpoint} failed: {message}")]
    Delivery { endpoint: String, message: String },

    /// Subscriber answered with a non-success status
    #[error("Delivery to {endpoint} rejected with HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Subscriber did not answer in time
    #[error("Delivery to {endpoint} timed out after {timeout_ms}ms")]
    Timeout { endpoint: String, timeout_ms: u64 },
}

/// Convenience type alias for Thumbing results.
pub type Result<T> = std::result::Result<T, ThumbingError>;

/// Convenience type alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
