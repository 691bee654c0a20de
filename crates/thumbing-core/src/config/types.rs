//! Sub-configuration structs with defaults matching the deployed stack.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bucket identity and the two monitored key prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Bucket name
    pub name: String,

    /// Key prefix that triggers the resize worker
    pub input_prefix: String,

    /// Key prefix that receives resized objects and triggers the notifier
    pub output_prefix: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            name: "thumbing-assets".to_string(),
            input_prefix: "avatar/original/".to_string(),
            output_prefix: "avatar/processed/".to_string(),
        }
    }
}

/// Resize worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Whether the input-prefix route is registered
    pub enabled: bool,

    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Resampling filter
    pub filter: ResizeFilter,

    /// Output encoding
    pub format: OutputFormat,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 512,
            height: 512,
            filter: ResizeFilter::Lanczos3,
            format: OutputFormat::Source,
        }
    }
}

/// Resampling filter used when scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Encoding of the resized derivative.
///
/// `Source` keeps the detected input format so the output key's extension
/// stays truthful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Source,
    Png,
    Jpeg,
    Webp,
}

/// Notifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Topic name; the output-prefix route is only registered when set
    pub topic_name: Option<String>,

    /// Single webhook subscriber registered at wiring time
    pub webhook_url: Option<String>,

    /// Per-subscriber delivery timeout in milliseconds
    pub delivery_timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            topic_name: None,
            webhook_url: None,
            delivery_timeout_ms: 5000,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// "memory" or "local"
    pub backend: StoreBackend,

    /// Root directory for the local backend
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            root: PathBuf::from("~/.thumbing/store"),
        }
    }
}

/// Available object store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Local,
}

/// Redelivery settings for the event router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max redeliveries for retryable handler failures
    pub retry_attempts: u32,

    /// Base delay between redeliveries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 200,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum source object size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum source image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Per-operation store timeout in milliseconds
    pub store_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            store_timeout_ms: 10000,
        }
    }
}

/// What happens to events that fail for good.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadLetterConfig {
    /// Record failures instead of dropping them
    pub enabled: bool,

    /// Key prefix for dead-letter records
    pub prefix: String,
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: "failed/".to_string(),
        }
    }
}

/// Public read surface for processed assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicConfig {
    /// Host serving the output prefix over HTTPS
    pub asset_host: String,
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            asset_host: "assets.localhost".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
