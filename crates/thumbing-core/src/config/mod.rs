//! Configuration management for Thumbing.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults, then `THUMBING_*` environment variables are layered on top.
//! All config structs implement `Default` with the deployed values.

mod env;
mod types;
mod validate;

pub use env::EnvOverrides;
pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Thumbing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bucket identity and prefixes
    pub bucket: BucketConfig,

    /// Resize worker settings
    pub resize: ResizeConfig,

    /// Notifier settings
    pub notify: NotifyConfig,

    /// Storage backend
    pub store: StoreConfig,

    /// Redelivery settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Dead-letter policy
    pub dead_letter: DeadLetterConfig,

    /// Public asset URLs
    pub public: PublicConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, then apply environment
    /// overrides.
    ///
    /// Returns default configuration (plus overrides) if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env(&EnvOverrides::from_env())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_from(path)?;
        config.apply_env(&EnvOverrides::from_env())?;
        config.validate()?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string without validating it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.thumbing.thumbing/config.toml
    /// - Linux: ~/.config/thumbing/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\thumbing\config\config.toml
    ///
    /// Falls back to ~/.thumbing/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "thumbing", "thumbing")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".thumbing").join("config.toml")
            })
    }

    /// Get the resolved local store root (with ~ expansion).
    pub fn store_root(&self) -> PathBuf {
        let path_str = self.store.root.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.resize.width, 512);
        assert_eq!(config.resize.height, 512);
        assert_eq!(config.bucket.output_prefix, "avatar/processed/");
        assert!(config.notify.topic_name.is_none());
        assert!(!config.dead_letter.enabled);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[bucket]"));
        assert!(toml.contains("[resize]"));
        assert!(toml.contains("filter = \"lanczos3\""));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [bucket]
            name = "b"
            input_prefix = "input/"
            output_prefix = "output/"

            [resize]
            width = 128
            format = "webp"
            filter = "catmull-rom"

            [notify]
            topic_name = "thumbnails"
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket.name, "b");
        assert_eq!(config.resize.width, 128);
        assert_eq!(config.resize.height, 512);
        assert_eq!(config.resize.format, OutputFormat::Webp);
        assert_eq!(config.resize.filter, ResizeFilter::CatmullRom);
        assert_eq!(config.notify.topic_name.as_deref(), Some("thumbnails"));
        assert_eq!(config.notify.delivery_timeout_ms, 5000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resize]\nwidth = 64\nheight = 32\n").unwrap();
        let config = Config::read_from(&path).unwrap();
        assert_eq!(config.resize.width, 64);
        assert_eq!(config.resize.height, 32);
    }

    #[test]
    fn test_store_root_expands_tilde() {
        let config = Config::default();
        assert!(!config.store_root().to_string_lossy().starts_with('~'));
    }
}
