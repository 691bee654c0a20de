//! CLI command implementations.

pub mod config;
pub mod get;
pub mod policy;
pub mod upload;

use std::path::Path;

use thumbing_core::Config;

/// Load configuration from `path`, or the default location when `None`.
pub fn load_config(path: Option<&Path>) -> Result<Config, thumbing_core::ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
