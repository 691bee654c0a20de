//! `THUMBING_*` environment overrides.
//!
//! Deployments configure the bucket and prefixes through the environment
//! (optionally via a `.env` file loaded by the CLI). Overrides are captured
//! into a plain struct first so tests never touch process-global state.

use crate::error::ConfigError;

use super::Config;

/// Environment values that override file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub bucket_name: Option<String>,
    pub folder_input: Option<String>,
    pub folder_output: Option<String>,
    pub process_width: Option<String>,
    pub process_height: Option<String>,
    pub topic_name: Option<String>,
    pub webhook_url: Option<String>,
    pub asset_host: Option<String>,
}

impl EnvOverrides {
    /// Capture overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Capture overrides through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            bucket_name: get("THUMBING_BUCKET_NAME"),
            folder_input: get("THUMBING_FOLDER_INPUT"),
            folder_output: get("THUMBING_FOLDER_OUTPUT"),
            process_width: get("THUMBING_PROCESS_WIDTH"),
            process_height: get("THUMBING_PROCESS_HEIGHT"),
            topic_name: get("THUMBING_TOPIC_NAME"),
            webhook_url: get("THUMBING_WEBHOOK_URL"),
            asset_host: get("THUMBING_ASSET_HOST"),
        }
    }
}

impl Config {
    /// Layer environment overrides onto this configuration.
    pub fn apply_env(&mut self, env: &EnvOverrides) -> Result<(), ConfigError> {
        if let Some(name) = &env.bucket_name {
            self.bucket.name = name.clone();
        }
        if let Some(prefix) = &env.folder_input {
            self.bucket.input_prefix = normalize_prefix(prefix);
        }
        if let Some(prefix) = &env.folder_output {
            self.bucket.output_prefix = normalize_prefix(prefix);
        }
        if let Some(width) = &env.process_width {
            self.resize.width = parse_dimension("THUMBING_PROCESS_WIDTH", width)?;
        }
        if let Some(height) = &env.process_height {
            self.resize.height = parse_dimension("THUMBING_PROCESS_HEIGHT", height)?;
        }
        if let Some(topic) = &env.topic_name {
            self.notify.topic_name = Some(topic.clone());
        }
        if let Some(url) = &env.webhook_url {
            self.notify.webhook_url = Some(url.clone());
        }
        if let Some(host) = &env.asset_host {
            self.public.asset_host = host.clone();
        }
        Ok(())
    }
}

/// Folder names arrive with or without the trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

fn parse_dimension(var: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{var} must be an integer, got {value:?}")))
}
