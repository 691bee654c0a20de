//! Configuration validation. Runs before any resource is created.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values and prefix layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.name.trim().is_empty() {
            return Err(invalid("bucket.name must not be empty"));
        }
        let input = &self.bucket.input_prefix;
        let output = &self.bucket.output_prefix;
        if input.is_empty() {
            return Err(invalid("bucket.input_prefix must not be empty"));
        }
        if output.is_empty() {
            return Err(invalid("bucket.output_prefix must not be empty"));
        }
        if input == output {
            return Err(invalid(
                "bucket.input_prefix and bucket.output_prefix must differ",
            ));
        }
        // A nested output prefix would feed derivatives back into the worker.
        if overlaps(input, output) {
            return Err(invalid(
                "bucket.input_prefix and bucket.output_prefix must not contain one another",
            ));
        }
        if self.resize.width == 0 {
            return Err(invalid("resize.width must be > 0"));
        }
        if self.resize.height == 0 {
            return Err(invalid("resize.height must be > 0"));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(invalid("limits.max_file_size_mb must be > 0"));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(invalid("limits.max_image_dimension must be > 0"));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(invalid("limits.decode_timeout_ms must be > 0"));
        }
        if self.limits.store_timeout_ms == 0 {
            return Err(invalid("limits.store_timeout_ms must be > 0"));
        }
        if self.notify.delivery_timeout_ms == 0 {
            return Err(invalid("notify.delivery_timeout_ms must be > 0"));
        }
        if let Some(topic) = &self.notify.topic_name {
            if topic.trim().is_empty() {
                return Err(invalid("notify.topic_name must not be empty when set"));
            }
        }
        if let Some(url) = &self.notify.webhook_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| invalid(&format!("notify.webhook_url is not a URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid("notify.webhook_url must use http or https"));
            }
        }
        if self.dead_letter.enabled {
            let dlq = &self.dead_letter.prefix;
            if dlq.is_empty() {
                return Err(invalid("dead_letter.prefix must not be empty"));
            }
            if overlaps(dlq, input) || overlaps(dlq, output) {
                return Err(invalid(
                    "dead_letter.prefix must be disjoint from the input and output prefixes",
                ));
            }
        }
        if self.public.asset_host.trim().is_empty() {
            return Err(invalid("public.asset_host must not be empty"));
        }
        Ok(())
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
