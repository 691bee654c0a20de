//! Dead-letter records for events that fail for good.

use serde::{Deserialize, Serialize};

use crate::error::ResizeError;
use crate::store::keys::identifier;

/// A non-retryable resize failure, written as JSON under the dead-letter prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub bucket: String,
    pub source_key: String,
    pub target_key: String,
    pub kind: String,
    pub message: String,
}

impl DeadLetter {
    pub fn new(bucket: &str, source_key: &str, target_key: &str, error: &ResizeError) -> Self {
        Self {
            bucket: bucket.to_string(),
            source_key: source_key.to_string(),
            target_key: target_key.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Where dead-letter records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadLetterPolicy {
    /// Log and drop
    Drop,
    /// Write a record under this prefix
    Record { prefix: String },
}

impl DeadLetterPolicy {
    /// Key of the record for a source key under `input_prefix`.
    ///
    /// Returns `None` for `Drop`.
    pub fn record_key(&self, source_key: &str, input_prefix: &str) -> Option<String> {
        match self {
            DeadLetterPolicy::Drop => None,
            DeadLetterPolicy::Record { prefix } => {
                let id = identifier(source_key, input_prefix).unwrap_or(source_key);
                Some(format!("{prefix}{id}.json"))
            }
        }
    }
}
