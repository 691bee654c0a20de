//! Key validation and prefix arithmetic.
//!
//! Keys are `prefix + identifier`, e.g. `avatar/original/` + `a.png`. The
//! output key of a resize is the same identifier under the output prefix.

use crate::error::{StoreError, StoreResult};

/// Reject keys that are empty, absolute, or could escape the bucket.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.starts_with('/') {
        Some("key must be relative")
    } else if key.contains('\\') || key.contains('\0') {
        Some("key contains a forbidden character")
    } else if key.ends_with('/') {
        Some("key names a folder, not an object")
    } else if key.split('/').any(|seg| seg == ".." || seg == "." || seg.is_empty()) {
        Some("key contains an empty or relative segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Identifier part of `key` under `prefix`, if the key lives there.
pub fn identifier<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix).filter(|id| !id.is_empty())
}

/// Move `key` from one prefix to another, keeping the identifier.
pub fn swap_prefix(key: &str, from: &str, to: &str) -> Option<String> {
    identifier(key, from).map(|id| format!("{to}{id}"))
}

/// Public HTTPS URL of a processed object.
///
/// `id` is the identifier without extension; processed avatars are served as
/// `https://<host>/<output_prefix><id>.png`.
pub fn public_url(asset_host: &str, output_prefix: &str, id: &str) -> String {
    format!(
        "https://{}/{}{}.png",
        asset_host.trim_end_matches('/'),
        output_prefix,
        id
    )
}
