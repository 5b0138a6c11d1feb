//! HMAC request signing for the GRVT REST API
//!
//! GRVT authenticates each request with an HMAC-SHA256 digest over
//! `timestamp + METHOD + path`, keyed by the raw UTF-8 bytes of the API
//! secret and hex-encoded lowercase. The timestamp is passed in rather than
//! read here, so signing stays a pure function.

use hmac::{Hmac, Mac};
use monitor_core::{MonitorError, MonitorResult};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Build the canonical message a signature commits to
///
/// Exact concatenation, no separators: the millisecond timestamp in decimal
/// ASCII, the HTTP method uppercased, then the request path.
pub fn canonical_message(timestamp_ms: i64, method: &str, path: &str) -> String {
    format!("{}{}{}", timestamp_ms, method.to_uppercase(), path)
}

/// Sign one request, returning the lowercase hex HMAC-SHA256 digest
///
/// Deterministic: identical inputs always yield the identical signature.
pub fn sign(api_secret: &str, timestamp_ms: i64, method: &str, path: &str) -> MonitorResult<String> {
    let message = canonical_message(timestamp_ms, method, path);

    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|e| MonitorError::signing(format!("Failed to key HMAC: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}
