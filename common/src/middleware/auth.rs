//! Bearer authentication header.

use reqwest::header::HeaderValue;

/// Builds the `Authorization` header value for a stored token.
///
/// Returns `None` for an empty token or one that is not a valid header value.
pub fn bearer_header_value(token: &str) -> Option<HeaderValue> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).ok()?;
    value.set_sensitive(true);
    Some(value)
}
