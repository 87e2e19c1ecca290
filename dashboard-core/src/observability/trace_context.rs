//! Request correlation for outbound API calls.

use http::HeaderMap;
use uuid::Uuid;

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a fresh correlation ID.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Insert the request ID header, replacing any previous value.
pub fn inject_request_id(headers: &mut HeaderMap, request_id: &str) {
    if let Ok(value) = request_id.parse() {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

/// Extract request ID from headers.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
