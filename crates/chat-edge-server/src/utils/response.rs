use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chat_edge_core::RateLimitStatus;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// `X-RateLimit-*` headers; reset is epoch milliseconds.
pub fn rate_limit_headers(limit: u32, status: &RateLimitStatus) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(status.reset_time));
    headers
}

/// Whole seconds until `reset_time`, at least 1.
pub fn retry_after_seconds(reset_time: i64, now_ms: i64) -> u64 {
    let wait_ms = (reset_time - now_ms).max(0) as u64;
    wait_ms.div_ceil(1_000).max(1)
}
