use serde::{Deserialize, Serialize};

/// Rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub limit: u32,
    /// Window size in milliseconds.
    pub window_ms: u64,
    /// Counter keys are `{key_prefix}:{identifier}`.
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            window_ms: 60_000,
            key_prefix: "ratelimit".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Fixed window containing `now_ms`.
    pub fn window_at(&self, now_ms: i64) -> Window {
        let size = self.window_ms.max(1) as i64;
        let start = now_ms.div_euclid(size) * size;
        Window {
            start,
            end: start + size,
        }
    }

    /// Counter expiry: two windows, rounded up to whole seconds.
    pub fn counter_ttl_seconds(&self) -> u64 {
        (self.window_ms.max(1) * 2).div_ceil(1_000).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

/// Stored counter value. Only meaningful for the window it was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitCounter {
    pub count: u32,
    pub window_start: i64,
}

/// Answer returned to the caller for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_time: i64,
    pub blocked: bool,
}
