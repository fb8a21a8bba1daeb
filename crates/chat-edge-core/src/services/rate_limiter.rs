//! Fixed-window rate limiter over a shared key-value store.
//!
//! Each identifier owns one counter tagged with the start of the window
//! it was written in. A counter from an earlier window reads as zero, so
//! rollover needs no cleanup job; the TTL only reclaims space.
//!
//! The read and the write are separate store calls. Two concurrent
//! requests for the same identifier can both read the same count and
//! both be admitted, so a burst may slightly exceed `limit`.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::domain::{RateLimitConfig, RateLimitCounter, RateLimitStatus, Window};
use crate::error::DomainError;
use crate::outcome::Outcome;
use crate::ports::KeyValueStore;

pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: RateLimitConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or block one request for `identifier`, consuming a slot when admitted.
    ///
    /// Storage failures admit the request (fail-open) and come back as
    /// [`Outcome::Degraded`].
    pub async fn check_and_consume(&self, identifier: &str) -> Outcome<RateLimitStatus> {
        let window = self.config.window_at(self.clock.now_ms());
        let key = self.key(identifier);

        match self.try_consume(&key, window).await {
            Ok(status) => {
                debug!(
                    identifier,
                    remaining = status.remaining,
                    blocked = status.blocked,
                    "Rate limit checked"
                );
                Outcome::Complete(status)
            }
            Err(e) => {
                warn!(
                    identifier,
                    operation = "check_and_consume",
                    error = %e,
                    "Rate limit store failed, admitting request"
                );
                Outcome::degraded(self.fail_open(window), e)
            }
        }
    }

    /// Current status for `identifier` without consuming anything.
    pub async fn peek_status(&self, identifier: &str) -> Outcome<RateLimitStatus> {
        let window = self.config.window_at(self.clock.now_ms());
        let key = self.key(identifier);

        match self.current_count(&key, window).await {
            Ok(count) => {
                let remaining = self.config.limit.saturating_sub(count);
                Outcome::Complete(RateLimitStatus {
                    remaining,
                    reset_time: window.end,
                    blocked: remaining == 0,
                })
            }
            Err(e) => {
                warn!(
                    identifier,
                    operation = "peek_status",
                    error = %e,
                    "Rate limit store failed, reporting open status"
                );
                Outcome::degraded(self.fail_open(window), e)
            }
        }
    }

    async fn try_consume(&self, key: &str, window: Window) -> Result<RateLimitStatus, DomainError> {
        let count = self.current_count(key, window).await?;

        if count >= self.config.limit {
            return Ok(RateLimitStatus {
                remaining: 0,
                reset_time: window.end,
                blocked: true,
            });
        }

        let counter = RateLimitCounter {
            count: count + 1,
            window_start: window.start,
        };
        let raw = serde_json::to_string(&counter)?;
        self.store
            .put(key, &raw, self.config.counter_ttl_seconds())
            .await?;

        Ok(RateLimitStatus {
            remaining: self.config.limit - counter.count,
            reset_time: window.end,
            blocked: false,
        })
    }

    /// Count recorded for `window`; zero when absent or written in another window.
    async fn current_count(&self, key: &str, window: Window) -> Result<u32, DomainError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(0);
        };

        match serde_json::from_str::<RateLimitCounter>(&raw) {
            Ok(counter) if counter.window_start == window.start => Ok(counter.count),
            Ok(_) => Ok(0),
            Err(e) => {
                warn!(key, error = %e, "Undecodable rate limit counter, treating as absent");
                Ok(0)
            }
        }
    }

    fn fail_open(&self, window: Window) -> RateLimitStatus {
        RateLimitStatus {
            remaining: self.config.limit.saturating_sub(1),
            reset_time: window.end,
            blocked: false,
        }
    }

    fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.config.key_prefix, identifier)
    }
}
