//! In-process key-value store with per-entry expiry.
//!
//! State is local to one process, so rate limits are only enforced per
//! instance. Meant for development, tests and single-node deployments.

use async_trait::async_trait;
use chat_edge_core::{Clock, DomainError, KeyValueStore};
use dashmap::DashMap;
use std::sync::Arc;

struct Entry {
    value: String,
    expires_at_ms: i64,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

pub struct InMemoryKeyValueStore {
    map: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryKeyValueStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until they are touched or purged.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.map.len())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = self.clock.now_ms();
        let Some(entry) = self.map.get(key) else {
            return Ok(None);
        };

        if entry.is_expired(now) {
            drop(entry);
            self.map.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError> {
        let expires_at_ms = self
            .clock
            .now_ms()
            .saturating_add((ttl_seconds as i64).saturating_mul(1_000));

        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at_ms,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_edge_core::ManualClock;
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_put() {
        let store = InMemoryKeyValueStore::new(Arc::new(ManualClock::new(0)));
        assert_eq!(store.get("k").await.unwrap(), None);

        store.put("k", "v1", 10).await.unwrap();
        store.put("k", "v2", 10).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let clock = Arc::new(ManualClock::new(0));
        let store = InMemoryKeyValueStore::new(clock.clone());

        store.put("short", "v", 1).await.unwrap();
        store.put("long", "v", 120).await.unwrap();

        clock.advance(Duration::from_millis(999));
        assert!(store.get("short").await.unwrap().is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get("short").await.unwrap().is_none());
        assert_eq!(store.len(), 1);

        clock.advance(Duration::from_secs(200));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }
}
