//! Key-value store trait (port)

use async_trait::async_trait;

use crate::error::DomainError;

/// Get/put-with-TTL over opaque string keys and values.
///
/// Eventually consistent, no transactions; a `get` followed by a `put`
/// is two independent operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), DomainError>;
}
