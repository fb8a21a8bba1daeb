//! Key-value adapters

pub mod memory;
pub mod redis;

pub use memory::InMemoryKeyValueStore;
pub use self::redis::RedisKeyValueStore;
