//! # Chat Edge Infrastructure
//!
//! Database and cache implementations (adapters) of the core ports.

pub mod cache;
pub mod database;

pub use cache::{InMemoryKeyValueStore, RedisKeyValueStore};
pub use database::{create_pool, InMemoryMessageRepository, PgMessageRepository};
