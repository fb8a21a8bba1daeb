//! Storage ports. Adapters live in `chat-edge-infrastructure`.

mod kv_store;
mod message_repository;

pub use kv_store::KeyValueStore;
pub use message_repository::MessageRepository;

#[cfg(test)]
pub use kv_store::MockKeyValueStore;
#[cfg(test)]
pub use message_repository::MockMessageRepository;
