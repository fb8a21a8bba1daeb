//! Domain types

mod message;
mod rate_limit;
mod stats;

pub use message::{format_timestamp, ConversationMessage, Metadata, Role};
pub use rate_limit::{RateLimitConfig, RateLimitCounter, RateLimitStatus, Window};
pub use stats::{ConversationStats, ConversationStoreConfig};
