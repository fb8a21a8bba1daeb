pub mod conversation_store;
pub mod rate_limiter;

pub use conversation_store::ConversationStore;
pub use rate_limiter::RateLimiter;
