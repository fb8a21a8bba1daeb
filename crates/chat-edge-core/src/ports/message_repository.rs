//! Message repository trait (port)

use async_trait::async_trait;

use crate::domain::ConversationMessage;
use crate::error::DomainError;

/// Relational table of conversation messages.
///
/// Ordering is by timestamp, ties broken by insertion order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: &ConversationMessage) -> Result<(), DomainError>;

    /// The `limit` most recent messages of a conversation, oldest first.
    async fn recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DomainError>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, DomainError>;

    /// Deletes everything but the `keep` most recent messages. Returns rows removed.
    async fn delete_except_latest(
        &self,
        conversation_id: &str,
        keep: usize,
    ) -> Result<u64, DomainError>;

    async fn count_conversations(&self) -> Result<u64, DomainError>;
    async fn count_messages(&self) -> Result<u64, DomainError>;

    async fn ping(&self) -> Result<(), DomainError>;
}
