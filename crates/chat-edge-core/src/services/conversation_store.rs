//! Bounded per-conversation message log.
//!
//! Reads and stats degrade to empty/zero on storage failure; deletion
//! failures propagate because callers rely on the rows being gone.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::domain::{ConversationMessage, ConversationStats, ConversationStoreConfig, Metadata, Role};
use crate::error::DomainError;
use crate::outcome::Outcome;
use crate::ports::MessageRepository;

pub struct ConversationStore {
    repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    config: ConversationStoreConfig,
}

impl ConversationStore {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        config: ConversationStoreConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    pub fn max_history_length(&self) -> usize {
        self.config.max_history_length
    }

    /// Stores a new message, then trims the conversation.
    ///
    /// A failed insert is an error. A failed trim is not: the stored
    /// message comes back as [`Outcome::Degraded`].
    pub async fn append(
        &self,
        conversation_id: &str,
        role: Role,
        content: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Result<Outcome<ConversationMessage>, DomainError> {
        let message = ConversationMessage::new(
            conversation_id,
            role,
            content,
            metadata,
            self.clock.now_utc(),
        );

        self.repository.insert(&message).await.map_err(|e| {
            error!(conversation_id, operation = "append", error = %e, "Failed to store message");
            e
        })?;

        debug!(
            conversation_id,
            message_id = %message.id,
            role = %role,
            "Message stored"
        );

        match self.enforce_retention(conversation_id).await {
            Ok(_) => Ok(Outcome::Complete(message)),
            Err(e) => {
                warn!(
                    conversation_id,
                    operation = "enforce_retention",
                    error = %e,
                    "Retention failed after append, message kept"
                );
                Ok(Outcome::degraded(message, e))
            }
        }
    }

    /// Deletes all but the `max_history_length` most recent messages.
    /// Safe to repeat; returns how many rows were removed.
    pub async fn enforce_retention(&self, conversation_id: &str) -> Result<u64, DomainError> {
        let removed = self
            .repository
            .delete_except_latest(conversation_id, self.config.max_history_length)
            .await?;

        if removed > 0 {
            debug!(conversation_id, removed, "Trimmed conversation history");
        }
        Ok(removed)
    }

    /// Up to `max_history_length` messages, oldest first. Empty for an
    /// unknown conversation or when the read fails.
    pub async fn get_history(&self, conversation_id: &str) -> Outcome<Vec<ConversationMessage>> {
        match self
            .repository
            .recent(conversation_id, self.config.max_history_length)
            .await
        {
            Ok(messages) => Outcome::Complete(messages),
            Err(e) => {
                warn!(
                    conversation_id,
                    operation = "get_history",
                    error = %e,
                    "History read failed, returning empty history"
                );
                Outcome::degraded(Vec::new(), e)
            }
        }
    }

    /// Removes every message of the conversation. Errors are returned, never swallowed.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, DomainError> {
        match self.repository.delete_conversation(conversation_id).await {
            Ok(removed) => {
                info!(conversation_id, removed, "Conversation deleted");
                Ok(removed)
            }
            Err(e) => {
                error!(
                    conversation_id,
                    operation = "delete_conversation",
                    error = %e,
                    "Failed to delete conversation"
                );
                Err(e)
            }
        }
    }

    /// Distinct conversations and total messages; zeros when the store is unavailable.
    pub async fn get_stats(&self) -> Outcome<ConversationStats> {
        let counts = async {
            let total_conversations = self.repository.count_conversations().await?;
            let total_messages = self.repository.count_messages().await?;
            Ok::<_, DomainError>(ConversationStats {
                total_conversations,
                total_messages,
            })
        };

        match counts.await {
            Ok(stats) => Outcome::Complete(stats),
            Err(e) => {
                warn!(operation = "get_stats", error = %e, "Stats query failed, returning zeros");
                Outcome::degraded(ConversationStats::default(), e)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.repository.ping().await
    }
}
