//! In-process message table for tests and single-node development.

use async_trait::async_trait;
use chat_edge_core::{ConversationMessage, DomainError, MessageRepository};
use parking_lot::RwLock;
use std::collections::HashSet;

struct Row {
    seq: u64,
    message: ConversationMessage,
}

#[derive(Default)]
struct Table {
    next_seq: u64,
    rows: Vec<Row>,
}

impl Table {
    /// Rows of one conversation, most recent first.
    fn newest_first(&self, conversation_id: &str) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .rows
            .iter()
            .filter(|r| r.message.conversation_id == conversation_id)
            .collect();
        rows.sort_by(|a, b| {
            b.message
                .timestamp
                .cmp(&a.message.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        rows
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    table: RwLock<Table>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &ConversationMessage) -> Result<(), DomainError> {
        let mut table = self.table.write();
        if table.rows.iter().any(|r| r.message.id == message.id) {
            return Err(DomainError::Storage(format!(
                "duplicate message id {}",
                message.id
            )));
        }

        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.push(Row {
            seq,
            message: message.clone(),
        });
        Ok(())
    }

    async fn recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DomainError> {
        let table = self.table.read();
        let mut messages: Vec<ConversationMessage> = table
            .newest_first(conversation_id)
            .into_iter()
            .take(limit)
            .map(|r| r.message.clone())
            .collect();
        messages.reverse();
        Ok(messages)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, DomainError> {
        let mut table = self.table.write();
        let before = table.rows.len();
        table
            .rows
            .retain(|r| r.message.conversation_id != conversation_id);
        Ok((before - table.rows.len()) as u64)
    }

    async fn delete_except_latest(
        &self,
        conversation_id: &str,
        keep: usize,
    ) -> Result<u64, DomainError> {
        let mut table = self.table.write();
        let survivors: HashSet<u64> = table
            .newest_first(conversation_id)
            .into_iter()
            .take(keep)
            .map(|r| r.seq)
            .collect();

        let before = table.rows.len();
        table.rows.retain(|r| {
            r.message.conversation_id != conversation_id || survivors.contains(&r.seq)
        });
        Ok((before - table.rows.len()) as u64)
    }

    async fn count_conversations(&self) -> Result<u64, DomainError> {
        let table = self.table.read();
        let distinct: HashSet<&str> = table
            .rows
            .iter()
            .map(|r| r.message.conversation_id.as_str())
            .collect();
        Ok(distinct.len() as u64)
    }

    async fn count_messages(&self) -> Result<u64, DomainError> {
        Ok(self.table.read().rows.len() as u64)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
