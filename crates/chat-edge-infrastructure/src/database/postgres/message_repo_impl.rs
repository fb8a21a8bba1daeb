//! PostgreSQL message repository.
//!
//! `seq` is a BIGSERIAL used only to order messages whose timestamps
//! collide; it never leaves this module.

use async_trait::async_trait;
use chat_edge_core::{ConversationMessage, DomainError, MessageRepository, Metadata};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info};

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the table and indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        info!("Creating conversation_messages table if not exist");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS conversation_messages (
                seq BIGSERIAL PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                metadata JSONB
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_conversation_messages_conversation
                ON conversation_messages (conversation_id, created_at DESC, seq DESC)
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    created_at: String,
    metadata: Option<Json<Metadata>>,
}

impl TryFrom<MessageRow> for ConversationMessage {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(ConversationMessage {
            id: row.id,
            conversation_id: row.conversation_id,
            role: row.role.parse()?,
            content: row.content,
            timestamp: row.created_at,
            metadata: row.metadata.map(|m| m.0),
        })
    }
}

fn db_error(operation: &str, e: sqlx::Error) -> DomainError {
    error!("Database error in {}: {}", operation, e);
    DomainError::Storage(e.to_string())
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: &ConversationMessage) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_messages (id, conversation_id, role, content, created_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.timestamp)
        .bind(message.metadata.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert", e))?;

        Ok(())
    }

    async fn recent(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, DomainError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, role, content, created_at, metadata
            FROM (
                SELECT seq, id, conversation_id, role, content, created_at, metadata
                FROM conversation_messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
            ) latest
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("recent", e))?;

        debug!("Retrieved {} messages for conversation {}", rows.len(), conversation_id);

        rows.into_iter().map(ConversationMessage::try_from).collect()
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM conversation_messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_conversation", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_except_latest(
        &self,
        conversation_id: &str,
        keep: usize,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM conversation_messages
            WHERE conversation_id = $1
              AND seq NOT IN (
                SELECT seq
                FROM conversation_messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
              )
            "#,
        )
        .bind(conversation_id)
        .bind(keep as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_except_latest", e))?;

        Ok(result.rows_affected())
    }

    async fn count_conversations(&self) -> Result<u64, DomainError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT conversation_id) FROM conversation_messages")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("count_conversations", e))?;
        Ok(count.max(0) as u64)
    }

    async fn count_messages(&self) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversation_messages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_messages", e))?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("ping", e))?;
        Ok(())
    }
}
