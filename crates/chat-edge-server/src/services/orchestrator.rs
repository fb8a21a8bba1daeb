use anyhow::Result;
use chat_edge_core::{
    ConversationMessage, ConversationStore, DomainError, Metadata, RateLimitStatus, RateLimiter,
    Role,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{ChatMessage, ContextSnippet};

/// Trait for the language model backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Trait for context enrichment (retrieval)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContextProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ContextSnippet>>;
}

/// Context provider used when enrichment is disabled.
pub struct NoContext;

#[async_trait::async_trait]
impl ContextProvider for NoContext {
    async fn search(&self, _query: &str) -> Result<Vec<ContextSnippet>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct ChatInput {
    pub conversation_id: Option<String>,
    pub message: String,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub conversation_id: String,
    pub reply: ConversationMessage,
    pub context_snippets: Vec<ContextSnippet>,
    pub rate_limit: RateLimitStatus,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("rate limit exceeded")]
    RateLimited(RateLimitStatus),

    #[error(transparent)]
    Storage(#[from] DomainError),

    #[error("language model failed: {0}")]
    Llm(String),
}

/// Runs one chat turn: admission, persistence, enrichment, generation.
pub struct ChatOrchestrator {
    rate_limiter: Arc<RateLimiter>,
    conversations: Arc<ConversationStore>,
    llm: Arc<dyn LlmProvider>,
    context: Arc<dyn ContextProvider>,
    system_prompt: String,
}

impl ChatOrchestrator {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        conversations: Arc<ConversationStore>,
        llm: Arc<dyn LlmProvider>,
        context: Arc<dyn ContextProvider>,
        system_prompt: String,
    ) -> Self {
        Self {
            rate_limiter,
            conversations,
            llm,
            context,
            system_prompt,
        }
    }

    pub async fn handle(&self, identifier: &str, input: ChatInput) -> Result<ChatTurn, ChatError> {
        let rate_limit = self.rate_limiter.check_and_consume(identifier).await.into_inner();
        if rate_limit.blocked {
            info!("Rate limited: identifier={}, reset={}", identifier, rate_limit.reset_time);
            return Err(ChatError::RateLimited(rate_limit));
        }

        let conversation_id = input
            .conversation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let user_message = self
            .conversations
            .append(&conversation_id, Role::User, input.message.clone(), input.metadata)
            .await?
            .into_inner();

        let history = self.conversations.get_history(&conversation_id).await;
        if let Some(reason) = history.reason() {
            warn!("Continuing without history for {}: {}", conversation_id, reason);
        }
        let history: Vec<ConversationMessage> = history
            .into_inner()
            .into_iter()
            .filter(|m| m.id != user_message.id)
            .collect();

        let context_snippets = match self.context.search(&input.message).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("Context search failed, continuing without context: {}", e);
                Vec::new()
            }
        };

        debug!(
            "Generating reply: conversation={}, history={}, snippets={}",
            conversation_id,
            history.len(),
            context_snippets.len()
        );

        let messages = build_messages(&self.system_prompt, &context_snippets, &history, &input.message);
        let reply_text = self
            .llm
            .generate(&messages)
            .await
            .map_err(|e| ChatError::Llm(e.to_string()))?;

        let reply = self
            .conversations
            .append(&conversation_id, Role::Assistant, reply_text, None)
            .await?
            .into_inner();

        Ok(ChatTurn {
            conversation_id,
            reply,
            context_snippets,
            rate_limit,
        })
    }
}

/// System prompt (with context appended), prior turns, then the new user message.
pub fn build_messages(
    system_prompt: &str,
    context_snippets: &[ContextSnippet],
    history: &[ConversationMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut system = system_prompt.to_string();
    if !context_snippets.is_empty() {
        system.push_str("\n\nContext:\n");
        for (i, snippet) in context_snippets.iter().enumerate() {
            match &snippet.source {
                Some(source) => {
                    system.push_str(&format!("[{}] ({}) {}\n", i + 1, source, snippet.content))
                }
                None => system.push_str(&format!("[{}] {}\n", i + 1, snippet.content)),
            }
        }
    }

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(message));
    messages
}
