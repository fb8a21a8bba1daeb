use axum::extract::FromRef;
use chat_edge_core::{Clock, ConversationStore, RateLimiter};
use std::sync::Arc;

use crate::config::Settings;
use crate::services::{ChatOrchestrator, ContextProvider, LlmProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub clock: Arc<dyn Clock>,
    pub rate_limiter: Arc<RateLimiter>,
    pub conversations: Arc<ConversationStore>,
    pub orchestrator: Arc<ChatOrchestrator>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        clock: Arc<dyn Clock>,
        rate_limiter: Arc<RateLimiter>,
        conversations: Arc<ConversationStore>,
        llm: Arc<dyn LlmProvider>,
        context: Arc<dyn ContextProvider>,
    ) -> Self {
        let orchestrator = Arc::new(ChatOrchestrator::new(
            rate_limiter.clone(),
            conversations.clone(),
            llm,
            context,
            settings.llm.system_prompt.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            clock,
            rate_limiter,
            conversations,
            orchestrator,
        }
    }
}

impl FromRef<AppState> for Arc<ConversationStore> {
    fn from_ref(state: &AppState) -> Self {
        state.conversations.clone()
    }
}

impl FromRef<AppState> for Arc<RateLimiter> {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}
