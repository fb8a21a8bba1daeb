use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use chat_edge_core::Clock;
use std::time::Instant;
use tracing::info;

use crate::models::{ChatRequest, ChatResponse};
use crate::security::{rate_limit_identifier, ClientIp};
use crate::services::{ChatError, ChatInput};
use crate::state::AppState;
use crate::utils::{
    response::{rate_limit_headers, retry_after_seconds},
    ApiError,
};

pub async fn chat_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let start_time = Instant::now();
    let Json(request) = payload?;
    request.validate(state.settings.conversation.max_message_chars)?;

    let identifier = rate_limit_identifier(request.user_id.as_deref(), client_ip);
    let limit = state.rate_limiter.config().limit;

    info!(
        "Chat request: identifier={}, conversation={:?}, message_len={}",
        identifier,
        request.conversation_id,
        request.message.len()
    );

    let input = ChatInput {
        conversation_id: request.conversation_id,
        message: request.message,
        metadata: request.metadata,
    };

    let turn = state
        .orchestrator
        .handle(&identifier, input)
        .await
        .map_err(|e| match e {
            ChatError::RateLimited(status) => ApiError::RateLimited {
                limit,
                retry_after_secs: retry_after_seconds(status.reset_time, state.clock.now_ms()),
                status,
            },
            ChatError::Storage(e) => ApiError::from(e),
            ChatError::Llm(msg) => ApiError::LlmError(msg),
        })?;

    info!(
        "Chat completed: conversation={}, snippets={}, elapsed_ms={}",
        turn.conversation_id,
        turn.context_snippets.len(),
        start_time.elapsed().as_millis()
    );

    let headers = rate_limit_headers(limit, &turn.rate_limit);
    let body = ChatResponse {
        conversation_id: turn.conversation_id,
        message: turn.reply,
        context_snippets: turn.context_snippets,
        rate_limit: turn.rate_limit,
    };

    Ok((headers, Json(body)))
}
