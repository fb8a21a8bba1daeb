use axum::{
    extract::{Path, State},
    Json,
};
use chat_edge_core::ConversationStore;
use std::sync::Arc;
use tracing::info;

use crate::models::{validate_conversation_id, DeleteResponse, HistoryResponse};
use crate::utils::ApiError;

pub async fn get_history_handler(
    State(conversations): State<Arc<ConversationStore>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    validate_conversation_id(&conversation_id)?;

    let history = conversations.get_history(&conversation_id).await;
    let degraded = history.is_degraded();

    Ok(Json(HistoryResponse {
        conversation_id,
        messages: history.into_inner(),
        degraded,
    }))
}

pub async fn delete_conversation_handler(
    State(conversations): State<Arc<ConversationStore>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    validate_conversation_id(&conversation_id)?;

    let deleted = conversations.delete_conversation(&conversation_id).await?;
    info!("Deleted conversation {} ({} messages)", conversation_id, deleted);

    Ok(Json(DeleteResponse {
        conversation_id,
        deleted,
    }))
}
