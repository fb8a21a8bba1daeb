use axum::{extract::State, Json};
use chat_edge_core::ConversationStore;
use std::sync::Arc;

use crate::models::StatsResponse;

pub async fn stats_handler(
    State(conversations): State<Arc<ConversationStore>>,
) -> Json<StatsResponse> {
    let stats = conversations.get_stats().await;
    let degraded = stats.is_degraded();

    Json(StatsResponse {
        stats: stats.into_inner(),
        degraded,
    })
}
