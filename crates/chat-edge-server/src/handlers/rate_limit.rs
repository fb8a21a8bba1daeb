use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chat_edge_core::RateLimiter;
use std::sync::Arc;

use crate::models::RateLimitQuery;
use crate::security::{rate_limit_identifier, ClientIp};
use crate::utils::response::rate_limit_headers;

/// Current window status for the caller; does not consume.
pub async fn rate_limit_status_handler(
    State(rate_limiter): State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    Query(query): Query<RateLimitQuery>,
) -> impl IntoResponse {
    let identifier = rate_limit_identifier(query.user_id.as_deref(), client_ip);
    let status = rate_limiter.peek_status(&identifier).await.into_inner();

    (rate_limit_headers(rate_limiter.config().limit, &status), Json(status))
}
