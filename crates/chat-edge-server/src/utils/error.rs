use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chat_edge_core::{DomainError, RateLimitStatus};
use serde::Serialize;
use thiserror::Error;

use super::response::rate_limit_headers;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited {
        limit: u32,
        status: RateLimitStatus,
        retry_after_secs: u64,
    },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::StorageError(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

fn error_body(error_type: &str, message: String) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: error_type.to_string(),
        message,
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::RateLimited {
                limit,
                status,
                retry_after_secs,
            } => {
                tracing::info!("Rate limited, reset at {}", status.reset_time);
                let mut headers = rate_limit_headers(limit, &status);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    headers,
                    error_body("RateLimited", message),
                )
                    .into_response();
            }
            ApiError::StorageError(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "StorageError", msg)
            }
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "LlmError", msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg),
        };

        (status, error_body(error_type, message)).into_response()
    }
}
