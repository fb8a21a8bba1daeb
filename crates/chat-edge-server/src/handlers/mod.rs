pub mod chat;
pub mod conversations;
pub mod health;
pub mod rate_limit;
pub mod stats;

use crate::utils::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}
