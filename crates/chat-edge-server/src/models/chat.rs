use chat_edge_core::{ConversationMessage, ConversationStats, Metadata, RateLimitStatus};
use serde::{Deserialize, Serialize};

use crate::utils::ApiError;

const MAX_CONVERSATION_ID_LEN: usize = 128;

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ChatRequest {
    /// Rejects empty or oversized messages and malformed conversation ids.
    pub fn validate(&self, max_message_chars: usize) -> Result<(), ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".to_string()));
        }

        let chars = self.message.chars().count();
        if chars > max_message_chars {
            return Err(ApiError::BadRequest(format!(
                "message is {} characters, maximum is {}",
                chars, max_message_chars
            )));
        }

        if let Some(conversation_id) = &self.conversation_id {
            validate_conversation_id(conversation_id)?;
        }

        if let Some(user_id) = &self.user_id {
            if user_id.trim().is_empty() {
                return Err(ApiError::BadRequest("userId must not be empty".to_string()));
            }
        }

        Ok(())
    }
}

/// 1 to 128 characters of `[A-Za-z0-9_-]`.
pub fn validate_conversation_id(conversation_id: &str) -> Result<(), ApiError> {
    let valid_len = (1..=MAX_CONVERSATION_ID_LEN).contains(&conversation_id.len());
    let valid_chars = conversation_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "invalid conversation id: {:?}",
            conversation_id
        )))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One entry of an OpenAI-style `messages` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self::new(message.role.as_str(), message.content.clone())
    }
}

// ===== RESPONSE MODELS =====

/// Retrieved passage handed to the model as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub content: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: ConversationMessage,
    pub context_snippets: Vec<ContextSnippet>,
    pub rate_limit: RateLimitStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub conversation_id: String,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ConversationStats,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str, conversation_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            user_id: None,
            metadata: None,
        }
    }

    #[test]
    fn test_validate_message() {
        assert!(request("hello", None).validate(10).is_ok());
        assert!(request("   \n", None).validate(10).is_err());
        assert!(request("héllo wörld", None).validate(11).is_ok());
        assert!(request("hello world!", None).validate(11).is_err());
    }

    #[test]
    fn test_validate_conversation_id() {
        assert!(validate_conversation_id("conv_01-A").is_ok());
        assert!(validate_conversation_id(&"a".repeat(128)).is_ok());
        assert!(validate_conversation_id(&"a".repeat(129)).is_err());
        assert!(validate_conversation_id("").is_err());
        assert!(validate_conversation_id("../etc").is_err());
        assert!(request("hi", Some("has space")).validate(10).is_err());
    }

    #[test]
    fn test_request_accepts_camel_case() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","conversationId":"c1","userId":"u1","metadata":{"k":1}}"#,
        )
        .unwrap();

        assert_eq!(request.conversation_id.as_deref(), Some("c1"));
        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert_eq!(request.metadata.unwrap()["k"], 1);
    }

    #[test]
    fn test_stats_response_is_flat() {
        let body = StatsResponse {
            stats: ConversationStats { total_conversations: 2, total_messages: 5 },
            degraded: false,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json, serde_json::json!({"totalConversations": 2, "totalMessages": 5}));
    }
}
