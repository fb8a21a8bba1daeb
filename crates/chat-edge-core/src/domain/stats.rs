use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationStoreConfig {
    /// Messages retained per conversation; exactly this many survive trimming.
    pub max_history_length: usize,
}

impl Default for ConversationStoreConfig {
    fn default() -> Self {
        Self {
            max_history_length: 50,
        }
    }
}

/// Aggregate counts over the message table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    pub total_conversations: u64,
    pub total_messages: u64,
}
