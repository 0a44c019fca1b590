//! Wire types for the ChatJimmy chat endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "chatOptions")]
    pub chat_options: ChatOptions,
    /// Always sent, always `null`.
    pub attachment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    pub selected_model: String,
    pub system_prompt: String,
    pub top_k: i64,
}
