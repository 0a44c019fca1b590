//! Type definitions for the [OpenAI Chat Completions API](https://platform.openai.com/docs/api-reference/chat).
//!
//! Inbound requests are loosely typed (clients send `model` as anything and
//! `content` in several shapes), so only the pieces the mapping needs get a
//! real type. Everything we send back is fully typed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::values::json_text;

// ---------------------------------------------------------------------------
// Request types (what clients send US)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub top_k: Option<Value>,
    #[serde(default, rename = "topK")]
    pub top_k_camel: Option<Value>,
    #[serde(default, rename = "chatOptions")]
    pub chat_options: Option<Value>,
    #[serde(default)]
    pub stream: Option<Value>,
}

impl ChatCompletionRequest {
    /// `chatOptions` as an object; any other shape counts as empty.
    pub fn chat_options(&self) -> Option<&Map<String, Value>> {
        self.chat_options.as_ref().and_then(Value::as_object)
    }

    /// Only a literal `true` asks for a stream.
    pub fn wants_stream(&self) -> bool {
        matches!(self.stream, Some(Value::Bool(true)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Object(Map<String, Value>),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text(String),
    Object(Map<String, Value>),
    Other(Value),
}

// ---------------------------------------------------------------------------
// Response types (what we send back)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: ChatUsage,
    /// Upstream stats block, passed through untouched.
    pub chatjimmy_stats: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChoiceMessage,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

// ---------------------------------------------------------------------------
// Streaming chunk types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Model listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl MessageContent {
    /// Collapse any content shape into the plain text the upstream accepts.
    pub fn flatten(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(ContentPart::flatten)
                .collect::<Vec<_>>()
                .join("\n"),
            MessageContent::Object(map) => match (map.get("text"), map.get("content")) {
                (Some(Value::String(text)), _) => text.clone(),
                (_, Some(Value::String(content))) => content.clone(),
                _ => json_text(&Value::Object(map.clone())),
            },
            MessageContent::Other(Value::String(s)) => s.clone(),
            MessageContent::Other(Value::Null) => String::new(),
            MessageContent::Other(other) => json_text(other),
        }
    }
}

impl ContentPart {
    fn flatten(&self) -> String {
        match self {
            ContentPart::Text(t) => t.clone(),
            ContentPart::Object(map) => match map.get("text") {
                Some(Value::String(text)) => text.clone(),
                _ => json_text(&Value::Object(map.clone())),
            },
            ContentPart::Other(other) => json_text(other),
        }
    }
}
