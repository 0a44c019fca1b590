//! Translate an OpenAI Chat Completions request body into a ChatJimmy request.
//!
//! System messages are pulled out into `chatOptions.systemPrompt`; every other
//! message is flattened to plain text and forwarded in order. Model and topK
//! are resolved through their precedence chains here so the proxy layer only
//! has to send the result.

use serde_json::Value;

use super::openai_types::{ChatCompletionRequest, InboundMessage, MessageContent};
use super::upstream_types::{ChatMessage, ChatOptions, UpstreamRequest};
use super::values::{json_text, leading_int, non_empty_text};
use crate::config::{ShimConfig, DEFAULT_TOP_K};
use crate::error::ApiError;

/// A validated request, ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedChat {
    pub upstream: UpstreamRequest,
    /// Model id echoed back in the completion.
    pub model: String,
    pub stream: bool,
}

/// Parse and translate a raw request body. Pure function: no I/O.
pub fn prepare_chat(body: &[u8], config: &ShimConfig) -> Result<PreparedChat, ApiError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::invalid_request("Request body must be JSON"))?;

    // A JSON body that isn't an object simply has no `messages`.
    let req: ChatCompletionRequest = serde_json::from_value(payload).unwrap_or_default();

    let raw_messages = req
        .messages
        .as_ref()
        .and_then(Value::as_array)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::invalid_request("messages must be a non-empty array"))?;

    let model = resolve_model(&req, config);
    let top_k = resolve_top_k(&req, config);

    let mut system_parts: Vec<String> = Vec::new();
    let mut messages: Vec<ChatMessage> = Vec::new();

    for raw in raw_messages {
        if !raw.is_object() {
            continue;
        }
        let Ok(msg) = serde_json::from_value::<InboundMessage>(raw.clone()) else {
            continue;
        };

        let role = role_text(msg.role.as_ref());
        let content = msg
            .content
            .as_ref()
            .map(MessageContent::flatten)
            .unwrap_or_default();

        if role == "system" {
            if !content.is_empty() {
                system_parts.push(content);
            }
            continue;
        }

        messages.push(ChatMessage { role, content });
    }

    if messages.is_empty() {
        return Err(ApiError::invalid_request("no valid non-system messages found"));
    }

    let joined = system_parts.join("\n");
    let system_prompt = match joined.trim() {
        "" => req
            .chat_options()
            .and_then(|opts| opts.get("systemPrompt"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        trimmed => trimmed.to_string(),
    };

    tracing::debug!(
        model = %model,
        top_k,
        messages = messages.len(),
        system_parts = system_parts.len(),
        "Translated chat request"
    );

    Ok(PreparedChat {
        upstream: UpstreamRequest {
            messages,
            chat_options: ChatOptions {
                selected_model: model.clone(),
                system_prompt,
                top_k,
            },
            attachment: None,
        },
        model,
        stream: req.wants_stream(),
    })
}

/// `model` → `chatOptions.selectedModel` → configured default. The configured
/// default is never blank, so the built-in fallback is already folded into it.
pub fn resolve_model(req: &ChatCompletionRequest, config: &ShimConfig) -> String {
    req.model
        .as_ref()
        .and_then(non_empty_text)
        .or_else(|| {
            req.chat_options()
                .and_then(|opts| opts.get("selectedModel"))
                .and_then(non_empty_text)
        })
        .unwrap_or_else(|| config.default_model.clone())
}

/// `top_k` → `topK` → `chatOptions.topK` → configured default → 8. The first
/// value present wins the chain even if it then fails to parse.
pub fn resolve_top_k(req: &ChatCompletionRequest, config: &ShimConfig) -> i64 {
    let present = |v: Option<&Value>| v.filter(|v| !v.is_null()).cloned();

    present(req.top_k.as_ref())
        .or_else(|| present(req.top_k_camel.as_ref()))
        .or_else(|| present(req.chat_options().and_then(|opts| opts.get("topK"))))
        .or_else(|| config.default_top_k.clone().map(Value::String))
        .map_or(DEFAULT_TOP_K, |v| parse_top_k(&v))
}

pub fn parse_top_k(value: &Value) -> i64 {
    leading_int(value).filter(|k| *k > 0).unwrap_or(DEFAULT_TOP_K)
}

fn role_text(role: Option<&Value>) -> String {
    match role {
        None | Some(Value::Null) => "user".to_string(),
        Some(Value::String(s)) if s.is_empty() => "user".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => json_text(other),
    }
}
