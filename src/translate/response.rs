use serde_json::{json, Value};

use super::openai_types::{ChatCompletion, ChatUsage, Choice, ChoiceMessage};
use super::values::leading_int;

/// Stats delimiters, tried in order; the first style that matches wins.
const STATS_DELIMITERS: &[(&str, &str)] = &[("<|stats|>", "<|/stats|>"), ("<stats>", "</stats>")];

/// Upstream reply split into answer text and the embedded stats block.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub text: String,
    pub stats: Value,
}

/// Split a raw upstream body into answer text and stats. Stats that fail to
/// parse are kept as `{"raw": <text>}`; no stats block gives `{}`.
pub fn parse_upstream_reply(raw: &str) -> UpstreamReply {
    let mut text = raw.to_string();
    let mut stats_raw = String::new();

    for (open, close) in STATS_DELIMITERS {
        let Some(start) = text.find(open) else {
            continue;
        };
        let inner_start = start + open.len();
        let Some(inner_len) = text[inner_start..].find(close) else {
            continue;
        };
        let inner_end = inner_start + inner_len;

        stats_raw = text[inner_start..inner_end].trim().to_string();
        text.replace_range(start..inner_end + close.len(), "");
        break;
    }

    let stats = if stats_raw.is_empty() {
        json!({})
    } else {
        serde_json::from_str(&stats_raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Upstream stats block is not JSON");
            json!({ "raw": stats_raw })
        })
    };

    UpstreamReply {
        text: text.trim().to_string(),
        stats,
    }
}

/// Token counts from the stats block. Missing or non-numeric fields count as
/// zero; a missing total is the sum of the other two.
pub fn usage_from_stats(stats: &Value) -> ChatUsage {
    let field = |name: &str| stats.get(name).and_then(leading_int);

    let prompt_tokens = field("prefill_tokens").unwrap_or(0);
    let completion_tokens = field("decode_tokens").unwrap_or(0);
    let total_tokens = field("total_tokens")
        .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens));

    ChatUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    }
}

/// Build the OpenAI completion for a parsed reply.
pub fn build_completion(model: &str, reply: UpstreamReply) -> ChatCompletion {
    let usage = usage_from_stats(&reply.stats);

    ChatCompletion {
        id: completion_id(),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: reply.text,
            },
            finish_reason: "stop".to_string(),
        }],
        usage,
        chatjimmy_stats: reply.stats,
    }
}

/// `chatcmpl-` plus the first 24 hex digits of a v4 UUID.
pub fn completion_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &hex[..24])
}
