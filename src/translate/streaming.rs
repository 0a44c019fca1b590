//! Simulated streaming for clients that ask for `stream: true`.
//!
//! The upstream call has already finished by the time this runs, so the whole
//! answer goes out in the first frame. Frame two closes the choice and the
//! last frame is the literal `[DONE]` sentinel.

use super::openai_types::{ChatCompletion, ChatCompletionChunk, ChunkChoice, ChunkDelta};

pub const DONE_SENTINEL: &str = "[DONE]";

/// The two chunks that replay a finished completion.
pub fn completion_chunks(completion: &ChatCompletion) -> [ChatCompletionChunk; 2] {
    let content = completion
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default();

    let chunk = |delta: ChunkDelta, finish_reason: Option<String>| ChatCompletionChunk {
        id: completion.id.clone(),
        object: "chat.completion.chunk".to_string(),
        created: completion.created,
        model: completion.model.clone(),
        choices: vec![ChunkChoice {
            index: 0,
            delta,
            finish_reason,
        }],
    };

    [
        chunk(
            ChunkDelta {
                role: Some("assistant".to_string()),
                content: Some(content),
            },
            None,
        ),
        chunk(ChunkDelta::default(), Some("stop".to_string())),
    ]
}

/// SSE `data:` payloads in emission order, ending with `[DONE]`.
pub fn completion_frames(completion: &ChatCompletion) -> serde_json::Result<Vec<String>> {
    let mut frames = completion_chunks(completion)
        .iter()
        .map(serde_json::to_string)
        .collect::<serde_json::Result<Vec<_>>>()?;
    frames.push(DONE_SENTINEL.to_string());
    Ok(frames)
}
