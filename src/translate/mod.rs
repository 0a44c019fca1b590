//! Translation between OpenAI Chat Completions and the ChatJimmy chat API.
//!
//! Everything in here is pure (no I/O): request mapping, reply parsing,
//! completion building and the simulated SSE frames.

pub mod openai_types;
pub mod request;
pub mod response;
pub mod streaming;
pub mod upstream_types;
pub mod values;
