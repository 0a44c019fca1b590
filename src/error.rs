//! Error types for the shim.
//!
//! [`ShimError`] covers failures inside the process (config files, adapter
//! input). [`ApiError`] is what a caller sees: an HTTP status plus the OpenAI
//! error envelope.

use axum::http::StatusCode;
use thiserror::Error;

use crate::translate::openai_types::{ErrorDetail, ErrorResponse};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ShimError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Adapter error: {message}")]
    Adapter { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ShimError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter {
            message: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShimError>;

/// A failure reported to the caller as an OpenAI-style error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
    pub code: Option<&'static str>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        message: impl Into<String>,
        kind: &'static str,
        code: Option<&'static str>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
            code,
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg, "invalid_request_error", None)
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "Not found",
            "invalid_request_error",
            Some("not_found"),
        )
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
            "invalid_request_error",
            Some("method_not_allowed"),
        )
    }

    pub fn invalid_api_key() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Invalid API key",
            "invalid_api_key",
            Some("invalid_api_key"),
        )
    }

    /// The upstream could not be reached at all.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            format!("upstream request failed: {err}"),
            "api_error",
            Some("upstream_error"),
        )
    }

    /// The upstream answered with a non-2xx status.
    pub fn upstream_status(status: u16, body: &str) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            format!("upstream returned {status}: {}", truncate_chars(body, 500)),
            "api_error",
            Some("upstream_status_error"),
        )
    }

    pub fn to_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                message: self.message.clone(),
                error_type: self.kind.to_string(),
                param: None,
                code: self.code.map(str::to_string),
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status.as_u16(), self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
