//! Platform-neutral HTTP request/response model.
//!
//! Hosting adapters convert their own request objects into [`HttpRequest`]
//! and render [`HttpResponse`] back out; the core never sees anything else.

use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::config::ShimConfig;
use crate::error::ApiError;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SSE_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

pub const ALLOW_ORIGIN: HeaderName = HeaderName::from_static("access-control-allow-origin");
pub const ALLOW_METHODS: HeaderName = HeaderName::from_static("access-control-allow-methods");
pub const ALLOW_HEADERS: HeaderName = HeaderName::from_static("access-control-allow-headers");
pub const MAX_AGE: HeaderName = HeaderName::from_static("access-control-max-age");

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path only, no query string.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    /// SSE `data:` payloads, one per frame.
    Events(Vec<String>),
}

impl ResponseBody {
    /// The body as it goes over the wire.
    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Empty => String::new(),
            ResponseBody::Text(t) => t.clone(),
            ResponseBody::Events(frames) => frames.iter().map(|f| sse_frame(f)).collect(),
        }
    }
}

pub fn sse_frame(data: &str) -> String {
    format!("data: {data}\n\n")
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl HttpResponse {
    /// CORS preflight: 204, CORS headers, nothing else.
    pub fn preflight(config: &ShimConfig) -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: cors_headers(config),
            body: ResponseBody::Empty,
        }
    }

    pub fn json<T: Serialize>(status: StatusCode, data: &T, config: &ShimConfig) -> Self {
        let mut headers = cors_headers(config);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        match serde_json::to_string(data) {
            Ok(body) => Self {
                status,
                headers,
                body: ResponseBody::Text(body),
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    headers,
                    body: ResponseBody::Text(
                        r#"{"error":{"message":"Internal error","type":"api_error","param":null,"code":null}}"#
                            .to_string(),
                    ),
                }
            }
        }
    }

    pub fn error(err: &ApiError, config: &ShimConfig) -> Self {
        Self::json(err.status, &err.to_body(), config)
    }

    pub fn event_stream(frames: Vec<String>, config: &ShimConfig) -> Self {
        let mut headers = cors_headers(config);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(SSE_CONTENT_TYPE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        Self {
            status: StatusCode::OK,
            headers,
            body: ResponseBody::Events(frames),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn cors_headers(config: &ShimConfig) -> HeaderMap {
    let origin = HeaderValue::from_str(&config.allowed_origin).unwrap_or_else(|_| {
        tracing::warn!(origin = %config.allowed_origin, "Invalid ALLOWED_ORIGIN, using *");
        HeaderValue::from_static("*")
    });

    let mut headers = HeaderMap::new();
    headers.insert(ALLOW_ORIGIN, origin);
    headers.insert(ALLOW_METHODS, HeaderValue::from_static("GET,POST,OPTIONS"));
    headers.insert(ALLOW_HEADERS, HeaderValue::from_static("Authorization,Content-Type"));
    headers.insert(MAX_AGE, HeaderValue::from_static("86400"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_headers_use_configured_origin() {
        let config = ShimConfig {
            allowed_origin: "https://app.example".to_string(),
            ..ShimConfig::default()
        };
        let headers = cors_headers(&config);
        assert_eq!(headers[ALLOW_ORIGIN], "https://app.example");
        assert_eq!(headers[ALLOW_METHODS], "GET,POST,OPTIONS");
        assert_eq!(headers[ALLOW_HEADERS], "Authorization,Content-Type");
        assert_eq!(headers[MAX_AGE], "86400");
    }

    #[test]
    fn test_invalid_origin_falls_back_to_wildcard() {
        let config = ShimConfig {
            allowed_origin: "bad\norigin".to_string(),
            ..ShimConfig::default()
        };
        assert_eq!(cors_headers(&config)[ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_preflight_has_no_body_or_content_type() {
        let resp = HttpResponse::preflight(&ShimConfig::default());
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert_eq!(resp.body, ResponseBody::Empty);
        assert!(resp.header("content-type").is_none());
    }

    #[test]
    fn test_event_stream_wire_format() {
        let resp = HttpResponse::event_stream(
            vec!["{\"a\":1}".to_string(), "[DONE]".to_string()],
            &ShimConfig::default(),
        );
        assert_eq!(resp.header("content-type"), Some(SSE_CONTENT_TYPE));
        assert_eq!(resp.header("cache-control"), Some("no-cache"));
        assert_eq!(resp.header("connection"), Some("keep-alive"));
        assert_eq!(resp.body.to_text(), "data: {\"a\":1}\n\ndata: [DONE]\n\n");
    }
}
