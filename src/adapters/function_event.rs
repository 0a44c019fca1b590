//! Adapter for function platforms that deliver a JSON event and expect a JSON
//! reply (Netlify Functions, Lambda-style proxies).

use std::collections::{BTreeMap, HashMap};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::HostAdapter;
use crate::error::{Result, ShimError};
use crate::http::{HttpRequest, HttpResponse};

/// Where the platform mounts the function.
pub const DEFAULT_MOUNT_PREFIX: &str = "/.netlify/functions/openai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub raw_url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub raw_query: Option<String>,
}

impl FunctionEvent {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReply {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FunctionEventAdapter {
    mount_prefix: String,
}

impl Default for FunctionEventAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_PREFIX)
    }
}

impl FunctionEventAdapter {
    pub fn new(mount_prefix: impl Into<String>) -> Self {
        Self {
            mount_prefix: mount_prefix.into(),
        }
    }
}

impl HostAdapter for FunctionEventAdapter {
    type Event = FunctionEvent;
    type Reply = FunctionReply;

    fn to_core_request(&self, event: FunctionEvent) -> Result<HttpRequest> {
        let method_name = event
            .http_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("GET");
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|e| ShimError::adapter(format!("Invalid HTTP method '{method_name}': {e}")))?;

        let raw_url = resolve_raw_url(&event);
        let url = reqwest::Url::parse(&raw_url)
            .map_err(|e| ShimError::adapter(format!("Invalid request URL '{raw_url}': {e}")))?;
        let path = strip_mount_prefix(url.path(), &self.mount_prefix).to_string();

        let headers = event
            .headers
            .as_ref()
            .map(header_map_from)
            .unwrap_or_default();

        let body = if method == Method::GET || method == Method::HEAD {
            Bytes::new()
        } else {
            match event.body {
                None => Bytes::new(),
                Some(b) if event.is_base64_encoded => Bytes::from(STANDARD.decode(b.as_bytes())?),
                Some(b) => Bytes::from(b),
            }
        };

        Ok(HttpRequest {
            method,
            path: if path.is_empty() { "/".to_string() } else { path },
            headers,
            body,
        })
    }

    fn from_core_response(&self, response: HttpResponse) -> FunctionReply {
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        FunctionReply {
            status_code: response.status.as_u16(),
            headers,
            body: response.body.to_text(),
        }
    }
}

/// `rawUrl` when the platform gives one, otherwise rebuilt from the headers
/// and path.
fn resolve_raw_url(event: &FunctionEvent) -> String {
    if let Some(raw) = event.raw_url.as_deref().filter(|u| !u.is_empty()) {
        return raw.to_string();
    }

    let header = |name: &str| {
        event.headers.as_ref().and_then(|h| {
            h.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    };

    let proto = header("x-forwarded-proto").unwrap_or("https");
    let host = header("host").unwrap_or("localhost");
    let path = event.path.as_deref().filter(|p| !p.is_empty()).unwrap_or("/");
    let query = event
        .raw_query
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(|q| format!("?{q}"))
        .unwrap_or_default();

    format!("{proto}://{host}{path}{query}")
}

fn strip_mount_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if path == prefix {
        return "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn header_map_from(raw: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(raw.len());
    for (name, value) in raw {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                headers.append(n, v);
            }
            _ => tracing::debug!(header = %name, "Skipping invalid header"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShimConfig;
    use axum::http::StatusCode;

    fn event(json: serde_json::Value) -> FunctionEvent {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_mount_prefix_is_stripped() {
        assert_eq!(strip_mount_prefix("/.netlify/functions/openai", DEFAULT_MOUNT_PREFIX), "/");
        assert_eq!(
            strip_mount_prefix("/.netlify/functions/openai/v1/models", DEFAULT_MOUNT_PREFIX),
            "/v1/models"
        );
        assert_eq!(
            strip_mount_prefix("/.netlify/functions/openaix", DEFAULT_MOUNT_PREFIX),
            "/.netlify/functions/openaix"
        );
        assert_eq!(strip_mount_prefix("/v1/models", DEFAULT_MOUNT_PREFIX), "/v1/models");
    }

    #[test]
    fn test_event_with_raw_url_and_base64_body() {
        let adapter = FunctionEventAdapter::default();
        let req = adapter
            .to_core_request(event(serde_json::json!({
                "httpMethod": "POST",
                "rawUrl": "https://site.example/.netlify/functions/openai/v1/chat/completions?x=1",
                "headers": {"authorization": "Bearer k", "content-type": "application/json"},
                "body": STANDARD.encode(br#"{"messages":[]}"#),
                "isBase64Encoded": true,
            })))
            .unwrap();

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/v1/chat/completions");
        assert_eq!(req.headers["authorization"], "Bearer k");
        assert_eq!(&req.body[..], br#"{"messages":[]}"#);
    }

    #[test]
    fn test_event_without_raw_url_is_rebuilt() {
        let ev = event(serde_json::json!({
            "path": "/.netlify/functions/openai/health",
            "rawQuery": "a=b",
            "headers": {"Host": "fn.example", "X-Forwarded-Proto": "http"},
        }));
        assert_eq!(
            resolve_raw_url(&ev),
            "http://fn.example/.netlify/functions/openai/health?a=b"
        );

        let req = FunctionEventAdapter::default().to_core_request(ev).unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/health");
    }

    #[test]
    fn test_empty_event_defaults() {
        let ev = FunctionEvent::default();
        assert_eq!(resolve_raw_url(&ev), "https://localhost/");
        let req = FunctionEventAdapter::default().to_core_request(ev).unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/");
    }

    #[test]
    fn test_get_body_is_dropped() {
        let req = FunctionEventAdapter::default()
            .to_core_request(event(serde_json::json!({
                "httpMethod": "GET",
                "path": "/v1/models",
                "body": "ignored",
            })))
            .unwrap();
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_event_from_json() {
        let ev = FunctionEvent::from_json(r#"{"httpMethod":"POST","rawUrl":"https://x/v1/models"}"#)
            .unwrap();
        assert_eq!(ev.http_method.as_deref(), Some("POST"));

        let err = FunctionEvent::from_json("not an event").unwrap_err();
        assert!(matches!(err, ShimError::Json(_)));
    }

    #[test]
    fn test_bad_base64_is_an_error() {
        let err = FunctionEventAdapter::default()
            .to_core_request(event(serde_json::json!({
                "httpMethod": "POST",
                "body": "***",
                "isBase64Encoded": true,
            })))
            .unwrap_err();
        assert!(matches!(err, ShimError::Base64(_)));
    }

    #[test]
    fn test_reply_flattens_headers_and_frames() {
        let resp = HttpResponse::event_stream(vec!["[DONE]".to_string()], &ShimConfig::default());
        let reply = FunctionEventAdapter::default().from_core_response(resp);
        assert_eq!(reply.status_code, StatusCode::OK.as_u16());
        assert_eq!(reply.headers["content-type"], "text/event-stream; charset=utf-8");
        assert_eq!(reply.headers["access-control-allow-origin"], "*");
        assert_eq!(reply.body, "data: [DONE]\n\n");

        let v = serde_json::to_value(&reply).unwrap();
        assert!(v.get("statusCode").is_some());
    }
}
