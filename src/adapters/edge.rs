use std::convert::Infallible;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use bytes::Bytes;

use super::HostAdapter;
use crate::error::Result;
use crate::http::{sse_frame, HttpRequest, HttpResponse, ResponseBody};

/// Adapter for hosts that speak plain `http` types (the axum server, edge
/// functions). An edge function bound to a single route can force the path
/// the core sees.
#[derive(Debug, Clone, Default)]
pub struct EdgeAdapter {
    forced_path: Option<String>,
}

impl EdgeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forced_path(path: impl Into<String>) -> Self {
        Self {
            forced_path: Some(path.into()),
        }
    }
}

impl HostAdapter for EdgeAdapter {
    type Event = Request<Bytes>;
    type Reply = Response;

    fn to_core_request(&self, event: Request<Bytes>) -> Result<HttpRequest> {
        let (parts, body) = event.into_parts();
        let path = self
            .forced_path
            .clone()
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(HttpRequest {
            method: parts.method,
            path,
            headers: parts.headers,
            body,
        })
    }

    fn from_core_response(&self, response: HttpResponse) -> Response {
        let body = match response.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Text(text) => Body::from(text),
            // One body chunk per SSE frame.
            ResponseBody::Events(frames) => Body::from_stream(futures::stream::iter(
                frames
                    .into_iter()
                    .map(|f| Ok::<_, Infallible>(Bytes::from(sse_frame(&f)))),
            )),
        };

        let mut reply = Response::new(body);
        *reply.status_mut() = response.status;
        *reply.headers_mut() = response.headers;
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShimConfig;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_request_keeps_path_without_query() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("https://shim.example/v1/chat/completions/?debug=1")
            .header("authorization", "Bearer x")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let core = EdgeAdapter::new().to_core_request(req).unwrap();
        assert_eq!(core.method, Method::POST);
        assert_eq!(core.path, "/v1/chat/completions/");
        assert_eq!(core.headers["authorization"], "Bearer x");
        assert_eq!(core.body, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_forced_path_overrides_uri() {
        let req = Request::builder()
            .uri("/api/anything")
            .body(Bytes::new())
            .unwrap();
        let core = EdgeAdapter::with_forced_path("/v1/chat/completions")
            .to_core_request(req)
            .unwrap();
        assert_eq!(core.path, "/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_event_stream_body_is_framed() {
        let resp = HttpResponse::event_stream(
            vec!["{}".to_string(), "[DONE]".to_string()],
            &ShimConfig::default(),
        );
        let reply = EdgeAdapter::new().from_core_response(resp);
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(
            reply.headers()["content-type"],
            "text/event-stream; charset=utf-8"
        );

        let body = axum::body::to_bytes(reply.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"data: {}\n\ndata: [DONE]\n\n");
    }
}
