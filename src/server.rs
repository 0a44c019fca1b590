use crate::adapters::{EdgeAdapter, HostAdapter};
use crate::config::{env_lookup, FileConfig, ShimConfig};
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::router;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Request bodies larger than this are rejected before translation.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Source of setting overrides, consulted on every request.
pub type SettingLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    /// File layer read at startup; `lookup` (the environment by default) is
    /// consulted per request.
    pub file_config: FileConfig,
    pub client: reqwest::Client,
    pub adapter: EdgeAdapter,
    pub lookup: SettingLookup,
}

impl AppState {
    pub fn new(file_config: FileConfig, client: reqwest::Client) -> Self {
        Self {
            file_config,
            client,
            adapter: EdgeAdapter::new(),
            lookup: Arc::new(env_lookup),
        }
    }

    pub fn with_adapter(mut self, adapter: EdgeAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    /// Settings for one request.
    pub fn request_config(&self) -> ShimConfig {
        ShimConfig::resolve(&self.file_config, |key| (self.lookup)(key))
    }
}

/// Every method and path goes to the core router, which handles aliases and
/// unknown routes itself.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(handle_any)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_any(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let config = state.request_config();
    let (parts, body) = request.into_parts();

    // Preflights are answered without reading the body.
    let read = if parts.method == Method::OPTIONS {
        Ok(Bytes::new())
    } else {
        axum::body::to_bytes(body, MAX_BODY_BYTES).await
    };

    let bytes = match read {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            let err = ApiError::invalid_request(format!("Failed to read request body: {e}"));
            return state
                .adapter
                .from_core_response(HttpResponse::error(&err, &config));
        }
    };

    let core_request = match state
        .adapter
        .to_core_request(axum::http::Request::from_parts(parts, bytes))
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to adapt request");
            let err = ApiError::invalid_request(e.to_string());
            return state
                .adapter
                .from_core_response(HttpResponse::error(&err, &config));
        }
    };

    let response = router::route(core_request, &config, &state.client).await;
    state.adapter.from_core_response(response)
}
