//! Request routing: path cleanup, aliases, method checks, dispatch.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::auth::check_bearer;
use crate::config::ShimConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::{models, proxy};

/// Alternate paths used by hosts that can't serve nested routes.
const ALIASES: &[(&str, &str)] = &[
    ("/api", "/"),
    ("/api/health", "/health"),
    ("/api/v1-models", "/v1/models"),
    ("/api/v1-chat-completions", "/v1/chat/completions"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Models,
    ChatCompletions,
    NotFound,
}

impl Route {
    /// Resolve a raw request path.
    pub fn from_path(raw: &str) -> Self {
        match canonical_path(raw).as_str() {
            "/" | "/health" => Route::Health,
            "/v1/models" => Route::Models,
            "/v1/chat/completions" => Route::ChatCompletions,
            _ => Route::NotFound,
        }
    }
}

/// Empty becomes `/`; trailing slashes are dropped from anything longer.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    if path.len() > 1 && path.ends_with('/') {
        return path.trim_end_matches('/').to_string();
    }
    path.to_string()
}

pub fn resolve_alias(path: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == path)
        .map_or(path, |(_, canonical)| *canonical)
}

/// Normalize, apply aliases, normalize again.
pub fn canonical_path(raw: &str) -> String {
    normalize_path(resolve_alias(&normalize_path(raw)))
}

/// Entry point for every hosted request.
pub async fn route(
    req: HttpRequest,
    config: &ShimConfig,
    client: &reqwest::Client,
) -> HttpResponse {
    if req.method == Method::OPTIONS {
        return HttpResponse::preflight(config);
    }

    let route = Route::from_path(&req.path);
    tracing::debug!(method = %req.method, path = %req.path, ?route, "Routing request");

    match dispatch(route, &req, config, client).await {
        Ok(resp) => resp,
        Err(err) => {
            tracing::debug!(status = err.status.as_u16(), kind = err.kind, "Request failed");
            HttpResponse::error(&err, config)
        }
    }
}

async fn dispatch(
    route: Route,
    req: &HttpRequest,
    config: &ShimConfig,
    client: &reqwest::Client,
) -> Result<HttpResponse, ApiError> {
    match route {
        Route::Health => Ok(HttpResponse::json(
            StatusCode::OK,
            &json!({ "status": "ok" }),
            config,
        )),
        Route::Models => {
            if req.method != Method::GET {
                return Err(ApiError::method_not_allowed());
            }
            Ok(HttpResponse::json(
                StatusCode::OK,
                &models::list_models(config),
                config,
            ))
        }
        Route::ChatCompletions => {
            if req.method != Method::POST {
                return Err(ApiError::method_not_allowed());
            }
            check_bearer(&req.headers, config)?;
            proxy::chat_completion(&req.body, config, client).await
        }
        Route::NotFound => Err(ApiError::not_found()),
    }
}
