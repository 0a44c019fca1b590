use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::config::ShimConfig;
use crate::error::ApiError;

/// Check the static bearer token, if one is configured.
pub fn check_bearer(headers: &HeaderMap, config: &ShimConfig) -> Result<(), ApiError> {
    if !config.auth_enabled() {
        return Ok(());
    }

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();

    if provided.is_empty() || provided != config.api_key {
        tracing::warn!(
            header_present = headers.contains_key(AUTHORIZATION),
            "Rejected request with invalid API key"
        );
        return Err(ApiError::invalid_api_key());
    }

    Ok(())
}
