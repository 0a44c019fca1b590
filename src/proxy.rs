use axum::http::StatusCode;

use crate::config::ShimConfig;
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::translate::request::prepare_chat;
use crate::translate::response::{build_completion, parse_upstream_reply};
use crate::translate::streaming::completion_frames;
use crate::translate::upstream_types::UpstreamRequest;

/// Handle a `/v1/chat/completions` body end to end: translate, call the
/// upstream once, translate the reply back.
pub async fn chat_completion(
    body: &[u8],
    config: &ShimConfig,
    client: &reqwest::Client,
) -> Result<HttpResponse, ApiError> {
    let prepared = prepare_chat(body, config)?;

    let raw = send_upstream(&prepared.upstream, config, client).await?;
    let reply = parse_upstream_reply(&raw);
    let completion = build_completion(&prepared.model, reply);

    tracing::info!(
        id = %completion.id,
        model = %completion.model,
        prompt_tokens = completion.usage.prompt_tokens,
        completion_tokens = completion.usage.completion_tokens,
        stream = prepared.stream,
        "Completed"
    );

    if !prepared.stream {
        return Ok(HttpResponse::json(StatusCode::OK, &completion, config));
    }

    let frames = completion_frames(&completion).map_err(|e| {
        tracing::error!(error = %e, "Failed to encode stream frames");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error",
            "api_error",
            None,
        )
    })?;
    Ok(HttpResponse::event_stream(frames, config))
}

/// POST the translated request and return the raw reply text.
pub async fn send_upstream(
    req: &UpstreamRequest,
    config: &ShimConfig,
    client: &reqwest::Client,
) -> Result<String, ApiError> {
    let url = config.upstream_url.as_str();

    tracing::info!(
        url,
        model = %req.chat_options.selected_model,
        messages = req.messages.len(),
        "POST upstream"
    );

    let response = client
        .post(url)
        .header("content-type", "application/json")
        .json(req)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Upstream request failed");
            ApiError::upstream(e)
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read upstream body");
        ApiError::upstream(e)
    })?;

    tracing::debug!(status = status.as_u16(), body_len = body.len(), "Upstream responded");

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Upstream returned an error status");
        return Err(ApiError::upstream_status(status.as_u16(), &body));
    }

    Ok(body)
}
