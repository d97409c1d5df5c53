// src/routes/models.rs
use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    error::AppError,
    message::UpstreamDiagnostics,
    services::{normalizer::normalize_bytes, prompt::format_prompt},
    state::SharedState,
};

const TEST_MESSAGE: &str = "Reply with one short sentence confirming you are online.";

/// Relays the backend's model listing (or model metadata) verbatim.
pub async fn models_handler(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let debug = state.config.debug;
    if state.config.credential_missing() {
        return Err(AppError::Configuration);
    }

    let reply = state
        .upstream
        .list_models()
        .await
        .map_err(|e| AppError::from_upstream(e, debug))?;

    if !reply.is_success() {
        return Err(AppError::from_status(&reply, debug));
    }

    serde_json::from_str(&reply.body)
        .map(Json)
        .map_err(|e| AppError::unexpected_shape(format!("model listing is not JSON: {e}"), debug))
}

// Only routed when debug diagnostics are on.
pub async fn debug_upstream_handler(
    State(state): State<SharedState>,
) -> Result<Json<UpstreamDiagnostics>, AppError> {
    let config = &state.config;
    let prompt = format_prompt(&config.system_prompt, TEST_MESSAGE, config.max_prompt_chars);
    let reply = state
        .upstream
        .generate(&prompt)
        .await
        .map_err(|e| AppError::from_upstream(e, true))?;

    let extracted = if reply.is_success() {
        normalize_bytes(reply.body.as_bytes(), Some(&prompt)).ok()
    } else {
        None
    };

    Ok(Json(UpstreamDiagnostics {
        profile: state.upstream.profile().to_string(),
        endpoint: state.upstream.generate_url(),
        status: reply.status,
        body: reply.body,
        extracted,
    }))
}
