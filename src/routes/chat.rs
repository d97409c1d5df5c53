// src/routes/chat.rs
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    services::{normalizer::normalize_bytes, prompt::format_prompt},
    state::SharedState,
};

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let debug = state.config.debug;

    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "rejected chat body");
        AppError::BadRequest(
            "Request body must be a JSON object with a \"message\" field".to_string(),
        )
    })?;

    let message = payload.message.as_deref().map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    if state.config.credential_missing() {
        tracing::error!(
            profile = %state.config.profile,
            "chat requested but no API key is configured"
        );
        return Err(AppError::Configuration);
    }

    let system = payload
        .system_prompt
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(state.config.system_prompt.as_str());
    let prompt = format_prompt(system, message, state.config.max_prompt_chars);

    tracing::info!(
        profile = %state.upstream.profile(),
        model = state.upstream.model(),
        prompt_chars = prompt.chars().count(),
        "forwarding chat"
    );

    let reply = state
        .upstream
        .generate(&prompt)
        .await
        .map_err(|e| AppError::from_upstream(e, debug))?;

    if !reply.is_success() {
        return Err(AppError::from_status(&reply, debug));
    }

    let response = normalize_bytes(reply.body.as_bytes(), Some(&prompt))
        .map_err(|e| AppError::from_normalize(e, debug))?;

    tracing::info!(response_chars = response.chars().count(), "chat answered");
    Ok(Json(ChatResponse { response }))
}
