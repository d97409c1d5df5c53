// src/routes/health.rs
use std::{convert::Infallible, path::Path};

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use tower::util::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    message::{BackendStatus, HealthResponse, HealthStatus, ServiceInfo},
    state::SharedState,
};

/// Serves the chat page (`<static_dir>/index.html`) when it exists,
/// otherwise a JSON banner.
pub async fn root_handler(State(state): State<SharedState>, req: Request) -> Response {
    let index = Path::new(&state.config.static_dir).join("index.html");
    if tokio::fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
        let served: Result<_, Infallible> = ServeFile::new(index).oneshot(req).await;
        return match served {
            Ok(response) => response.map(Body::new).into_response(),
            Err(never) => match never {},
        };
    }

    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        profile: state.config.profile.to_string(),
        model: state.config.model_name.clone(),
    })
    .into_response()
}

/// Always 200. Only a missing required key makes the service `unhealthy`;
/// an unreachable backend is `partial`.
pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let (status, backend) = if state.config.credential_missing() {
        (HealthStatus::Unhealthy, BackendStatus::ApiKeyMissing)
    } else {
        match state.upstream.probe().await {
            Ok(reply) if reply.is_success() => (HealthStatus::Healthy, BackendStatus::Connected),
            Ok(reply) => {
                tracing::warn!(status = reply.status, "health probe got non-success status");
                (HealthStatus::Partial, BackendStatus::Disconnected)
            }
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed");
                (HealthStatus::Partial, BackendStatus::Disconnected)
            }
        }
    };

    Json(HealthResponse {
        status,
        backend,
        profile: state.config.profile.to_string(),
        model: state.config.model_name.clone(),
    })
}
