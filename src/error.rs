// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorBody;
use crate::services::normalizer::NormalizeError;
use crate::services::upstream::{UpstreamError, UpstreamResponse};

/// Every failure a handler can return. `detail` is only ever filled when
/// debug diagnostics are enabled.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend credential is not configured")]
    Configuration,
    #[error("{0}")]
    BadRequest(String),
    #[error("Unable to reach the model backend")]
    UpstreamUnreachable { detail: Option<String> },
    #[error("Model backend returned an unrecognized response")]
    UpstreamUnexpectedShape { detail: Option<String> },
    #[error("Model backend returned an error")]
    UpstreamStatus { detail: Option<String> },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration
            | AppError::UpstreamUnexpectedShape { .. }
            | AppError::UpstreamStatus { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            AppError::UpstreamUnreachable { detail }
            | AppError::UpstreamUnexpectedShape { detail }
            | AppError::UpstreamStatus { detail } => detail.as_deref(),
            AppError::Configuration | AppError::BadRequest(_) => None,
        }
    }

    pub fn from_upstream(err: UpstreamError, debug: bool) -> Self {
        match err {
            UpstreamError::MissingCredential | UpstreamError::InvalidCredential => {
                tracing::error!(error = %err, "backend credential problem");
                AppError::Configuration
            }
            UpstreamError::Network(reason) => {
                tracing::warn!(%reason, "backend unreachable");
                AppError::UpstreamUnreachable { detail: debug.then_some(reason) }
            }
        }
    }

    pub fn from_status(response: &UpstreamResponse, debug: bool) -> Self {
        tracing::warn!(
            status = response.status,
            body = %response.body,
            "backend returned an error status"
        );
        AppError::UpstreamStatus {
            detail: debug.then(|| format!("backend status {}: {}", response.status, response.body)),
        }
    }

    pub fn from_normalize(err: NormalizeError, debug: bool) -> Self {
        Self::unexpected_shape(err.to_string(), debug)
    }

    pub fn unexpected_shape(reason: impl Into<String>, debug: bool) -> Self {
        let reason = reason.into();
        tracing::warn!(%reason, "backend response not recognized");
        AppError::UpstreamUnexpectedShape { detail: debug.then_some(reason) }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            status_code: status.as_u16(),
            detail: self.detail().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Configuration.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::UpstreamUnreachable { detail: None }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn detail_only_in_debug() {
        let response = UpstreamResponse { status: 502, body: "secret internals".into() };
        assert!(AppError::from_status(&response, false).detail().is_none());
        let detail = AppError::from_status(&response, true).detail().map(str::to_string);
        assert_eq!(detail.as_deref(), Some("backend status 502: secret internals"));

        let network = UpstreamError::Network("http://10.0.0.5 refused".into());
        let err = AppError::from_upstream(network, false);
        assert!(err.detail().is_none());
    }
}
