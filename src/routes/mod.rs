// src/routes/mod.rs
pub mod chat;
pub mod health;
pub mod models;

use crate::{config::Config, state::SharedState};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use chat::chat_handler;
use health::{health_handler, root_handler};
use models::{debug_upstream_handler, models_handler};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(config: &Config) -> Router<SharedState> {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/models", get(models_handler))
        .nest_service("/static", ServeDir::new(&config.static_dir));

    if config.debug {
        tracing::warn!("debug diagnostics enabled, upstream details will be returned to callers");
        let debug_routes = Router::new().route("/upstream", get(debug_upstream_handler));
        router = router.nest("/debug", debug_routes);
    }

    router
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Router with state attached, ready to serve.
pub fn app(state: SharedState) -> Router {
    create_router(&state.config).with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                tracing::warn!("wildcard CORS origin ignored, list origins explicitly");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "invalid CORS origin ignored");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
