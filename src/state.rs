// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::upstream::UpstreamClient;

pub type SharedState = Arc<AppState>;

/// Read-only for the life of the process.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        Ok(Self { config, upstream })
    }

    pub fn shared(config: Config) -> anyhow::Result<SharedState> {
        Ok(Arc::new(Self::new(config)?))
    }
}
