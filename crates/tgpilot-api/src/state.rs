//! Application state shared across handlers.

use std::sync::Arc;

use tgpilot_runtime::Runtime;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Session registry and workflows.
    pub runtime: Arc<Runtime>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(config: ApiConfig, runtime: Arc<Runtime>) -> Self {
        Self {
            config: Arc::new(config),
            runtime,
        }
    }
}
