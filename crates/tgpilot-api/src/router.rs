//! Router configuration and server setup.

use std::future::Future;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Health
        .route("/", get(handlers::landing))
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        // Sessions
        .route("/api/connect", post(handlers::connect))
        .route("/api/disconnect", post(handlers::disconnect))
        // Channels
        .route("/api/search-channels", post(handlers::search_channels))
        .route("/api/subscribe", post(handlers::subscribe))
        // Comment jobs
        .route("/api/comment", post(handlers::start_comment))
        .route("/api/stop-commenting", post(handlers::stop_commenting))
        .route("/api/jobs", get(handlers::list_jobs))
        // Apply middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Starts the API server and runs until `shutdown` resolves.
pub async fn serve<F>(config: ApiConfig, state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        address = %addr,
        environment = %config.environment,
        "API server listening"
    );
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
