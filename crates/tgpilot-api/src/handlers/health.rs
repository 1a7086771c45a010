//! Health check and landing page handlers.

use axum::{extract::State, response::Html, Json};
use chrono::Utc;

use crate::state::AppState;
use crate::types::HealthResponse;

const LANDING_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>tgpilot</title></head>
<body>
<h1>tgpilot</h1>
<p>Channel automation API. See <code>/api/health</code> for status.</p>
<ul>
<li><code>POST /api/connect</code></li>
<li><code>POST /api/search-channels</code></li>
<li><code>POST /api/subscribe</code></li>
<li><code>POST /api/comment</code></li>
<li><code>POST /api/stop-commenting</code></li>
<li><code>GET /api/jobs</code></li>
<li><code>POST /api/disconnect</code></li>
</ul>
</body>
</html>
"#;

/// GET /health, GET /api/health - Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        uptime_seconds: state.config.uptime_seconds(),
        sessions: state.runtime.registry().len().await,
    })
}

/// GET / - Static landing page.
pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
