//! Session login and logout handlers.

use axum::{extract::State, Json};
use tracing::info;

use tgpilot_protocol::ApiCredentials;
use tgpilot_runtime::{AuthOutcome, LoginRequest};

use crate::error::{ApiError, Result};
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::types::{session_key, ConnectRequest, ConnectResponse, DisconnectRequest, SuccessResponse};

/// POST /api/connect - Advance the login handshake.
///
/// Returns `needsCode`, `needsPassword` or the session string depending on
/// how far the handshake got.
pub async fn connect(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ConnectRequest>,
) -> Result<Json<ConnectResponse>> {
    let key = session_key(req.api_id.as_ref(), req.phone_number.as_deref())?;
    let api_hash = req
        .api_hash
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("apiHash is required".to_string()))?;

    let request = LoginRequest::new(
        ApiCredentials::new(key.api_id(), api_hash),
        key.phone_number(),
    )
    .with_code(req.code)
    .with_password(req.password);

    let response = match state.runtime.connect(request).await? {
        AuthOutcome::NeedsCode => ConnectResponse {
            success: true,
            needs_code: Some(true),
            message: Some("Verification code sent".to_string()),
            ..ConnectResponse::default()
        },
        AuthOutcome::NeedsPassword => ConnectResponse {
            success: true,
            needs_password: Some(true),
            message: Some("Two-step verification password required".to_string()),
            ..ConnectResponse::default()
        },
        AuthOutcome::Authenticated { session } => ConnectResponse {
            success: true,
            session: Some(session),
            message: Some("Connected".to_string()),
            ..ConnectResponse::default()
        },
    };
    Ok(Json(response))
}

/// POST /api/disconnect - Close and forget a session.
pub async fn disconnect(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DisconnectRequest>,
) -> Result<Json<SuccessResponse>> {
    let key = session_key(req.api_id.as_ref(), req.phone_number.as_deref())?;
    let existed = state.runtime.disconnect(&key).await?;
    info!(session = %key, existed, "disconnect requested");

    Ok(Json(SuccessResponse::ok(if existed {
        "Disconnected"
    } else {
        "No active session"
    })))
}
