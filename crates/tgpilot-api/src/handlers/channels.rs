//! Channel search and subscription handlers.

use axum::{extract::State, Json};

use tgpilot_runtime::DiscoveryQuery;

use crate::error::{ApiError, Result};
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::types::{
    session_key, SearchChannelsRequest, SearchChannelsResponse, SubscribeRequest,
    SubscribeResponse,
};

/// POST /api/search-channels - Find channels by keyword and subscriber count.
pub async fn search_channels(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SearchChannelsRequest>,
) -> Result<Json<SearchChannelsResponse>> {
    let key = session_key(req.api_id.as_ref(), req.phone_number.as_deref())?;
    let query = DiscoveryQuery::new(
        req.keywords,
        req.min_subscribers.unwrap_or(0),
        req.max_subscribers.unwrap_or(i64::MAX),
    );

    let channels = state.runtime.search_channels(&key, &query).await?;
    let total = channels.len();
    Ok(Json(SearchChannelsResponse {
        success: true,
        channels,
        total,
    }))
}

/// POST /api/subscribe - Join a batch of channels.
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    let key = session_key(req.api_id.as_ref(), req.phone_number.as_deref())?;
    if req.channel_links.is_empty() {
        return Err(ApiError::BadRequest(
            "channelLinks must not be empty".to_string(),
        ));
    }

    let summary = state.runtime.subscribe(&key, &req.channel_links).await?;
    Ok(Json(SubscribeResponse {
        success: true,
        results: summary.results,
        joined: summary.joined,
        failed: summary.failed,
        interrupted: summary.interrupted,
    }))
}
