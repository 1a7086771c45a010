//! Request DTOs for the API.
//!
//! Every field is optional at the wire level so that a missing field turns
//! into a 400 with a readable message rather than an extractor rejection.

use serde::Deserialize;

use tgpilot_models::SessionKey;

use crate::error::{ApiError, Result};

/// Application id, sent either as a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
    /// `"apiId": 12345`
    Number(i64),
    /// `"apiId": "12345"`
    Text(String),
}

impl ApiId {
    /// Returns the id if it is a positive 32-bit integer.
    pub fn value(&self) -> Option<i32> {
        let raw = match self {
            ApiId::Number(n) => *n,
            ApiId::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        i32::try_from(raw).ok().filter(|id| *id > 0)
    }
}

/// Builds the session key from the two identifying fields.
pub fn session_key(api_id: Option<&ApiId>, phone_number: Option<&str>) -> Result<SessionKey> {
    let api_id = api_id
        .ok_or_else(|| ApiError::BadRequest("apiId is required".to_string()))?
        .value()
        .ok_or_else(|| ApiError::BadRequest("apiId must be a positive integer".to_string()))?;
    let phone = phone_number
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("phoneNumber is required".to_string()))?;
    Ok(SessionKey::new(phone, api_id))
}

/// `POST /api/connect` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub api_id: Option<ApiId>,
    pub api_hash: Option<String>,
    pub phone_number: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/search-channels` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchChannelsRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub min_subscribers: Option<i64>,
    pub max_subscribers: Option<i64>,
    pub api_id: Option<ApiId>,
    pub phone_number: Option<String>,
}

/// `POST /api/subscribe` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub channel_links: Vec<String>,
    pub api_id: Option<ApiId>,
    pub phone_number: Option<String>,
}

/// `POST /api/comment` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub channel_links: Vec<String>,
    pub comment_text: Option<String>,
    /// Seconds between channels.
    pub interval: Option<u64>,
    pub api_id: Option<ApiId>,
    pub phone_number: Option<String>,
}

/// `POST /api/stop-commenting` body. Without identity every job stops.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCommentingRequest {
    pub api_id: Option<ApiId>,
    pub phone_number: Option<String>,
}

impl StopCommentingRequest {
    /// Returns the targeted session, or `None` for all sessions.
    pub fn target(&self) -> Result<Option<SessionKey>> {
        if self.api_id.is_none() && self.phone_number.is_none() {
            return Ok(None);
        }
        session_key(self.api_id.as_ref(), self.phone_number.as_deref()).map(Some)
    }
}

/// `POST /api/disconnect` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectRequest {
    pub api_id: Option<ApiId>,
    pub phone_number: Option<String>,
}
