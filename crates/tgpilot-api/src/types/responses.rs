//! Response DTOs for the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tgpilot_models::{ChannelCandidate, CommentJobInfo, SubscriptionResult};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Time of the check.
    pub timestamp: DateTime<Utc>,
    /// Service version.
    pub version: String,
    /// Deployment environment.
    pub environment: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Registered sessions.
    pub sessions: usize,
}

/// Connect response. Exactly one of the optional fields is set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Channel search response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchChannelsResponse {
    pub success: bool,
    pub channels: Vec<ChannelCandidate>,
    pub total: usize,
}

/// Subscription batch response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub results: Vec<SubscriptionResult>,
    pub joined: usize,
    pub failed: usize,
    /// Set when the login was lost before the batch finished.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub interrupted: bool,
}

/// Comment job start response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
    /// Seconds between channels.
    pub interval: u64,
    /// Number of channels in the rotation.
    pub channels: usize,
}

/// Stop-commenting response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCommentingResponse {
    pub success: bool,
    pub message: String,
    /// Number of jobs stopped.
    pub stopped: usize,
}

/// Active comment jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<CommentJobInfo>,
    pub total: usize,
}

/// Generic success response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    /// Creates a successful response with `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
