//! Recurring comment jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ids::{JobId, SessionKey};

/// What a comment job posts, where, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPlan {
    /// Channel references, rescanned in order on every pass.
    pub channels: Vec<String>,
    /// Text posted as a reply to each channel's newest message.
    pub text: String,
    /// Pause after each channel.
    pub interval: Duration,
}

impl CommentPlan {
    /// Creates a plan.
    pub fn new(channels: Vec<String>, text: impl Into<String>, interval: Duration) -> Self {
        Self {
            channels,
            text: text.into(),
            interval,
        }
    }
}

/// Public view of a running comment job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentJobInfo {
    /// Job id.
    pub id: JobId,
    /// Session that owns the job.
    pub session: SessionKey,
    /// Number of channels in the rotation.
    pub channels: usize,
    /// Pause after each channel, in seconds.
    pub interval_secs: u64,
    /// When the job was started.
    pub started_at: DateTime<Utc>,
}

impl CommentJobInfo {
    /// Describes a job that starts now.
    pub fn new(id: JobId, session: SessionKey, plan: &CommentPlan) -> Self {
        Self {
            id,
            session,
            channels: plan.channels.len(),
            interval_secs: plan.interval.as_secs(),
            started_at: Utc::now(),
        }
    }
}
