//! Comment job handlers.

use std::time::Duration;

use axum::{extract::State, Json};

use tgpilot_models::CommentPlan;

use crate::error::{ApiError, Result};
use crate::extract::{ApiJson, OptionalJson};
use crate::state::AppState;
use crate::types::{
    session_key, CommentRequest, CommentResponse, JobListResponse, StopCommentingRequest,
    StopCommentingResponse,
};

/// POST /api/comment - Start the session's comment job.
///
/// Responds as soon as the job is scheduled.
pub async fn start_comment(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<Json<CommentResponse>> {
    let key = session_key(req.api_id.as_ref(), req.phone_number.as_deref())?;
    let text = req
        .comment_text
        .ok_or_else(|| ApiError::BadRequest("commentText is required".to_string()))?;
    let interval = req
        .interval
        .map(Duration::from_secs)
        .unwrap_or(state.runtime.config().default_comment_interval);

    let plan = CommentPlan::new(req.channel_links, text, interval);
    let job = state.runtime.start_commenting(&key, plan).await?;

    Ok(Json(CommentResponse {
        success: true,
        message: "Commenting started".to_string(),
        job_id: job.id.to_string(),
        interval: job.interval_secs,
        channels: job.channels,
    }))
}

/// POST /api/stop-commenting - Stop one session's job, or all of them.
///
/// Only an empty body means "all"; a body that does not parse is rejected.
pub async fn stop_commenting(
    State(state): State<AppState>,
    OptionalJson(req): OptionalJson<StopCommentingRequest>,
) -> Result<Json<StopCommentingResponse>> {
    let target = req.target()?;
    let stopped = state.runtime.stop_commenting(target.as_ref()).await;

    let message = match stopped {
        0 => "No active comment job".to_string(),
        1 => "Commenting stopped".to_string(),
        n => format!("Stopped {} comment jobs", n),
    };
    Ok(Json(StopCommentingResponse {
        success: true,
        message,
        stopped,
    }))
}

/// GET /api/jobs - List active comment jobs.
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs = state.runtime.comment_jobs().await;
    let total = jobs.len();
    Json(JobListResponse {
        success: true,
        jobs,
        total,
    })
}
