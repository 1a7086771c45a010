//! Pacing between remote calls.
//!
//! Batches ask a `Pacer` to wait before the next call instead of sleeping
//! inline, so tests can run without delays and deployments can tune them.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::RuntimeConfig;

/// Points in a workflow where a pause is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacePoint {
    /// After a channel metadata lookup during discovery.
    ChannelLookup,
    /// Between two discovery keywords.
    Keyword,
    /// After a join attempt.
    Join,
    /// After a comment attempt, with the job's own interval.
    Comment {
        /// Interval requested by the job.
        interval: Duration,
    },
}

/// Decides how long to wait before the next remote call.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits before the next call at `point`.
    async fn pause(&self, point: PacePoint);
}

/// Fixed delays taken from a `RuntimeConfig`.
#[derive(Debug, Clone)]
pub struct FixedPacer {
    channel_lookup: Duration,
    keyword: Duration,
    join: Duration,
}

impl FixedPacer {
    /// Creates a pacer with the configured delays.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            channel_lookup: config.channel_lookup_delay,
            keyword: config.keyword_delay,
            join: config.join_delay,
        }
    }

    /// Returns the delay for `point`.
    pub fn delay(&self, point: PacePoint) -> Duration {
        match point {
            PacePoint::ChannelLookup => self.channel_lookup,
            PacePoint::Keyword => self.keyword,
            PacePoint::Join => self.join,
            PacePoint::Comment { interval } => interval,
        }
    }
}

#[async_trait]
impl Pacer for FixedPacer {
    async fn pause(&self, point: PacePoint) {
        let delay = self.delay(point);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Skips every rate-limit delay. A comment job's own interval is still
/// honored, since it is the schedule the caller asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pause(&self, point: PacePoint) {
        if let PacePoint::Comment { interval } = point {
            tokio::time::sleep(interval).await;
        }
    }
}
