//! Recurring comment jobs.
//!
//! Each session owns at most one job. A job walks its channel list forever,
//! replying to the newest message of each channel and pausing for the job's
//! interval after every channel. Stopping a job cancels its token; the loop
//! checks the token before each channel and again before posting, and the
//! interval pause races against it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tgpilot_models::{normalize_channel_ref, CommentJobInfo, CommentPlan, JobId, SessionKey};
use tgpilot_protocol::ProtocolClient;

use crate::bounded::bounded;
use crate::error::{Result, WorkflowError};
use crate::pacing::{PacePoint, Pacer};

struct RunningJob {
    info: CommentJobInfo,
    token: CancellationToken,
    task: JoinHandle<()>,
}

type JobMap = Arc<Mutex<HashMap<SessionKey, RunningJob>>>;

/// Owns the running comment jobs.
pub struct CommentScheduler {
    jobs: JobMap,
    pacer: Arc<dyn Pacer>,
    lookback: usize,
    call_timeout: Option<Duration>,
    min_interval: Duration,
}

impl CommentScheduler {
    /// Creates a scheduler with no jobs.
    pub fn new(
        pacer: Arc<dyn Pacer>,
        lookback: usize,
        call_timeout: Option<Duration>,
        min_interval: Duration,
    ) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            pacer,
            lookback: lookback.max(1),
            call_timeout,
            min_interval,
        }
    }

    /// Starts a job for `key`, replacing the session's previous job.
    ///
    /// Returns as soon as the job is spawned.
    pub async fn start(
        &self,
        key: SessionKey,
        client: Arc<dyn ProtocolClient>,
        plan: CommentPlan,
    ) -> Result<CommentJobInfo> {
        let channels = self.validate(&plan)?;

        let id = JobId::new();
        let info = CommentJobInfo::new(id.clone(), key.clone(), &plan);
        let token = CancellationToken::new();

        let worker = Worker {
            session: key.clone(),
            client,
            pacer: Arc::clone(&self.pacer),
            channels,
            text: plan.text.clone(),
            interval: plan.interval,
            lookback: self.lookback,
            call_timeout: self.call_timeout,
            token: token.clone(),
        };

        let mut jobs = self.jobs.lock().await;
        if let Some(previous) = jobs.remove(&key) {
            info!(session = %key, job_id = %previous.info.id, "replacing comment job");
            previous.token.cancel();
        }

        let registry = Arc::clone(&self.jobs);
        let task_id = id.clone();
        let task = tokio::spawn(async move {
            let session = worker.session.clone();
            worker.run().await;

            let mut jobs = registry.lock().await;
            if jobs.get(&session).is_some_and(|job| job.info.id == task_id) {
                jobs.remove(&session);
            }
        });

        info!(
            session = %key,
            job_id = %id,
            channels = info.channels,
            interval_secs = info.interval_secs,
            "comment job started"
        );
        jobs.insert(
            key,
            RunningJob {
                info: info.clone(),
                token,
                task,
            },
        );
        Ok(info)
    }

    /// Stops the job for `key`, or every job when `key` is `None`.
    ///
    /// Returns how many jobs were signalled. Does not wait for them to exit.
    pub async fn stop(&self, key: Option<&SessionKey>) -> usize {
        let stopped: Vec<RunningJob> = {
            let mut jobs = self.jobs.lock().await;
            match key {
                Some(key) => jobs.remove(key).into_iter().collect(),
                None => jobs.drain().map(|(_, job)| job).collect(),
            }
        };

        for job in &stopped {
            info!(session = %job.info.session, job_id = %job.info.id, "stopping comment job");
            job.token.cancel();
        }
        stopped.len()
    }

    /// Lists the running jobs.
    pub async fn list(&self) -> Vec<CommentJobInfo> {
        let jobs = self.jobs.lock().await;
        let mut infos: Vec<CommentJobInfo> = jobs.values().map(|job| job.info.clone()).collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        infos
    }

    /// Returns true if `key` has a running job.
    pub async fn is_active(&self, key: &SessionKey) -> bool {
        self.jobs.lock().await.contains_key(key)
    }

    /// Cancels every job and waits for the loops to exit.
    pub async fn shutdown(&self) {
        let stopped: Vec<RunningJob> = {
            let mut jobs = self.jobs.lock().await;
            jobs.drain().map(|(_, job)| job).collect()
        };

        for job in &stopped {
            job.token.cancel();
        }
        for job in stopped {
            if let Err(e) = job.task.await {
                warn!(job_id = %job.info.id, error = %e, "comment job panicked");
            }
        }
    }

    fn validate(&self, plan: &CommentPlan) -> Result<Vec<String>> {
        let channels: Vec<String> = plan
            .channels
            .iter()
            .map(|c| normalize_channel_ref(c))
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "channelLinks must not be empty".into(),
            ));
        }
        if plan.text.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "commentText must not be empty".into(),
            ));
        }
        if plan.interval < self.min_interval {
            return Err(WorkflowError::InvalidInput(format!(
                "interval must be at least {}s",
                self.min_interval.as_secs()
            )));
        }
        Ok(channels)
    }
}

impl Drop for CommentScheduler {
    fn drop(&mut self) {
        if let Ok(jobs) = self.jobs.try_lock() {
            for job in jobs.values() {
                job.token.cancel();
            }
        }
    }
}

struct Worker {
    session: SessionKey,
    client: Arc<dyn ProtocolClient>,
    pacer: Arc<dyn Pacer>,
    channels: Vec<String>,
    text: String,
    interval: Duration,
    lookback: usize,
    call_timeout: Option<Duration>,
    token: CancellationToken,
}

impl Worker {
    async fn run(&self) {
        loop {
            for channel in &self.channels {
                if self.token.is_cancelled() {
                    debug!(session = %self.session, "comment job cancelled");
                    return;
                }

                match self.comment_on(channel).await {
                    Ok(true) => debug!(session = %self.session, channel = %channel, "comment posted"),
                    Ok(false) => debug!(session = %self.session, channel = %channel, "nothing to reply to"),
                    Err(WorkflowError::NotConnected) => {
                        warn!(session = %self.session, "session is no longer authorized, ending comment job");
                        return;
                    }
                    Err(e) => {
                        warn!(session = %self.session, channel = %channel, error = %e, "comment failed");
                    }
                }

                tokio::select! {
                    _ = self.token.cancelled() => {
                        debug!(session = %self.session, "comment job cancelled");
                        return;
                    }
                    _ = self.pacer.pause(PacePoint::Comment { interval: self.interval }) => {}
                }
            }
        }
    }

    /// Replies to the newest message in `channel`. Returns false if the
    /// channel has no messages or the job was cancelled before posting.
    async fn comment_on(&self, channel: &str) -> Result<bool> {
        let peer = bounded(self.call_timeout, self.client.resolve_channel(channel)).await?;
        let messages = bounded(
            self.call_timeout,
            self.client.recent_messages(&peer, self.lookback),
        )
        .await?;

        let Some(newest) = messages.iter().max_by_key(|m| m.id) else {
            return Ok(false);
        };
        if self.token.is_cancelled() {
            return Ok(false);
        }

        bounded(
            self.call_timeout,
            self.client.send_message(&peer, &self.text, Some(newest.id)),
        )
        .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{FixedPacer, NoPacing};
    use crate::config::RuntimeConfig;
    use tgpilot_protocol::mock::{MockCall, MockClient};
    use tgpilot_protocol::{PeerMessage, ProtocolClient as _};

    async fn connected(client: MockClient) -> Arc<MockClient> {
        let client = Arc::new(client.authorized());
        client.reconnect().await.unwrap();
        client
    }

    fn scheduler() -> CommentScheduler {
        let pacer = Arc::new(FixedPacer::from_config(&RuntimeConfig::default()));
        CommentScheduler::new(pacer, 5, None, Duration::from_secs(1))
    }

    fn plan(channels: &[&str], secs: u64) -> CommentPlan {
        CommentPlan::new(
            channels.iter().map(|c| c.to_string()).collect(),
            "nice post",
            Duration::from_secs(secs),
        )
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_to_newest_message() {
        let client = connected(MockClient::new().with_messages(
            "news",
            vec![PeerMessage::new(41, "older"), PeerMessage::new(42, "newest")],
        ))
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["@news"], 60))
            .await
            .unwrap();
        settle().await;

        assert_eq!(
            client.sent_messages(),
            vec![("news".to_string(), "nice post".to_string(), Some(42))]
        );
        assert!(scheduler.is_active(&key).await);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_loop_within_one_interval() {
        let client = connected(
            MockClient::new()
                .with_messages("a", vec![PeerMessage::new(1, "x")])
                .with_messages("b", vec![PeerMessage::new(2, "y")]),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["a", "b"], 30))
            .await
            .unwrap();
        settle().await;
        assert_eq!(client.sent_messages().len(), 1);

        assert_eq!(scheduler.stop(Some(&key)).await, 1);
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(client.sent_messages().len(), 1);
        assert!(!scheduler.is_active(&key).await);
        assert!(scheduler.list().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_reading_skips_the_reply() {
        let client = connected(
            MockClient::new()
                .with_messages("a", vec![PeerMessage::new(1, "x")])
                .with_read_latency(Duration::from_secs(5)),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["a"], 30))
            .await
            .unwrap();
        settle().await;
        assert_eq!(client.count(|c| matches!(c, MockCall::RecentMessages(_))), 1);

        // The worker is still waiting on the message read.
        assert_eq!(scheduler.stop(Some(&key)).await, 1);
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;

        assert_eq!(client.count(|c| matches!(c, MockCall::SendMessage { .. })), 0);
        assert_eq!(client.count(|c| matches!(c, MockCall::RecentMessages(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_text_is_posted_verbatim() {
        let client = connected(
            MockClient::new().with_messages("a", vec![PeerMessage::new(1, "x")]),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);
        let text = "\n  first line\n  second line\n";

        scheduler
            .start(
                key.clone(),
                client.clone(),
                CommentPlan::new(vec!["a".into()], text, Duration::from_secs(30)),
            )
            .await
            .unwrap();
        settle().await;

        assert_eq!(
            client.sent_messages(),
            vec![("a".to_string(), text.to_string(), Some(1))]
        );
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescans_list_every_interval() {
        let client = connected(
            MockClient::new()
                .with_messages("a", vec![PeerMessage::new(1, "x")])
                .with_messages("b", vec![PeerMessage::new(2, "y")]),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["a", "b"], 10))
            .await
            .unwrap();
        settle().await;
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(10)).await;
            settle().await;
        }

        let channels: Vec<String> = client.sent_messages().into_iter().map(|m| m.0).collect();
        assert_eq!(channels, vec!["a", "b", "a", "b"]);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_errors_do_not_end_job() {
        let client = connected(
            MockClient::new()
                .unresolvable("gone")
                .failing_send("locked")
                .with_messages("locked", vec![PeerMessage::new(5, "x")])
                .with_messages("ok", vec![PeerMessage::new(9, "y")]),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["gone", "locked", "empty", "ok"], 5))
            .await
            .unwrap();
        for _ in 0..4 {
            settle().await;
            tokio::time::advance(Duration::from_secs(5)).await;
        }
        settle().await;

        assert!(client
            .sent_messages()
            .iter()
            .any(|(channel, _, reply)| channel == "ok" && *reply == Some(9)));
        assert!(scheduler.is_active(&key).await);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaces_previous_job() {
        let client = connected(
            MockClient::new()
                .with_messages("a", vec![PeerMessage::new(1, "x")])
                .with_messages("b", vec![PeerMessage::new(2, "y")]),
        )
        .await;
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        let first = scheduler
            .start(key.clone(), client.clone(), plan(&["a"], 10))
            .await
            .unwrap();
        settle().await;
        let second = scheduler
            .start(key.clone(), client.clone(), plan(&["b"], 10))
            .await
            .unwrap();
        settle().await;

        assert_ne!(first.id, second.id);
        let jobs = scheduler.list().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, second.id);

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        let to_a = client.sent_messages().iter().filter(|m| m.0 == "a").count();
        assert_eq!(to_a, 1);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_are_per_session() {
        let client = connected(MockClient::new()).await;
        let scheduler = scheduler();
        let alice = SessionKey::new("+1", 1);
        let bob = SessionKey::new("+2", 1);

        scheduler
            .start(alice.clone(), client.clone(), plan(&["a"], 10))
            .await
            .unwrap();
        scheduler
            .start(bob.clone(), client.clone(), plan(&["b"], 10))
            .await
            .unwrap();
        assert_eq!(scheduler.list().await.len(), 2);

        assert_eq!(scheduler.stop(Some(&alice)).await, 1);
        assert!(!scheduler.is_active(&alice).await);
        assert!(scheduler.is_active(&bob).await);

        assert_eq!(scheduler.stop(None).await, 1);
        assert_eq!(scheduler.stop(None).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_session_ends_job() {
        let client = Arc::new(MockClient::new());
        client.reconnect().await.unwrap();
        let scheduler = scheduler();
        let key = SessionKey::new("+1555", 1);

        scheduler
            .start(key.clone(), client.clone(), plan(&["a"], 10))
            .await
            .unwrap();
        settle().await;

        assert!(!scheduler.is_active(&key).await);
        assert_eq!(client.count(|c| matches!(c, MockCall::SendMessage { .. })), 0);
    }

    #[tokio::test]
    async fn test_validation() {
        let client = connected(MockClient::new()).await;
        let scheduler = CommentScheduler::new(Arc::new(NoPacing), 5, None, Duration::from_secs(1));
        let key = SessionKey::new("+1555", 1);

        let cases = [
            CommentPlan::new(vec![], "hi", Duration::from_secs(5)),
            CommentPlan::new(vec!["  ".into()], "hi", Duration::from_secs(5)),
            CommentPlan::new(vec!["a".into()], "   ", Duration::from_secs(5)),
            CommentPlan::new(vec!["a".into()], "hi", Duration::from_millis(10)),
        ];
        for plan in cases {
            let err = scheduler
                .start(key.clone(), client.clone(), plan)
                .await
                .unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidInput(_)));
        }
        assert!(scheduler.list().await.is_empty());
    }
}
