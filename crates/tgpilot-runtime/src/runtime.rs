//! Main runtime manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tgpilot_models::{ChannelCandidate, CommentJobInfo, CommentPlan, SessionKey, SubscriptionSummary};
use tgpilot_protocol::{ProtocolClient, ProtocolConnector};

use crate::auth::{AuthOutcome, Authenticator, LoginRequest};
use crate::bounded::bounded;
use crate::commenter::CommentScheduler;
use crate::config::RuntimeConfig;
use crate::discovery::{discover_channels, DiscoveryQuery};
use crate::error::{Result, WorkflowError};
use crate::pacing::{FixedPacer, Pacer};
use crate::registry::SessionRegistry;
use crate::subscription::subscribe_channels;

/// Main runtime manager combining the session registry, the workflows and
/// the comment scheduler.
pub struct Runtime {
    config: RuntimeConfig,
    connector: Arc<dyn ProtocolConnector>,
    registry: SessionRegistry,
    pacer: Arc<dyn Pacer>,
    commenter: CommentScheduler,
}

impl Runtime {
    /// Create a runtime that paces remote calls with the configured delays.
    pub fn new(config: RuntimeConfig, connector: Arc<dyn ProtocolConnector>) -> Self {
        let pacer = Arc::new(FixedPacer::from_config(&config));
        Self::with_pacer(config, connector, pacer)
    }

    /// Create a runtime with a custom pacing policy.
    pub fn with_pacer(
        config: RuntimeConfig,
        connector: Arc<dyn ProtocolConnector>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        let commenter = CommentScheduler::new(
            Arc::clone(&pacer),
            config.comment_lookback,
            config.call_timeout,
            config.min_comment_interval,
        );
        Self {
            config,
            connector,
            registry: SessionRegistry::new(),
            pacer,
            commenter,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get the session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Advance the login handshake for the request's session.
    pub async fn connect(&self, request: LoginRequest) -> Result<AuthOutcome> {
        if request.phone_number.trim().is_empty() {
            return Err(WorkflowError::InvalidInput("phoneNumber is required".into()));
        }
        if request.credentials.api_id == 0 || request.credentials.api_hash.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "apiId and apiHash are required".into(),
            ));
        }

        let key = request.session_key();
        let (handle, created) = self.registry.get_or_create(&key).await;
        let authenticator = Authenticator::new(self.connector.as_ref(), self.config.call_timeout);

        let outcome = authenticator.run(&handle, &request).await;
        if let Err(WorkflowError::ConnectFailed(_)) = &outcome {
            // A handle that never got a connection must not linger.
            if !handle.has_client().await && self.registry.remove_if_same(&handle).await {
                debug!(session = %key, created, "dropped unconnected session");
            }
        }
        outcome
    }

    /// Returns the authenticated client for `key`, reconnecting it if the
    /// connection dropped.
    pub async fn client(&self, key: &SessionKey) -> Result<Arc<dyn ProtocolClient>> {
        let handle = self
            .registry
            .get(key)
            .await
            .ok_or(WorkflowError::NotConnected)?;
        let client = handle
            .authenticated_client()
            .await
            .ok_or(WorkflowError::NotConnected)?;

        if !client.is_connected().await {
            info!(session = %key, "reconnecting dropped session");
            bounded(self.config.call_timeout, client.reconnect()).await?;
        }
        Ok(client)
    }

    /// Forgets the session's login when the platform no longer accepts it,
    /// so the next connect request runs the handshake again.
    async fn observe<T>(&self, key: &SessionKey, result: Result<T>) -> Result<T> {
        if let Err(WorkflowError::NotConnected) = &result {
            self.forget_login(key).await;
        }
        result
    }

    async fn forget_login(&self, key: &SessionKey) {
        if let Some(handle) = self.registry.get(key).await {
            handle.revoke_login().await;
        }
    }

    /// Search channels for the session.
    pub async fn search_channels(
        &self,
        key: &SessionKey,
        query: &DiscoveryQuery,
    ) -> Result<Vec<ChannelCandidate>> {
        query.validated_keywords()?;
        let client = self.client(key).await?;
        let found = discover_channels(client.as_ref(), self.pacer.as_ref(), &self.config, query).await;
        self.observe(key, found).await
    }

    /// Join each channel in `links` with the session's account.
    pub async fn subscribe(&self, key: &SessionKey, links: &[String]) -> Result<SubscriptionSummary> {
        if links.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "channelLinks must not be empty".into(),
            ));
        }
        let client = self.client(key).await?;
        let summary =
            subscribe_channels(client.as_ref(), self.pacer.as_ref(), self.config.call_timeout, links)
                .await;
        let summary = self.observe(key, summary).await?;
        if summary.interrupted {
            self.forget_login(key).await;
        }
        Ok(summary)
    }

    /// Start the session's comment job, replacing any previous one.
    pub async fn start_commenting(&self, key: &SessionKey, plan: CommentPlan) -> Result<CommentJobInfo> {
        let client = self.client(key).await?;
        self.commenter.start(key.clone(), client, plan).await
    }

    /// Stop the session's comment job, or all jobs when `key` is `None`.
    pub async fn stop_commenting(&self, key: Option<&SessionKey>) -> usize {
        self.commenter.stop(key).await
    }

    /// List running comment jobs.
    pub async fn comment_jobs(&self) -> Vec<CommentJobInfo> {
        self.commenter.list().await
    }

    /// Close the session and forget it. Returns false if there was none.
    pub async fn disconnect(&self, key: &SessionKey) -> Result<bool> {
        self.commenter.stop(Some(key)).await;

        let Some(handle) = self.registry.remove(key).await else {
            debug!(session = %key, "disconnect for unknown session");
            return Ok(false);
        };

        info!(session = %key, "disconnecting session");
        handle.close().await?;
        Ok(true)
    }

    /// Stop all comment jobs and disconnect every session.
    ///
    /// Individual disconnect failures are logged and do not stop the rest.
    pub async fn shutdown(&self) {
        info!("shutting down runtime");
        self.commenter.shutdown().await;

        let handles = self.registry.drain().await;
        for handle in handles {
            debug!(session = %handle.key(), "disconnecting session");
            if let Err(e) = handle.close().await {
                warn!(
                    session = %handle.key(),
                    error = %e,
                    "failed to disconnect session during shutdown"
                );
            }
        }

        info!("runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoPacing;
    use crate::session::AuthState;
    use std::time::Duration;
    use tgpilot_protocol::mock::{MockCall, MockClient, MockConnector};
    use tgpilot_protocol::{ApiCredentials, ChannelDetails, FoundChat, PeerMessage};

    const PHONE: &str = "+15550001111";

    fn runtime(client: MockClient) -> (Runtime, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(Arc::new(client)));
        let runtime = Runtime::with_pacer(
            RuntimeConfig::default(),
            Arc::clone(&connector) as Arc<dyn ProtocolConnector>,
            Arc::new(NoPacing),
        );
        (runtime, connector)
    }

    fn login() -> LoginRequest {
        LoginRequest::new(ApiCredentials::new(12345, "hash"), PHONE)
    }

    fn key() -> SessionKey {
        SessionKey::new(PHONE, 12345)
    }

    #[tokio::test]
    async fn test_login_with_password() {
        let (runtime, connector) = runtime(MockClient::new().with_password("hunter2"));

        assert_eq!(runtime.connect(login()).await.unwrap(), AuthOutcome::NeedsCode);
        assert_eq!(
            runtime
                .connect(login().with_code(Some("12345".into())))
                .await
                .unwrap(),
            AuthOutcome::NeedsPassword
        );
        assert_eq!(
            runtime
                .connect(
                    login()
                        .with_code(Some("12345".into()))
                        .with_password(Some("hunter2".into()))
                )
                .await
                .unwrap(),
            AuthOutcome::Authenticated {
                session: "mock-session".into()
            }
        );

        assert_eq!(connector.connect_count(), 1);
        assert_eq!(runtime.registry().len().await, 1);
    }

    #[tokio::test]
    async fn test_reconnect_is_idempotent() {
        let (runtime, connector) = runtime(MockClient::new());
        runtime.connect(login()).await.unwrap();
        let code = login().with_code(Some("12345".into()));

        let first = runtime.connect(code.clone()).await.unwrap();
        let second = runtime.connect(code).await.unwrap();

        assert_eq!(first, second);
        let client = connector.client();
        assert_eq!(client.count(|c| matches!(c, MockCall::SendCode(_))), 1);
        assert_eq!(client.count(|c| matches!(c, MockCall::SignIn { .. })), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connect_shares_one_handle() {
        let client = Arc::new(MockClient::new().authorized());
        let connector =
            Arc::new(MockConnector::new(client).with_latency(Duration::from_millis(200)));
        let runtime = Arc::new(Runtime::with_pacer(
            RuntimeConfig::default(),
            Arc::clone(&connector) as Arc<dyn ProtocolConnector>,
            Arc::new(NoPacing),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let runtime = Arc::clone(&runtime);
                tokio::spawn(async move { runtime.connect(login()).await })
            })
            .collect();
        for task in tasks {
            assert!(matches!(
                task.await.unwrap().unwrap(),
                AuthOutcome::Authenticated { .. }
            ));
        }

        assert_eq!(connector.connect_count(), 1);
        assert_eq!(runtime.registry().len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_session() {
        let connector =
            Arc::new(MockConnector::new(Arc::new(MockClient::new())).failing("network down"));
        let runtime = Runtime::with_pacer(
            RuntimeConfig::default(),
            connector as Arc<dyn ProtocolConnector>,
            Arc::new(NoPacing),
        );

        let err = runtime.connect(login()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ConnectFailed(_)));
        assert!(runtime.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_credentials() {
        let (runtime, connector) = runtime(MockClient::new());

        let blank_phone = LoginRequest::new(ApiCredentials::new(12345, "hash"), "  ");
        let no_hash = LoginRequest::new(ApiCredentials::new(12345, ""), PHONE);
        for request in [blank_phone, no_hash] {
            let err = runtime.connect(request).await.unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidInput(_)));
        }
        assert_eq!(connector.connect_count(), 0);
        assert!(runtime.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_workflows_require_authentication() {
        let (runtime, _) = runtime(MockClient::new());
        let query = DiscoveryQuery::new(vec!["news".into()], 0, 10);

        let err = runtime.search_channels(&key(), &query).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotConnected));

        // Halfway through login is still not connected.
        runtime.connect(login()).await.unwrap();
        let err = runtime
            .subscribe(&key(), &["@foo".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotConnected));

        let plan = CommentPlan::new(vec!["@foo".into()], "hi", Duration::from_secs(5));
        let err = runtime.start_commenting(&key(), plan).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotConnected));
    }

    #[tokio::test]
    async fn test_search_and_subscribe() {
        let (runtime, _) = runtime(
            MockClient::new()
                .authorized()
                .with_search("news", vec![FoundChat::broadcast(1, "News", Some("news"))])
                .with_details(1, ChannelDetails::new(2500, true))
                .failing_join("bar", "CHANNEL_PRIVATE"),
        );
        runtime.connect(login()).await.unwrap();

        let found = runtime
            .search_channels(&key(), &DiscoveryQuery::new(vec!["news".into()], 1000, 5000))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].subscribers, 2500);

        let summary = runtime
            .subscribe(&key(), &["https://t.me/foo".to_string(), "@bar".to_string()])
            .await
            .unwrap();
        assert_eq!((summary.joined, summary.failed), (1, 1));
    }

    #[tokio::test]
    async fn test_dropped_connection_is_restored() {
        let (runtime, connector) = runtime(MockClient::new().authorized());
        runtime.connect(login()).await.unwrap();
        connector.client().drop_connection();

        runtime.client(&key()).await.unwrap();
        assert_eq!(
            connector
                .client()
                .count(|c| matches!(c, MockCall::Reconnect)),
            1
        );
    }

    #[tokio::test]
    async fn test_revoked_login_can_reconnect() {
        let (runtime, connector) = runtime(MockClient::new());
        let query = DiscoveryQuery::new(vec!["news".into()], 0, 10);
        runtime.connect(login()).await.unwrap();
        runtime
            .connect(login().with_code(Some("12345".into())))
            .await
            .unwrap();

        let client = connector.client();
        client.revoke();
        let err = runtime.search_channels(&key(), &query).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotConnected));
        let handle = runtime.registry().get(&key()).await.unwrap();
        assert_eq!(handle.state().await, AuthState::Disconnected);

        assert_eq!(runtime.connect(login()).await.unwrap(), AuthOutcome::NeedsCode);
        assert_eq!(client.count(|c| matches!(c, MockCall::SendCode(_))), 2);
        assert!(matches!(
            runtime
                .connect(login().with_code(Some("12345".into())))
                .await
                .unwrap(),
            AuthOutcome::Authenticated { .. }
        ));
        assert!(runtime.search_channels(&key(), &query).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_job_and_forgets_session() {
        let (runtime, connector) = runtime(
            MockClient::new()
                .authorized()
                .with_messages("news", vec![PeerMessage::new(3, "hello")]),
        );
        runtime.connect(login()).await.unwrap();
        runtime
            .start_commenting(
                &key(),
                CommentPlan::new(vec!["@news".into()], "hi", Duration::from_secs(5)),
            )
            .await
            .unwrap();
        assert_eq!(runtime.comment_jobs().await.len(), 1);

        assert!(runtime.disconnect(&key()).await.unwrap());
        assert!(runtime.comment_jobs().await.is_empty());
        assert!(runtime.registry().get(&key()).await.is_none());
        assert_eq!(connector.client().count(|c| *c == MockCall::Disconnect), 1);

        // Unknown sessions are a no-op.
        assert!(!runtime.disconnect(&key()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_everything() {
        let (runtime, connector) = runtime(MockClient::new().authorized());
        runtime.connect(login()).await.unwrap();
        runtime
            .connect(LoginRequest::new(ApiCredentials::new(12345, "hash"), "+15550002222"))
            .await
            .unwrap();
        runtime
            .start_commenting(
                &key(),
                CommentPlan::new(vec!["@news".into()], "hi", Duration::from_secs(5)),
            )
            .await
            .unwrap();

        runtime.shutdown().await;

        assert!(runtime.registry().is_empty().await);
        assert!(runtime.comment_jobs().await.is_empty());
        assert_eq!(connector.client().count(|c| *c == MockCall::Disconnect), 2);
    }

    #[tokio::test]
    async fn test_session_state_after_code_request() {
        let (runtime, _) = runtime(MockClient::new());
        runtime.connect(login()).await.unwrap();

        let handle = runtime.registry().get(&key()).await.unwrap();
        assert_eq!(handle.state().await, AuthState::AwaitingCode);
    }
}
