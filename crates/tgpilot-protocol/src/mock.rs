//! Scripted in-memory protocol client for tests.
//!
//! `MockClient` answers every call from a script set up with builder
//! methods and records each call so tests can assert on what was sent.
//!
//! ```ignore
//! let client = Arc::new(
//!     MockClient::new()
//!         .with_login_code("12345")
//!         .with_search("news", vec![FoundChat::broadcast(1, "News", Some("news"))])
//!         .with_details(1, ChannelDetails::new(2500, true)),
//! );
//! let connector = MockConnector::new(Arc::clone(&client));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProtocolError, Result};
use crate::traits::{ProtocolClient, ProtocolConnector};
use crate::types::{ApiCredentials, ChannelDetails, ChannelPeer, FoundChat, PeerMessage};

/// Login code accepted by default.
pub const DEFAULT_LOGIN_CODE: &str = "12345";

/// A call recorded by [`MockClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Reconnect,
    SendCode(String),
    SignIn {
        code: String,
        password: Option<String>,
    },
    ExportSession,
    Search(String),
    ChannelDetails(i64),
    Resolve(String),
    Join(String),
    RecentMessages(String),
    SendMessage {
        channel: String,
        text: String,
        reply_to: Option<i32>,
    },
    Disconnect,
}

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    authorized: bool,
    login_code: String,
    password: Option<String>,
    awaiting_password: bool,
    search: HashMap<String, Vec<FoundChat>>,
    search_failures: HashSet<String>,
    details: HashMap<i64, ChannelDetails>,
    unresolvable: HashSet<String>,
    join_failures: HashMap<String, String>,
    messages: HashMap<String, Vec<PeerMessage>>,
    send_failures: HashSet<String>,
    peer_ids: HashMap<String, i64>,
    read_latency: Duration,
    calls: Vec<MockCall>,
}

/// Scripted protocol client.
#[derive(Debug)]
pub struct MockClient {
    state: Mutex<MockState>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    /// Creates an unauthorized client accepting [`DEFAULT_LOGIN_CODE`].
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                login_code: DEFAULT_LOGIN_CODE.to_string(),
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the script from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts out already authorized.
    pub fn authorized(self) -> Self {
        self.state().authorized = true;
        self
    }

    /// Sets the accepted login code.
    pub fn with_login_code(self, code: &str) -> Self {
        self.state().login_code = code.to_string();
        self
    }

    /// Requires a second-factor password.
    pub fn with_password(self, password: &str) -> Self {
        self.state().password = Some(password.to_string());
        self
    }

    /// Sets the results of searching for `query`.
    pub fn with_search(self, query: &str, results: Vec<FoundChat>) -> Self {
        self.state().search.insert(query.to_string(), results);
        self
    }

    /// Makes searching for `query` fail.
    pub fn failing_search(self, query: &str) -> Self {
        self.state().search_failures.insert(query.to_string());
        self
    }

    /// Sets the metadata for channel `id`. Channels without details fail.
    pub fn with_details(self, id: i64, details: ChannelDetails) -> Self {
        self.state().details.insert(id, details);
        self
    }

    /// Makes resolving `username` fail with `NotFound`.
    pub fn unresolvable(self, username: &str) -> Self {
        self.state().unresolvable.insert(username.to_string());
        self
    }

    /// Makes joining `username` fail with the given RPC error.
    pub fn failing_join(self, username: &str, error: &str) -> Self {
        self.state()
            .join_failures
            .insert(username.to_string(), error.to_string());
        self
    }

    /// Sets the recent messages of `username`, newest first.
    pub fn with_messages(self, username: &str, messages: Vec<PeerMessage>) -> Self {
        self.state().messages.insert(username.to_string(), messages);
        self
    }

    /// Makes posting to `username` fail.
    pub fn failing_send(self, username: &str) -> Self {
        self.state().send_failures.insert(username.to_string());
        self
    }

    /// Simulates a dropped transport.
    pub fn drop_connection(&self) {
        self.state().connected = false;
    }

    /// Simulates the platform terminating the login.
    pub fn revoke(&self) {
        self.state().authorized = false;
    }

    /// Delays every `recent_messages` call by `latency`, after recording it.
    pub fn with_read_latency(self, latency: Duration) -> Self {
        self.state().read_latency = latency;
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Counts recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    /// Returns the texts posted, as `(channel, text, reply_to)`.
    pub fn sent_messages(&self) -> Vec<(String, String, Option<i32>)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::SendMessage {
                    channel,
                    text,
                    reply_to,
                } => Some((channel.clone(), text.clone(), *reply_to)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.state().calls.push(call);
    }

    fn require_authorized(&self) -> Result<()> {
        let state = self.state();
        if !state.connected {
            return Err(ProtocolError::Rpc("not connected".to_string()));
        }
        if !state.authorized {
            return Err(ProtocolError::NotAuthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl ProtocolClient for MockClient {
    async fn is_connected(&self) -> bool {
        self.state().connected
    }

    async fn reconnect(&self) -> Result<()> {
        self.record(MockCall::Reconnect);
        self.state().connected = true;
        Ok(())
    }

    async fn is_authorized(&self) -> Result<bool> {
        Ok(self.state().authorized)
    }

    async fn send_code(&self, phone_number: &str) -> Result<()> {
        self.record(MockCall::SendCode(phone_number.to_string()));
        Ok(())
    }

    async fn sign_in(&self, _phone_number: &str, code: &str, password: Option<&str>) -> Result<()> {
        self.record(MockCall::SignIn {
            code: code.to_string(),
            password: password.map(str::to_string),
        });

        let mut state = self.state();
        if !state.awaiting_password {
            if code != state.login_code {
                return Err(ProtocolError::InvalidCode);
            }
            if state.password.is_none() {
                state.authorized = true;
                return Ok(());
            }
            state.awaiting_password = true;
        }

        match password {
            None => Err(ProtocolError::PasswordRequired),
            Some(p) if Some(p) == state.password.as_deref() => {
                state.awaiting_password = false;
                state.authorized = true;
                Ok(())
            }
            Some(_) => Err(ProtocolError::InvalidPassword),
        }
    }

    async fn export_session(&self) -> Result<String> {
        self.record(MockCall::ExportSession);
        self.require_authorized()?;
        Ok("mock-session".to_string())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoundChat>> {
        self.record(MockCall::Search(query.to_string()));
        self.require_authorized()?;
        let state = self.state();
        if state.search_failures.contains(query) {
            return Err(ProtocolError::Rpc("SEARCH_QUERY_EMPTY".to_string()));
        }
        let mut results = state.search.get(query).cloned().unwrap_or_default();
        results.truncate(limit);
        Ok(results)
    }

    async fn channel_details(&self, chat: &FoundChat) -> Result<ChannelDetails> {
        self.record(MockCall::ChannelDetails(chat.id));
        self.require_authorized()?;
        self.state()
            .details
            .get(&chat.id)
            .cloned()
            .ok_or_else(|| ProtocolError::Rpc("CHANNEL_PRIVATE".to_string()))
    }

    async fn resolve_channel(&self, username: &str) -> Result<ChannelPeer> {
        self.record(MockCall::Resolve(username.to_string()));
        self.require_authorized()?;
        let mut state = self.state();
        if state.unresolvable.contains(username) {
            return Err(ProtocolError::NotFound(username.to_string()));
        }
        let next_id = state.peer_ids.len() as i64 + 1000;
        let id = *state.peer_ids.entry(username.to_string()).or_insert(next_id);
        Ok(ChannelPeer {
            id,
            access_hash: 0,
            username: username.to_string(),
            title: username.to_string(),
        })
    }

    async fn join_channel(&self, channel: &ChannelPeer) -> Result<()> {
        self.record(MockCall::Join(channel.username.clone()));
        self.require_authorized()?;
        match self.state().join_failures.get(&channel.username) {
            Some(error) => Err(ProtocolError::Rpc(error.clone())),
            None => Ok(()),
        }
    }

    async fn recent_messages(
        &self,
        channel: &ChannelPeer,
        limit: usize,
    ) -> Result<Vec<PeerMessage>> {
        self.record(MockCall::RecentMessages(channel.username.clone()));
        let latency = self.state().read_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.require_authorized()?;
        let mut messages = self
            .state()
            .messages
            .get(&channel.username)
            .cloned()
            .unwrap_or_default();
        messages.truncate(limit);
        Ok(messages)
    }

    async fn send_message(
        &self,
        channel: &ChannelPeer,
        text: &str,
        reply_to: Option<i32>,
    ) -> Result<()> {
        self.record(MockCall::SendMessage {
            channel: channel.username.clone(),
            text: text.to_string(),
            reply_to,
        });
        self.require_authorized()?;
        if self.state().send_failures.contains(&channel.username) {
            return Err(ProtocolError::Rpc("CHAT_WRITE_FORBIDDEN".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(MockCall::Disconnect);
        self.state().connected = false;
        Ok(())
    }
}

/// Connector handing out one shared [`MockClient`].
#[derive(Debug)]
pub struct MockConnector {
    client: Arc<MockClient>,
    connects: AtomicUsize,
    latency: Duration,
    failure: Option<String>,
}

impl MockConnector {
    /// Creates a connector for `client`.
    pub fn new(client: Arc<MockClient>) -> Self {
        Self {
            client,
            connects: AtomicUsize::new(0),
            latency: Duration::ZERO,
            failure: None,
        }
    }

    /// Delays every connect by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every connect fail.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Number of connect calls so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// The shared client.
    pub fn client(&self) -> Arc<MockClient> {
        Arc::clone(&self.client)
    }
}

#[async_trait]
impl ProtocolConnector for MockConnector {
    async fn connect(&self, _credentials: &ApiCredentials) -> Result<Arc<dyn ProtocolClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(reason) = &self.failure {
            return Err(ProtocolError::ConnectFailed(reason.clone()));
        }
        self.client.state().connected = true;
        Ok(Arc::clone(&self.client) as Arc<dyn ProtocolClient>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let client = MockClient::new().with_password("hunter2");

        assert_eq!(
            client.sign_in("+1", "00000", None).await,
            Err(ProtocolError::InvalidCode)
        );
        assert_eq!(
            client.sign_in("+1", DEFAULT_LOGIN_CODE, None).await,
            Err(ProtocolError::PasswordRequired)
        );
        assert_eq!(
            client.sign_in("+1", "", Some("wrong")).await,
            Err(ProtocolError::InvalidPassword)
        );
        assert_eq!(client.sign_in("+1", "", Some("hunter2")).await, Ok(()));
        assert!(client.is_authorized().await.unwrap());
    }

    #[tokio::test]
    async fn test_connector_shares_client() {
        let client = Arc::new(MockClient::new().authorized());
        let connector = MockConnector::new(Arc::clone(&client));

        let handle = connector
            .connect(&ApiCredentials::new(1, "h"))
            .await
            .unwrap();
        assert!(handle.is_connected().await);
        assert_eq!(connector.connect_count(), 1);

        handle.disconnect().await.unwrap();
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn test_join_failure_is_scripted() {
        let client = MockClient::new().authorized().failing_join("bar", "CHANNELS_TOO_MUCH");
        client.reconnect().await.unwrap();

        let bar = client.resolve_channel("bar").await.unwrap();
        let foo = client.resolve_channel("foo").await.unwrap();
        assert_ne!(bar.id, foo.id);
        assert_eq!(
            client.join_channel(&bar).await,
            Err(ProtocolError::Rpc("CHANNELS_TOO_MUCH".into()))
        );
        assert_eq!(client.join_channel(&foo).await, Ok(()));
        assert_eq!(client.count(|c| matches!(c, MockCall::Join(_))), 2);
    }
}
