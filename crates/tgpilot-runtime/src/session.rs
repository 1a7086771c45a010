//! Session handles.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use tgpilot_models::SessionKey;
use tgpilot_protocol::{ProtocolClient, ProtocolError};

/// Login progress of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No handshake has run on the connection yet.
    Disconnected,
    /// A login code was requested and not yet accepted.
    AwaitingCode,
    /// The code was accepted; the account needs its password.
    AwaitingPassword,
    /// Logged in.
    Authenticated,
}

/// Mutable part of a handle, guarded by the handle's lock.
pub(crate) struct SessionInner {
    pub(crate) client: Option<Arc<dyn ProtocolClient>>,
    pub(crate) state: AuthState,
    pub(crate) session_string: Option<String>,
}

impl SessionInner {
    /// Drops the login but keeps the connection.
    pub(crate) fn forget_login(&mut self) {
        self.state = AuthState::Disconnected;
        self.session_string = None;
    }
}

/// One session in the registry.
///
/// The handle's lock serializes the login handshake for its key; workflows
/// only hold it long enough to clone the client out.
pub struct SessionHandle {
    key: SessionKey,
    created_at: DateTime<Utc>,
    inner: Mutex<SessionInner>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("key", &self.key)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl SessionHandle {
    /// Creates an empty handle with no connection.
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            created_at: Utc::now(),
            inner: Mutex::new(SessionInner {
                client: None,
                state: AuthState::Disconnected,
                session_string: None,
            }),
        }
    }

    /// Returns the session key.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Returns when the handle was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the login state.
    pub async fn state(&self) -> AuthState {
        self.inner.lock().await.state
    }

    /// Returns true once a connection has been opened on this handle.
    pub async fn has_client(&self) -> bool {
        self.inner.lock().await.client.is_some()
    }

    /// Returns the client if the session is authenticated.
    pub async fn authenticated_client(&self) -> Option<Arc<dyn ProtocolClient>> {
        let inner = self.inner.lock().await;
        match inner.state {
            AuthState::Authenticated => inner.client.clone(),
            _ => None,
        }
    }

    /// Returns the serialized credential from the last successful login.
    pub async fn session_string(&self) -> Option<String> {
        self.inner.lock().await.session_string.clone()
    }

    /// Marks an authenticated session as logged out after the platform
    /// rejected it. The next connect request starts a new handshake.
    pub async fn revoke_login(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == AuthState::Authenticated {
            debug!(session = %self.key, "forgetting revoked login");
            inner.forget_login();
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().await
    }

    /// Closes the connection and forgets the login.
    pub async fn close(&self) -> Result<(), ProtocolError> {
        let client = {
            let mut inner = self.inner.lock().await;
            inner.forget_login();
            inner.client.take()
        };

        match client {
            Some(client) => {
                debug!(session = %self.key, "closing protocol connection");
                client.disconnect().await
            }
            None => Ok(()),
        }
    }
}
