//! Login handshake.
//!
//! ```text
//! Disconnected --connect + send code--> AwaitingCode
//! AwaitingCode --code accepted--------> Authenticated
//! AwaitingCode --password required----> AwaitingPassword
//! AwaitingPassword --password---------> Authenticated
//! Authenticated --any request---------> Authenticated
//! Authenticated --authorization lost--> Disconnected
//! ```
//!
//! Each call advances the state machine by at most one step and reports
//! where it stopped, so an HTTP caller can come back with the missing piece.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tgpilot_models::SessionKey;
use tgpilot_protocol::{ApiCredentials, ProtocolClient, ProtocolConnector, ProtocolError};

use crate::bounded::bounded;
use crate::error::{Result, WorkflowError};
use crate::session::{AuthState, SessionHandle, SessionInner};

/// One connect request.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Application credentials.
    pub credentials: ApiCredentials,
    /// Account phone number.
    pub phone_number: String,
    /// Login code, once the caller has received it.
    pub code: Option<String>,
    /// Second-factor password, if the account has one.
    pub password: Option<String>,
}

impl LoginRequest {
    /// Creates a request without code or password.
    pub fn new(credentials: ApiCredentials, phone_number: impl Into<String>) -> Self {
        Self {
            credentials,
            phone_number: phone_number.into(),
            code: None,
            password: None,
        }
    }

    /// Sets the login code. Blank codes count as absent.
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code.filter(|c| !c.trim().is_empty());
        self
    }

    /// Sets the password. Empty passwords count as absent.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Returns the session key for this request.
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.phone_number, self.credentials.api_id)
    }
}

/// Where a connect request left the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A code was sent out-of-band; call again with it.
    NeedsCode,
    /// The code was accepted; call again with the password.
    NeedsPassword,
    /// Logged in.
    Authenticated {
        /// Serialized credential.
        session: String,
    },
}

/// Drives the login handshake for one handle.
pub struct Authenticator<'a> {
    connector: &'a dyn ProtocolConnector,
    call_timeout: Option<Duration>,
}

impl<'a> Authenticator<'a> {
    /// Creates an authenticator.
    pub fn new(connector: &'a dyn ProtocolConnector, call_timeout: Option<Duration>) -> Self {
        Self {
            connector,
            call_timeout,
        }
    }

    /// Advances the handshake for `handle` with what `request` carries.
    pub async fn run(&self, handle: &SessionHandle, request: &LoginRequest) -> Result<AuthOutcome> {
        let phone = request.phone_number.trim();
        if phone.is_empty() {
            return Err(WorkflowError::InvalidInput("phoneNumber is required".into()));
        }

        let mut inner = handle.lock().await;
        let client = self.ensure_connected(&mut inner, handle.key(), request).await?;

        if inner.state == AuthState::Authenticated
            && !bounded(self.call_timeout, client.is_authorized()).await?
        {
            warn!(session = %handle.key(), "authorization was revoked; restarting login");
            inner.forget_login();
        }

        let state = inner.state;
        match state {
            AuthState::Authenticated => {
                debug!(session = %handle.key(), "session already authenticated");
                let session = match inner.session_string.clone() {
                    Some(session) => session,
                    None => self.export(&mut inner, &client).await?,
                };
                Ok(AuthOutcome::Authenticated { session })
            }
            AuthState::Disconnected => {
                if bounded(self.call_timeout, client.is_authorized()).await? {
                    info!(session = %handle.key(), "connection already authorized");
                    inner.state = AuthState::Authenticated;
                    let session = self.export(&mut inner, &client).await?;
                    return Ok(AuthOutcome::Authenticated { session });
                }
                if request.code.is_some() {
                    debug!(session = %handle.key(), "no code request pending; requesting a new code");
                }
                bounded(self.call_timeout, client.send_code(phone)).await?;
                inner.state = AuthState::AwaitingCode;
                info!(session = %handle.key(), "login code requested");
                Ok(AuthOutcome::NeedsCode)
            }
            AuthState::AwaitingCode => match request.code.as_deref() {
                None => Ok(AuthOutcome::NeedsCode),
                Some(code) => {
                    self.sign_in(&mut inner, &client, handle.key(), phone, code, request)
                        .await
                }
            },
            AuthState::AwaitingPassword => match request.password.as_deref() {
                None => Ok(AuthOutcome::NeedsPassword),
                Some(_) => {
                    let code = request.code.as_deref().unwrap_or_default();
                    self.sign_in(&mut inner, &client, handle.key(), phone, code, request)
                        .await
                }
            },
        }
    }

    /// Opens the connection on first use and reconnects a dropped one.
    async fn ensure_connected(
        &self,
        inner: &mut SessionInner,
        key: &SessionKey,
        request: &LoginRequest,
    ) -> Result<Arc<dyn ProtocolClient>> {
        if let Some(client) = inner.client.clone() {
            if !client.is_connected().await {
                info!(session = %key, "reconnecting dropped session");
                bounded(self.call_timeout, client.reconnect())
                    .await
                    .map_err(connect_failed)?;
            }
            return Ok(client);
        }

        info!(session = %key, "opening protocol connection");
        let client = bounded(self.call_timeout, self.connector.connect(&request.credentials))
            .await
            .map_err(connect_failed)?;
        inner.client = Some(Arc::clone(&client));
        inner.state = AuthState::Disconnected;
        Ok(client)
    }

    async fn sign_in(
        &self,
        inner: &mut SessionInner,
        client: &Arc<dyn ProtocolClient>,
        key: &SessionKey,
        phone: &str,
        code: &str,
        request: &LoginRequest,
    ) -> Result<AuthOutcome> {
        let password = request.password.as_deref();
        let attempt = bounded(self.call_timeout, client.sign_in(phone, code, password)).await;

        match attempt {
            Ok(()) => {
                inner.state = AuthState::Authenticated;
                let session = self.export(inner, client).await?;
                info!(session = %key, "session authenticated");
                Ok(AuthOutcome::Authenticated { session })
            }
            Err(WorkflowError::Upstream(ProtocolError::PasswordRequired)) => {
                inner.state = AuthState::AwaitingPassword;
                info!(session = %key, "two-step verification password required");
                Ok(AuthOutcome::NeedsPassword)
            }
            Err(e) => {
                warn!(session = %key, error = %e, "sign-in failed");
                Err(e)
            }
        }
    }

    async fn export(
        &self,
        inner: &mut SessionInner,
        client: &Arc<dyn ProtocolClient>,
    ) -> Result<String> {
        let session = bounded(self.call_timeout, client.export_session()).await?;
        inner.session_string = Some(session.clone());
        Ok(session)
    }
}

fn connect_failed(err: WorkflowError) -> WorkflowError {
    match err {
        WorkflowError::ConnectFailed(_) => err,
        WorkflowError::Upstream(e) => WorkflowError::ConnectFailed(e.to_string()),
        other => WorkflowError::ConnectFailed(other.to_string()),
    }
}
