//! MTProto adapter built on `grammers-client`.
//!
//! Session strings are the grammers session bytes, base64-encoded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use grammers_client::client::auth::{LoginToken, PasswordToken};
use grammers_client::types::Chat;
use grammers_client::{Client, Config, InitParams, InputMessage, InvocationError, SignInError};
use grammers_session::{PackedChat, PackedType, Session};
use grammers_tl_types as tl;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{ProtocolError, Result};
use crate::traits::{ProtocolClient, ProtocolConnector};
use crate::types::{ApiCredentials, ChannelDetails, ChannelPeer, ChatKind, FoundChat, PeerMessage};

/// Opens grammers clients.
#[derive(Debug, Clone, Default)]
pub struct GrammersConnector;

impl GrammersConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProtocolConnector for GrammersConnector {
    async fn connect(&self, credentials: &ApiCredentials) -> Result<Arc<dyn ProtocolClient>> {
        let client = GrammersClient::connect(credentials.clone(), Session::new()).await?;
        Ok(Arc::new(client))
    }
}

/// One grammers connection plus the pending login state.
pub struct GrammersClient {
    credentials: ApiCredentials,
    client: RwLock<Client>,
    connected: AtomicBool,
    login_token: Mutex<Option<LoginToken>>,
    password_token: Mutex<Option<PasswordToken>>,
}

impl GrammersClient {
    async fn connect(credentials: ApiCredentials, session: Session) -> Result<Self> {
        let client = open(&credentials, session).await?;
        info!(api_id = credentials.api_id, "mtproto connection established");
        Ok(Self {
            credentials,
            client: RwLock::new(client),
            connected: AtomicBool::new(true),
            login_token: Mutex::new(None),
            password_token: Mutex::new(None),
        })
    }

    async fn client(&self) -> Client {
        self.client.read().await.clone()
    }

    async fn finish_password(&self, password: &str) -> Result<()> {
        let token = self
            .password_token
            .lock()
            .await
            .clone()
            .ok_or(ProtocolError::PasswordRequired)?;
        match self.client().await.check_password(token, password).await {
            Ok(_) => {
                self.password_token.lock().await.take();
                Ok(())
            }
            Err(e) => Err(map_sign_in(e)),
        }
    }
}

async fn open(credentials: &ApiCredentials, session: Session) -> Result<Client> {
    Client::connect(Config {
        session,
        api_id: credentials.api_id,
        api_hash: credentials.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .map_err(|e| ProtocolError::ConnectFailed(e.to_string()))
}

fn map_invocation(err: InvocationError) -> ProtocolError {
    match err {
        InvocationError::Rpc(rpc) => match rpc.name.as_str() {
            "FLOOD_WAIT" => ProtocolError::FloodWait {
                seconds: rpc.value.unwrap_or(0),
            },
            "USERNAME_NOT_OCCUPIED" | "USERNAME_INVALID" | "CHANNEL_INVALID" => {
                ProtocolError::NotFound(rpc.name)
            }
            "AUTH_KEY_UNREGISTERED" | "SESSION_REVOKED" => ProtocolError::NotAuthorized,
            _ => ProtocolError::Rpc(rpc.to_string()),
        },
        other => ProtocolError::Rpc(other.to_string()),
    }
}

fn map_sign_in(err: SignInError) -> ProtocolError {
    match err {
        SignInError::InvalidCode => ProtocolError::InvalidCode,
        SignInError::InvalidPassword => ProtocolError::InvalidPassword,
        SignInError::PasswordRequired(_) => ProtocolError::PasswordRequired,
        SignInError::Other(e) => map_invocation(e),
        other => ProtocolError::Rpc(other.to_string()),
    }
}

fn input_channel(id: i64, access_hash: i64) -> tl::enums::InputChannel {
    tl::enums::InputChannel::Channel(tl::types::InputChannel {
        channel_id: id,
        access_hash,
    })
}

fn packed(channel: &ChannelPeer) -> PackedChat {
    PackedChat {
        ty: PackedType::Broadcast,
        id: channel.id,
        access_hash: Some(channel.access_hash),
    }
}

#[async_trait]
impl ProtocolClient for GrammersClient {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<()> {
        let session = Session::load(&self.client().await.session().save())
            .map_err(|e| ProtocolError::ConnectFailed(e.to_string()))?;
        let fresh = open(&self.credentials, session).await?;
        *self.client.write().await = fresh;
        self.connected.store(true, Ordering::SeqCst);
        debug!(api_id = self.credentials.api_id, "mtproto connection re-established");
        Ok(())
    }

    async fn is_authorized(&self) -> Result<bool> {
        self.client()
            .await
            .is_authorized()
            .await
            .map_err(map_invocation)
    }

    async fn send_code(&self, phone_number: &str) -> Result<()> {
        let token = self
            .client()
            .await
            .request_login_code(phone_number)
            .await
            .map_err(|e| ProtocolError::Rpc(e.to_string()))?;
        *self.login_token.lock().await = Some(token);
        Ok(())
    }

    async fn sign_in(&self, _phone_number: &str, code: &str, password: Option<&str>) -> Result<()> {
        if self.password_token.lock().await.is_some() {
            return match password {
                Some(password) => self.finish_password(password).await,
                None => Err(ProtocolError::PasswordRequired),
            };
        }

        let token = self
            .login_token
            .lock()
            .await
            .take()
            .ok_or_else(|| ProtocolError::Rpc("no login code was requested".to_string()))?;

        match self.client().await.sign_in(&token, code).await {
            Ok(_) => Ok(()),
            Err(SignInError::PasswordRequired(password_token)) => {
                *self.password_token.lock().await = Some(password_token);
                match password {
                    Some(password) => self.finish_password(password).await,
                    None => Err(ProtocolError::PasswordRequired),
                }
            }
            Err(SignInError::InvalidCode) => {
                // The token stays valid for another attempt.
                *self.login_token.lock().await = Some(token);
                Err(ProtocolError::InvalidCode)
            }
            Err(e) => Err(map_sign_in(e)),
        }
    }

    async fn export_session(&self) -> Result<String> {
        Ok(STANDARD.encode(self.client().await.session().save()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoundChat>> {
        let request = tl::functions::contacts::Search {
            q: query.to_string(),
            limit: limit.min(i32::MAX as usize) as i32,
        };
        let tl::enums::contacts::Found::Found(found) = self
            .client()
            .await
            .invoke(&request)
            .await
            .map_err(map_invocation)?;

        let chats = found
            .chats
            .into_iter()
            .filter_map(|chat| match chat {
                tl::enums::Chat::Channel(ch) => Some(FoundChat {
                    id: ch.id,
                    access_hash: ch.access_hash,
                    title: ch.title,
                    username: ch.username,
                    kind: if ch.broadcast {
                        ChatKind::Broadcast
                    } else {
                        ChatKind::Megagroup
                    },
                    verified: ch.verified,
                    participants_count: ch.participants_count.map(i64::from),
                }),
                tl::enums::Chat::Chat(group) => Some(FoundChat {
                    id: group.id,
                    access_hash: None,
                    title: group.title,
                    username: None,
                    kind: ChatKind::Group,
                    verified: false,
                    participants_count: Some(i64::from(group.participants_count)),
                }),
                _ => None,
            })
            .collect();
        Ok(chats)
    }

    async fn channel_details(&self, chat: &FoundChat) -> Result<ChannelDetails> {
        let access_hash = chat
            .access_hash
            .ok_or_else(|| ProtocolError::NotFound(format!("no access hash for {}", chat.id)))?;
        let request = tl::functions::channels::GetFullChannel {
            channel: input_channel(chat.id, access_hash),
        };
        let tl::enums::messages::ChatFull::Full(full) = self
            .client()
            .await
            .invoke(&request)
            .await
            .map_err(map_invocation)?;

        match full.full_chat {
            tl::enums::ChatFull::ChannelFull(channel) => Ok(ChannelDetails {
                subscribers: channel.participants_count.map(i64::from),
                about: channel.about,
                comments_enabled: Some(channel.linked_chat_id.is_some()),
            }),
            tl::enums::ChatFull::Full(_) => Err(ProtocolError::Rpc(format!(
                "chat {} is not a channel",
                chat.id
            ))),
        }
    }

    async fn resolve_channel(&self, username: &str) -> Result<ChannelPeer> {
        let chat = self
            .client()
            .await
            .resolve_username(username)
            .await
            .map_err(map_invocation)?
            .ok_or_else(|| ProtocolError::NotFound(username.to_string()))?;

        match chat {
            Chat::Channel(channel) => Ok(ChannelPeer {
                id: channel.raw.id,
                access_hash: channel.raw.access_hash.unwrap_or(0),
                username: username.to_string(),
                title: channel.raw.title.clone(),
            }),
            _ => Err(ProtocolError::NotFound(format!("{} is not a channel", username))),
        }
    }

    async fn join_channel(&self, channel: &ChannelPeer) -> Result<()> {
        let request = tl::functions::channels::JoinChannel {
            channel: input_channel(channel.id, channel.access_hash),
        };
        self.client()
            .await
            .invoke(&request)
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel: &ChannelPeer,
        limit: usize,
    ) -> Result<Vec<PeerMessage>> {
        let client = self.client().await;
        let mut iter = client.iter_messages(packed(channel)).limit(limit);
        let mut messages = Vec::new();
        while let Some(message) = iter.next().await.map_err(map_invocation)? {
            messages.push(PeerMessage {
                id: message.id(),
                date: message.date(),
                text: message.text().to_string(),
            });
        }
        Ok(messages)
    }

    async fn send_message(
        &self,
        channel: &ChannelPeer,
        text: &str,
        reply_to: Option<i32>,
    ) -> Result<()> {
        let message = InputMessage::text(text).reply_to(reply_to);
        self.client()
            .await
            .send_message(packed(channel), message)
            .await
            .map_err(map_invocation)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        // grammers closes the socket once the last client handle drops; keep
        // the session so reconnect can resume it.
        self.connected.store(false, Ordering::SeqCst);
        self.login_token.lock().await.take();
        Ok(())
    }
}
