//! Core traits for protocol clients.
//!
//! The `ProtocolClient` trait is the whole surface the workflows need from
//! the messaging platform. Every call may suspend on network I/O, fail, or
//! be throttled by the platform; callers decide how to pace and bound them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ApiCredentials, ChannelDetails, ChannelPeer, FoundChat, PeerMessage};

/// Opens protocol connections.
#[async_trait]
pub trait ProtocolConnector: Send + Sync {
    /// Connects with the given application credentials.
    ///
    /// The returned client is connected but not necessarily authorized.
    async fn connect(&self, credentials: &ApiCredentials) -> Result<Arc<dyn ProtocolClient>>;
}

/// One connected account on the messaging platform.
///
/// # Login handshake
///
/// ```ignore
/// client.send_code(phone).await?;
/// match client.sign_in(phone, code, None).await {
///     Ok(()) => { /* authorized */ }
///     Err(ProtocolError::PasswordRequired) => {
///         client.sign_in(phone, code, Some(password)).await?;
///     }
///     Err(e) => return Err(e),
/// }
/// let session = client.export_session().await?;
/// ```
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Returns true while the transport is up.
    async fn is_connected(&self) -> bool;

    /// Re-establishes a dropped transport.
    async fn reconnect(&self) -> Result<()>;

    /// Returns true once the account is logged in.
    async fn is_authorized(&self) -> Result<bool>;

    /// Asks the platform to deliver a login code out-of-band.
    async fn send_code(&self, phone_number: &str) -> Result<()>;

    /// Submits the login code, and the second-factor password if one is
    /// available.
    ///
    /// Returns `PasswordRequired` when the account needs a password that was
    /// not supplied; a later call with the password completes the login.
    async fn sign_in(&self, phone_number: &str, code: &str, password: Option<&str>) -> Result<()>;

    /// Serializes the authorized session into an opaque string.
    async fn export_session(&self) -> Result<String>;

    /// Global search for chats matching `query`, at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<FoundChat>>;

    /// Fetches extended metadata for a broadcast channel.
    async fn channel_details(&self, chat: &FoundChat) -> Result<ChannelDetails>;

    /// Resolves a bare username to a channel.
    async fn resolve_channel(&self, username: &str) -> Result<ChannelPeer>;

    /// Joins (subscribes to) a channel.
    async fn join_channel(&self, channel: &ChannelPeer) -> Result<()>;

    /// Returns up to `limit` of the channel's most recent messages, newest first.
    async fn recent_messages(&self, channel: &ChannelPeer, limit: usize)
        -> Result<Vec<PeerMessage>>;

    /// Posts `text` to the channel, optionally as a reply to `reply_to`.
    async fn send_message(
        &self,
        channel: &ChannelPeer,
        text: &str,
        reply_to: Option<i32>,
    ) -> Result<()>;

    /// Closes the connection.
    async fn disconnect(&self) -> Result<()>;
}
