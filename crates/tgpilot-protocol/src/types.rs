//! Value types exchanged with a protocol client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application credentials registered with the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Application id.
    pub api_id: i32,
    /// Application hash.
    pub api_hash: String,
}

impl ApiCredentials {
    /// Creates credentials.
    pub fn new(api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
        }
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .finish()
    }
}

/// Kind of chat returned by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-many broadcast channel.
    Broadcast,
    /// Supergroup (discussion group).
    Megagroup,
    /// Basic group.
    Group,
    /// A user or bot.
    User,
}

/// A chat found by a global search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundChat {
    /// Chat id.
    pub id: i64,
    /// Access hash required to address the chat, if the platform sent one.
    pub access_hash: Option<i64>,
    /// Display name.
    pub title: String,
    /// Public username.
    pub username: Option<String>,
    /// Chat kind.
    pub kind: ChatKind,
    /// Verified badge.
    pub verified: bool,
    /// Participant count included in the search result, if any.
    pub participants_count: Option<i64>,
}

impl FoundChat {
    /// Creates a broadcast channel entry.
    pub fn broadcast(id: i64, title: impl Into<String>, username: Option<&str>) -> Self {
        Self {
            id,
            access_hash: Some(0),
            title: title.into(),
            username: username.map(str::to_string),
            kind: ChatKind::Broadcast,
            verified: false,
            participants_count: None,
        }
    }

    /// Creates a discussion group entry.
    pub fn megagroup(id: i64, title: impl Into<String>, username: Option<&str>) -> Self {
        Self {
            kind: ChatKind::Megagroup,
            ..Self::broadcast(id, title, username)
        }
    }

    /// Sets the verified flag.
    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Returns true for broadcast channels.
    pub fn is_broadcast(&self) -> bool {
        self.kind == ChatKind::Broadcast
    }
}

/// Extended channel metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDetails {
    /// Subscriber count, if the platform disclosed it.
    pub subscribers: Option<i64>,
    /// "About" text.
    pub about: String,
    /// Whether comments are enabled. `None` when the platform sent no flag.
    pub comments_enabled: Option<bool>,
}

impl ChannelDetails {
    /// Creates details with a known subscriber count and comments flag.
    pub fn new(subscribers: i64, comments_enabled: bool) -> Self {
        Self {
            subscribers: Some(subscribers),
            about: String::new(),
            comments_enabled: Some(comments_enabled),
        }
    }

    /// Sets the about text.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }
}

/// A channel resolved from a username, ready to be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPeer {
    /// Channel id.
    pub id: i64,
    /// Access hash.
    pub access_hash: i64,
    /// Username the channel was resolved from.
    pub username: String,
    /// Display name.
    pub title: String,
}

/// A message read from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerMessage {
    /// Message id within the channel.
    pub id: i32,
    /// Send time.
    pub date: DateTime<Utc>,
    /// Text content (empty for media without caption).
    pub text: String,
}

impl PeerMessage {
    /// Creates a message sent now.
    pub fn new(id: i32, text: impl Into<String>) -> Self {
        Self {
            id,
            date: Utc::now(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_hash() {
        let creds = ApiCredentials::new(1, "secret-hash");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret-hash"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_found_chat_kinds() {
        assert!(FoundChat::broadcast(1, "a", None).is_broadcast());
        assert!(!FoundChat::megagroup(2, "b", Some("b")).is_broadcast());
    }
}
