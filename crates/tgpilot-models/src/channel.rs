//! Discovered channels and channel references.

use serde::{Deserialize, Serialize};

/// Public link prefix for channels with a username.
const PUBLIC_LINK_BASE: &str = "https://t.me/";

/// Host prefixes accepted in channel links, matched case-insensitively.
const LINK_HOSTS: &[&str] = &["t.me/", "telegram.me/", "telegram.dog/"];

/// A broadcast channel that matched a discovery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCandidate {
    /// Channel id on the platform.
    pub id: i64,
    /// Display name.
    pub title: String,
    /// Public username, when the channel has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Public link derived from the username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Subscriber count at discovery time.
    pub subscribers: i64,
    /// Channel description ("about" text).
    pub description: String,
    /// Whether the platform marks the channel as verified.
    pub verified: bool,
    /// Keyword whose search produced this candidate.
    pub keyword: String,
    /// Whether comments are enabled on channel posts.
    pub comments_enabled: bool,
}

/// Returns the public `t.me` link for a username.
pub fn public_link(username: &str) -> String {
    format!("{}{}", PUBLIC_LINK_BASE, username)
}

/// Reduces a channel reference to a bare username.
///
/// Accepts `https://t.me/name`, `t.me/name/123`, `@name` and `name`.
/// Returns an empty string when nothing usable remains.
pub fn normalize_channel_ref(raw: &str) -> String {
    let mut rest = raw.trim();

    for scheme in ["https://", "http://"] {
        if starts_with_ignore_case(rest, scheme) {
            rest = &rest[scheme.len()..];
            break;
        }
    }
    if starts_with_ignore_case(rest, "www.") {
        rest = &rest[4..];
    }
    for host in LINK_HOSTS {
        if starts_with_ignore_case(rest, host) {
            rest = &rest[host.len()..];
            // Web preview links: t.me/s/<name>
            if let Some(stripped) = rest.strip_prefix("s/") {
                rest = stripped;
            }
            break;
        }
    }

    let rest = rest.trim_start_matches('@');
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_link_forms() {
        assert_eq!(normalize_channel_ref("https://t.me/foo"), "foo");
        assert_eq!(normalize_channel_ref("http://t.me/foo/"), "foo");
        assert_eq!(normalize_channel_ref("HTTPS://T.ME/foo"), "foo");
        assert_eq!(normalize_channel_ref("t.me/foo/123"), "foo");
        assert_eq!(normalize_channel_ref("https://t.me/s/foo"), "foo");
        assert_eq!(normalize_channel_ref("https://telegram.me/foo?start=1"), "foo");
        assert_eq!(normalize_channel_ref("@bar"), "bar");
        assert_eq!(normalize_channel_ref("  baz  "), "baz");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_channel_ref(""), "");
        assert_eq!(normalize_channel_ref("@"), "");
        assert_eq!(normalize_channel_ref("https://t.me/"), "");
    }

    #[test]
    fn test_public_link() {
        assert_eq!(public_link("news"), "https://t.me/news");
    }

    #[test]
    fn test_candidate_serializes_camel_case() {
        let candidate = ChannelCandidate {
            id: 7,
            title: "News".into(),
            username: Some("news".into()),
            link: Some(public_link("news")),
            subscribers: 2500,
            description: String::new(),
            verified: false,
            keyword: "news".into(),
            comments_enabled: true,
        };

        let value = serde_json::to_value(&candidate).unwrap();
        assert_eq!(value["subscribers"], 2500);
        assert_eq!(value["commentsEnabled"], true);
        assert_eq!(value["link"], "https://t.me/news");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(name in "[a-zA-Z][a-zA-Z0-9_]{3,20}") {
            let once = normalize_channel_ref(&format!("https://t.me/{}", name));
            prop_assert_eq!(&once, &name);
            prop_assert_eq!(normalize_channel_ref(&once), name.clone());
            prop_assert_eq!(normalize_channel_ref(&format!("@{}", name)), name);
        }
    }
}
