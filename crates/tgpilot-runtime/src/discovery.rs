//! Channel discovery.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use tgpilot_models::{public_link, ChannelCandidate};
use tgpilot_protocol::{FoundChat, ProtocolClient};

use crate::bounded::bounded;
use crate::config::RuntimeConfig;
use crate::error::{Result, WorkflowError};
use crate::pacing::{PacePoint, Pacer};

/// Keywords plus inclusive subscriber bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
    /// Search keywords, processed in order.
    pub keywords: Vec<String>,
    /// Minimum subscriber count, inclusive.
    pub min_subscribers: i64,
    /// Maximum subscriber count, inclusive.
    pub max_subscribers: i64,
}

impl DiscoveryQuery {
    /// Creates a query.
    pub fn new(keywords: Vec<String>, min_subscribers: i64, max_subscribers: i64) -> Self {
        Self {
            keywords,
            min_subscribers,
            max_subscribers,
        }
    }

    /// Returns the trimmed, non-blank keywords, or `InvalidInput` if none.
    pub fn validated_keywords(&self) -> Result<Vec<String>> {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "keywords must not be empty".into(),
            ));
        }
        Ok(keywords)
    }

    /// Returns true if a channel with these properties qualifies.
    pub fn accepts(&self, subscribers: i64, comments_enabled: bool) -> bool {
        comments_enabled && self.min_subscribers <= subscribers && subscribers <= self.max_subscribers
    }
}

/// Searches every keyword and returns the qualifying broadcast channels.
///
/// Each channel id appears at most once per call. A failed search or
/// metadata lookup is logged and skipped. Results are ordered by subscriber
/// count, largest first.
pub async fn discover_channels(
    client: &dyn ProtocolClient,
    pacer: &dyn Pacer,
    config: &RuntimeConfig,
    query: &DiscoveryQuery,
) -> Result<Vec<ChannelCandidate>> {
    let keywords = query.validated_keywords()?;
    if query.min_subscribers > query.max_subscribers {
        debug!(
            min = query.min_subscribers,
            max = query.max_subscribers,
            "empty subscriber range"
        );
        return Ok(Vec::new());
    }

    let mut seen: HashSet<i64> = HashSet::new();
    let mut candidates = Vec::new();

    for (idx, keyword) in keywords.iter().enumerate() {
        if idx > 0 {
            pacer.pause(PacePoint::Keyword).await;
        }

        let found = match bounded(config.call_timeout, client.search(keyword, config.search_limit))
            .await
        {
            Ok(found) => found,
            Err(WorkflowError::NotConnected) => return Err(WorkflowError::NotConnected),
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "search failed");
                continue;
            }
        };
        debug!(keyword = %keyword, results = found.len(), "search returned");

        for chat in found.iter().filter(|c| c.is_broadcast()) {
            if !seen.insert(chat.id) {
                continue;
            }

            let outcome = bounded(config.call_timeout, client.channel_details(chat)).await;
            pacer.pause(PacePoint::ChannelLookup).await;

            let details = match outcome {
                Ok(details) => details,
                Err(WorkflowError::NotConnected) => return Err(WorkflowError::NotConnected),
                Err(e) => {
                    warn!(channel_id = chat.id, error = %e, "channel lookup failed");
                    continue;
                }
            };

            let subscribers = details
                .subscribers
                .or(chat.participants_count)
                .unwrap_or(0);
            let comments_enabled = details
                .comments_enabled
                .unwrap_or(config.comments_default_when_unknown);

            if query.accepts(subscribers, comments_enabled) {
                candidates.push(candidate(chat, keyword, subscribers, details.about, comments_enabled));
            }
        }
    }

    candidates.sort_by(|a, b| b.subscribers.cmp(&a.subscribers));
    info!(
        keywords = keywords.len(),
        channels = candidates.len(),
        "channel discovery finished"
    );
    Ok(candidates)
}

fn candidate(
    chat: &FoundChat,
    keyword: &str,
    subscribers: i64,
    description: String,
    comments_enabled: bool,
) -> ChannelCandidate {
    ChannelCandidate {
        id: chat.id,
        title: chat.title.clone(),
        username: chat.username.clone(),
        link: chat.username.as_deref().map(public_link),
        subscribers,
        description,
        verified: chat.verified,
        keyword: keyword.to_string(),
        comments_enabled,
    }
}
