//! Subscription outcomes.

use serde::{Deserialize, Serialize};

/// Outcome of one join attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResult {
    /// The reference exactly as the caller supplied it.
    pub link: String,
    /// Username the reference was normalized to.
    pub username: String,
    /// Whether the join succeeded.
    pub success: bool,
    /// Human-readable outcome on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubscriptionResult {
    /// Creates a successful result.
    pub fn joined(link: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            username: username.into(),
            success: true,
            message: Some("joined".to_string()),
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failed(
        link: impl Into<String>,
        username: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            username: username.into(),
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of a subscription batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    /// One entry per input reference.
    pub results: Vec<SubscriptionResult>,
    /// Number of successful joins.
    pub joined: usize,
    /// Number of failed joins.
    pub failed: usize,
    /// The account lost its login partway through; the links after that
    /// point were not attempted and are reported as failed.
    #[serde(default)]
    pub interrupted: bool,
}

impl SubscriptionSummary {
    /// Appends a result and updates the counters.
    pub fn push(&mut self, result: SubscriptionResult) {
        if result.success {
            self.joined += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = SubscriptionSummary::default();
        summary.push(SubscriptionResult::joined("https://t.me/foo", "foo"));
        summary.push(SubscriptionResult::failed("@bar", "bar", "CHANNEL_PRIVATE"));
        summary.push(SubscriptionResult::joined("baz", "baz"));

        assert_eq!(summary.joined, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.results[1].username, "bar");
    }

    #[test]
    fn test_failed_result_omits_message() {
        let result = SubscriptionResult::failed("@bar", "bar", "boom");
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("message").is_none());
        assert_eq!(value["error"], "boom");
        assert_eq!(value["success"], false);
    }
}
