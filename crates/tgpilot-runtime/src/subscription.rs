//! Sequential channel joins.

use std::time::Duration;

use tracing::{info, warn};

use tgpilot_models::{normalize_channel_ref, SubscriptionResult, SubscriptionSummary};
use tgpilot_protocol::ProtocolClient;

use crate::bounded::bounded;
use crate::error::{Result, WorkflowError};
use crate::pacing::{PacePoint, Pacer};

const NOT_ATTEMPTED: &str = "not connected";

/// Joins every channel in `links`, one at a time.
///
/// A failure on one link is recorded in its result and the batch moves on.
/// Results keep the order of `links`.
///
/// If the account loses its login mid-batch, the remaining links are
/// reported as failed and the summary is marked interrupted. When nothing
/// was joined by then the batch fails with [`WorkflowError::NotConnected`].
pub async fn subscribe_channels(
    client: &dyn ProtocolClient,
    pacer: &dyn Pacer,
    call_timeout: Option<Duration>,
    links: &[String],
) -> Result<SubscriptionSummary> {
    if links.is_empty() {
        return Err(WorkflowError::InvalidInput(
            "channelLinks must not be empty".into(),
        ));
    }

    let mut summary = SubscriptionSummary::default();
    for link in links {
        let username = normalize_channel_ref(link);
        if summary.interrupted {
            summary.push(SubscriptionResult::failed(link, username, NOT_ATTEMPTED));
            continue;
        }
        if username.is_empty() {
            summary.push(SubscriptionResult::failed(link, "", "not a channel link"));
            continue;
        }

        let outcome = join_one(client, call_timeout, &username).await;
        match outcome {
            Ok(()) => {
                info!(channel = %username, "joined channel");
                summary.push(SubscriptionResult::joined(link, &username));
            }
            Err(WorkflowError::NotConnected) => {
                warn!(channel = %username, "session lost its login, abandoning the batch");
                summary.interrupted = true;
                summary.push(SubscriptionResult::failed(link, &username, NOT_ATTEMPTED));
                continue;
            }
            Err(e) => {
                warn!(channel = %username, error = %e, "join failed");
                summary.push(SubscriptionResult::failed(link, &username, e.to_string()));
            }
        }
        pacer.pause(PacePoint::Join).await;
    }

    if summary.interrupted && summary.joined == 0 {
        return Err(WorkflowError::NotConnected);
    }

    info!(
        joined = summary.joined,
        failed = summary.failed,
        "subscription batch finished"
    );
    Ok(summary)
}

async fn join_one(
    client: &dyn ProtocolClient,
    call_timeout: Option<Duration>,
    username: &str,
) -> Result<()> {
    let peer = bounded(call_timeout, client.resolve_channel(username)).await?;
    bounded(call_timeout, client.join_channel(&peer)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tgpilot_protocol::mock::{MockCall, MockClient};
    use tgpilot_protocol::ProtocolClient as _;

    #[derive(Default)]
    struct CountingPacer {
        points: Mutex<Vec<PacePoint>>,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self, point: PacePoint) {
            self.points.lock().unwrap().push(point);
        }
    }

    /// Revokes the login after the first join attempt.
    struct RevokingPacer {
        client: Arc<MockClient>,
    }

    #[async_trait]
    impl Pacer for RevokingPacer {
        async fn pause(&self, _point: PacePoint) {
            self.client.revoke();
        }
    }

    async fn connected(client: MockClient) -> Arc<MockClient> {
        let client = Arc::new(client.authorized());
        client.reconnect().await.unwrap();
        client
    }

    fn links(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_order() {
        let client = connected(MockClient::new().failing_join("bar", "CHANNEL_PRIVATE")).await;
        let pacer = CountingPacer::default();

        let summary = subscribe_channels(
            client.as_ref(),
            &pacer,
            None,
            &links(&["https://t.me/foo", "@bar"]),
        )
        .await
        .unwrap();

        assert_eq!(summary.joined, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results[0].link, "https://t.me/foo");
        assert_eq!(summary.results[0].username, "foo");
        assert!(summary.results[0].success);
        assert_eq!(summary.results[1].username, "bar");
        assert!(!summary.results[1].success);
        assert!(summary.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("CHANNEL_PRIVATE"));
        assert_eq!(pacer.points.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_counts_add_up() {
        let client = connected(
            MockClient::new()
                .unresolvable("gone")
                .failing_join("closed", "INVITE_REQUEST_SENT"),
        )
        .await;
        let input = links(&["a", "gone", "t.me/b", "closed", "https://telegram.me/c", ""]);

        let summary = subscribe_channels(client.as_ref(), &crate::NoPacing, None, &input)
            .await
            .unwrap();

        assert_eq!(summary.results.len(), input.len());
        assert_eq!(summary.joined + summary.failed, input.len());
        assert_eq!(summary.joined, 3);
        assert_eq!(summary.failed, 3);
        // The blank link never reached the client.
        assert_eq!(client.count(|c| matches!(c, MockCall::Resolve(_))), 5);
    }

    #[tokio::test]
    async fn test_joins_are_sequential() {
        let client = connected(MockClient::new()).await;
        subscribe_channels(client.as_ref(), &crate::NoPacing, None, &links(&["a", "b"]))
            .await
            .unwrap();

        let calls: Vec<MockCall> = client
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, MockCall::Reconnect))
            .collect();
        assert_eq!(
            calls,
            vec![
                MockCall::Resolve("a".into()),
                MockCall::Join("a".into()),
                MockCall::Resolve("b".into()),
                MockCall::Join("b".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_lost_login_keeps_earlier_joins() {
        let client = connected(MockClient::new()).await;
        let pacer = RevokingPacer {
            client: Arc::clone(&client),
        };

        let summary = subscribe_channels(client.as_ref(), &pacer, None, &links(&["a", "b", "c"]))
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!((summary.joined, summary.failed), (1, 2));
        assert!(summary.results[0].success);
        assert_eq!(summary.results[2].username, "c");
        assert!(!summary.results[2].success);
        // Nothing was sent for the link after the rejected one.
        assert_eq!(client.count(|c| matches!(c, MockCall::Resolve(_))), 2);
    }

    #[tokio::test]
    async fn test_lost_login_before_any_join_is_an_error() {
        let client = connected(MockClient::new()).await;
        client.revoke();

        let err = subscribe_channels(client.as_ref(), &crate::NoPacing, None, &links(&["a", "b"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotConnected));
        assert_eq!(client.count(|c| matches!(c, MockCall::Resolve(_))), 1);
    }

    #[tokio::test]
    async fn test_empty_list_rejected() {
        let client = connected(MockClient::new()).await;
        let err = subscribe_channels(client.as_ref(), &crate::NoPacing, None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }
}
