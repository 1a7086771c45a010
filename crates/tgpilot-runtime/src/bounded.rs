use std::future::Future;
use std::time::Duration;

use tgpilot_protocol::ProtocolError;

use crate::error::{Result, WorkflowError};

/// Awaits a remote call, giving up after `limit` when one is set.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, ProtocolError>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(WorkflowError::from),
            Err(_) => Err(WorkflowError::Timeout(limit)),
        },
        None => call.await.map_err(WorkflowError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let limit = Duration::from_secs(5);
        let result: Result<()> = bounded(Some(limit), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(WorkflowError::Timeout(d)) if d == limit));
    }

    #[tokio::test]
    async fn test_unbounded_passes_through() {
        let result = bounded(None, async { Ok::<_, ProtocolError>(7) }).await;
        assert_eq!(result.unwrap(), 7);

        let result: Result<()> = bounded(None, async { Err(ProtocolError::InvalidCode) }).await;
        assert!(matches!(result, Err(WorkflowError::InvalidCode)));
    }
}
