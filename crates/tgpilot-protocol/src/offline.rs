//! Connector used when no protocol backend is compiled in.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ProtocolError, Result};
use crate::traits::{ProtocolClient, ProtocolConnector};
use crate::types::ApiCredentials;

/// Refuses every connection with a `ConnectFailed` error.
#[derive(Debug, Clone, Default)]
pub struct OfflineConnector {
    reason: String,
}

impl OfflineConnector {
    /// Creates a connector that reports `reason` on every attempt.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ProtocolConnector for OfflineConnector {
    async fn connect(&self, credentials: &ApiCredentials) -> Result<Arc<dyn ProtocolClient>> {
        warn!(api_id = credentials.api_id, reason = %self.reason, "refusing connection");
        Err(ProtocolError::ConnectFailed(self.reason.clone()))
    }
}
