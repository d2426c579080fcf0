//! Best-effort remote persistence.
//!
//! Local state is authoritative. Each saved edit is pushed to the remote
//! endpoint on a detached task; the outcome is never awaited by the caller and
//! failures are only logged.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FeatureId, FeatureProperties};

/// Body posted to the remote endpoint for one saved edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUpdate {
    pub feature_id: FeatureId,
    pub properties: FeatureProperties,
}

/// Remote sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote rejected update ({0}): {1}")]
    Rejected(StatusCode, String),
}

/// Fire-and-forget sink for saved edits.
pub trait RemoteSync: Send + Sync {
    /// Hand `update` off. Must return immediately and never fail.
    fn push(&self, update: RemoteUpdate);
}

/// Used when no remote endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl RemoteSync for NoopSync {
    fn push(&self, update: RemoteUpdate) {
        tracing::trace!(feature_id = %update.feature_id, "no remote configured, update kept local");
    }
}

/// Posts updates as JSON to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpSync {
    url: String,
    client: Client,
}

impl HttpSync {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    /// Send one update and wait for the response.
    pub async fn send(&self, update: &RemoteUpdate) -> Result<(), SyncError> {
        let response = self.client.post(&self.url).json(update).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SyncError::Rejected(status, body))
        }
    }
}

impl RemoteSync for HttpSync {
    fn push(&self, update: RemoteUpdate) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(feature_id = %update.feature_id, "no async runtime, remote update dropped");
            return;
        };

        let sync = self.clone();
        runtime.spawn(async move {
            match sync.send(&update).await {
                Ok(()) => tracing::debug!(feature_id = %update.feature_id, "remote update sent"),
                Err(e) => {
                    tracing::debug!(feature_id = %update.feature_id, error = %e, "remote update failed")
                }
            }
        });
    }
}
