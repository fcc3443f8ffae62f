//! Connectivity probe.
//!
//! A probe is a best-effort hint taken before touching the remote store: a
//! negative answer lets callers fall back to the local store without waiting
//! on a doomed write. A positive answer guarantees nothing; the next remote
//! call can still fail on its own and must be handled as usual.

use crate::remote::RemoteStore;
use serde::Serialize;
use std::sync::Arc;

/// Answer from a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectivity {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Whether a failed probe may be answered from the local store.
    #[serde(skip)]
    pub recoverable: bool,
}

/// Reads the fixed probe document to judge whether the remote is reachable.
pub struct ConnectivityProbe<R: ?Sized> {
    store: Arc<R>,
}

impl<R: ?Sized> Clone for ConnectivityProbe<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: RemoteStore + ?Sized> ConnectivityProbe<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Probe the remote store. Never fails; errors are folded into the answer.
    pub async fn is_connected(&self) -> Connectivity {
        match self.store.probe().await {
            Ok(()) => Connectivity {
                connected: true,
                error: None,
                code: None,
                recoverable: false,
            },
            Err(e) => {
                tracing::debug!(error = %e, "connectivity probe failed");
                Connectivity {
                    connected: false,
                    error: Some(e.to_string()),
                    code: Some(e.code().to_string()),
                    recoverable: e.is_recoverable(),
                }
            }
        }
    }
}
