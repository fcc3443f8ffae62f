//! Recovery and inspection utilities for test harnesses and admin tooling.
//!
//! The facade borrows the stores it works on; nothing here is reachable
//! without being handed a [`DebugFacade`] explicitly.

use crate::error::Result;
use crate::local::{read_dataset, write_dataset, LocalStore};
use crate::remote::{RemoteDatasets, RemoteStore};
use serde::Serialize;
use serde_json::Value;
use tandem_engine::{max_timestamp, plan_sync, DatasetName, SyncPlan};

/// Side-by-side view of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSnapshot {
    pub dataset: DatasetName,
    pub local: Option<Value>,
    pub remote: Option<Value>,
    /// Newest local record timestamp (RFC 3339)
    pub local_freshness: Option<String>,
    /// Newest remote record timestamp (RFC 3339)
    pub remote_freshness: Option<String>,
    /// What a bidirectional sync would do right now
    pub plan: SyncPlan,
}

/// Explicitly-passed debug handle over a local and a remote store.
pub struct DebugFacade<'a, L: ?Sized, R: ?Sized> {
    local: &'a L,
    remote: &'a RemoteDatasets<R>,
}

impl<'a, L: LocalStore + ?Sized, R: RemoteStore + ?Sized> DebugFacade<'a, L, R> {
    pub fn new(local: &'a L, remote: &'a RemoteDatasets<R>) -> Self {
        Self { local, remote }
    }

    /// Inspect every dataset on both sides.
    ///
    /// Stops at the first store error; this is a diagnostic, not a sync.
    pub async fn snapshot(&self, user: &str) -> Result<Vec<DatasetSnapshot>> {
        let mut snapshots = Vec::with_capacity(DatasetName::ALL.len());
        for dataset in DatasetName::ALL {
            let local = read_dataset(self.local, dataset)?;
            let remote = self.remote.load(user, dataset).await?;
            let freshness = |value: &Option<Value>| {
                value
                    .as_ref()
                    .and_then(max_timestamp)
                    .map(|ts| ts.to_rfc3339())
            };
            snapshots.push(DatasetSnapshot {
                dataset,
                local_freshness: freshness(&local),
                remote_freshness: freshness(&remote),
                plan: plan_sync(local.as_ref(), remote.as_ref()),
                local,
                remote,
            });
        }
        Ok(snapshots)
    }

    /// Remove every dataset entry from the local store.
    pub fn clear_local(&self) -> Result<usize> {
        let mut removed = 0;
        for dataset in DatasetName::ALL {
            if self.local.get(dataset.as_str())?.is_some() {
                self.local.remove(dataset.as_str())?;
                removed += 1;
            }
        }
        tracing::info!(removed, "cleared local datasets");
        Ok(removed)
    }

    /// Push the local value up regardless of freshness. Returns whether a value was pushed.
    pub async fn force_push(&self, user: &str, dataset: DatasetName) -> Result<bool> {
        match read_dataset(self.local, dataset)? {
            Some(value) => {
                self.remote.save_value(user, dataset, &value).await?;
                tracing::info!(%dataset, "force-pushed local value");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pull the remote value down regardless of freshness. Returns whether a value was pulled.
    pub async fn force_pull(&self, user: &str, dataset: DatasetName) -> Result<bool> {
        match self.remote.load(user, dataset).await? {
            Some(value) => {
                write_dataset(self.local, dataset, &value)?;
                tracing::info!(%dataset, "force-pulled remote value");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the remote document for a dataset.
    pub async fn purge_remote(&self, user: &str, dataset: DatasetName) -> Result<()> {
        self.remote.purge(user, dataset).await?;
        tracing::info!(%dataset, "purged remote document");
        Ok(())
    }
}
