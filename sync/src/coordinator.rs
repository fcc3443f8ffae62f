//! Multi-dataset synchronization between the local and remote stores.
//!
//! Every operation visits the fixed dataset set one by one. Each dataset's
//! read/decide/write sequence either completes or fails as a unit; a failure
//! is recorded in the outcome and the remaining datasets still run. The
//! operation as a whole is not atomic and nothing is rolled back.
//!
//! Concurrent writers on other devices are not coordinated: the policy is
//! dataset-level last-writer-wins, an accepted eventual-consistency
//! trade-off.

use crate::error::Result;
use crate::local::{read_dataset, write_dataset, LocalStore};
use crate::probe::ConnectivityProbe;
use crate::remote::{RemoteDatasets, RemoteStore};
use crate::service::DataService;
use serde_json::Value;
use std::sync::Arc;
use tandem_engine::{
    dataset_error, is_present, plan_migration, plan_sync, sanitize_value, DatasetName,
    DownloadOutcome, MigrateOutcome, SyncDirection, SyncOutcome,
};

/// Orchestrates migrate, download and bidirectional sync.
pub struct SyncCoordinator<L: ?Sized, R: ?Sized> {
    local: Arc<L>,
    remote: RemoteDatasets<R>,
    probe: ConnectivityProbe<R>,
}

impl<L: LocalStore + ?Sized, R: RemoteStore + ?Sized> SyncCoordinator<L, R> {
    pub fn new(local: Arc<L>, remote: Arc<R>) -> Self {
        Self {
            local,
            remote: RemoteDatasets::new(Arc::clone(&remote)),
            probe: ConnectivityProbe::new(remote),
        }
    }

    /// Share the stores of an existing [`DataService`].
    pub fn from_service(service: &DataService<L, R>) -> Self {
        Self {
            local: Arc::clone(service.local()),
            remote: service.remote().clone(),
            probe: service.probe().clone(),
        }
    }

    /// The probe error, if the remote store looks unreachable.
    async fn unreachable(&self) -> Option<String> {
        let connectivity = self.probe.is_connected().await;
        if connectivity.connected {
            None
        } else {
            let error = connectivity.error.unwrap_or_default();
            tracing::warn!(%error, "remote store unreachable, skipping sync");
            Some(format!("remote: {}", error))
        }
    }

    /// Copy local datasets up where the remote has nothing yet.
    ///
    /// Never overwrites non-empty remote data.
    pub async fn migrate_local_to_remote(&self, user: &str) -> MigrateOutcome {
        let mut outcome = MigrateOutcome::default();
        if let Some(error) = self.unreachable().await {
            outcome.errors.push(error);
            return outcome.finish();
        }

        for dataset in DatasetName::ALL {
            match self.migrate_dataset(user, dataset).await {
                Ok(true) => outcome.migrated += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(%dataset, error = %e, "migration failed");
                    outcome.errors.push(dataset_error(dataset, e));
                }
            }
        }

        tracing::info!(
            user,
            migrated = outcome.migrated,
            errors = outcome.errors.len(),
            "migration finished"
        );
        outcome.finish()
    }

    /// The local value as it would be written remotely.
    ///
    /// Presence and freshness are judged on this, so a local value that
    /// sanitizes down to nothing is never pushed.
    fn read_local(&self, dataset: DatasetName) -> Result<Option<Value>> {
        match read_dataset(&*self.local, dataset)? {
            Some(value) => Ok(Some(sanitize_value(&value)?)),
            None => Ok(None),
        }
    }

    async fn migrate_dataset(&self, user: &str, dataset: DatasetName) -> Result<bool> {
        let local = self.read_local(dataset)?;
        let Some(value) = local.as_ref().filter(|v| is_present(Some(*v))) else {
            return Ok(false);
        };

        let remote = self.remote.load(user, dataset).await?;
        match plan_migration(Some(value), remote.as_ref()) {
            SyncDirection::Up => {
                self.remote.save_value(user, dataset, value).await?;
                tracing::debug!(%dataset, "migrated to remote");
                Ok(true)
            }
            _ => {
                tracing::debug!(%dataset, "remote already has data, not migrating");
                Ok(false)
            }
        }
    }

    /// Overwrite local datasets with whatever the remote holds.
    pub async fn download_remote_to_local(&self, user: &str) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::default();
        if let Some(error) = self.unreachable().await {
            outcome.errors.push(error);
            return outcome.finish();
        }

        for dataset in DatasetName::ALL {
            match self.download_dataset(user, dataset).await {
                Ok(true) => outcome.downloaded += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(%dataset, error = %e, "download failed");
                    outcome.errors.push(dataset_error(dataset, e));
                }
            }
        }

        tracing::info!(
            user,
            downloaded = outcome.downloaded,
            errors = outcome.errors.len(),
            "download finished"
        );
        outcome.finish()
    }

    async fn download_dataset(&self, user: &str, dataset: DatasetName) -> Result<bool> {
        match self.remote.load(user, dataset).await? {
            Some(value) if !value.is_null() => {
                write_dataset(&*self.local, dataset, &value)?;
                tracing::debug!(%dataset, "downloaded to local");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Reconcile each dataset in whichever direction is fresher.
    pub async fn sync_bidirectional(&self, user: &str) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        if let Some(error) = self.unreachable().await {
            outcome.conflicts.push(error);
            return outcome.finish();
        }

        for dataset in DatasetName::ALL {
            match self.sync_dataset(user, dataset).await {
                Ok(SyncDirection::Up) => outcome.synced_up += 1,
                Ok(SyncDirection::Down) => outcome.synced_down += 1,
                Ok(SyncDirection::None) => {}
                Err(e) => {
                    tracing::warn!(%dataset, error = %e, "sync failed");
                    outcome.conflicts.push(dataset_error(dataset, e));
                }
            }
        }

        tracing::info!(
            user,
            synced_up = outcome.synced_up,
            synced_down = outcome.synced_down,
            conflicts = outcome.conflicts.len(),
            "sync finished"
        );
        outcome.finish()
    }

    async fn sync_dataset(&self, user: &str, dataset: DatasetName) -> Result<SyncDirection> {
        let local = self.read_local(dataset)?;
        let remote = self.remote.load(user, dataset).await?;

        let plan = plan_sync(local.as_ref(), remote.as_ref());
        tracing::debug!(%dataset, direction = ?plan.direction, reason = ?plan.reason, "planned");

        match (plan.direction, &local, &remote) {
            (SyncDirection::Up, Some(value), _) => {
                self.remote.save_value(user, dataset, value).await?;
            }
            (SyncDirection::Down, _, Some(value)) => {
                write_dataset(&*self.local, dataset, value)?;
            }
            _ => {}
        }
        Ok(plan.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryLocalStore;
    use crate::remote::{FaultMode, MemoryRemoteStore};
    use serde_json::json;

    fn coordinator() -> (
        SyncCoordinator<MemoryLocalStore, MemoryRemoteStore>,
        Arc<MemoryLocalStore>,
        Arc<MemoryRemoteStore>,
    ) {
        let local = Arc::new(MemoryLocalStore::new());
        let remote = Arc::new(MemoryRemoteStore::new());
        (SyncCoordinator::new(local.clone(), remote.clone()), local, remote)
    }

    #[tokio::test]
    async fn empty_stores_do_nothing() {
        let (coordinator, _local, remote) = coordinator();
        let outcome = coordinator.sync_bidirectional("u1").await;
        assert_eq!(
            outcome,
            SyncOutcome {
                success: true,
                ..Default::default()
            }
        );
        assert_eq!(remote.write_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_remote_short_circuits() {
        let (coordinator, local, remote) = coordinator();
        write_dataset(&*local, DatasetName::Todos, &json!([1])).unwrap();
        remote.set_mode(FaultMode::Offline);

        let outcome = coordinator.migrate_local_to_remote("u1").await;
        assert!(!outcome.success);
        assert_eq!(outcome.migrated, 0);
        assert_eq!(
            outcome.errors,
            vec!["remote: remote unavailable: client is offline".to_string()]
        );
    }

    #[tokio::test]
    async fn download_skips_missing_documents() {
        let (coordinator, local, _remote) = coordinator();
        write_dataset(&*local, DatasetName::Todos, &json!(["keep"])).unwrap();

        let outcome = coordinator.download_remote_to_local("u1").await;
        assert!(outcome.success);
        assert_eq!(outcome.downloaded, 0);
        assert_eq!(
            read_dataset(&*local, DatasetName::Todos).unwrap(),
            Some(json!(["keep"]))
        );
    }

    #[tokio::test]
    async fn null_only_local_settles_after_one_pass() {
        let (coordinator, local, remote) = coordinator();
        local.set("settings", r#"{"theme":null}"#).unwrap();

        let outcome = coordinator.sync_bidirectional("u1").await;
        assert_eq!(outcome.synced_up, 0);
        assert_eq!(remote.write_count(), 0);

        let outcome = coordinator.migrate_local_to_remote("u1").await;
        assert_eq!(outcome.migrated, 0);

        local.set("settings", r#"{"theme":"dark","font":null}"#).unwrap();
        let outcome = coordinator.sync_bidirectional("u1").await;
        assert_eq!(outcome.synced_up, 1);
        let outcome = coordinator.sync_bidirectional("u1").await;
        assert_eq!(outcome.synced_up, 0);
        assert_eq!(remote.write_count(), 1);
        assert_eq!(
            remote.document("u1", DatasetName::Settings).unwrap().data,
            json!({"theme": "dark"})
        );
    }

    #[tokio::test]
    async fn corrupt_local_entry_is_isolated() {
        let (coordinator, local, remote) = coordinator();
        local.set("projects", "{broken").unwrap();
        write_dataset(&*local, DatasetName::Todos, &json!([{"id": 1}])).unwrap();

        let outcome = coordinator.sync_bidirectional("u1").await;
        assert_eq!(outcome.synced_up, 1);
        assert_eq!(outcome.conflicts.len(), 1);
        assert!(outcome.conflicts[0].starts_with("projects: invalid local value"));
        assert!(remote.document("u1", DatasetName::Todos).is_some());
    }
}
