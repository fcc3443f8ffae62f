//! Save/load entry points used by UI collaborators.
//!
//! Both operations try the remote store first and fall back to the local
//! store on connectivity or authorization failures only. Any other failure,
//! including a failed fallback, comes back as `success: false`.

use crate::error::StoreError;
use crate::local::{read_dataset, write_dataset, LocalStore};
use crate::probe::ConnectivityProbe;
use crate::remote::{RemoteDatasets, RemoteStore};
use std::sync::Arc;
use tandem_engine::{local_value, DataSource, DatasetName, InputValue, LoadResult, SaveResult};

/// Dataset save/load with local fallback.
pub struct DataService<L: ?Sized, R: ?Sized> {
    local: Arc<L>,
    remote: RemoteDatasets<R>,
    probe: ConnectivityProbe<R>,
}

impl<L: ?Sized, R: ?Sized> Clone for DataService<L, R> {
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: self.remote.clone(),
            probe: self.probe.clone(),
        }
    }
}

impl<L: LocalStore + ?Sized, R: RemoteStore + ?Sized> DataService<L, R> {
    pub fn new(local: Arc<L>, remote: Arc<R>) -> Self {
        Self {
            local,
            remote: RemoteDatasets::new(Arc::clone(&remote)),
            probe: ConnectivityProbe::new(remote),
        }
    }

    pub fn local(&self) -> &Arc<L> {
        &self.local
    }

    pub fn remote(&self) -> &RemoteDatasets<R> {
        &self.remote
    }

    pub fn probe(&self) -> &ConnectivityProbe<R> {
        &self.probe
    }

    /// Save a dataset, remote first.
    ///
    /// A successful remote save also refreshes the local copy with the
    /// sanitized value so the device keeps an offline mirror.
    pub async fn save_dataset(
        &self,
        user: &str,
        dataset: DatasetName,
        value: &InputValue,
    ) -> SaveResult {
        let connectivity = self.probe.is_connected().await;
        if !connectivity.connected {
            let reason = connectivity.error.unwrap_or_default();
            let code = connectivity.code.unwrap_or_default();
            if !connectivity.recoverable {
                tracing::error!(%dataset, %reason, "save aborted, remote store is broken");
                return SaveResult::failed(reason, code);
            }
            return self.save_local(dataset, value, reason, code);
        }

        match self.remote.save(user, dataset, value).await {
            Ok(document) => {
                if let Err(e) = write_dataset(&*self.local, dataset, &document.data) {
                    tracing::warn!(%dataset, error = %e, "saved remotely but local mirror failed");
                }
                tracing::debug!(%dataset, "saved to remote");
                SaveResult::remote()
            }
            Err(e) if e.is_recoverable() => {
                self.save_local(dataset, value, e.to_string(), e.code().to_string())
            }
            Err(e) => {
                tracing::error!(%dataset, error = %e, "save aborted");
                SaveResult::failed(e.to_string(), e.code())
            }
        }
    }

    fn save_local(
        &self,
        dataset: DatasetName,
        value: &InputValue,
        reason: String,
        code: String,
    ) -> SaveResult {
        tracing::warn!(%dataset, %reason, "remote save unavailable, falling back to local store");
        let written = local_value(value)
            .map_err(StoreError::from)
            .and_then(|rendered| write_dataset(&*self.local, dataset, &rendered));
        match written {
            Ok(()) => SaveResult::local_fallback(reason, code),
            Err(e) => {
                tracing::error!(%dataset, error = %e, "local fallback save failed");
                SaveResult::failed(format!("{}; {}", reason, e), e.code())
            }
        }
    }

    /// Load a dataset, remote first.
    pub async fn load_dataset(&self, user: &str, dataset: DatasetName) -> LoadResult {
        let connectivity = self.probe.is_connected().await;
        if !connectivity.connected {
            let reason = connectivity.error.unwrap_or_default();
            if !connectivity.recoverable {
                tracing::error!(%dataset, %reason, "load aborted, remote store is broken");
                let code = connectivity.code.unwrap_or_default();
                return LoadResult::failed(reason, code);
            }
            return self.load_local(dataset, reason);
        }

        match self.remote.load(user, dataset).await {
            Ok(data) => LoadResult::found(data, DataSource::Remote),
            Err(e) if e.is_recoverable() => self.load_local(dataset, e.to_string()),
            Err(e) => {
                tracing::error!(%dataset, error = %e, "load failed");
                LoadResult::failed(e.to_string(), e.code())
            }
        }
    }

    fn load_local(&self, dataset: DatasetName, reason: String) -> LoadResult {
        tracing::warn!(%dataset, %reason, "remote load unavailable, falling back to local store");
        match read_dataset(&*self.local, dataset) {
            Ok(data) => LoadResult::found(data, DataSource::Local),
            Err(e) => LoadResult::failed(format!("{}; {}", reason, e), e.code()),
        }
    }
}
