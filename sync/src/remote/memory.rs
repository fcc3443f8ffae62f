//! In-process remote store with switchable failure modes.

use super::RemoteStore;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use tandem_engine::{DatasetName, RemoteDocument};

/// How the in-memory store behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultMode {
    /// Everything succeeds
    Online = 0,
    /// Every call fails with `Unavailable`
    Offline = 1,
    /// Every call fails with `PermissionDenied`
    Denied = 2,
    /// Every call fails with `Unauthenticated`
    Unauthenticated = 3,
    /// Reads and probes succeed, writes fail with `PermissionDenied`
    ReadOnly = 4,
    /// Every call fails with `Remote`, as a missing table would
    Broken = 5,
}

impl FaultMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultMode::Offline,
            2 => FaultMode::Denied,
            3 => FaultMode::Unauthenticated,
            4 => FaultMode::ReadOnly,
            5 => FaultMode::Broken,
            _ => FaultMode::Online,
        }
    }
}

/// Remote store kept in a concurrent map, keyed by (user, dataset).
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: DashMap<(String, DatasetName), RemoteDocument>,
    mode: AtomicU8,
    writes: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the failure mode for all subsequent calls.
    pub fn set_mode(&self, mode: FaultMode) {
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    pub fn mode(&self) -> FaultMode {
        FaultMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    /// Number of successful document writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Seed a document directly, bypassing faults and the write counter.
    pub fn insert_document(&self, user: &str, dataset: DatasetName, document: RemoteDocument) {
        self.documents.insert((user.to_string(), dataset), document);
    }

    /// Inspect a stored document, bypassing faults.
    pub fn document(&self, user: &str, dataset: DatasetName) -> Option<RemoteDocument> {
        self.documents
            .get(&(user.to_string(), dataset))
            .map(|d| d.value().clone())
    }

    fn check_read(&self) -> Result<()> {
        match self.mode() {
            FaultMode::Online | FaultMode::ReadOnly => Ok(()),
            mode => Err(Self::fault(mode)),
        }
    }

    fn check_write(&self) -> Result<()> {
        match self.mode() {
            FaultMode::Online => Ok(()),
            FaultMode::ReadOnly => Err(StoreError::PermissionDenied(
                "document store is read-only".to_string(),
            )),
            mode => Err(Self::fault(mode)),
        }
    }

    fn fault(mode: FaultMode) -> StoreError {
        match mode {
            FaultMode::Denied => StoreError::PermissionDenied("access rules rejected the call".to_string()),
            FaultMode::Unauthenticated => StoreError::Unauthenticated("no signed-in user".to_string()),
            FaultMode::Broken => StoreError::Remote("relation \"documents\" does not exist".to_string()),
            _ => StoreError::Unavailable("client is offline".to_string()),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get_document(
        &self,
        user: &str,
        dataset: DatasetName,
    ) -> Result<Option<RemoteDocument>> {
        self.check_read()?;
        Ok(self.document(user, dataset))
    }

    async fn put_document(
        &self,
        user: &str,
        dataset: DatasetName,
        document: &RemoteDocument,
    ) -> Result<()> {
        self.check_write()?;
        self.documents
            .insert((user.to_string(), dataset), document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_document(&self, user: &str, dataset: DatasetName) -> Result<()> {
        self.check_write()?;
        self.documents.remove(&(user.to_string(), dataset));
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        self.check_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn doc() -> RemoteDocument {
        RemoteDocument::wrap(json!([1]), DatasetName::Todos, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn modes_map_to_error_classes() {
        let store = MemoryRemoteStore::new();
        assert!(store.probe().await.is_ok());

        store.set_mode(FaultMode::Offline);
        assert!(matches!(store.probe().await, Err(StoreError::Unavailable(_))));

        store.set_mode(FaultMode::Denied);
        assert!(matches!(
            store.get_document("u", DatasetName::Todos).await,
            Err(StoreError::PermissionDenied(_))
        ));

        store.set_mode(FaultMode::Unauthenticated);
        assert!(matches!(
            store.put_document("u", DatasetName::Todos, &doc()).await,
            Err(StoreError::Unauthenticated(_))
        ));

        store.set_mode(FaultMode::Broken);
        let err = store.probe().await.unwrap_err();
        assert_eq!(err.code(), "remote");
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn read_only_mode_allows_reads() {
        let store = MemoryRemoteStore::new();
        store.insert_document("u", DatasetName::Todos, doc());
        store.set_mode(FaultMode::ReadOnly);

        assert!(store.probe().await.is_ok());
        assert!(store.get_document("u", DatasetName::Todos).await.unwrap().is_some());
        assert!(matches!(
            store.put_document("u", DatasetName::Todos, &doc()).await,
            Err(StoreError::PermissionDenied(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn writes_are_counted() {
        let store = MemoryRemoteStore::new();
        store.put_document("u", DatasetName::Todos, &doc()).await.unwrap();
        store.put_document("u", DatasetName::Todos, &doc()).await.unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.mode(), FaultMode::Online);
    }
}
