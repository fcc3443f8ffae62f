//! Remote document store adapters.
//!
//! A [`RemoteStore`] persists one whole [`RemoteDocument`] per
//! (user, dataset). [`RemoteDatasets`] layers the dataset-level `save`/`load`
//! contract on top: sanitize, wrap, write; read, validate, unwrap.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tandem_engine::{sanitize, DatasetName, InputValue, RemoteDocument};

/// User id of the fixed document read by connectivity probes.
pub const PROBE_USER: &str = "__probe__";

/// Dataset key of the fixed document read by connectivity probes.
pub const PROBE_DATASET: &str = "connectivity";

/// Asynchronous access to the multi-device document store.
///
/// Implementations map transport failures to
/// [`StoreError::Unavailable`](crate::StoreError::Unavailable) and
/// authorization failures to `PermissionDenied`/`Unauthenticated`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a document, `None` when it does not exist.
    async fn get_document(&self, user: &str, dataset: DatasetName)
        -> Result<Option<RemoteDocument>>;

    /// Write a whole document, replacing any previous one.
    async fn put_document(
        &self,
        user: &str,
        dataset: DatasetName,
        document: &RemoteDocument,
    ) -> Result<()>;

    /// Delete a document; missing documents are not an error.
    async fn delete_document(&self, user: &str, dataset: DatasetName) -> Result<()>;

    /// Cheapest possible read: the fixed probe document.
    async fn probe(&self) -> Result<()>;
}

/// Dataset-level view of a [`RemoteStore`].
pub struct RemoteDatasets<R: ?Sized> {
    store: Arc<R>,
}

impl<R: ?Sized> Clone for RemoteDatasets<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: RemoteStore + ?Sized> RemoteDatasets<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<R> {
        &self.store
    }

    /// Sanitize `value`, wrap it with the current time and write it whole.
    ///
    /// A sanitizer failure aborts the save before anything is written.
    pub async fn save(
        &self,
        user: &str,
        dataset: DatasetName,
        value: &InputValue,
    ) -> Result<RemoteDocument> {
        let document = sanitize(value)
            .and_then(|data| RemoteDocument::wrap(data, dataset, Utc::now()))
            .map_err(|e| {
                tracing::error!(%dataset, error = %e, "refusing to write unsanitizable value");
                e
            })?;
        self.store.put_document(user, dataset, &document).await?;
        Ok(document)
    }

    /// Save an already-parsed JSON value.
    pub async fn save_value(
        &self,
        user: &str,
        dataset: DatasetName,
        value: &Value,
    ) -> Result<RemoteDocument> {
        self.save(user, dataset, &InputValue::from(value.clone()))
            .await
    }

    /// Load and unwrap a dataset; `None` when no document exists.
    pub async fn load(&self, user: &str, dataset: DatasetName) -> Result<Option<Value>> {
        match self.store.get_document(user, dataset).await? {
            Some(document) => {
                document.validate(dataset)?;
                Ok(Some(document.into_data()))
            }
            None => Ok(None),
        }
    }

    /// Remove a dataset's document.
    pub async fn purge(&self, user: &str, dataset: DatasetName) -> Result<()> {
        self.store.delete_document(user, dataset).await
    }
}
