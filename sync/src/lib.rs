//! # Tandem Sync
//!
//! Keeps Tandem's datasets in step between the device-local store and the
//! remote document store, using the pure logic in [`tandem_engine`].
//!
//! - [`DataService`] is what UI code calls to save or load one dataset. It
//!   goes remote first and falls back to the local store when the remote is
//!   unreachable or refuses the caller.
//! - [`SyncCoordinator`] runs one-way migration, one-way download and
//!   bidirectional sync across every dataset.
//! - [`LocalStore`] and [`RemoteStore`] are the two storage seams, with
//!   file, Postgres and in-memory implementations.
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tandem_engine::{DatasetName, InputValue};
//! use tandem_sync::{DataService, MemoryLocalStore, MemoryRemoteStore, SyncCoordinator};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let local = Arc::new(MemoryLocalStore::new());
//! let remote = Arc::new(MemoryRemoteStore::new());
//! let service = DataService::new(local, remote);
//!
//! let value = InputValue::from(json!([{"id": 1, "updatedAt": "2024-01-02"}]));
//! let saved = service.save_dataset("user-1", DatasetName::Todos, &value).await;
//! assert!(saved.success);
//!
//! let outcome = SyncCoordinator::from_service(&service)
//!     .sync_bidirectional("user-1")
//!     .await;
//! assert_eq!(outcome.synced_up + outcome.synced_down, 0);
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod debug;
pub mod error;
pub mod local;
pub mod probe;
pub mod remote;
pub mod service;

pub use config::{Config, ConfigError};
pub use coordinator::SyncCoordinator;
pub use debug::{DatasetSnapshot, DebugFacade};
pub use error::StoreError;
pub use local::{read_dataset, write_dataset, FileLocalStore, LocalStore, MemoryLocalStore};
pub use probe::{Connectivity, ConnectivityProbe};
pub use remote::{
    map_sqlx_error, FaultMode, MemoryRemoteStore, PgRemoteStore, RemoteDatasets, RemoteStore,
};
pub use service::DataService;
