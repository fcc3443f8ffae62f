//! # Tandem Engine
//!
//! Deterministic core of the Tandem dataset synchronization subsystem.
//!
//! Tandem keeps a fixed set of named datasets (conditions, projects, todos,
//! settings) in two places: a local store that is always available and a
//! remote document store shared across devices. This crate holds the pieces
//! of that job that need no IO at all.
//!
//! ## Design Principles
//!
//! - **No IO**: no files, network, clocks or logging; callers pass timestamps in
//! - **Deterministic**: same inputs always produce byte-identical outputs
//! - **Testable**: pure functions, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Sanitization
//!
//! [`sanitize`] turns a caller-supplied [`InputValue`] tree into a JSON value
//! that is safe to persist remotely: absent and callable members are removed,
//! `null` object members are dropped, and arrays shrink rather than keep holes.
//!
//! ### Envelopes
//!
//! Remote values are wrapped in a [`RemoteDocument`]; local values are stored
//! as raw JSON text through [`encode_local`]/[`decode_local`]. The two shapes
//! are intentionally different.
//!
//! ### Planning
//!
//! [`plan_sync`] decides, per dataset, whether to copy local to remote,
//! remote to local, or leave both alone. Freshness is the newest record
//! timestamp in the whole dataset ([`max_timestamp`]), so this is coarse
//! last-writer-wins, not per-record merge.
//!
//! ## Quick Start
//!
//! ```rust
//! use tandem_engine::{plan_sync, sanitize, InputValue, SyncDirection};
//! use serde_json::json;
//!
//! let input = InputValue::object([
//!     ("id", InputValue::Number(1.into())),
//!     ("note", InputValue::Absent),
//!     ("updatedAt", InputValue::String("2024-01-02".into())),
//! ]);
//! let local = json!([sanitize(&input).unwrap()]);
//! assert_eq!(local, json!([{"id": 1, "updatedAt": "2024-01-02"}]));
//!
//! let plan = plan_sync(Some(&local), None);
//! assert_eq!(plan.direction, SyncDirection::Up);
//! ```

pub mod dataset;
pub mod document;
pub mod error;
pub mod freshness;
pub mod outcome;
pub mod plan;
pub mod sanitize;

// Re-export main types at crate root
pub use dataset::DatasetName;
pub use document::{
    decode_local, encode_local, local_value, RemoteDocument, DOCUMENT_SOURCE, DOCUMENT_VERSION,
    SUPPORTED_MAJOR,
};
pub use error::Error;
pub use freshness::{compare_freshness, max_timestamp, parse_timestamp};
pub use outcome::{
    dataset_error, DataSource, DownloadOutcome, LoadResult, MigrateOutcome, SaveResult,
    SyncOutcome,
};
pub use plan::{is_present, plan_migration, plan_sync, PlanReason, SyncDirection, SyncPlan};
pub use sanitize::{
    sanitize, sanitize_serializable, sanitize_value, verify_persistable, InputValue, MAX_DEPTH,
};
