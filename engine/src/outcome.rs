//! Result structures returned to UI collaborators.
//!
//! Public sync operations never fail outright; everything that went wrong is
//! carried in these values.

use crate::DatasetName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which store served or accepted a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
}

/// Result of saving one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

impl SaveResult {
    /// Saved to the remote store.
    pub fn remote() -> Self {
        Self {
            success: true,
            error: None,
            code: None,
            source: Some(DataSource::Remote),
            fallback: None,
        }
    }

    /// Saved to the local store after the remote path was unavailable.
    pub fn local_fallback(reason: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: true,
            error: Some(reason.into()),
            code: Some(code.into()),
            source: Some(DataSource::Local),
            fallback: Some(true),
        }
    }

    /// Nothing was persisted.
    pub fn failed(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            code: Some(code.into()),
            source: None,
            fallback: None,
        }
    }

    /// Whether the value ended up in the local store instead of the remote.
    pub fn is_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }
}

/// Result of loading one dataset.
///
/// `data` is `None` when no value exists; absence is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    pub success: bool,
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl LoadResult {
    pub fn found(data: Option<Value>, source: DataSource) -> Self {
        Self {
            success: true,
            data,
            source: Some(source),
            error: None,
            code: None,
        }
    }

    pub fn failed(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            source: None,
            error: Some(error.into()),
            code: Some(code.into()),
        }
    }
}

/// Format a per-dataset error entry as `"<dataset>: <error>"`.
pub fn dataset_error(dataset: DatasetName, error: impl std::fmt::Display) -> String {
    format!("{}: {}", dataset, error)
}

/// Result of a local-to-remote migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateOutcome {
    pub success: bool,
    pub migrated: usize,
    pub errors: Vec<String>,
}

/// Result of a remote-to-local download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutcome {
    pub success: bool,
    pub downloaded: usize,
    pub errors: Vec<String>,
}

/// Result of a bidirectional sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    pub synced_up: usize,
    pub synced_down: usize,
    pub conflicts: Vec<String>,
}

impl MigrateOutcome {
    /// Mark success from the collected errors.
    pub fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

impl DownloadOutcome {
    /// Mark success from the collected errors.
    pub fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

impl SyncOutcome {
    /// Mark success from the collected conflicts.
    pub fn finish(mut self) -> Self {
        self.success = self.conflicts.is_empty();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_save_shape() {
        let result = SaveResult::local_fallback("remote unavailable: offline", "unavailable");
        assert!(result.success);
        assert!(result.is_fallback());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["source"], json!("local"));
        assert_eq!(value["fallback"], json!(true));
    }

    #[test]
    fn remote_save_omits_optional_fields() {
        let value = serde_json::to_value(SaveResult::remote()).unwrap();
        assert_eq!(value, json!({"success": true, "source": "remote"}));
        assert!(!SaveResult::remote().is_fallback());
    }

    #[test]
    fn sync_outcome_wire_names() {
        let outcome = SyncOutcome {
            success: false,
            synced_up: 1,
            synced_down: 2,
            conflicts: vec![dataset_error(DatasetName::Projects, "boom")],
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "syncedUp": 1, "syncedDown": 2, "conflicts": ["projects: boom"]})
        );
    }

    #[test]
    fn finish_derives_success() {
        assert!(MigrateOutcome::default().finish().success);
        let outcome = DownloadOutcome {
            errors: vec!["todos: denied".into()],
            ..Default::default()
        }
        .finish();
        assert!(!outcome.success);
    }
}
