//! Persisted shapes for the two stores.
//!
//! The remote store holds a [`RemoteDocument`] envelope per (user, dataset).
//! The local store holds the raw dataset value as JSON text with no envelope.
//! The two shapes are deliberately kept apart behind separate functions so a
//! local value is never wrapped twice or an envelope stored locally.

use crate::{
    error::Result,
    sanitize::{verify_persistable, InputValue},
    DatasetName, Error,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version tag written on every remote document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Major version this build can read.
pub const SUPPORTED_MAJOR: u32 = 1;

/// Source tag written on every remote document.
pub const DOCUMENT_SOURCE: &str = "tandem";

fn legacy_version() -> String {
    DOCUMENT_VERSION.to_string()
}

/// The envelope persisted in the remote document store.
///
/// Written whole; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// The sanitized dataset value
    pub data: Value,
    /// When the document was written (RFC 3339)
    pub updated_at: String,
    /// Which dataset this document holds
    pub data_type: DatasetName,
    /// Envelope format version; documents written before versioning carry none
    #[serde(default = "legacy_version")]
    pub version: String,
    /// Writer tag
    pub source: String,
}

impl RemoteDocument {
    /// Wrap an already-sanitized value.
    ///
    /// Refuses values that still violate the sanitized invariants.
    pub fn wrap(data: Value, dataset: DatasetName, now: DateTime<Utc>) -> Result<Self> {
        verify_persistable(&data)?;
        Ok(Self {
            data,
            updated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            data_type: dataset,
            version: DOCUMENT_VERSION.to_string(),
            source: DOCUMENT_SOURCE.to_string(),
        })
    }

    /// Check the envelope before trusting its payload.
    ///
    /// The major version must be one this build reads, and the document must
    /// belong to the dataset it was loaded for.
    pub fn validate(&self, expected: DatasetName) -> Result<()> {
        let major = parse_major(&self.version)?;
        if major > SUPPORTED_MAJOR {
            return Err(Error::UnsupportedVersion {
                found: self.version.clone(),
                supported: format!("{}.x", SUPPORTED_MAJOR),
            });
        }
        if self.data_type != expected {
            return Err(Error::InvalidDocument(format!(
                "expected dataType '{}', found '{}'",
                expected, self.data_type
            )));
        }
        Ok(())
    }

    /// Unwrap the envelope, yielding the dataset value.
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Serialize the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidDocument(e.to_string()))
    }

    /// Deserialize an envelope from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidDocument(e.to_string()))
    }
}

fn parse_major(version: &str) -> Result<u32> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| Error::InvalidDocument(format!("malformed version '{}'", version)))
}

/// Render a caller value the way the local store keeps it.
///
/// This is plain JSON encoding, not sanitization: `null` members and array
/// positions survive. Absent or callable object members are omitted, absent
/// or callable array elements become `null`, and an absent root is `null`.
/// Trees nested deeper than [`MAX_DEPTH`](crate::sanitize::MAX_DEPTH) are
/// refused.
pub fn local_value(input: &InputValue) -> Result<Value> {
    input.check_depth()?;
    Ok(render_local(input))
}

fn render_local(input: &InputValue) -> Value {
    match input {
        InputValue::Absent | InputValue::Callable | InputValue::Null => Value::Null,
        InputValue::Bool(b) => Value::Bool(*b),
        InputValue::Number(n) => Value::Number(n.clone()),
        InputValue::String(s) => Value::String(s.clone()),
        InputValue::Array(items) => Value::Array(items.iter().map(render_local).collect()),
        InputValue::Object(entries) => {
            let mut map = Map::new();
            for (key, member) in entries {
                match member {
                    InputValue::Absent | InputValue::Callable => {
                        map.remove(key);
                    }
                    _ => {
                        map.insert(key.clone(), render_local(member));
                    }
                }
            }
            Value::Object(map)
        }
    }
}

/// Encode a dataset value for the local store: raw JSON text, no envelope.
pub fn encode_local(value: &Value) -> String {
    value.to_string()
}

/// Decode a local store entry back into a dataset value.
pub fn decode_local(dataset: DatasetName, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::InvalidLocalValue {
        dataset: dataset.to_string(),
        reason: e.to_string(),
    })
}
