//! Sanitization of loosely-typed value trees before remote persistence.
//!
//! Values handed over by UI collaborators can carry members that must never
//! reach the remote document store: absent markers and callables. The
//! [`InputValue`] tree models those explicitly; [`sanitize`] turns it into a
//! plain JSON [`Value`] that is safe to persist.
//!
//! # Rules
//!
//! - Object members whose sanitized value is absent or `null` are dropped.
//! - Array elements whose sanitized value is absent are removed, so the
//!   array may shrink. Index correspondence with the input is not kept.
//! - Callables are treated as absent.
//! - Primitives pass through unchanged.
//!
//! The pass is idempotent and deterministic: object members are emitted in
//! sorted key order and nothing time- or randomness-dependent is added.
//!
//! Trees nested deeper than [`MAX_DEPTH`] are refused up front with
//! [`Error::Serialization`], before any recursive pass runs.

use crate::{error::Result, Error};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Deepest container nesting accepted for persistence.
///
/// Kept below the JSON parser's recursion limit so that anything written
/// can also be read back.
pub const MAX_DEPTH: usize = 100;

/// A value tree as produced by a caller, before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// An absent (undefined) member
    Absent,
    /// A callable member; never persisted
    Callable,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<InputValue>),
    /// Object members in insertion order; a later duplicate key overrides an earlier one
    Object(Vec<(String, InputValue)>),
}

impl InputValue {
    /// Build an object from `(key, value)` pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, InputValue)>) -> Self {
        InputValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Whether this tree contains an absent or callable marker at any depth.
    pub fn has_unpersistable(&self) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                InputValue::Absent | InputValue::Callable => return true,
                InputValue::Array(items) => pending.extend(items),
                InputValue::Object(entries) => pending.extend(entries.iter().map(|(_, v)| v)),
                _ => {}
            }
        }
        false
    }

    /// Refuse trees nested deeper than [`MAX_DEPTH`].
    ///
    /// Walks with an explicit stack, so any depth is safe to check.
    pub fn check_depth(&self) -> Result<()> {
        let mut pending = vec![(self, 0usize)];
        while let Some((node, depth)) = pending.pop() {
            if depth > MAX_DEPTH {
                return Err(too_deep());
            }
            match node {
                InputValue::Array(items) => pending.extend(items.iter().map(|v| (v, depth + 1))),
                InputValue::Object(entries) => {
                    pending.extend(entries.iter().map(|(_, v)| (v, depth + 1)))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn check_value_depth(value: &Value) -> Result<()> {
    let mut pending = vec![(value, 0usize)];
    while let Some((node, depth)) = pending.pop() {
        if depth > MAX_DEPTH {
            return Err(too_deep());
        }
        match node {
            Value::Array(items) => pending.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => pending.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    Ok(())
}

fn too_deep() -> Error {
    Error::Serialization {
        path: "$".to_string(),
        reason: format!("value is nested deeper than {} levels", MAX_DEPTH),
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => InputValue::Null,
            Value::Bool(b) => InputValue::Bool(b),
            Value::Number(n) => InputValue::Number(n),
            Value::String(s) => InputValue::String(s),
            Value::Array(items) => InputValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                InputValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Sanitize a value tree for remote persistence.
///
/// An absent root maps to `null`. The result is re-checked by
/// [`verify_persistable`]; a failing check surfaces as
/// [`Error::Serialization`] instead of a value that would corrupt the
/// destination.
pub fn sanitize(value: &InputValue) -> Result<Value> {
    value.check_depth()?;
    let sanitized = sanitize_node(value).unwrap_or(Value::Null);
    verify_persistable(&sanitized)?;
    Ok(sanitized)
}

/// Sanitize an already-parsed JSON value.
///
/// JSON cannot carry absent markers, so this only drops `null` object
/// members.
pub fn sanitize_value(value: &Value) -> Result<Value> {
    check_value_depth(value)?;
    sanitize(&InputValue::from(value.clone()))
}

/// Serialize any `Serialize` type and sanitize the result.
///
/// Types that cannot be represented as JSON (for example maps with
/// non-string keys) surface as [`Error::Serialization`].
pub fn sanitize_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let json = serde_json::to_value(value).map_err(|e| Error::Serialization {
        path: "$".to_string(),
        reason: e.to_string(),
    })?;
    sanitize_value(&json)
}

fn sanitize_node(value: &InputValue) -> Option<Value> {
    match value {
        InputValue::Absent | InputValue::Callable => None,
        InputValue::Null => Some(Value::Null),
        InputValue::Bool(b) => Some(Value::Bool(*b)),
        InputValue::Number(n) => Some(Value::Number(n.clone())),
        InputValue::String(s) => Some(Value::String(s.clone())),
        InputValue::Array(items) => Some(Value::Array(
            items.iter().filter_map(sanitize_node).collect(),
        )),
        InputValue::Object(entries) => {
            let mut map = Map::new();
            for (key, member) in entries {
                match sanitize_node(member) {
                    Some(Value::Null) | None => {
                        map.remove(key);
                    }
                    Some(v) => {
                        map.insert(key.clone(), v);
                    }
                }
            }
            Some(Value::Object(map))
        }
    }
}

/// Deep scan asserting the sanitized invariants hold.
///
/// A sanitized tree never has a `null` object member. Finding one means the
/// recursive pass was bypassed, so the value is refused.
pub fn verify_persistable(value: &Value) -> Result<()> {
    check_value_depth(value)?;
    verify_at(value, &mut String::from("$"))
}

fn verify_at(value: &Value, path: &mut String) -> Result<()> {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{}]", i));
                verify_at(item, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, member) in map {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                if member.is_null() {
                    return Err(Error::Serialization {
                        path: path.clone(),
                        reason: "absent member survived sanitization".to_string(),
                    });
                }
                verify_at(member, path)?;
                path.truncate(len);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
