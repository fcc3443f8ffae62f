//! Dataset freshness: the newest record timestamp in a dataset value.
//!
//! Freshness is computed at dataset granularity. For an array of records it
//! is the maximum `updatedAt`/`createdAt` across all top-level records; a
//! lone object (such as settings) counts as a single record. Anything else
//! has no freshness.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// Record fields consulted for timestamps.
pub const TIMESTAMP_FIELDS: [&str; 2] = ["updatedAt", "createdAt"];

/// Naive date-time layouts accepted after RFC 3339, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a record timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 date-times with seconds or minute
/// precision and either a `T` or a space separator, plain dates (all read
/// as UTC), and integer milliseconds since the epoch.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_iso(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn record_timestamp(record: &Value) -> Option<DateTime<Utc>> {
    let fields = record.as_object()?;
    TIMESTAMP_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field).and_then(parse_timestamp))
        .max()
}

/// The newest timestamp found in a dataset value, if any.
pub fn max_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Array(records) => records.iter().filter_map(record_timestamp).max(),
        Value::Object(_) => record_timestamp(value),
        _ => None,
    }
}

/// Compare local freshness against remote freshness.
///
/// When either side has no extractable timestamp the two are considered
/// equally fresh.
pub fn compare_freshness(local: &Value, remote: &Value) -> Ordering {
    match (max_timestamp(local), max_timestamp(remote)) {
        (Some(l), Some(r)) => l.cmp(&r),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parse_formats() {
        assert_eq!(parse_timestamp(&json!("2024-01-02")), Some(utc(2024, 1, 2)));
        assert_eq!(
            parse_timestamp(&json!("2024-01-02T00:00:00Z")),
            Some(utc(2024, 1, 2))
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-02T02:00:00+02:00")),
            Some(utc(2024, 1, 2))
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-02T00:00:00.000")),
            Some(utc(2024, 1, 2))
        );
        assert_eq!(
            parse_timestamp(&json!(1704153600000i64)),
            Some(utc(2024, 1, 2))
        );
        let ten = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-01-02T10:00")), Some(ten));
        assert_eq!(parse_timestamp(&json!("2024-01-02 10:00:00")), Some(ten));
        assert_eq!(
            parse_timestamp(&json!("2024-01-02 10:00:00.250")),
            Some(ten + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp(&json!("2024-01-02 10:00")), Some(ten));
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn max_over_records_and_fields() {
        let value = json!([
            {"id": 1, "createdAt": "2024-01-01", "updatedAt": "2024-02-01"},
            {"id": 2, "createdAt": "2024-03-05"},
            {"id": 3},
            "not a record"
        ]);
        assert_eq!(max_timestamp(&value), Some(utc(2024, 3, 5)));
    }

    #[test]
    fn settings_object_is_one_record() {
        let value = json!({"theme": "dark", "updatedAt": "2024-06-01"});
        assert_eq!(max_timestamp(&value), Some(utc(2024, 6, 1)));
    }

    #[test]
    fn no_timestamp_is_none() {
        assert_eq!(max_timestamp(&json!([{"id": 1}])), None);
        assert_eq!(max_timestamp(&json!("text")), None);
        assert_eq!(max_timestamp(&json!([])), None);
    }

    #[test]
    fn compare_sides() {
        let older = json!([{"updatedAt": "2024-01-01"}]);
        let newer = json!([{"updatedAt": "2024-06-01"}]);
        assert_eq!(compare_freshness(&older, &newer), Ordering::Less);
        assert_eq!(compare_freshness(&newer, &older), Ordering::Greater);
        assert_eq!(compare_freshness(&newer, &newer), Ordering::Equal);
    }

    #[test]
    fn missing_side_counts_as_equal() {
        let dated = json!([{"updatedAt": "2024-01-01"}]);
        let undated = json!([{"id": 1}]);
        assert_eq!(compare_freshness(&dated, &undated), Ordering::Equal);
        assert_eq!(compare_freshness(&undated, &dated), Ordering::Equal);
    }

    #[test]
    fn one_fresh_record_dominates() {
        // Dataset-level comparison: a single newer record outweighs the rest.
        let local = json!([
            {"id": 1, "updatedAt": "2020-01-01"},
            {"id": 2, "updatedAt": "2024-09-01"}
        ]);
        let remote = json!([
            {"id": 1, "updatedAt": "2024-08-01"},
            {"id": 2, "updatedAt": "2024-08-01"}
        ]);
        assert_eq!(compare_freshness(&local, &remote), Ordering::Greater);
    }
}
