//! Record timestamp resolution.
//!
//! Order: explicit argument, then the metadata `timestamp` field (epoch
//! number or ISO-8601 string), then the current time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use strata_types::memory::{METADATA_TIMESTAMP_KEY, Metadata};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Interpret a metadata value as epoch milliseconds.
///
/// Numbers are taken as epoch ms. Strings may be RFC 3339, naive ISO-8601
/// (read as UTC), a bare date, or a numeric string.
pub fn parse_timestamp_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis());
    }
    s.parse::<i64>().ok()
}

/// Resolve the timestamp for a write.
pub fn resolve_timestamp(explicit: Option<i64>, metadata: &Metadata, now_ms: i64) -> i64 {
    explicit
        .or_else(|| {
            metadata
                .get(METADATA_TIMESTAMP_KEY)
                .and_then(parse_timestamp_value)
        })
        .unwrap_or(now_ms)
}

/// Format epoch ms as RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_iso(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fill in the metadata timestamp field when the caller did not set one.
pub fn normalize_metadata_timestamp(metadata: &mut Metadata, timestamp_ms: i64) {
    if !metadata.contains_key(METADATA_TIMESTAMP_KEY) {
        metadata.insert(
            METADATA_TIMESTAMP_KEY.to_string(),
            Value::String(format_iso(timestamp_ms)),
        );
    }
}

/// Current time as epoch ms.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Metadata {
        let mut m = Metadata::new();
        m.insert(METADATA_TIMESTAMP_KEY.to_string(), value);
        m
    }

    #[test]
    fn test_explicit_timestamp_wins() {
        let m = meta(json!(5));
        assert_eq!(resolve_timestamp(Some(7), &m, 9), 7);
    }

    #[test]
    fn test_metadata_epoch_number() {
        let m = meta(json!(1_700_000_000_000i64));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_700_000_000_000);

        let m = meta(json!(1.6));
        assert_eq!(resolve_timestamp(None, &m, 9), 2);
    }

    #[test]
    fn test_metadata_iso_string() {
        let m = meta(json!("2024-01-02T03:04:05.678Z"));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_704_164_645_678);

        let m = meta(json!("2024-01-02T05:04:05.678+02:00"));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_704_164_645_678);
    }

    #[test]
    fn test_metadata_naive_strings_are_utc() {
        let m = meta(json!("2024-01-02T03:04:05"));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_704_164_645_000);

        let m = meta(json!("2024-01-02"));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_704_153_600_000);

        let m = meta(json!("1704153600000"));
        assert_eq!(resolve_timestamp(None, &m, 9), 1_704_153_600_000);
    }

    #[test]
    fn test_unparseable_metadata_falls_back_to_now() {
        assert_eq!(resolve_timestamp(None, &meta(json!("yesterday")), 9), 9);
        assert_eq!(resolve_timestamp(None, &meta(json!(true)), 9), 9);
        assert_eq!(resolve_timestamp(None, &Metadata::new(), 9), 9);
    }

    #[test]
    fn test_format_iso() {
        assert_eq!(format_iso(1_704_164_645_678), "2024-01-02T03:04:05.678Z");
    }

    #[test]
    fn test_normalize_only_when_absent() {
        let mut m = Metadata::new();
        normalize_metadata_timestamp(&mut m, 1_704_164_645_678);
        assert_eq!(m[METADATA_TIMESTAMP_KEY], json!("2024-01-02T03:04:05.678Z"));

        let mut m = meta(json!(123));
        normalize_metadata_timestamp(&mut m, 1_704_164_645_678);
        assert_eq!(m[METADATA_TIMESTAMP_KEY], json!(123));
    }
}
