//! Partition keys and retention math.
//!
//! Partitions are UTC time buckets. A record's partition key is derived once
//! at write time; tiering works per record while deletion works per
//! partition, keyed on the partition's start time.

use chrono::{DateTime, NaiveDate, Utc};

use strata_types::config::{PartitionGranularity, RetentionPolicy};
use strata_types::memory::Tier;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

fn to_datetime(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default()
}

/// Compute the partition key for a timestamp.
///
/// `Day` yields `YYYY-MM-DD`; `Hour` yields `YYYY-MM-DD-HH`.
pub fn partition_key(timestamp_ms: i64, granularity: PartitionGranularity) -> String {
    let dt = to_datetime(timestamp_ms);
    match granularity {
        PartitionGranularity::Day => dt.format("%Y-%m-%d").to_string(),
        PartitionGranularity::Hour => dt.format("%Y-%m-%d-%H").to_string(),
    }
}

/// Parse a partition key back into its start time (epoch ms).
///
/// Accepts both day and hour keys regardless of the configured granularity,
/// so a store can be reopened after the granularity changed.
pub fn partition_start(key: &str) -> Option<i64> {
    let date_part = key.get(..10)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let day_start = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();

    match key.len() {
        10 => Some(day_start),
        13 if key.as_bytes()[10] == b'-' => {
            let hour: i64 = key.get(11..)?.parse().ok()?;
            if !(0..24).contains(&hour) {
                return None;
            }
            Some(day_start + hour * MS_PER_HOUR)
        }
        _ => None,
    }
}

/// Tier of a record written at `timestamp_ms`, evaluated at `now_ms`.
pub fn tier_for(timestamp_ms: i64, now_ms: i64, policy: &RetentionPolicy) -> Tier {
    if timestamp_ms >= now_ms - policy.hot_retention_ms() {
        Tier::Hot
    } else {
        Tier::Cold
    }
}

/// Whether the partition `key` has aged past cold retention.
///
/// Keys that do not parse are never considered expired.
pub fn partition_expired(key: &str, now_ms: i64, policy: &RetentionPolicy) -> bool {
    match partition_start(key) {
        Some(start) => start < now_ms - policy.cold_retention_ms(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

    fn ms(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 15)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_partition_key_day() {
        let ts = ms(2026, 3, 9, 17);
        assert_eq!(partition_key(ts, PartitionGranularity::Day), "2026-03-09");
    }

    #[test]
    fn test_partition_key_hour() {
        let ts = ms(2026, 3, 9, 7);
        assert_eq!(partition_key(ts, PartitionGranularity::Hour), "2026-03-09-07");
    }

    #[test]
    fn test_partition_start_round_trips_key() {
        let ts = ms(2026, 3, 9, 17);
        let day_key = partition_key(ts, PartitionGranularity::Day);
        let hour_key = partition_key(ts, PartitionGranularity::Hour);

        let day_start = partition_start(&day_key).unwrap();
        let hour_start = partition_start(&hour_key).unwrap();

        assert!(day_start <= ts && ts - day_start < MS_PER_DAY);
        assert!(hour_start <= ts && ts - hour_start < MS_PER_HOUR);
        assert_eq!(hour_start - day_start, 17 * MS_PER_HOUR);
    }

    #[test]
    fn test_partition_start_rejects_garbage() {
        assert_eq!(partition_start("not-a-key"), None);
        assert_eq!(partition_start("2026-13-01"), None);
        assert_eq!(partition_start("2026-01-01-25"), None);
        assert_eq!(partition_start("2026-01-01T05"), None);
        assert_eq!(partition_start(""), None);
    }

    #[test]
    fn test_tier_for_respects_hot_window() {
        let now = ms(2026, 6, 1, 12);
        let ten_days_ago = now - 10 * MS_PER_DAY;

        let week = RetentionPolicy::from_days(7, 90, PartitionGranularity::Day).unwrap();
        assert_eq!(tier_for(ten_days_ago, now, &week), Tier::Cold);

        let month = RetentionPolicy::from_days(30, 90, PartitionGranularity::Day).unwrap();
        assert_eq!(tier_for(ten_days_ago, now, &month), Tier::Hot);
    }

    #[test]
    fn test_partition_expired_uses_partition_start() {
        let policy = RetentionPolicy::from_days(7, 90, PartitionGranularity::Day).unwrap();
        let now = ms(2026, 6, 1, 12);

        let old_key = partition_key(now - 91 * MS_PER_DAY, PartitionGranularity::Day);
        assert!(partition_expired(&old_key, now, &policy));

        let inside_key = partition_key(now - 89 * MS_PER_DAY, PartitionGranularity::Day);
        assert!(!partition_expired(&inside_key, now, &policy));

        assert!(!partition_expired("garbage", now, &policy));
    }

    #[test]
    fn test_partition_expired_can_drop_newer_siblings() {
        // The partition starting just past the horizon is expired even though
        // records late in that day are younger than the horizon itself.
        let policy = RetentionPolicy::from_days(1, 2, PartitionGranularity::Day).unwrap();
        let now = ms(2026, 6, 10, 12);
        let late_record = now - 2 * MS_PER_DAY + MS_PER_HOUR;
        let key = partition_key(late_record, PartitionGranularity::Day);
        assert!(partition_expired(&key, now, &policy));
    }
}
