//! Live report freshness.
//!
//! A report is usable only while its timestamp is recent. Anything we cannot
//! date is treated as stale rather than as an error.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::domain::VehicleReport;

/// Parse an upstream ISO-8601 timestamp.
///
/// Accepts RFC 3339 with `Z` or a numeric offset. Timestamps without any
/// offset are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Whether `report` is recent enough to use: `now - timestamp < max_age`.
///
/// A missing or unparseable timestamp is stale.
pub fn is_fresh(report: &VehicleReport, now: DateTime<Utc>, max_age: Duration) -> bool {
    report
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .is_some_and(|ts| now.signed_duration_since(ts) < max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 25, 0).unwrap()
    }

    fn report(ts: Option<&str>) -> VehicleReport {
        VehicleReport {
            id: Some("1".into()),
            timestamp: ts.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn z_suffix_is_utc() {
        let ts = parse_timestamp("2024-03-15T08:22:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 15, 8, 22, 0).unwrap());
    }

    #[test]
    fn explicit_offset_is_honoured() {
        let ts = parse_timestamp("2024-03-15T10:22:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 15, 8, 22, 0).unwrap());
    }

    #[test]
    fn offsetless_is_utc() {
        let ts = parse_timestamp("2024-03-15T08:22:00.500").unwrap();
        assert_eq!(ts.timestamp(), 1_710_490_920);
        assert!(parse_timestamp("2024-03-15 08:22:00").is_some());
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-45T99:00:00Z").is_none());
    }

    #[test]
    fn three_minutes_old_is_fresh() {
        assert!(is_fresh(
            &report(Some("2024-03-15T08:22:00Z")),
            now(),
            Duration::minutes(10)
        ));
    }

    #[test]
    fn fifteen_minutes_old_is_stale() {
        assert!(!is_fresh(
            &report(Some("2024-03-15T08:10:00Z")),
            now(),
            Duration::minutes(10)
        ));
    }

    #[test]
    fn exactly_max_age_is_stale() {
        assert!(!is_fresh(
            &report(Some("2024-03-15T08:15:00Z")),
            now(),
            Duration::minutes(10)
        ));
    }

    #[test]
    fn missing_or_bad_timestamp_is_stale() {
        assert!(!is_fresh(&report(None), now(), Duration::minutes(10)));
        assert!(!is_fresh(&report(Some("n/a")), now(), Duration::minutes(10)));
    }

    #[test]
    fn max_age_is_configurable() {
        let r = report(Some("2024-03-15T08:22:00Z"));
        assert!(!is_fresh(&r, now(), Duration::minutes(2)));
        assert!(is_fresh(&r, now(), Duration::minutes(5)));
    }
}
