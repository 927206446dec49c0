//! Lenient ISO-8601 timestamp parsing.

use crate::Time;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// A string that is not a recognised timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date format: {0:?}")]
pub struct TimestampError(pub String);

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Parse an ISO timestamp into UTC.
///
/// Accepts RFC 3339, date-times with or without seconds and with `Z`, an
/// explicit offset or no zone at all (read as UTC), and bare `YYYY-MM-DD`
/// dates (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<Time, TimestampError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(TimestampError(input.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    let naive = s
        .strip_suffix('Z')
        .or_else(|| s.strip_suffix('z'))
        .unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(TimestampError(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Time {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_timestamp("2025-01-01T09:00:00Z").unwrap(),
            utc(2025, 1, 1, 9, 0)
        );
        assert_eq!(
            parse_timestamp("2025-01-01T10:00:00+01:00").unwrap(),
            utc(2025, 1, 1, 9, 0)
        );
        assert_eq!(
            parse_timestamp("2025-01-01T09:00:00.000Z").unwrap(),
            utc(2025, 1, 1, 9, 0)
        );
    }

    #[test]
    fn test_minutes_precision() {
        assert_eq!(parse_timestamp("2025-01-01T09:30Z").unwrap(), utc(2025, 1, 1, 9, 30));
        assert_eq!(parse_timestamp("2025-01-01T09:30").unwrap(), utc(2025, 1, 1, 9, 30));
        assert_eq!(
            parse_timestamp("2025-01-01T11:30+02:00").unwrap(),
            utc(2025, 1, 1, 9, 30)
        );
    }

    #[test]
    fn test_bare_date() {
        assert_eq!(parse_timestamp("2025-01-15").unwrap(), utc(2025, 1, 15, 0, 0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_timestamp("2025-13-01").is_err());
    }
}
