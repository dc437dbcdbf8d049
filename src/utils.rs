// Utility functions
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses a stored timestamp into `DateTime<Utc>`, if possible.
/// Naive timestamps (no offset) are taken to be UTC.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    let s = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn accepts_rfc3339_and_naive_forms() {
        let a = parse_datetime("2024-03-01T10:20:30+02:00").unwrap();
        assert_eq!(a.hour(), 8);

        let b = parse_datetime("2024-03-01 10:20:30.123456").unwrap();
        assert_eq!(b.minute(), 20);

        let c = parse_datetime("2024-03-01").unwrap();
        assert_eq!(c.day(), 1);
        assert_eq!(c.hour(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("2024-13-45 99:99:99").is_none());
    }
}
