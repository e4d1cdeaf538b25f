use chrono::{DateTime, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date format, expected YYYY-MM-DD")]
    InvalidFormat,
    #[error("invalid date value")]
    InvalidValue,
    #[error("invalid calendar date")]
    InvalidCalendarDate,
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Epoch milliseconds to UTC day key. Total: instants chrono cannot
/// represent clamp to the epoch.
pub fn normalize_day(timestamp_ms: i64) -> String {
    let instant = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or(DateTime::UNIX_EPOCH);
    day_key(instant.date_naive())
}

/// Strict "YYYY-MM-DD" validation. The reconstruction check at the end
/// rejects inputs that parse but do not round-trip, such as a signed year.
pub fn parse_day_key(input: &str) -> Result<NaiveDate, DateError> {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(DateError::InvalidFormat);
    }

    let year: i32 = input[..4].parse().map_err(|_| DateError::InvalidValue)?;
    let month: u32 = input[5..7].parse().map_err(|_| DateError::InvalidValue)?;
    let day: u32 = input[8..10].parse().map_err(|_| DateError::InvalidValue)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidCalendarDate)?;

    if day_key(date) != input {
        return Err(DateError::InvalidCalendarDate);
    }

    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_day_uses_utc_calendar() {
        // 2026-01-05T00:00:00Z
        assert_eq!(normalize_day(1_767_571_200_000), "2026-01-05");
        // One millisecond before midnight stays on the previous day.
        assert_eq!(normalize_day(1_767_571_199_999), "2026-01-04");
    }

    #[test]
    fn normalize_day_is_total() {
        assert_eq!(normalize_day(0), "1970-01-01");
        assert_eq!(normalize_day(-1), "1969-12-31");
        assert_eq!(normalize_day(i64::MAX), "1970-01-01");
    }

    #[test]
    fn parse_day_key_round_trips_normalized_output() {
        let key = normalize_day(1_767_571_200_000);
        let date = parse_day_key(&key).unwrap();
        assert_eq!(day_key(date), key);
    }

    #[test]
    fn rejects_wrong_shape() {
        assert_eq!(parse_day_key("2026/01/01"), Err(DateError::InvalidFormat));
        assert_eq!(parse_day_key("2026-1-01"), Err(DateError::InvalidFormat));
        assert_eq!(parse_day_key("2026-01-01T"), Err(DateError::InvalidFormat));
        assert_eq!(parse_day_key(""), Err(DateError::InvalidFormat));
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert_eq!(parse_day_key("20XX-01-01"), Err(DateError::InvalidValue));
        assert_eq!(parse_day_key("2026-ab-01"), Err(DateError::InvalidValue));
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(
            parse_day_key("2026-02-30"),
            Err(DateError::InvalidCalendarDate)
        );
        assert_eq!(
            parse_day_key("2026-13-01"),
            Err(DateError::InvalidCalendarDate)
        );
        assert_eq!(
            parse_day_key("2026-00-10"),
            Err(DateError::InvalidCalendarDate)
        );
    }

    #[test]
    fn reconstruction_guard_rejects_signed_year() {
        assert_eq!(
            parse_day_key("+026-02-03"),
            Err(DateError::InvalidCalendarDate)
        );
    }

    #[test]
    fn accepts_leap_day() {
        assert!(parse_day_key("2028-02-29").is_ok());
        assert_eq!(
            parse_day_key("2026-02-29"),
            Err(DateError::InvalidCalendarDate)
        );
    }
}
