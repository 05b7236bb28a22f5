//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::utils::errors::{AsakatsuError, Result};

/// Format a whole-yen amount for display: `無料` when zero, otherwise `¥1,500`
pub fn format_yen(amount: i32) -> String {
    if amount <= 0 {
        return "無料".to_string();
    }

    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("¥{}", grouped)
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Build a fixed offset from a minute count
pub fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| AsakatsuError::Config(format!("UTC offset out of range: {} minutes", minutes)))
}

/// Calendar date of `instant` in the given offset
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight starting `date`
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = NaiveDateTime::new(date, NaiveTime::default());
    let utc = local - Duration::seconds(offset.local_minus_utc() as i64);
    Utc.from_utc_datetime(&utc)
}

/// `[start, end)` of the local day containing `instant`
pub fn local_day_bounds(instant: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(local_date(instant, offset), offset);
    (start, start + Duration::days(1))
}

/// `[Monday 00:00, next Monday 00:00)` of the local week containing `instant`
pub fn local_week_bounds(instant: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = local_date(instant, offset);
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    let start = local_midnight(monday, offset);
    (start, start + Duration::days(7))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jst() -> FixedOffset {
        utc_offset(9 * 60).unwrap()
    }

    #[test]
    fn test_format_yen() {
        assert_eq!(format_yen(0), "無料");
        assert_eq!(format_yen(500), "¥500");
        assert_eq!(format_yen(1000), "¥1,000");
        assert_eq!(format_yen(1234567), "¥1,234,567");
    }

    #[test]
    fn test_local_day_bounds_cross_utc_midnight() {
        // 2025-09-12 20:00 UTC is already 2025-09-13 05:00 in Japan
        let instant = Utc.with_ymd_and_hms(2025, 9, 12, 20, 0, 0).unwrap();
        let (start, end) = local_day_bounds(instant, jst());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 9, 12, 15, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 9, 13, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_local_week_starts_on_monday() {
        // Saturday 2025-09-13 in Japan
        let instant = Utc.with_ymd_and_hms(2025, 9, 13, 1, 0, 0).unwrap();
        let (start, end) = local_week_bounds(instant, jst());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 9, 7, 15, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(7));
    }

    #[test]
    fn test_utc_offset_range() {
        assert!(utc_offset(-12 * 60).is_ok());
        assert!(utc_offset(24 * 60).is_err());
    }
}
