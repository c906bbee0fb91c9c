//! Time-of-day helpers for the program model.
//!
//! Slot times are signed offsets from local midnight (`chrono::Duration`).
//! Keeping them signed lets the assembly algorithm subtract a pre-heat
//! duration from an early-morning event start, or add a buffer past 24h,
//! without clamping; only the wire format wraps times back into a day.

use chrono::{DateTime, Duration, TimeZone, Timelike};

/// Offset from local midnight for the given instant, at second resolution.
pub fn time_of_day<Tz: TimeZone>(t: &DateTime<Tz>) -> Duration {
    Duration::seconds(i64::from(t.time().num_seconds_from_midnight()))
}

/// Hour and minute of a time-of-day offset, wrapped into `[0h, 24h)`.
///
/// Offsets outside the range (a pre-heat slot pushed before midnight, or a
/// restore slot pushed past it) wrap around, matching how the thermostat
/// interprets out-of-day times.
pub fn hours_minutes(t: Duration) -> (u32, u32) {
    let secs = t.num_seconds().rem_euclid(24 * 3600);
    ((secs / 3600) as u32, ((secs % 3600) / 60) as u32)
}

/// Parse a `"HH:MM"` (or `"HH:MM:SS"`) clock time into an offset from
/// midnight. `"24:00"` is accepted as the end-of-day boundary.
pub fn parse_clock_time(s: &str) -> Result<Duration, chrono::ParseError> {
    if s == "24:00" {
        return Ok(Duration::hours(24));
    }
    let t = chrono::NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M:%S"))?;
    Ok(Duration::seconds(i64::from(t.num_seconds_from_midnight())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_time_of_day() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let t = est.with_ymd_and_hms(2024, 1, 24, 6, 30, 0).unwrap();
        assert_eq!(time_of_day(&t), Duration::hours(6) + Duration::minutes(30));

        let midnight = est.with_ymd_and_hms(2024, 1, 24, 0, 0, 0).unwrap();
        assert_eq!(time_of_day(&midnight), Duration::zero());
    }

    #[test]
    fn test_time_of_day_uses_local_clock() {
        // 06:00 EST is 11:00 UTC; the offset must come from the local clock.
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let t = est.with_ymd_and_hms(2024, 1, 24, 6, 0, 0).unwrap();
        assert_eq!(time_of_day(&t), Duration::hours(6));
        assert_eq!(time_of_day(&t.to_utc()), Duration::hours(11));
    }

    #[test]
    fn test_hours_minutes_in_range() {
        assert_eq!(hours_minutes(Duration::hours(7)), (7, 0));
        assert_eq!(
            hours_minutes(Duration::hours(21) + Duration::minutes(58)),
            (21, 58)
        );
        assert_eq!(hours_minutes(Duration::zero()), (0, 0));
    }

    #[test]
    fn test_hours_minutes_wraps() {
        // A pre-heat slot pushed before midnight lands late the previous day.
        assert_eq!(hours_minutes(Duration::minutes(-30)), (23, 30));
        // A restore slot pushed past midnight lands early the next day.
        assert_eq!(
            hours_minutes(Duration::hours(24) + Duration::minutes(2)),
            (0, 2)
        );
        assert_eq!(hours_minutes(Duration::hours(24)), (0, 0));
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(parse_clock_time("07:00").unwrap(), Duration::hours(7));
        assert_eq!(
            parse_clock_time("16:30").unwrap(),
            Duration::hours(16) + Duration::minutes(30)
        );
        assert_eq!(parse_clock_time("24:00").unwrap(), Duration::hours(24));
        assert_eq!(
            parse_clock_time("09:02:30").unwrap(),
            Duration::hours(9) + Duration::minutes(2) + Duration::seconds(30)
        );
        assert!(parse_clock_time("25:00").is_err());
        assert!(parse_clock_time("7h").is_err());
        assert!(parse_clock_time("").is_err());
    }
}
