use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};

pub const MINUTES_IN_DAY: i64 = 24 * 60;

pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// This is the standard way of printing a number of minutes in daypie, e.g. `1h 5m`.
/// Hours are floored while the minutes keep the sign, so `-30` prints as `-1h -30m`.
pub fn format_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes.div_euclid(60), minutes % 60)
}

/// Returns the first and the last millisecond of the reference's calendar day in its timezone.
/// `None` when the day can't be expressed, e.g. midnight skipped by a DST change.
pub fn day_bounds<Tz: TimeZone>(reference: &DateTime<Tz>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let timezone = reference.timezone();
    let day = reference.date_naive();
    let start = timezone
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()?;
    let next = timezone
        .from_local_datetime(&day.succ_opt()?.and_time(NaiveTime::MIN))
        .earliest()?;
    Some((
        start.with_timezone(&Utc),
        next.with_timezone(&Utc) - Duration::milliseconds(1),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveTime, TimeZone, Utc};

    use super::{day_bounds, format_minutes, minute_of_day};

    #[test]
    fn minutes_are_counted_from_midnight() {
        assert_eq!(minute_of_day(NaiveTime::MIN), 0);
        assert_eq!(minute_of_day(NaiveTime::from_hms_opt(9, 0, 59).unwrap()), 540);
        assert_eq!(minute_of_day(NaiveTime::from_hms_opt(23, 59, 0).unwrap()), 1439);
    }

    #[test]
    fn minutes_are_formatted_as_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(59), "0h 59m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(1505), "25h 5m");
    }

    #[test]
    fn negative_minutes_floor_the_hours_only() {
        assert_eq!(format_minutes(-30), "-1h -30m");
        assert_eq!(format_minutes(-60), "-1h 0m");
        assert_eq!(format_minutes(-90), "-2h -30m");
    }

    #[test]
    fn day_bounds_follow_reference_timezone() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let reference = offset.with_ymd_and_hms(2024, 4, 5, 1, 30, 0).unwrap();

        let (start, end) = day_bounds(&reference).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 4, 21, 0, 0).unwrap());
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 4, 5, 20, 59, 59).unwrap()
                + chrono::Duration::milliseconds(999)
        );
    }
}
