use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// This is the standard way of converting a date to a string in dayusage.
pub fn date_to_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Returns the closed window covering the calendar `date` in `tz`: local midnight to
/// 23:59:59.999.
///
/// Offsets change around midnight in a few zones, so a missing local time is moved towards the
/// inside of the day until it exists.
pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Tz>, DateTime<Tz>) {
    let midnight = date.and_time(NaiveTime::MIN);
    let last_millisecond = midnight + Duration::days(1) - Duration::milliseconds(1);
    let start = resolve_local(tz, midnight, Duration::minutes(1));
    let end = resolve_local(tz, last_millisecond, Duration::minutes(-1));
    (start, end)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, step: Duration) -> DateTime<Tz> {
    let mut candidate = naive;
    // A gap never spans a whole day.
    for _ in 0..24 * 60 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(v) => return v,
            LocalResult::Ambiguous(earliest, latest) => {
                return if step > Duration::zero() {
                    earliest
                } else {
                    latest
                };
            }
            LocalResult::None => candidate += step,
        }
    }
    tz.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{date_to_key, day_window};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    #[test]
    fn test_date_to_key_is_fixed_width() {
        assert_eq!(date_to_key(TEST_DATE), "2024-05-01");
        assert_eq!(
            date_to_key(NaiveDate::from_ymd_opt(987, 12, 9).unwrap()),
            "0987-12-09"
        );
    }

    #[test]
    fn test_day_window_utc() {
        let (start, end) = day_window(TEST_DATE, &Utc);
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            end.timestamp_millis() - start.timestamp_millis(),
            24 * 60 * 60 * 1000 - 1
        );
    }

    #[test]
    fn test_day_window_uses_local_midnight() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let (start, end) = day_window(TEST_DATE, &tz);
        assert_eq!(start.date_naive(), TEST_DATE);
        assert_eq!(end.date_naive(), TEST_DATE);
        assert_eq!(
            start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 4, 30, 21, 0, 0).unwrap()
        );
    }
}
