use chrono::Datelike;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, Month, OffsetDateTime, UtcOffset};

pub fn localized_datetime(time: OffsetDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    let utc = time.to_offset(UtcOffset::UTC);
    let datetime_utc = DateTime::<Utc>::from_timestamp(utc.unix_timestamp(), utc.nanosecond())?;
    Some(tz.from_utc_datetime(&datetime_utc.naive_utc()))
}

/// Calendar date of `time` as observed in `tz`. Falls back to the UTC date.
pub fn local_date(time: OffsetDateTime, tz: Tz) -> Date {
    localized_datetime(time, tz)
        .and_then(|localized| {
            let month = Month::try_from(u8::try_from(localized.month()).ok()?).ok()?;
            let day = u8::try_from(localized.day()).ok()?;
            Date::from_calendar_date(localized.year(), month, day).ok()
        })
        .unwrap_or_else(|| time.to_offset(UtcOffset::UTC).date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn late_utc_evening_is_next_day_in_tokyo() {
        let now = datetime!(2025-03-04 20:00:00 UTC);
        assert_eq!(local_date(now, Tz::UTC), date!(2025 - 03 - 04));
        assert_eq!(local_date(now, chrono_tz::Asia::Tokyo), date!(2025 - 03 - 05));
    }

    #[test]
    fn early_utc_morning_is_previous_day_in_new_york() {
        let now = datetime!(2025-03-05 02:00:00 UTC);
        assert_eq!(
            local_date(now, chrono_tz::America::New_York),
            date!(2025 - 03 - 04)
        );
    }
}
