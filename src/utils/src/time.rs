use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc, Weekday};

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// utc_datetime converts an epoch instant into a UTC civil date time.
pub fn utc_datetime(epoch: i64, nanos: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(epoch, nanos as u32)
        .ok_or(anyhow!("epoch {}.{:09} is out of the civil range", epoch, nanos))
}

/// midnight returns the UTC instant at 00:00:00 of the given civil date.
pub fn midnight(date: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    let dt = date
        .and_hms_opt(0, 0, 0)
        .ok_or(anyhow!("invalid civil date {}", date))?;
    Ok(Utc.from_utc_datetime(&dt))
}

/// first_of_month returns the first day of the given year and month (1 based).
pub fn first_of_month(year: i32, month: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(anyhow!("invalid month {}-{}", year, month))
}

/// epoch_day returns the number of whole days between the Unix epoch and `epoch`,
/// rounding towards negative infinity.
pub fn epoch_day(epoch: i64) -> i64 {
    epoch.div_euclid(SECONDS_PER_DAY)
}

/// weekday_of_epoch_day returns the weekday of an epoch day.
pub fn weekday_of_epoch_day(day: i64) -> anyhow::Result<Weekday> {
    let epoch = day
        .checked_mul(SECONDS_PER_DAY)
        .ok_or(anyhow!("epoch day {} is out of range", day))?;
    Ok(utc_datetime(epoch, 0)?.weekday())
}

/// month_index returns a monotonically increasing month counter for a date.
pub fn month_index<D: Datelike>(d: &D) -> i64 {
    d.year() as i64 * 12 + d.month0() as i64
}

/// time_format renders an instant as RFC 3339 with a `Z` offset.
pub fn time_format(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
