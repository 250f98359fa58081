use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use chrono::{Days, Months, Weekday};
use serde::{Deserialize, Serialize};
use tsquery_utils::time::{
    epoch_day, first_of_month, midnight, month_index, time_format, utc_datetime,
    weekday_of_epoch_day, NANOS_PER_SECOND, SECONDS_PER_DAY,
};

/// Op is a comparison operator between two timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

/// TimeUnit is the unit an interval or a timestamp resolution is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanos,
    Micros,
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    /// fixed_nanos returns the length of the unit in nanoseconds, or None for the
    /// calendar units whose length depends on the date.
    pub fn fixed_nanos(&self) -> Option<i128> {
        match self {
            TimeUnit::Nanos => Some(1),
            TimeUnit::Micros => Some(1_000),
            TimeUnit::Millis => Some(1_000_000),
            TimeUnit::Seconds => Some(NANOS_PER_SECOND as i128),
            TimeUnit::Minutes => Some(60 * NANOS_PER_SECOND as i128),
            TimeUnit::Hours => Some(3_600 * NANOS_PER_SECOND as i128),
            TimeUnit::Days => Some(SECONDS_PER_DAY as i128 * NANOS_PER_SECOND as i128),
            TimeUnit::Weeks | TimeUnit::Months | TimeUnit::Years => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanos => "Nanos",
            TimeUnit::Micros => "Micros",
            TimeUnit::Millis => "Millis",
            TimeUnit::Seconds => "Seconds",
            TimeUnit::Minutes => "Minutes",
            TimeUnit::Hours => "Hours",
            TimeUnit::Days => "Days",
            TimeUnit::Weeks => "Weeks",
            TimeUnit::Months => "Months",
            TimeUnit::Years => "Years",
        }
    }

    /// suffix is the short form used in downsample strings such as `1m`.
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanos => "ns",
            TimeUnit::Micros => "us",
            TimeUnit::Millis => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "n",
            TimeUnit::Years => "y",
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TemporalAmount is an amount of time to add to or subtract from a timestamp.
///
/// A `Duration` is a fixed number of (nano)seconds. A `Period` is a calendar
/// amount whose length depends on the date it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalAmount {
    Duration(chrono::Duration),
    Period { years: i32, months: i32, days: i32 },
}

impl TemporalAmount {
    pub fn seconds(n: i64) -> Self {
        TemporalAmount::Duration(chrono::Duration::seconds(n))
    }

    pub fn months(n: i32) -> Self {
        TemporalAmount::Period {
            years: 0,
            months: n,
            days: 0,
        }
    }

    pub fn days(n: i32) -> Self {
        TemporalAmount::Period {
            years: 0,
            months: 0,
            days: n,
        }
    }

    pub fn weeks(n: i32) -> Self {
        Self::days(n * 7)
    }

    /// iso8601 renders the amount as an ISO-8601 duration, e.g. `PT1M` or `P1M`.
    pub fn iso8601(&self) -> String {
        match self {
            TemporalAmount::Duration(d) => {
                let total = d.num_seconds();
                let nanos = (*d - chrono::Duration::seconds(total))
                    .num_nanoseconds()
                    .unwrap_or(0);
                if total == 0 && nanos == 0 {
                    return "PT0S".to_string();
                }
                let hours = total / 3600;
                let minutes = (total % 3600) / 60;
                let secs = total % 60;
                let mut s = String::from("PT");
                if hours != 0 {
                    s.push_str(&format!("{}H", hours));
                }
                if minutes != 0 {
                    s.push_str(&format!("{}M", minutes));
                }
                if secs != 0 || nanos != 0 {
                    if nanos == 0 {
                        s.push_str(&format!("{}S", secs));
                    } else {
                        let frac = format!("{:09}", nanos.abs());
                        s.push_str(&format!("{}.{}S", secs, frac.trim_end_matches('0')));
                    }
                }
                s
            }
            TemporalAmount::Period {
                years,
                months,
                days,
            } => {
                if *years == 0 && *months == 0 && *days == 0 {
                    return "P0D".to_string();
                }
                let mut s = String::from("P");
                if *years != 0 {
                    s.push_str(&format!("{}Y", years));
                }
                if *months != 0 {
                    s.push_str(&format!("{}M", months));
                }
                if *days != 0 {
                    s.push_str(&format!("{}D", days));
                }
                s
            }
        }
    }
}

/// Timestamp is an instant in Unix epoch seconds plus a sub-second nanosecond
/// component. Second resolution timestamps carry `nanos == 0`. Always UTC.
///
/// Ordering is lexicographic on `(epoch, nanos)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    epoch: i64,
    #[serde(default)]
    nanos: i64,
}

impl Timestamp {
    /// new builds a timestamp, carrying any nanos overflow into the seconds. The
    /// seconds saturate at the bounds of i64.
    pub fn new(epoch: i64, nanos: i64) -> Self {
        Self {
            epoch: epoch.saturating_add(nanos.div_euclid(NANOS_PER_SECOND)),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND),
        }
    }

    pub fn from_epoch(epoch: i64) -> Self {
        Self { epoch, nanos: 0 }
    }

    pub fn from_ms_epoch(ms: i64) -> Self {
        Self::new(ms.div_euclid(1000), ms.rem_euclid(1000) * 1_000_000)
    }

    /// max returns the sentinel "infinite future" timestamp.
    pub fn max() -> Self {
        Self {
            epoch: i64::MAX,
            nanos: 0,
        }
    }

    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    pub fn nanos(&self) -> i64 {
        self.nanos
    }

    pub fn ms_epoch(&self) -> i64 {
        self.epoch
            .saturating_mul(1000)
            .saturating_add(self.nanos / 1_000_000)
    }

    /// units returns the finest resolution this timestamp carries.
    pub fn units(&self) -> TimeUnit {
        if self.nanos == 0 {
            TimeUnit::Seconds
        } else {
            TimeUnit::Nanos
        }
    }

    pub fn timezone(&self) -> &'static str {
        "UTC"
    }

    pub fn update(&mut self, other: &Timestamp) {
        self.epoch = other.epoch;
        self.nanos = other.nanos;
    }

    pub fn update_epoch(&mut self, epoch: i64) {
        self.epoch = epoch;
        self.nanos = 0;
    }

    pub fn update_ms_epoch(&mut self, ms: i64) {
        *self = Self::from_ms_epoch(ms);
    }

    pub fn set_max(&mut self) {
        *self = Self::max();
    }

    pub fn compare(&self, op: Op, other: &Timestamp) -> bool {
        let ord = self.cmp(other);
        match op {
            Op::Lt => ord == Ordering::Less,
            Op::Lte => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::Gte => ord != Ordering::Less,
            Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
        }
    }

    /// add moves the timestamp forward by `amount`. Calendar periods are applied
    /// to the UTC civil date so month and year lengths are honored.
    pub fn add(&mut self, amount: TemporalAmount) -> anyhow::Result<()> {
        match amount {
            TemporalAmount::Duration(d) => self.shift(d, 1),
            TemporalAmount::Period {
                years,
                months,
                days,
            } => self.shift_calendar(years, months, days, 1),
        }
    }

    pub fn subtract(&mut self, amount: TemporalAmount) -> anyhow::Result<()> {
        match amount {
            TemporalAmount::Duration(d) => self.shift(d, -1),
            TemporalAmount::Period {
                years,
                months,
                days,
            } => self.shift_calendar(years, months, days, -1),
        }
    }

    fn shift(&mut self, d: chrono::Duration, sign: i64) -> anyhow::Result<()> {
        let secs = d.num_seconds();
        let nanos = (d - chrono::Duration::seconds(secs))
            .num_nanoseconds()
            .unwrap_or(0);
        let epoch = secs
            .checked_mul(sign)
            .and_then(|secs| self.epoch.checked_add(secs))
            .ok_or(anyhow!("timestamp overflow adding {:?}", d))?;

        // |nanos| < 1e9 on both sides so the sum can not overflow
        let nanos = self.nanos + sign * nanos;
        let epoch = epoch
            .checked_add(nanos.div_euclid(NANOS_PER_SECOND))
            .ok_or(anyhow!("timestamp overflow adding {:?}", d))?;

        self.epoch = epoch;
        self.nanos = nanos.rem_euclid(NANOS_PER_SECOND);
        Ok(())
    }

    fn shift_calendar(
        &mut self,
        years: i32,
        months: i32,
        days: i32,
        sign: i32,
    ) -> anyhow::Result<()> {
        let dt = utc_datetime(self.epoch, self.nanos)?;
        let total_months = years
            .checked_mul(12)
            .and_then(|m| m.checked_add(months))
            .and_then(|m| m.checked_mul(sign))
            .ok_or(anyhow!(
                "calendar overflow shifting {} years {} months",
                years,
                months
            ))?;
        let dt = if total_months >= 0 {
            dt.checked_add_months(Months::new(total_months as u32))
        } else {
            dt.checked_sub_months(Months::new(total_months.unsigned_abs()))
        }
        .ok_or(anyhow!("calendar overflow shifting {} months", total_months))?;
        let days = days
            .checked_mul(sign)
            .ok_or(anyhow!("calendar overflow shifting {} days", days))?;
        let dt = if days >= 0 {
            dt.checked_add_days(Days::new(days as u64))
        } else {
            dt.checked_sub_days(Days::new(days.unsigned_abs() as u64))
        }
        .ok_or(anyhow!("calendar overflow shifting {} days", days))?;

        self.epoch = dt.timestamp();
        self.nanos = dt.timestamp_subsec_nanos() as i64;
        Ok(())
    }

    pub fn snap_to_previous_interval(&mut self, interval: i64, units: TimeUnit) -> anyhow::Result<()> {
        self.snap_to_previous_interval_anchored(interval, units, Weekday::Sun)
    }

    /// snap_to_previous_interval_anchored aligns the timestamp down to the most
    /// recent `interval * units` boundary. Week boundaries start on `day_of_week`.
    /// Snapping an aligned timestamp leaves it unchanged.
    pub fn snap_to_previous_interval_anchored(
        &mut self,
        interval: i64,
        units: TimeUnit,
        day_of_week: Weekday,
    ) -> anyhow::Result<()> {
        if interval < 1 {
            return Err(anyhow!("snap interval must be positive, got {}", interval));
        }

        if let Some(unit_nanos) = units.fixed_nanos() {
            let width = unit_nanos * interval as i128;
            let total = self.epoch as i128 * NANOS_PER_SECOND as i128 + self.nanos as i128;
            let snapped = total.div_euclid(width) * width;
            let epoch = snapped.div_euclid(NANOS_PER_SECOND as i128);
            self.epoch = i64::try_from(epoch).map_err(|e| anyhow!(e))?;
            self.nanos = snapped.rem_euclid(NANOS_PER_SECOND as i128) as i64;
            return Ok(());
        }

        match units {
            TimeUnit::Weeks => {
                let day = epoch_day(self.epoch);
                let anchor = day_of_week.num_days_from_sunday() as i64;
                let current = weekday_of_epoch_day(day)?.num_days_from_sunday() as i64;
                let week_start = day - (current - anchor).rem_euclid(7);

                // first anchor weekday on or after the epoch, day zero is a Thursday
                let first_anchor = (anchor - 4).rem_euclid(7);
                let week = (week_start - first_anchor).div_euclid(7);
                let snapped_week = week.div_euclid(interval) * interval;
                let day = first_anchor + snapped_week * 7;

                self.epoch = day
                    .checked_mul(SECONDS_PER_DAY)
                    .ok_or(anyhow!("week {} is out of range", snapped_week))?;
                self.nanos = 0;
            }
            TimeUnit::Months | TimeUnit::Years => {
                let dt = utc_datetime(self.epoch, self.nanos)?;
                let width = match units {
                    TimeUnit::Years => interval * 12,
                    _ => interval,
                };
                let idx = month_index(&dt).div_euclid(width) * width;
                let year = i32::try_from(idx.div_euclid(12)).map_err(|e| anyhow!(e))?;
                let month = idx.rem_euclid(12) as u32 + 1;
                let start = midnight(first_of_month(year, month)?)?;

                self.epoch = start.timestamp();
                self.nanos = 0;
            }
            _ => return Err(anyhow!("can not snap to {}", units)),
        }

        Ok(())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then(self.nanos.cmp(&other.nanos))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let utc = utc_datetime(self.epoch, self.nanos)
            .map(time_format)
            .unwrap_or_else(|_| "out-of-range".to_string());
        write!(
            f,
            "timestamp={}, utc={}, epoch={}, nanos={}, msEpoch={}",
            self.epoch,
            utc,
            self.epoch,
            self.nanos,
            self.ms_epoch()
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use tsquery_utils::time::NANOS_PER_SECOND;

    use crate::timestamp::{Op, TemporalAmount, TimeUnit, Timestamp};

    #[test]
    fn test_compare() {
        let a = Timestamp::from_epoch(1000);
        let b = Timestamp::new(1000, 500);
        let c = Timestamp::from_epoch(1001);

        assert!(a.compare(Op::Lt, &b));
        assert!(b.compare(Op::Lt, &c));
        assert!(a.compare(Op::Lte, &a));
        assert!(c.compare(Op::Gt, &b));
        assert!(b.compare(Op::Gte, &b));
        assert!(a.compare(Op::Eq, &Timestamp::from_epoch(1000)));
        assert!(a.compare(Op::Ne, &b));
        assert!(!a.compare(Op::Eq, &b));
    }

    #[test]
    fn test_normalize_and_ms() {
        let ts = Timestamp::new(10, 1_500_000_000);
        assert_eq!(ts.epoch(), 11);
        assert_eq!(ts.nanos(), 500_000_000);
        assert_eq!(ts.ms_epoch(), 11_500);

        let ts = Timestamp::from_ms_epoch(-1);
        assert_eq!(ts.epoch(), -1);
        assert_eq!(ts.nanos(), 999_000_000);
        assert_eq!(ts.units(), TimeUnit::Nanos);
        assert_eq!(Timestamp::from_epoch(5).units(), TimeUnit::Seconds);
    }

    #[test]
    fn test_set_max_and_update() {
        let mut ts = Timestamp::from_epoch(1);
        ts.set_max();
        assert_eq!(ts.epoch(), i64::MAX);
        assert!(ts.compare(Op::Gt, &Timestamp::from_epoch(i64::MAX - 1)));

        ts.update_epoch(42);
        assert_eq!(ts, Timestamp::from_epoch(42));
        assert_eq!(ts.timezone(), "UTC");

        ts.update(&Timestamp::new(7, 8));
        assert_eq!(ts, Timestamp::new(7, 8));
        ts.update_ms_epoch(2_500);
        assert_eq!(ts, Timestamp::new(2, 500_000_000));
    }

    #[test]
    fn test_add_duration() {
        let mut ts = Timestamp::from_epoch(1000);
        ts.add(TemporalAmount::seconds(60)).unwrap();
        assert_eq!(ts.epoch(), 1060);
        ts.subtract(TemporalAmount::Duration(chrono::Duration::milliseconds(1500)))
            .unwrap();
        assert_eq!(ts, Timestamp::new(1058, 500_000_000));
    }

    #[test]
    fn test_add_overflow_is_error() {
        let mut ts = Timestamp::new(i64::MAX, 999_999_999);
        assert!(ts
            .add(TemporalAmount::Duration(chrono::Duration::milliseconds(1)))
            .is_err());
        assert_eq!(ts, Timestamp::new(i64::MAX, 999_999_999));

        let mut ts = Timestamp::from_epoch(i64::MAX);
        assert!(ts.add(TemporalAmount::seconds(1)).is_err());

        let mut ts = Timestamp::from_epoch(i64::MIN);
        assert!(ts
            .subtract(TemporalAmount::Duration(chrono::Duration::nanoseconds(1)))
            .is_err());

        let mut ts = Timestamp::from_epoch(1000);
        assert!(ts
            .add(TemporalAmount::Period {
                years: 200_000_000,
                months: 0,
                days: 0,
            })
            .is_err());
        assert!(ts
            .subtract(TemporalAmount::Period {
                years: 0,
                months: 0,
                days: i32::MIN,
            })
            .is_err());
        assert_eq!(ts.epoch(), 1000);

        let ts = Timestamp::new(i64::MAX, NANOS_PER_SECOND);
        assert_eq!(ts.epoch(), i64::MAX);
        assert_eq!(ts.nanos(), 0);
    }

    #[test]
    fn test_add_calendar() {
        // 2019-01-31T00:00:00Z
        let mut ts = Timestamp::from_epoch(1548892800);
        ts.add(TemporalAmount::months(1)).unwrap();
        // clamps to 2019-02-28T00:00:00Z
        assert_eq!(ts.epoch(), 1551312000);

        ts.subtract(TemporalAmount::months(1)).unwrap();
        // 2019-01-28T00:00:00Z
        assert_eq!(ts.epoch(), 1548633600);

        let mut ts = Timestamp::from_epoch(1548892800);
        ts.add(TemporalAmount::Period {
            years: 1,
            months: 0,
            days: 1,
        })
        .unwrap();
        // 2020-02-01T00:00:00Z
        assert_eq!(ts.epoch(), 1580515200);
    }

    #[test]
    fn test_snap_fixed() {
        let mut ts = Timestamp::new(1_000_123, 42);
        ts.snap_to_previous_interval(1, TimeUnit::Minutes).unwrap();
        assert_eq!(ts, Timestamp::from_epoch(1_000_080));

        let mut ts = Timestamp::from_epoch(7_199);
        ts.snap_to_previous_interval(2, TimeUnit::Hours).unwrap();
        assert_eq!(ts.epoch(), 0);

        let mut ts = Timestamp::from_epoch(-1);
        ts.snap_to_previous_interval(1, TimeUnit::Days).unwrap();
        assert_eq!(ts.epoch(), -86_400);

        assert!(ts.snap_to_previous_interval(0, TimeUnit::Days).is_err());
    }

    #[test]
    fn test_snap_weeks() {
        // 2019-01-02T12:00:00Z is a Wednesday
        let mut ts = Timestamp::from_epoch(1546430400);
        ts.snap_to_previous_interval(1, TimeUnit::Weeks).unwrap();
        // Sunday 2018-12-30T00:00:00Z
        assert_eq!(ts.epoch(), 1546128000);

        let mut ts = Timestamp::from_epoch(1546430400);
        ts.snap_to_previous_interval_anchored(1, TimeUnit::Weeks, Weekday::Mon)
            .unwrap();
        // Monday 2018-12-31T00:00:00Z
        assert_eq!(ts.epoch(), 1546214400);
    }

    #[test]
    fn test_snap_calendar() {
        // 2019-05-17T13:14:15Z
        let mut ts = Timestamp::from_epoch(1558098855);
        ts.snap_to_previous_interval(1, TimeUnit::Months).unwrap();
        // 2019-05-01T00:00:00Z
        assert_eq!(ts.epoch(), 1556668800);

        let mut ts = Timestamp::from_epoch(1558098855);
        ts.snap_to_previous_interval(3, TimeUnit::Months).unwrap();
        // 2019-04-01T00:00:00Z
        assert_eq!(ts.epoch(), 1554076800);

        let mut ts = Timestamp::from_epoch(1558098855);
        ts.snap_to_previous_interval(1, TimeUnit::Years).unwrap();
        // 2019-01-01T00:00:00Z
        assert_eq!(ts.epoch(), 1546300800);
    }

    #[test]
    fn test_snap_idempotent() {
        let cases = [
            (1, TimeUnit::Seconds),
            (15, TimeUnit::Minutes),
            (6, TimeUnit::Hours),
            (1, TimeUnit::Days),
            (1, TimeUnit::Weeks),
            (2, TimeUnit::Weeks),
            (1, TimeUnit::Months),
            (5, TimeUnit::Years),
        ];
        for epoch in [-90_000_i64, 0, 1_558_098_855, 1_546_430_400] {
            for (interval, unit) in cases {
                let mut once = Timestamp::new(epoch, 123);
                once.snap_to_previous_interval(interval, unit).unwrap();
                let mut twice = once;
                twice.snap_to_previous_interval(interval, unit).unwrap();
                assert_eq!(once, twice, "{} {} {:?}", epoch, interval, unit);
                assert!(once <= Timestamp::new(epoch, 123));
            }
        }
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(TemporalAmount::seconds(60).iso8601(), "PT1M");
        assert_eq!(TemporalAmount::seconds(5400).iso8601(), "PT1H30M");
        assert_eq!(TemporalAmount::seconds(0).iso8601(), "PT0S");
        assert_eq!(TemporalAmount::months(1).iso8601(), "P1M");
        assert_eq!(TemporalAmount::days(0).iso8601(), "P0D");
    }

    #[test]
    fn test_display() {
        let ts = Timestamp::from_epoch(1000);
        assert_eq!(
            ts.to_string(),
            "timestamp=1000, utc=1970-01-01T00:16:40Z, epoch=1000, nanos=0, msEpoch=1000000"
        );
    }
}
