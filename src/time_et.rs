//! Eastern-time calendar helpers.
//!
//! The core persists every instant in UTC and renders every consumer-facing
//! timestamp in `America/New_York`. This module is the single place that
//! knows how to go between the two, so the ET Day Gate (the Slate
//! Builder's most important invariant) has exactly one implementation.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

pub const EASTERN: Tz = New_York;

/// An ET calendar date (`YYYY-MM-DD`), independent of time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EtDate(NaiveDate);

impl EtDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }

    /// Today's date on the Eastern calendar, given the current instant.
    pub fn today(now_utc: DateTime<Utc>) -> Self {
        Self(now_utc.with_timezone(&EASTERN).date_naive())
    }

    pub fn succ(self) -> Self {
        Self(self.0.succ_opt().expect("date overflow"))
    }

    pub fn pred(self) -> Self {
        Self(self.0.pred_opt().expect("date underflow"))
    }

    pub fn as_naive(self) -> NaiveDate {
        self.0
    }

    /// `[00:00 ET on self, 00:00 ET on self+1)` expressed in UTC — the
    /// ET Day Gate window. MANDATORY per spec: every admitted event's
    /// `start_time` must fall in this half-open interval.
    pub fn et_day_bounds_utc(self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start_local = EASTERN
            .from_local_datetime(&self.0.and_hms_opt(0, 0, 0).expect("valid midnight"))
            .single()
            .expect("midnight is never ambiguous in America/New_York");
        let end_local = EASTERN
            .from_local_datetime(&self.succ().0.and_hms_opt(0, 0, 0).expect("valid midnight"))
            .single()
            .expect("midnight is never ambiguous in America/New_York");
        (start_local.with_timezone(&Utc), end_local.with_timezone(&Utc))
    }

    /// Whether `instant` falls within this ET calendar day — the ET Day Gate.
    pub fn admits(self, instant: DateTime<Utc>) -> bool {
        let (start, end) = self.et_day_bounds_utc();
        instant >= start && instant < end
    }
}

impl std::fmt::Display for EtDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Render a UTC instant as an ET display string, e.g. `"9:10 PM ET"`.
pub fn display_et_clock(instant: DateTime<Utc>) -> String {
    let local = instant.with_timezone(&EASTERN);
    format!("{} ET", local.format("%-I:%M %p"))
}

/// `DebugTime()` operator-surface payload (spec.md §6.3).
#[derive(Debug, Clone, serde::Serialize)]
pub struct DebugTime {
    pub now_utc: String,
    pub now_et: String,
    pub et_date: String,
    pub et_day_start: String,
    pub et_day_end: String,
}

pub fn debug_time(now_utc: DateTime<Utc>) -> DebugTime {
    let et_date = EtDate::today(now_utc);
    let (start, end) = et_date.et_day_bounds_utc();
    DebugTime {
        now_utc: now_utc.to_rfc3339(),
        now_et: now_utc.with_timezone(&EASTERN).to_rfc3339(),
        et_date: et_date.to_string(),
        et_day_start: start.with_timezone(&EASTERN).to_rfc3339(),
        et_day_end: end.with_timezone(&EASTERN).to_rfc3339(),
    }
}

/// Offset applied when a caller needs "yesterday" for grading jobs.
pub fn yesterday(date: EtDate) -> EtDate {
    date.pred()
}

pub const DAY: Duration = Duration::days(1);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gate_admits_only_today() {
        let day = EtDate::from_ymd(2026, 1, 29).unwrap();
        // 11:00 PM ET on 2026-01-29 == 04:00 UTC on 2026-01-30.
        let admitted = Utc.with_ymd_and_hms(2026, 1, 30, 4, 0, 0).unwrap();
        assert!(day.admits(admitted));

        // 01:00 AM ET on 2026-01-30 == 06:00 UTC on 2026-01-30 - belongs to next day.
        let rejected = Utc.with_ymd_and_hms(2026, 1, 30, 6, 0, 0).unwrap();
        assert!(!day.admits(rejected));
    }

    #[test]
    fn display_parses_back() {
        let day = EtDate::parse("2026-01-29").unwrap();
        assert_eq!(day.to_string(), "2026-01-29");
    }
}
