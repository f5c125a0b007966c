//! Explicit `America/New_York` cron-like triggers (spec §4.5). Deliberately
//! not backed by a cron-expression crate: the job registry is a small,
//! fixed table, and an explicit `(hour, minute, weekdays)` tuple is easier
//! to audit than a parsed cron string for eleven jobs.

use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};

use crate::time_et::EASTERN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Daily { hour: u32, minute: u32 },
    Weekdays { days: &'static [Weekday], hour: u32, minute: u32 },
}

impl Trigger {
    /// Whether `now` (UTC) falls inside `[trigger, trigger + grace]` on
    /// the ET calendar (spec §4.5).
    pub fn due(&self, now: DateTime<Utc>, grace: chrono::Duration) -> bool {
        let local = now.with_timezone(&EASTERN);
        let (hour, minute, days_ok) = match self {
            Trigger::Daily { hour, minute } => (*hour, *minute, true),
            Trigger::Weekdays { days, hour, minute } => {
                (*hour, *minute, days.contains(&local.weekday()))
            }
        };
        if !days_ok {
            return false;
        }
        let Some(trigger_today) = local
            .date_naive()
            .and_hms_opt(hour, minute, 0)
            .and_then(|naive| EASTERN.from_local_datetime(&naive).single())
        else {
            return false;
        };
        let elapsed = local.signed_duration_since(trigger_today);
        elapsed >= chrono::Duration::zero() && elapsed <= grace
    }

    /// Next ET wall-clock instant this trigger fires at or after `now`,
    /// rendered for `SchedulerStatus()` (spec §6.3). Scans forward up to
    /// 8 days so a `Weekdays` trigger always finds its next occurrence.
    pub fn next_run_et(&self, now: DateTime<Utc>) -> String {
        let local = now.with_timezone(&EASTERN);
        let (hour, minute) = match self {
            Trigger::Daily { hour, minute } => (*hour, *minute),
            Trigger::Weekdays { hour, minute, .. } => (*hour, *minute),
        };
        for offset in 0..8 {
            let candidate_date = local.date_naive() + chrono::Duration::days(offset);
            let days_ok = match self {
                Trigger::Daily { .. } => true,
                Trigger::Weekdays { days, .. } => days.contains(&candidate_date.weekday()),
            };
            if !days_ok {
                continue;
            }
            let Some(naive) = candidate_date.and_hms_opt(hour, minute, 0) else {
                continue;
            };
            let Some(candidate) = EASTERN.from_local_datetime(&naive).single() else {
                continue;
            };
            if candidate >= local || offset > 0 {
                return candidate.format("%Y-%m-%d %H:%M %Z").to_string();
            }
        }
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_trigger_is_due_within_grace_window() {
        let trigger = Trigger::Daily { hour: 5, minute: 0 };
        // 05:00 ET on 2026-01-29 == 10:00 UTC.
        let at_trigger = Utc.with_ymd_and_hms(2026, 1, 29, 10, 0, 0).unwrap();
        assert!(trigger.due(at_trigger, chrono::Duration::seconds(600)));

        let after_grace = Utc.with_ymd_and_hms(2026, 1, 29, 10, 20, 0).unwrap();
        assert!(!trigger.due(after_grace, chrono::Duration::seconds(600)));

        let before_trigger = Utc.with_ymd_and_hms(2026, 1, 29, 9, 0, 0).unwrap();
        assert!(!trigger.due(before_trigger, chrono::Duration::seconds(600)));
    }

    #[test]
    fn weekday_trigger_skips_non_matching_days() {
        let trigger = Trigger::Weekdays {
            days: &[Weekday::Sat, Weekday::Sun],
            hour: 12,
            minute: 0,
        };
        // 2026-01-29 is a Thursday.
        let thursday_noon = Utc.with_ymd_and_hms(2026, 1, 29, 17, 0, 0).unwrap();
        assert!(!trigger.due(thursday_noon, chrono::Duration::seconds(600)));
    }
}
