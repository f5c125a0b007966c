//! Training status and health derivation (spec §4.4).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingHealth {
    Healthy,
    Stale,
    NeverRan,
}

impl TrainingHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingHealth::Healthy => "HEALTHY",
            TrainingHealth::Stale => "STALE",
            TrainingHealth::NeverRan => "NEVER_RAN",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub last_train_run_at: Option<DateTime<Utc>>,
    pub graded_samples_seen: u64,
    pub samples_used_for_training: u64,
    pub filter_counts: HashMap<String, u64>,
}

impl TrainingStatus {
    /// Derive health from the last recorded run and whether graded picks
    /// exist to train on (spec §4.4).
    pub fn health(&self, now: DateTime<Utc>, graded_picks_available: bool) -> TrainingHealth {
        match self.last_train_run_at {
            Some(last) if now - last <= Duration::hours(24) => TrainingHealth::Healthy,
            Some(_) => TrainingHealth::Stale,
            None if !graded_picks_available => TrainingHealth::Healthy,
            None => TrainingHealth::NeverRan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn never_ran_is_healthy_with_no_graded_picks_yet() {
        let status = TrainingStatus::default();
        assert_eq!(status.health(Utc::now(), false), TrainingHealth::Healthy);
    }

    #[test]
    fn never_ran_with_graded_picks_is_never_ran() {
        let status = TrainingStatus::default();
        assert_eq!(status.health(Utc::now(), true), TrainingHealth::NeverRan);
    }

    #[test]
    fn stale_after_24h() {
        let now = Utc.with_ymd_and_hms(2026, 1, 29, 0, 0, 0).unwrap();
        let status = TrainingStatus {
            last_train_run_at: Some(now - Duration::hours(25)),
            ..Default::default()
        };
        assert_eq!(status.health(now, true), TrainingHealth::Stale);
    }
}
