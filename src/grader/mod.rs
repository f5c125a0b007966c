//! Auto-Grader (spec §4.4): grades completed picks against final
//! results, rolls graded outcomes into per-(sport, market) audit
//! reports, and drives weight learning.

pub mod audit;
pub mod grading;
pub mod training_status;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::candidate::Market;
use crate::domain::event::FinalScore;
use crate::domain::pick::{GradeResult, Pick};
use crate::errors::CoreError;
use crate::sources::results::{FetchOutcome, ResultsSource};
use crate::store::{PickStore, WeightStore};
use crate::time_et::EtDate;

pub use training_status::{TrainingHealth, TrainingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    Pre,
    Post,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradeReport {
    pub graded: u64,
    pub failed: u64,
    pub unresolved: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DryRunReport {
    pub mode_name: &'static str,
    pub pending_count: u64,
    pub graded_count: u64,
    pub total_count: u64,
    /// `true` unless the pipeline's expectation for this mode is
    /// violated (spec §4.4: `pre` expects some picks pending, `post`
    /// expects all picks graded).
    pub expectation_met: bool,
}

pub struct AutoGrader {
    results: Arc<dyn ResultsSource>,
    pick_store: Arc<PickStore>,
    weight_store: Arc<WeightStore>,
}

impl AutoGrader {
    pub fn new(
        results: Arc<dyn ResultsSource>,
        pick_store: Arc<PickStore>,
        weight_store: Arc<WeightStore>,
    ) -> Self {
        Self {
            results,
            pick_store,
            weight_store,
        }
    }

    /// `GradePending(et_date)` (spec §4.4): loads pending picks for the
    /// day, groups by event, fetches each event's final result once, and
    /// grades every pick in that group.
    pub async fn grade_pending(&self, et_date: EtDate) -> Result<GradeReport, CoreError> {
        let picks = self.pick_store.load_predictions(Some(et_date), None)?;
        let pending: Vec<Pick> = picks.into_iter().filter(|p| !p.is_graded()).collect();

        let mut report = GradeReport::default();
        let mut event_ids: Vec<String> = pending.iter().map(|p| p.event_id.clone()).collect();
        event_ids.sort();
        event_ids.dedup();

        let mut final_scores: HashMap<String, FinalScore> = HashMap::new();
        for event_id in &event_ids {
            match self.results.fetch_final_score(event_id).await {
                Ok(FetchOutcome::Found(score)) => {
                    if score.status == crate::domain::event::GameStatus::Final {
                        final_scores.insert(event_id.clone(), score);
                    }
                }
                Ok(FetchOutcome::NotFound) => {}
                Err(err) => {
                    warn!(event_id, error = %err, "fetch_final_score failed");
                }
            }
        }

        for pick in pending {
            if pick.market.is_player_prop() {
                match self.grade_player_pick(&pick).await {
                    Ok(Some(())) => report.graded += 1,
                    Ok(None) => report.unresolved += 1,
                    Err(err) => {
                        warn!(pick_id = %pick.pick_id, error = %err, "player prop grading failed");
                        report.failed += 1;
                    }
                }
                continue;
            }

            let Some(score) = final_scores.get(&pick.event_id) else {
                report.unresolved += 1;
                continue;
            };
            let (result, actual_value) =
                grading::grade_game_market(&pick.market, &pick.side, pick.line, score);
            match self
                .pick_store
                .mark_graded(&pick.pick_id, result, actual_value, Utc::now())
            {
                Ok(()) => report.graded += 1,
                Err(err) => {
                    warn!(pick_id = %pick.pick_id, error = %err, "mark_graded failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            et_date = %et_date,
            graded = report.graded,
            failed = report.failed,
            unresolved = report.unresolved,
            "grade_pending complete"
        );
        Ok(report)
    }

    async fn grade_player_pick(&self, pick: &Pick) -> Result<Option<()>, CoreError> {
        let Market::PlayerStat(stat) = &pick.market else {
            return Ok(None);
        };
        let Some(player_id) = &pick.player_id else {
            return Err(CoreError::missing_data(format!(
                "player prop pick {} has no player_id",
                pick.pick_id
            )));
        };
        let outcome = self
            .results
            .fetch_player_stat(player_id, &pick.event_id, stat)
            .await
            .map_err(|e| CoreError::UpstreamUnavailable {
                integration: "results".to_string(),
                detail: e.to_string(),
            })?;
        let FetchOutcome::Found(actual) = outcome else {
            return Ok(None);
        };
        let (result, actual_value) = grading::grade_player_prop(&pick.side, pick.line, actual);
        self.pick_store
            .mark_graded(&pick.pick_id, result, actual_value, Utc::now())?;
        Ok(Some(()))
    }

    /// `DryRun(et_date, mode)` (spec §4.4): the same grouping/counting
    /// pipeline as `GradePending`, without writes.
    pub fn dry_run(&self, et_date: EtDate, mode: DryRunMode) -> Result<DryRunReport, CoreError> {
        let picks = self.pick_store.load_predictions(Some(et_date), None)?;
        let total = picks.len() as u64;
        let graded = picks.iter().filter(|p| p.is_graded()).count() as u64;
        let pending = total - graded;

        let expectation_met = match mode {
            DryRunMode::Pre => pending > 0,
            DryRunMode::Post => pending == 0 && total > 0,
        };

        Ok(DryRunReport {
            mode_name: match mode {
                DryRunMode::Pre => "pre",
                DryRunMode::Post => "post",
            },
            pending_count: pending,
            graded_count: graded,
            total_count: total,
            expectation_met,
        })
    }

    /// `Audit(days_back)` (spec §4.4).
    pub fn audit(&self, days_back: i64, now: DateTime<Utc>) -> Result<audit::AuditReport, CoreError> {
        let mut today = EtDate::today(now);
        let mut window = Vec::new();
        for _ in 0..days_back.max(1) {
            window.extend(self.pick_store.load_predictions(Some(today), None)?);
            today = today.pred();
        }

        let weights = self.weight_store.current();
        let (report, adjusted) = audit::run_audit(&window, &weights, now);
        self.weight_store.replace(adjusted)?;
        Ok(report)
    }

    /// `GraderStatus()` payload fields not already owned by the Pick
    /// Store / storage health surface (spec §6.3).
    pub fn training_status_for(&self, status: &TrainingStatus, now: DateTime<Utc>, graded_picks_available: bool) -> TrainingHealth {
        status.health(now, graded_picks_available)
    }
}
