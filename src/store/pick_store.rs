//! `PickStore`: append-only JSONL log at `<VOLUME>/grader/predictions.jsonl`
//! (spec §4.3). Write-only from the Scoring Pipeline, append-only for
//! grading updates from the Auto-Grader — no other component writes here.
//!
//! Grading is modeled as a second, later JSONL line carrying the same
//! `pick_id` with grading fields populated; readers reconcile by keeping
//! the last line seen per `pick_id` (last-write-wins for grading fields,
//! spec §4.3).

use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::domain::event::Sport;
use crate::domain::pick::{GradeResult, Pick};
use crate::errors::CoreError;
use crate::time_et::EtDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Logged,
    Duplicate,
}

pub use CoreError as PickStoreError;

pub struct PickStore {
    predictions_path: PathBuf,
    write_lock: Mutex<()>,
    /// `(pick_id, et_date)` pairs already logged as an initial pick,
    /// loaded at startup and kept current so `PersistPick` never
    /// rescans the whole file to detect a duplicate (spec §4.3,
    /// property P11).
    seen_initial: Mutex<HashSet<(String, String)>>,
}

impl PickStore {
    /// Open (creating if absent) the Pick Store rooted at `<volume>/grader`.
    pub fn open(volume_mount_path: &Path) -> Result<Self, CoreError> {
        let grader_dir = volume_mount_path.join("grader");
        std::fs::create_dir_all(&grader_dir).map_err(|e| CoreError::StorageFatal {
            path: grader_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let predictions_path = grader_dir.join("predictions.jsonl");

        let seen_initial = Mutex::new(load_seen_initial(&predictions_path)?);
        info!(path = %predictions_path.display(), "pick store opened");

        Ok(Self {
            predictions_path,
            write_lock: Mutex::new(()),
            seen_initial,
        })
    }

    /// `PersistPick(pick) -> {logged | duplicate | error}` (spec §4.3).
    pub fn persist_pick(&self, pick: &Pick) -> Result<PersistOutcome, CoreError> {
        validate_pick(pick)?;

        let key = (pick.pick_id.clone(), pick.et_date.clone());
        let _guard = self.write_lock.lock();
        {
            let seen = self.seen_initial.lock();
            if seen.contains(&key) {
                return Ok(PersistOutcome::Duplicate);
            }
        }

        append_line(&self.predictions_path, pick)?;
        self.seen_initial.lock().insert(key);
        Ok(PersistOutcome::Logged)
    }

    /// `MarkGraded(pick_id, result, actual_value, graded_at)` (spec §4.3):
    /// appends a new line carrying the grading fields. Fails if `pick_id`
    /// has never been persisted.
    pub fn mark_graded(
        &self,
        pick_id: &str,
        result: GradeResult,
        actual_value: f64,
        graded_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock();
        let mut latest = self.load_all_reconciled()?;
        let Some(pick) = latest.get_mut(pick_id) else {
            return Err(CoreError::missing_data(format!(
                "mark_graded: unknown pick_id {pick_id}"
            )));
        };
        pick.result = Some(result);
        pick.actual_value = Some(actual_value);
        pick.graded_at = Some(graded_at);
        append_line(&self.predictions_path, pick)?;
        Ok(())
    }

    /// `LoadPredictions(et_date?, sport?) -> []Pick` (spec §4.3).
    pub fn load_predictions(
        &self,
        et_date: Option<EtDate>,
        sport: Option<Sport>,
    ) -> Result<Vec<Pick>, CoreError> {
        let reconciled = self.load_all_reconciled()?;
        let mut picks: Vec<Pick> = reconciled.into_values().collect();

        if let Some(date) = et_date {
            let date_str = date.to_string();
            picks.retain(|p| p.et_date == date_str);
        }
        if let Some(sport) = sport {
            picks.retain(|p| p.sport == sport);
        }
        picks.sort_by(|a, b| {
            b.tier
                .rank()
                .cmp(&a.tier.rank())
                .then(b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.pick_id.cmp(&b.pick_id))
        });
        Ok(picks)
    }

    /// Read the whole log and collapse to one `Pick` per `pick_id`,
    /// keeping the last line seen (spec §4.3 last-write-wins semantics).
    fn load_all_reconciled(&self) -> Result<HashMap<String, Pick>, CoreError> {
        let Some(file) = open_existing(&self.predictions_path)? else {
            return Ok(HashMap::new());
        };
        let reader = BufReader::new(file);
        let mut by_id: HashMap<String, Pick> = HashMap::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CoreError::StorageFatal {
                path: self.predictions_path.display().to_string(),
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Pick>(&line) {
                Ok(pick) => {
                    by_id.insert(pick.pick_id.clone(), pick);
                }
                Err(e) => {
                    warn!(lineno, error = %e, "skipping malformed pick store line");
                }
            }
        }
        Ok(by_id)
    }
}

fn open_existing(path: &Path) -> Result<Option<std::fs::File>, CoreError> {
    match std::fs::File::open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::StorageFatal {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

fn load_seen_initial(path: &Path) -> Result<HashSet<(String, String)>, CoreError> {
    let Some(file) = open_existing(path)? else {
        return Ok(HashSet::new());
    };
    let reader = BufReader::new(file);
    let mut seen = HashSet::new();
    for line in reader.lines() {
        let line = line.map_err(|e| CoreError::StorageFatal {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(pick) = serde_json::from_str::<Pick>(&line) {
            if !pick.is_graded() {
                seen.insert((pick.pick_id, pick.et_date));
            }
        }
    }
    Ok(seen)
}

/// Each JSONL line is a self-contained, atomically-written JSON object
/// (spec §4.3: "writes are atomic at the line level"). A single
/// `write_all` of a newline-terminated buffer is atomic with respect to
/// concurrent readers on a local filesystem for writes under `PIPE_BUF`,
/// which every serialized `Pick` comfortably fits under in practice; the
/// `write_lock` mutex still serializes writers to keep the JSONL
/// well-formed under concurrent producers.
fn append_line(path: &Path, pick: &Pick) -> Result<(), CoreError> {
    let mut json = serde_json::to_string(pick).map_err(|e| CoreError::ValidationFailure {
        reason: format!("pick failed to serialize: {e}"),
    })?;
    json.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CoreError::StorageFatal {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    file.write_all(json.as_bytes())
        .map_err(|e| CoreError::StorageFatal {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    file.sync_data().ok();
    Ok(())
}

/// Schema validation before write (spec §4.3: "all required fields
/// present before write, enforced by a schema validator; violations
/// raise").
fn validate_pick(pick: &Pick) -> Result<(), CoreError> {
    if pick.pick_id.len() != 12 || !pick.pick_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::validation(format!(
            "pick_id {} is not a 12-hex-char fingerprint",
            pick.pick_id
        )));
    }
    if !(0.0..=10.0).contains(&pick.final_score) {
        return Err(CoreError::validation(format!(
            "final_score {} out of [0,10]",
            pick.final_score
        )));
    }
    if EtDate::parse(&pick.et_date).is_none() {
        return Err(CoreError::validation(format!(
            "et_date {} does not parse as YYYY-MM-DD",
            pick.et_date
        )));
    }
    if pick.titanium_triggered && pick.titanium_count < 3 {
        return Err(CoreError::validation(
            "titanium_triggered is set but titanium_count < 3",
        ));
    }
    if pick.event_id.is_empty() {
        return Err(CoreError::validation("event_id must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Market, Side};
    use crate::domain::event::Sport;
    use crate::domain::pick::{AiMode, SharpStrength, SignalStatus, Tier};
    use std::collections::HashMap as Map;
    use tempfile::tempdir;

    fn sample_pick(pick_id: &str, et_date: &str) -> Pick {
        Pick {
            pick_id: pick_id.into(),
            sport: Sport::Nba,
            event_id: "e_123".into(),
            market: Market::Total,
            side: Side::Under,
            line: 246.5,
            player_id: None,
            player_name: None,
            book: "draftkings".into(),
            odds_american: Some(-110),
            ai_score: 7.0,
            research_score: 7.0,
            esoteric_score: 7.0,
            jarvis_score: 7.0,
            context_modifier: 0.0,
            context_score: 0.0,
            final_score: 7.2,
            tier: Tier::EdgeLean,
            confluence_boost: 0.0,
            msrf_boost: 0.0,
            jason_sim_boost: 0.0,
            serp_boost: 0.0,
            ensemble_adjustment: 0.0,
            live_adjustment: 0.0,
            totals_calibration_adjustment: 0.0,
            hook_penalty: 0.0,
            expert_consensus_boost: 0.0,
            prop_correlation_adjustment: 0.0,
            ai_reasons: vec![],
            research_reasons: vec![],
            esoteric_reasons: vec![],
            jarvis_reasons: vec![],
            ai_mode: AiMode::Model,
            sharp_strength: SharpStrength::None,
            sharp_source_api: None,
            sharp_status: SignalStatus::NoData,
            sharp_raw_inputs: None,
            line_source_api: None,
            line_variance: None,
            jarvis_rs: 4.5,
            jarvis_active: false,
            jarvis_hits_count: 0,
            jarvis_triggers_hit: vec![],
            jarvis_fail_reasons: vec![],
            jarvis_inputs_used: Map::new(),
            titanium_triggered: false,
            titanium_count: 0,
            titanium_qualified_engines: vec![],
            created_at: Utc::now(),
            event_start_time_et: "9:10 PM ET".into(),
            et_date: et_date.into(),
            result: None,
            actual_value: None,
            graded_at: None,
            beat_clv: None,
            process_grade: None,
        }
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = PickStore::open(dir.path()).unwrap();
        let pick = sample_pick("a1b2c3d4e5f6", "2026-01-29");
        assert_eq!(store.persist_pick(&pick).unwrap(), PersistOutcome::Logged);

        let loaded = store
            .load_predictions(Some(EtDate::from_ymd(2026, 1, 29).unwrap()), None)
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pick_id, "a1b2c3d4e5f6");
        assert_eq!(loaded[0].final_score, pick.final_score);
    }

    #[test]
    fn duplicate_persist_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = PickStore::open(dir.path()).unwrap();
        let pick = sample_pick("a1b2c3d4e5f6", "2026-01-29");
        assert_eq!(store.persist_pick(&pick).unwrap(), PersistOutcome::Logged);
        assert_eq!(store.persist_pick(&pick).unwrap(), PersistOutcome::Duplicate);

        let loaded = store.load_predictions(None, None).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn mark_graded_round_trips_grading_fields() {
        let dir = tempdir().unwrap();
        let store = PickStore::open(dir.path()).unwrap();
        let pick = sample_pick("a1b2c3d4e5f6", "2026-01-29");
        store.persist_pick(&pick).unwrap();

        let graded_at = Utc::now();
        store
            .mark_graded("a1b2c3d4e5f6", GradeResult::Win, 223.0, graded_at)
            .unwrap();

        let loaded = store.load_predictions(None, None).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].result, Some(GradeResult::Win));
        assert_eq!(loaded[0].actual_value, Some(223.0));
    }

    #[test]
    fn rejects_malformed_pick_id() {
        let dir = tempdir().unwrap();
        let store = PickStore::open(dir.path()).unwrap();
        let mut pick = sample_pick("not-hex", "2026-01-29");
        pick.pick_id = "short".into();
        assert!(store.persist_pick(&pick).is_err());
    }

    #[test]
    fn survives_reopen_across_restarts() {
        let dir = tempdir().unwrap();
        {
            let store = PickStore::open(dir.path()).unwrap();
            store
                .persist_pick(&sample_pick("a1b2c3d4e5f6", "2026-01-29"))
                .unwrap();
        }
        let reopened = PickStore::open(dir.path()).unwrap();
        let loaded = reopened.load_predictions(None, None).unwrap();
        assert_eq!(loaded.len(), 1);
        // Duplicate detection must also survive the restart.
        assert_eq!(
            reopened
                .persist_pick(&sample_pick("a1b2c3d4e5f6", "2026-01-29"))
                .unwrap(),
            PersistOutcome::Duplicate
        );
    }
}
