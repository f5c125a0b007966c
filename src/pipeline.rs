//! The operator surface (spec §6.3): `GenerateBestBets`, `StorageHealth`,
//! `GraderDryRun`, `GraderStatus`, `SchedulerStatus`, `DebugTime`. HTTP
//! routing over these is explicitly out of scope (spec §1) — this module
//! is the facade an external transport layer, wired up outside this
//! crate, calls into.
//!
//! `generate_best_bets` is the authoritative implementation of the
//! pipeline ordering in spec §4.2.7: slate -> score -> dedup -> filter ->
//! hidden-tier filter -> contradiction gate -> persist -> top-N.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::event::Sport;
use crate::domain::pick::{AiMode, GradeResult, Pick, SharpStrength, SignalStatus, Tier};
use crate::grader::{AutoGrader, DryRunMode, DryRunReport, GradeReport, TrainingStatus};
use crate::scoring::context::Context;
use crate::scoring::contradiction::apply_contradiction_gate;
use crate::scoring::tier::meets_output_threshold;
use crate::scoring::score_candidate;
use crate::slate::{build_slate, SlateBuilderConfig, SlateTelemetry};
use crate::sources::market_data::MarketDataSource;
use crate::store::{PersistOutcome, PickStore, WeightStore};
use crate::time_et::EtDate;

/// Per-request options for `GenerateBestBets` (spec §6.3). `context_for`
/// lets the caller supply the pre-fetched `Context` for each candidate —
/// assembling a `Context` requires network calls (splits, AI features,
/// SERP) that are explicitly out of this crate's scope (§1's opaque
/// `MarketDataSource`/`ResultsSource`/`SplitsSource` interfaces), so the
/// pipeline takes a closure rather than reaching out itself.
pub struct BestBetsOptions<'a> {
    pub top_n_props: usize,
    pub top_n_games: usize,
    pub context_for: &'a (dyn Fn(&crate::domain::Candidate) -> Context + Send + Sync),
}

/// Consumer-facing projection of a [`Pick`] (spec §6.3): every field the
/// storage record carries, except `created_at`/`graded_at`. Those are UTC
/// instants kept only for Pick Store bookkeeping — response payloads must
/// never carry a UTC/ISO/epoch field, only the ET display strings already
/// on the record (`event_start_time_et`, `et_date`).
#[derive(Debug, Clone, Serialize)]
pub struct PickView {
    pub pick_id: String,
    pub sport: Sport,
    pub event_id: String,
    pub market: crate::domain::candidate::Market,
    pub side: crate::domain::candidate::Side,
    pub line: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub book: String,
    pub odds_american: Option<i32>,

    pub ai_score: f64,
    pub research_score: f64,
    pub esoteric_score: f64,
    pub jarvis_score: f64,
    pub context_modifier: f64,
    pub context_score: f64,
    pub final_score: f64,
    pub tier: Tier,

    pub confluence_boost: f64,
    pub msrf_boost: f64,
    pub jason_sim_boost: f64,
    pub serp_boost: f64,
    pub ensemble_adjustment: f64,
    pub live_adjustment: f64,
    pub totals_calibration_adjustment: f64,
    pub hook_penalty: f64,
    pub expert_consensus_boost: f64,
    pub prop_correlation_adjustment: f64,

    pub ai_reasons: Vec<String>,
    pub research_reasons: Vec<String>,
    pub esoteric_reasons: Vec<String>,
    pub jarvis_reasons: Vec<String>,

    pub ai_mode: AiMode,

    pub sharp_strength: SharpStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharp_source_api: Option<String>,
    pub sharp_status: SignalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_source_api: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_variance: Option<f64>,

    pub jarvis_rs: f64,
    pub jarvis_active: bool,
    pub jarvis_hits_count: u32,
    pub jarvis_triggers_hit: Vec<String>,
    pub jarvis_fail_reasons: Vec<String>,
    pub jarvis_inputs_used: std::collections::HashMap<String, f64>,

    pub titanium_triggered: bool,
    pub titanium_count: u8,
    pub titanium_qualified_engines: Vec<String>,

    pub event_start_time_et: String,
    pub et_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GradeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat_clv: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_grade: Option<String>,
}

impl From<Pick> for PickView {
    fn from(p: Pick) -> Self {
        Self {
            pick_id: p.pick_id,
            sport: p.sport,
            event_id: p.event_id,
            market: p.market,
            side: p.side,
            line: p.line,
            player_id: p.player_id,
            player_name: p.player_name,
            book: p.book,
            odds_american: p.odds_american,
            ai_score: p.ai_score,
            research_score: p.research_score,
            esoteric_score: p.esoteric_score,
            jarvis_score: p.jarvis_score,
            context_modifier: p.context_modifier,
            context_score: p.context_score,
            final_score: p.final_score,
            tier: p.tier,
            confluence_boost: p.confluence_boost,
            msrf_boost: p.msrf_boost,
            jason_sim_boost: p.jason_sim_boost,
            serp_boost: p.serp_boost,
            ensemble_adjustment: p.ensemble_adjustment,
            live_adjustment: p.live_adjustment,
            totals_calibration_adjustment: p.totals_calibration_adjustment,
            hook_penalty: p.hook_penalty,
            expert_consensus_boost: p.expert_consensus_boost,
            prop_correlation_adjustment: p.prop_correlation_adjustment,
            ai_reasons: p.ai_reasons,
            research_reasons: p.research_reasons,
            esoteric_reasons: p.esoteric_reasons,
            jarvis_reasons: p.jarvis_reasons,
            ai_mode: p.ai_mode,
            sharp_strength: p.sharp_strength,
            sharp_source_api: p.sharp_source_api,
            sharp_status: p.sharp_status,
            line_source_api: p.line_source_api,
            line_variance: p.line_variance,
            jarvis_rs: p.jarvis_rs,
            jarvis_active: p.jarvis_active,
            jarvis_hits_count: p.jarvis_hits_count,
            jarvis_triggers_hit: p.jarvis_triggers_hit,
            jarvis_fail_reasons: p.jarvis_fail_reasons,
            jarvis_inputs_used: p.jarvis_inputs_used,
            titanium_triggered: p.titanium_triggered,
            titanium_count: p.titanium_count,
            titanium_qualified_engines: p.titanium_qualified_engines,
            event_start_time_et: p.event_start_time_et,
            et_date: p.et_date,
            result: p.result,
            actual_value: p.actual_value,
            beat_clv: p.beat_clv,
            process_grade: p.process_grade,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PickGroup {
    pub count: usize,
    pub picks: Vec<PickView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestBetsMeta {
    pub sport: &'static str,
    pub et_date: String,
    pub events_before: u64,
    pub events_after: u64,
    pub dropped_out_of_window: u64,
    pub dropped_missing_time: u64,
    pub contradiction_games_blocked: u64,
    pub contradiction_props_blocked: u64,
    pub timed_out_components: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestBetsResponse {
    pub props: PickGroup,
    pub games: PickGroup,
    pub meta: BestBetsMeta,
}

/// `GenerateBestBets(sport, opts)` (spec §6.3, §4.2.7). Never fails: a
/// total upstream outage still returns a well-formed envelope with empty
/// `picks[]` arrays (spec §7: "Best-bets responses always succeed").
pub async fn generate_best_bets(
    market_source: &Arc<dyn MarketDataSource>,
    pick_store: &PickStore,
    config: &Config,
    sport: Sport,
    et_date: EtDate,
    opts: BestBetsOptions<'_>,
) -> BestBetsResponse {
    let mut timed_out_components = Vec::new();

    // Step 1: Slate Builder -> []Candidate, today only (spec §4.2.7 step 1).
    let slate = build_slate(
        market_source,
        sport,
        et_date,
        SlateBuilderConfig {
            per_call_timeout: std::time::Duration::from_secs(config.market_data_timeout_secs),
            batch_deadline: std::time::Duration::from_secs(config.slate_batch_deadline_secs),
        },
    )
    .await;
    record_slate_timeouts(&slate.telemetry, &mut timed_out_components);

    // Step 2: score every candidate in parallel — embarrassingly
    // parallel per candidate (spec §5), via `rayon` rather than spawning
    // one tokio task per candidate since scoring itself never suspends.
    let shadow = config.shadow_expert_consensus;
    let scored: Vec<Pick> = slate
        .candidates
        .par_iter()
        .map(|candidate| {
            let ctx = (opts.context_for)(candidate);
            score_candidate(candidate, &ctx, shadow)
        })
        .collect();

    // Step 3: dedup by pick_id, retaining the highest final_score
    // (spec §4.2.7 step 3). The Slate Builder already deduped
    // candidates by book preference; this second pass collapses any
    // residual pick_id collisions scoring may introduce (e.g. two
    // identical candidates surviving from events + props).
    let deduped = dedup_by_pick_id_keep_best(scored);

    // Step 4+5: threshold filter, then drop hidden tiers (spec §4.2.7
    // steps 4-5). Order doesn't matter for correctness (both are
    // independent predicates over the same Pick) but matches the
    // spec's stated order for auditability.
    let filtered: Vec<Pick> = deduped
        .into_iter()
        .filter(|p| meets_output_threshold(p.market.is_player_prop(), p.final_score))
        .filter(|p| !p.tier.is_hidden())
        .collect();

    // Step 6: Contradiction Gate (spec §4.2.7 step 6, §4.2.6).
    let (gated, contradiction_telemetry) = apply_contradiction_gate(filtered);

    // Step 7: persist every remaining pick (spec §4.2.7 step 7). A
    // single write failure is logged and counted, never fails the
    // request (spec §7: "Pick Store errors on a single write ... do not
    // fail the request").
    for pick in &gated {
        match pick_store.persist_pick(pick) {
            Ok(PersistOutcome::Logged) | Ok(PersistOutcome::Duplicate) => {}
            Err(err) => warn!(pick_id = %pick.pick_id, error = %err, "persist_pick failed"),
        }
    }

    // Deterministic sort: (tier_rank desc, final_score desc, pick_id asc) (spec §5).
    let mut ordered = gated;
    ordered.sort_by(|a, b| {
        b.tier
            .rank()
            .cmp(&a.tier.rank())
            .then(b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.pick_id.cmp(&b.pick_id))
    });

    let (props, games): (Vec<Pick>, Vec<Pick>) =
        ordered.into_iter().partition(|p| p.market.is_player_prop());

    // Step 8: top-N per group (spec §4.2.7 step 8).
    let props: Vec<Pick> = props.into_iter().take(opts.top_n_props).collect();
    let games: Vec<Pick> = games.into_iter().take(opts.top_n_games).collect();

    info!(
        sport = %sport,
        et_date = %et_date,
        props = props.len(),
        games = games.len(),
        "generate_best_bets complete"
    );

    BestBetsResponse {
        props: PickGroup {
            count: props.len(),
            picks: props.into_iter().map(PickView::from).collect(),
        },
        games: PickGroup {
            count: games.len(),
            picks: games.into_iter().map(PickView::from).collect(),
        },
        meta: BestBetsMeta {
            sport: sport.as_str(),
            et_date: et_date.to_string(),
            events_before: slate.telemetry.events_before,
            events_after: slate.telemetry.events_after,
            dropped_out_of_window: slate.telemetry.dropped_out_of_window,
            dropped_missing_time: slate.telemetry.dropped_missing_time,
            contradiction_games_blocked: contradiction_telemetry.games_blocked,
            contradiction_props_blocked: contradiction_telemetry.props_blocked,
            timed_out_components,
        },
    }
}

fn record_slate_timeouts(telemetry: &SlateTelemetry, out: &mut Vec<String>) {
    if telemetry.events_fetch_failed {
        out.push("events".to_string());
    }
    if telemetry.props_fetch_failed {
        out.push("props".to_string());
    }
    if telemetry.odds_snapshot_fetch_failed {
        out.push("odds_snapshot".to_string());
    }
}

fn dedup_by_pick_id_keep_best(picks: Vec<Pick>) -> Vec<Pick> {
    use std::collections::HashMap;
    let mut best: HashMap<String, Pick> = HashMap::new();
    for pick in picks {
        match best.get(&pick.pick_id) {
            None => {
                best.insert(pick.pick_id.clone(), pick);
            }
            Some(existing) if pick.final_score > existing.final_score => {
                best.insert(pick.pick_id.clone(), pick);
            }
            Some(existing) if pick.final_score == existing.final_score => {
                if crate::domain::candidate::book_preference_rank(&pick.book)
                    < crate::domain::candidate::book_preference_rank(&existing.book)
                {
                    best.insert(pick.pick_id.clone(), pick);
                }
            }
            _ => {}
        }
    }
    best.into_values().collect()
}

/// `StorageHealth()` (spec §6.3).
#[derive(Debug, Clone, Serialize)]
pub struct StorageHealth {
    pub resolved_base_dir: String,
    pub is_mountpoint: Option<bool>,
    pub is_ephemeral: bool,
    pub writable: bool,
    pub predictions_line_count: u64,
    pub weights_exists: bool,
    pub weights_last_modified: Option<String>,
    pub absolute_paths: StorageHealthPaths,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageHealthPaths {
    pub predictions_jsonl: String,
    pub weights_json: String,
    pub audit_logs_dir: String,
}

pub fn storage_health(config: &Config) -> StorageHealth {
    let base = &config.volume_mount_path;
    let grader_dir = base.join("grader");
    let predictions_path = grader_dir.join("predictions.jsonl");
    let weights_path = grader_dir.join("weights.json");
    let audit_dir = base.join("audit_logs");

    let writable = {
        let probe = base.join(".health_probe");
        let ok = std::fs::write(&probe, b"ok").is_ok();
        let _ = std::fs::remove_file(&probe);
        ok
    };

    let predictions_line_count = std::fs::read_to_string(&predictions_path)
        .map(|s| s.lines().filter(|l| !l.trim().is_empty()).count() as u64)
        .unwrap_or(0);

    let weights_exists = weights_path.exists();
    let weights_last_modified = std::fs::metadata(&weights_path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

    let is_mountpoint = read_is_mountpoint(base);
    let is_ephemeral = {
        let s = base.to_string_lossy();
        s.starts_with("/tmp") || s.starts_with("/dev/shm")
    };

    StorageHealth {
        resolved_base_dir: base.display().to_string(),
        is_mountpoint,
        is_ephemeral,
        writable,
        predictions_line_count,
        weights_exists,
        weights_last_modified,
        absolute_paths: StorageHealthPaths {
            predictions_jsonl: predictions_path.display().to_string(),
            weights_json: weights_path.display().to_string(),
            audit_logs_dir: audit_dir.display().to_string(),
        },
    }
}

/// Best-effort `/proc/mounts` mountpoint check (SPEC_FULL.md §3): `None`
/// when `/proc/mounts` can't be read, since this crate targets Linux
/// containers exclusively but should not panic elsewhere.
#[cfg(target_os = "linux")]
fn read_is_mountpoint(path: &std::path::Path) -> Option<bool> {
    let canonical = std::fs::canonicalize(path).ok()?;
    let contents = std::fs::read_to_string("/proc/mounts").ok()?;
    Some(contents.lines().any(|line| {
        line.split_whitespace()
            .nth(1)
            .map(|mount_point| std::path::Path::new(mount_point) == canonical)
            .unwrap_or(false)
    }))
}

#[cfg(not(target_os = "linux"))]
fn read_is_mountpoint(_path: &std::path::Path) -> Option<bool> {
    None
}

/// `GraderDryRun(date, mode)` (spec §6.3, §4.4). Thin pass-through kept
/// here so the operator surface has one place documenting every
/// function in spec §6.3's table.
pub fn grader_dry_run(grader: &AutoGrader, et_date: EtDate, mode: DryRunMode) -> anyhow::Result<DryRunReport> {
    Ok(grader.dry_run(et_date, mode)?)
}

/// `GraderStatus()` (spec §6.3).
#[derive(Debug, Clone, Serialize)]
pub struct GraderStatus {
    pub available: bool,
    pub predictions_logged: u64,
    pub pending_to_grade: u64,
    pub graded_today: u64,
    pub storage_path: String,
    pub last_train_run_at: Option<String>,
    pub training_health: &'static str,
}

pub fn grader_status(
    pick_store: &PickStore,
    config: &Config,
    training_status: &TrainingStatus,
    now: DateTime<Utc>,
) -> anyhow::Result<GraderStatus> {
    let all = pick_store.load_predictions(None, None)?;
    let today = EtDate::today(now);
    let today_picks = pick_store.load_predictions(Some(today), None)?;

    let graded_available = all.iter().any(|p| p.is_graded());
    let health = training_status.health(now, graded_available);

    Ok(GraderStatus {
        available: true,
        predictions_logged: all.len() as u64,
        pending_to_grade: all.iter().filter(|p| !p.is_graded()).count() as u64,
        graded_today: today_picks.iter().filter(|p| p.is_graded()).count() as u64,
        storage_path: config.volume_mount_path.display().to_string(),
        last_train_run_at: training_status.last_train_run_at.map(|t| t.to_rfc3339()),
        training_health: health.as_str(),
    })
}

/// Re-exported for callers that only need the report shape, not the
/// grader itself (keeps `main.rs`'s imports flat).
pub use crate::grader::GradeReport as GradePendingReport;

pub fn grade_report_is_clean(report: &GradeReport) -> bool {
    report.failed == 0
}

pub fn weight_store_group_count(weight_store: &WeightStore) -> usize {
    weight_store.current().0.len()
}
