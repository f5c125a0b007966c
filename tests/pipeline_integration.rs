//! End-to-end acceptance tests for the pick scoring & lifecycle pipeline
//! (spec.md §8's concrete scenarios), driven through the public facade in
//! `pipeline.rs` rather than any single component in isolation.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use betterbot_backend::config::{Config, IntegrationRegistry};
use betterbot_backend::domain::candidate::Candidate;
use betterbot_backend::domain::event::{Event, FinalScore, GameStatus, Sport};
use betterbot_backend::domain::pick::GradeResult;
use betterbot_backend::grader::AutoGrader;
use betterbot_backend::pipeline::{generate_best_bets, BestBetsOptions};
use betterbot_backend::scoring::context::Context;
use betterbot_backend::sources::market_data::{MarketDataSource, OddsSnapshot};
use betterbot_backend::sources::results::{FetchOutcome, ResultsSource};
use betterbot_backend::store::{PickStore, WeightStore};
use betterbot_backend::time_et::EtDate;

struct FakeMarketData {
    events: Vec<Event>,
}

#[async_trait]
impl MarketDataSource for FakeMarketData {
    async fn fetch_events(&self, _sport: Sport) -> Result<Vec<Event>> {
        Ok(self.events.clone())
    }
    async fn fetch_props(&self, _sport: Sport) -> Result<Vec<Candidate>> {
        Ok(vec![])
    }
    async fn get_odds_snapshot(&self, _sport: Sport) -> Result<OddsSnapshot> {
        Ok(OddsSnapshot::empty())
    }
}

fn test_config(volume: &std::path::Path) -> Config {
    Config {
        volume_mount_path: volume.to_path_buf(),
        shadow_expert_consensus: true,
        market_data_timeout_secs: 3,
        slate_batch_deadline_secs: 15,
        scheduler_misfire_grace_secs: 600,
        integrations: IntegrationRegistry::default_set(),
    }
}

fn noop_context(_candidate: &Candidate) -> Context {
    Context::default()
}

/// Scenario 1: empty slate. Both upstream providers return nothing for
/// today, so the response is well-formed with empty `picks[]` arrays and
/// zero counts on both groups.
#[tokio::test]
async fn empty_slate_yields_well_formed_empty_response() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let pick_store = PickStore::open(dir.path()).unwrap();
    let market_source: Arc<dyn MarketDataSource> = Arc::new(FakeMarketData { events: vec![] });

    let response = generate_best_bets(
        &market_source,
        &pick_store,
        &config,
        Sport::Nhl,
        EtDate::from_ymd(2026, 1, 29).unwrap(),
        BestBetsOptions {
            top_n_props: 10,
            top_n_games: 10,
            context_for: &noop_context,
        },
    )
    .await;

    assert_eq!(response.props.count, 0);
    assert_eq!(response.games.count, 0);
    assert!(response.props.picks.is_empty());
    assert!(response.games.picks.is_empty());
    assert_eq!(response.meta.events_before, 0);
    assert_eq!(response.meta.events_after, 0);
}

/// Scenario 5: ET gate rejection. One event starts at 11:00 PM ET on the
/// requested day (admitted), the other at 1:00 AM ET the following day
/// (rejected) — the Slate Builder telemetry surfaced in the response meta
/// must show exactly one admission.
#[tokio::test]
async fn et_gate_rejects_event_outside_the_requested_calendar_day() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let pick_store = PickStore::open(dir.path()).unwrap();

    let admitted_start = Utc.with_ymd_and_hms(2026, 1, 30, 4, 0, 0).unwrap();
    let rejected_start = Utc.with_ymd_and_hms(2026, 1, 30, 6, 0, 0).unwrap();
    let market_source: Arc<dyn MarketDataSource> = Arc::new(FakeMarketData {
        events: vec![
            Event {
                event_id: "e_admitted".into(),
                sport: Sport::Nhl,
                home: "BOS".into(),
                away: "NYR".into(),
                start_time: admitted_start,
            },
            Event {
                event_id: "e_rejected".into(),
                sport: Sport::Nhl,
                home: "TOR".into(),
                away: "MTL".into(),
                start_time: rejected_start,
            },
        ],
    });

    let response = generate_best_bets(
        &market_source,
        &pick_store,
        &config,
        Sport::Nhl,
        EtDate::from_ymd(2026, 1, 29).unwrap(),
        BestBetsOptions {
            top_n_props: 10,
            top_n_games: 10,
            context_for: &noop_context,
        },
    )
    .await;

    assert_eq!(response.meta.events_before, 2);
    assert_eq!(response.meta.dropped_out_of_window, 1);
    // Neither admitted event has a quoted odds snapshot entry, so no
    // candidates are synthesized and the response stays empty — the
    // ET gate's effect is visible purely in the telemetry counters.
    assert_eq!(response.meta.events_after, 0);
}

struct FakeResults {
    final_score: FinalScore,
}

#[async_trait]
impl ResultsSource for FakeResults {
    async fn fetch_final_score(&self, _event_id: &str) -> Result<FetchOutcome<FinalScore>> {
        Ok(FetchOutcome::Found(self.final_score))
    }
    async fn fetch_player_stat(&self, _p: &str, _e: &str, _s: &str) -> Result<FetchOutcome<f64>> {
        Ok(FetchOutcome::NotFound)
    }
}

/// Scenario 6: grading round-trip. A persisted TOTAL/Under pick is graded
/// against a final score of 110-113 (total 223, under 246.5 line hits),
/// and the grading fields persist and reconcile on reload.
#[tokio::test]
async fn grading_round_trip_persists_and_reconciles() {
    use betterbot_backend::domain::candidate::{Market, Side};
    use betterbot_backend::domain::pick::{compute_pick_id, AiMode, SignalStatus, SharpStrength, Tier};
    use std::collections::HashMap;

    let dir = tempdir().unwrap();
    let pick_store = Arc::new(PickStore::open(dir.path()).unwrap());
    let weight_store = Arc::new(WeightStore::open(dir.path()).unwrap());

    let et_date = EtDate::from_ymd(2026, 1, 29).unwrap();
    let pick_id = compute_pick_id(Sport::Nba, "e_123", &Market::Total, &Side::Under, 246.5, None);

    let pick = betterbot_backend::domain::pick::Pick {
        pick_id: pick_id.clone(),
        sport: Sport::Nba,
        event_id: "e_123".into(),
        market: Market::Total,
        side: Side::Under,
        line: 246.5,
        player_id: None,
        player_name: None,
        book: "draftkings".into(),
        odds_american: Some(-110),
        ai_score: 7.5,
        research_score: 7.5,
        esoteric_score: 7.0,
        jarvis_score: 7.0,
        context_modifier: 0.0,
        context_score: 0.0,
        final_score: 7.3,
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
        jarvis_fail_reasons: vec!["no triggers fired".into()],
        jarvis_inputs_used: HashMap::new(),
        titanium_triggered: false,
        titanium_count: 0,
        titanium_qualified_engines: vec![],
        created_at: Utc::now(),
        event_start_time_et: "9:10 PM ET".into(),
        et_date: et_date.to_string(),
        result: None,
        actual_value: None,
        graded_at: None,
        beat_clv: None,
        process_grade: None,
    };
    pick_store.persist_pick(&pick).unwrap();

    let results: Arc<dyn ResultsSource> = Arc::new(FakeResults {
        final_score: FinalScore {
            home: 110.0,
            away: 113.0,
            status: GameStatus::Final,
        },
    });
    let grader = AutoGrader::new(results, Arc::clone(&pick_store), weight_store);

    let report = grader.grade_pending(et_date).await.unwrap();
    assert_eq!(report.graded, 1);
    assert_eq!(report.failed, 0);

    let reloaded = pick_store.load_predictions(Some(et_date), None).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].result, Some(GradeResult::Win));
    assert_eq!(reloaded[0].actual_value, Some(223.0));
    assert!(reloaded[0].graded_at.is_some());
}
