//! Slate Builder (spec §4.1): time-gated ingestion of today's events and
//! props, deduplicated into the candidate list the Scoring Pipeline draws
//! from.
//!
//! The single most important correctness invariant in this module is the
//! ET Day Gate ([`crate::time_et::EtDate::admits`]) — upstream APIs
//! routinely return multi-day windows, and scoring tomorrow's games as if
//! they were today's is the primary failure mode this module exists to
//! prevent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::candidate::{book_preference_rank, Candidate};
use crate::domain::event::Sport;
use crate::domain::pick::compute_pick_id_for;
use crate::sources::market_data::{MarketDataSource, OddsSnapshot};
use crate::time_et::EtDate;

#[derive(Debug, Clone, Default)]
pub struct SlateTelemetry {
    pub events_before: u64,
    pub events_after: u64,
    pub dropped_out_of_window: u64,
    pub dropped_missing_time: u64,
    pub props_fetch_failed: bool,
    pub events_fetch_failed: bool,
    /// A failed/timed-out odds snapshot only costs game-market
    /// candidates; it must never block event admission (spec §4.1).
    pub odds_snapshot_fetch_failed: bool,
}

#[derive(Debug, Clone)]
pub struct SlateResult {
    pub candidates: Vec<Candidate>,
    pub telemetry: SlateTelemetry,
}

#[derive(Debug, Clone, Copy)]
pub struct SlateBuilderConfig {
    pub per_call_timeout: Duration,
    pub batch_deadline: Duration,
}

impl Default for SlateBuilderConfig {
    fn default() -> Self {
        Self {
            per_call_timeout: Duration::from_secs(3),
            batch_deadline: Duration::from_secs(15),
        }
    }
}

/// `BuildSlate(sport, et_date)` (spec §4.1). Total failure of both
/// upstream calls yields an empty slate, never an error — partial
/// failure (e.g. the props call timing out) must not block game-market
/// candidates derived from events alone.
pub async fn build_slate(
    source: &Arc<dyn MarketDataSource>,
    sport: Sport,
    et_date: EtDate,
    config: SlateBuilderConfig,
) -> SlateResult {
    let mut telemetry = SlateTelemetry::default();

    let deadline = tokio::time::Instant::now() + config.batch_deadline;
    let events_fut = tokio::time::timeout(config.per_call_timeout, source.fetch_events(sport));
    let props_fut = tokio::time::timeout(config.per_call_timeout, source.fetch_props(sport));
    let odds_fut = tokio::time::timeout(config.per_call_timeout, source.get_odds_snapshot(sport));
    let batch = async { tokio::join!(events_fut, props_fut, odds_fut) };

    let (events_result, props_result, odds_result) = match tokio::time::timeout_at(deadline, batch)
        .await
    {
        Ok(triple) => triple,
        Err(_) => {
            warn!(sport = %sport, "slate batch deadline exceeded; returning empty slate");
            telemetry.events_fetch_failed = true;
            telemetry.props_fetch_failed = true;
            telemetry.odds_snapshot_fetch_failed = true;
            return SlateResult {
                candidates: vec![],
                telemetry,
            };
        }
    };

    let events = match events_result {
        Ok(Ok(events)) => events,
        Ok(Err(err)) => {
            warn!(sport = %sport, error = %err, "fetch_events failed");
            telemetry.events_fetch_failed = true;
            vec![]
        }
        Err(_) => {
            warn!(sport = %sport, "fetch_events timed out");
            telemetry.events_fetch_failed = true;
            vec![]
        }
    };

    let props = match props_result {
        Ok(Ok(props)) => props,
        Ok(Err(err)) => {
            debug!(sport = %sport, error = %err, "fetch_props failed; game markets unaffected");
            telemetry.props_fetch_failed = true;
            vec![]
        }
        Err(_) => {
            debug!(sport = %sport, "fetch_props timed out; game markets unaffected");
            telemetry.props_fetch_failed = true;
            vec![]
        }
    };

    let odds_snapshot = match odds_result {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(err)) => {
            debug!(sport = %sport, error = %err, "get_odds_snapshot failed; game markets unaffected");
            telemetry.odds_snapshot_fetch_failed = true;
            OddsSnapshot::empty()
        }
        Err(_) => {
            debug!(sport = %sport, "get_odds_snapshot timed out; game markets unaffected");
            telemetry.odds_snapshot_fetch_failed = true;
            OddsSnapshot::empty()
        }
    };

    telemetry.events_before = events.len() as u64 + props.len() as u64;

    let mut admitted_event_ids: std::collections::HashSet<String> =
        std::collections::HashSet::new();
    let mut game_candidates = Vec::new();

    for event in &events {
        if event.start_time.timestamp() == 0 {
            telemetry.dropped_missing_time += 1;
            continue;
        }
        if !et_date.admits(event.start_time) {
            telemetry.dropped_out_of_window += 1;
            continue;
        }
        admitted_event_ids.insert(event.event_id.clone());
        game_candidates.extend(odds_snapshot.candidates_for_event(event.sport, &event.event_id));
    }

    let admitted_props: Vec<Candidate> = props
        .into_iter()
        .filter(|c| admitted_event_ids.contains(&c.event_id))
        .collect();

    let mut all_candidates = game_candidates;
    all_candidates.extend(admitted_props);

    let deduped = dedup_by_pick_id(all_candidates);
    telemetry.events_after = deduped.len() as u64;

    SlateResult {
        candidates: deduped,
        telemetry,
    }
}

/// Dedup by `pick_id` fingerprint; on collision, keep the candidate from
/// the higher-preference book (spec §4.1).
fn dedup_by_pick_id(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut best: HashMap<String, Candidate> = HashMap::new();
    for candidate in candidates {
        let id = compute_pick_id_for(&candidate);
        match best.get(&id) {
            None => {
                best.insert(id, candidate);
            }
            Some(existing) => {
                if book_preference_rank(&candidate.book) < book_preference_rank(&existing.book) {
                    best.insert(id, candidate);
                }
            }
        }
    }
    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Market, Side};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FakeSource {
        events: Vec<crate::domain::event::Event>,
        props: Vec<Candidate>,
        odds: OddsSnapshot,
    }

    impl FakeSource {
        fn new(events: Vec<crate::domain::event::Event>, props: Vec<Candidate>) -> Self {
            Self {
                events,
                props,
                odds: OddsSnapshot::empty(),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeSource {
        async fn fetch_events(&self, _sport: Sport) -> Result<Vec<crate::domain::event::Event>> {
            Ok(self.events.clone())
        }
        async fn fetch_props(&self, _sport: Sport) -> Result<Vec<Candidate>> {
            Ok(self.props.clone())
        }
        async fn get_odds_snapshot(
            &self,
            _sport: Sport,
        ) -> Result<crate::sources::market_data::OddsSnapshot> {
            Ok(self.odds.clone())
        }
    }

    #[tokio::test]
    async fn et_gate_rejects_next_day_event() {
        let et_date = EtDate::from_ymd(2026, 1, 29).unwrap();
        let admitted = Utc.with_ymd_and_hms(2026, 1, 30, 4, 0, 0).unwrap();
        let rejected = Utc.with_ymd_and_hms(2026, 1, 30, 6, 0, 0).unwrap();

        let source: Arc<dyn MarketDataSource> = Arc::new(FakeSource::new(
            vec![
                crate::domain::event::Event {
                    event_id: "e_1".into(),
                    sport: Sport::Nba,
                    home: "BOS".into(),
                    away: "NYK".into(),
                    start_time: admitted,
                },
                crate::domain::event::Event {
                    event_id: "e_2".into(),
                    sport: Sport::Nba,
                    home: "LAL".into(),
                    away: "GSW".into(),
                    start_time: rejected,
                },
            ],
            vec![],
        ));

        let result = build_slate(&source, Sport::Nba, et_date, SlateBuilderConfig::default()).await;
        assert_eq!(result.telemetry.events_before, 2);
        assert_eq!(result.telemetry.dropped_out_of_window, 1);
    }

    #[tokio::test]
    async fn game_candidates_synthesized_from_odds_snapshot() {
        let et_date = EtDate::from_ymd(2026, 1, 29).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 29, 20, 0, 0).unwrap();

        let mut fake = FakeSource::new(
            vec![crate::domain::event::Event {
                event_id: "e_1".into(),
                sport: Sport::Nba,
                home: "BOS".into(),
                away: "NYK".into(),
                start_time: start,
            }],
            vec![],
        );
        let mut books = std::collections::HashMap::new();
        books.insert("draftkings".to_string(), -110);
        books.insert("pinnacle".to_string(), -105);
        fake.odds.by_candidate.insert(
            (
                "e_1".to_string(),
                "TOTAL".to_string(),
                "UNDER".to_string(),
                "220.50".to_string(),
            ),
            books,
        );
        // Odds entries for an event that never gets admitted must not
        // leak into the slate.
        let mut other_books = std::collections::HashMap::new();
        other_books.insert("draftkings".to_string(), -120);
        fake.odds.by_candidate.insert(
            (
                "e_missing".to_string(),
                "MONEYLINE".to_string(),
                "HOME".to_string(),
                "0.00".to_string(),
            ),
            other_books,
        );

        let source: Arc<dyn MarketDataSource> = Arc::new(fake);
        let result = build_slate(&source, Sport::Nba, et_date, SlateBuilderConfig::default()).await;
        assert_eq!(result.candidates.len(), 1);
        let candidate = &result.candidates[0];
        assert_eq!(candidate.event_id, "e_1");
        assert_eq!(candidate.market, Market::Total);
        assert_eq!(candidate.side, Side::Under);
        assert_eq!(candidate.book, "draftkings");
    }

    #[tokio::test]
    async fn props_timeout_does_not_block_game_candidates() {
        struct SlowPropsSource;
        #[async_trait]
        impl MarketDataSource for SlowPropsSource {
            async fn fetch_events(&self, _sport: Sport) -> Result<Vec<crate::domain::event::Event>> {
                Ok(vec![])
            }
            async fn fetch_props(&self, _sport: Sport) -> Result<Vec<Candidate>> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(vec![])
            }
            async fn get_odds_snapshot(
                &self,
                _sport: Sport,
            ) -> Result<crate::sources::market_data::OddsSnapshot> {
                Ok(crate::sources::market_data::OddsSnapshot::empty())
            }
        }
        let source: Arc<dyn MarketDataSource> = Arc::new(SlowPropsSource);
        let config = SlateBuilderConfig {
            per_call_timeout: Duration::from_millis(50),
            batch_deadline: Duration::from_secs(5),
        };
        let result = build_slate(
            &source,
            Sport::Nba,
            EtDate::from_ymd(2026, 1, 29).unwrap(),
            config,
        )
        .await;
        assert!(result.telemetry.props_fetch_failed);
        assert!(!result.telemetry.events_fetch_failed);
    }

    #[test]
    fn dedup_keeps_higher_preference_book() {
        let make = |book: &str| Candidate {
            sport: Sport::Nba,
            event_id: "e_1".into(),
            market: Market::Total,
            side: Side::Under,
            line: 220.5,
            odds_american: Some(-110),
            book: book.into(),
            player_id: None,
            player_name: None,
        };
        let deduped = dedup_by_pick_id(vec![make("pinnacle"), make("draftkings")]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].book, "draftkings");
    }
}
