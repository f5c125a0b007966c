//! `MarketDataSource` — the opaque upstream market-data interface (spec §6.2).
//!
//! The core never hard-codes a vendor here; concrete adapters live outside
//! this crate's scope and are injected as `Arc<dyn MarketDataSource>`.

use std::collections::HashMap;

use anyhow::Result;

use crate::domain::candidate::{book_preference_rank, Market, Side};
use crate::domain::{Candidate, Event, Sport};

/// Per-book odds for a single `(event, market, side, line)` key, used for
/// cross-book line-variance computation (Research engine) and for
/// synthesizing SPREAD/MONEYLINE/TOTAL candidates from admitted events
/// (Slate Builder). Keyed by `event_id` in addition to market/side/line
/// because a single slate-wide snapshot routinely quotes the same
/// market/side/line combination (e.g. `TOTAL UNDER 220.5`) for more than
/// one simultaneous game.
#[derive(Debug, Clone)]
pub struct OddsSnapshot {
    /// `(event_id, market_str, side_str, rounded_line) -> (book -> odds_american)`.
    pub by_candidate: HashMap<(String, String, String, String), HashMap<String, i32>>,
}

impl OddsSnapshot {
    pub fn empty() -> Self {
        Self {
            by_candidate: HashMap::new(),
        }
    }

    /// Synthesize game-market candidates for one admitted event from
    /// this snapshot (spec §4.1): the Slate Builder does not fabricate
    /// lines from a bare `Event`, but an odds snapshot entry for that
    /// event IS a real quoted line, and is exactly what the Scoring
    /// Pipeline needs a `Candidate` for. One candidate per
    /// `(market, side, line)` entry, taking the best-preference book
    /// that quoted it.
    pub fn candidates_for_event(&self, sport: Sport, event_id: &str) -> Vec<Candidate> {
        let mut out = Vec::new();
        for ((ev_id, market_str, side_str, line_str), books) in &self.by_candidate {
            if ev_id != event_id || books.is_empty() {
                continue;
            }
            let Some(market) = Market::from_market_str(market_str) else {
                continue;
            };
            if market.is_player_prop() {
                // Props come from `fetch_props`, never synthesized here.
                continue;
            }
            let Some(side) = Side::from_side_str(side_str) else {
                continue;
            };
            let Ok(line) = line_str.parse::<f64>() else {
                continue;
            };
            let Some((book, &odds)) = books
                .iter()
                .min_by_key(|(book, _)| book_preference_rank(book))
            else {
                continue;
            };
            out.push(Candidate {
                sport,
                event_id: event_id.to_string(),
                market,
                side,
                line,
                odds_american: Some(odds),
                book: book.clone(),
                player_id: None,
                player_name: None,
            });
        }
        out
    }
}

/// The upstream market-data API surface the Slate Builder depends on.
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    /// May return a multi-day forward window; the caller (Slate Builder)
    /// applies the ET Day Gate.
    async fn fetch_events(&self, sport: Sport) -> Result<Vec<Event>>;

    /// Player-prop markets keyed by event.
    async fn fetch_props(&self, sport: Sport) -> Result<Vec<Candidate>>;

    /// Per-book odds for line-variance computation.
    async fn get_odds_snapshot(&self, sport: Sport) -> Result<OddsSnapshot>;
}
