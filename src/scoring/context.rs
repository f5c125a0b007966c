//! The `Context` snapshot passed to every engine and boost (spec §4.2).
//!
//! A `Context` is assembled once per request at slate-build time (external
//! intelligence is pre-fetched in parallel per spec §5) and is otherwise
//! read-only for the rest of the pipeline — pure scoring functions never
//! touch the network.

use chrono::{DateTime, Utc};

use crate::domain::event::GameStatus;
use crate::sources::market_data::OddsSnapshot;
use crate::sources::splits::SplitsResult;
use crate::time_et::EtDate;

/// Features the AI engine consumes (spec §4.2.3).
#[derive(Debug, Clone, Default)]
pub struct AiFeatures {
    pub defensive_rank: Option<f64>,
    pub pace: Option<f64>,
    pub usage_vacuum: Option<f64>,
    pub rest_days: Option<f64>,
    pub recent_form: Option<f64>,
}

impl AiFeatures {
    /// Number of features actually present; used to detect a signature
    /// mismatch against the trained ensemble (spec §4.2.3).
    pub fn present_count(&self) -> usize {
        [
            self.defensive_rank.is_some(),
            self.pace.is_some(),
            self.usage_vacuum.is_some(),
            self.rest_days.is_some(),
            self.recent_form.is_some(),
        ]
        .iter()
        .filter(|x| **x)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Low,
    Medium,
    High,
}

/// Everything the four engines and the post-base boosts need to score one
/// candidate. Constructed once per request; never mutated by an engine.
#[derive(Debug, Clone)]
pub struct Context {
    pub et_date: EtDate,
    pub event_start_time: DateTime<Utc>,
    pub game_status: Option<GameStatus>,
    pub ai_features: AiFeatures,
    pub odds_snapshot: Option<OddsSnapshot>,
    pub splits: Option<SplitsResult>,
    /// Numeric spread and total for the event, independent of which
    /// market this particular candidate is. Used as Jarvis/Esoteric
    /// magnitude fallbacks (spec §4.2.3: "magnitude input priority").
    pub spread_line: Option<f64>,
    pub total_line: Option<f64>,
    /// Season high/low for the candidate's line magnitude, used by the
    /// Esoteric engine's Fibonacci retracement signal.
    pub season_high: Option<f64>,
    pub season_low: Option<f64>,
    /// Pick-side implied win probability, used by the Jason Sim blocker
    /// for spreads/ML (spec §4.2.4).
    pub pick_side_win_pct: Option<f64>,
    pub projected_total_variance: Option<Variance>,
    /// Whether the broader environment (pace, injuries, vegas total)
    /// supports a player-prop Jason Sim boost (spec §4.2.4).
    pub environment_supports_prop: bool,
    /// Expert-consensus agreement percentage, drives
    /// `expert_consensus_boost` before the SHADOW MODE gate.
    pub expert_consensus_pct: Option<f64>,
    /// SERP-style external-intelligence boost, pre-fetched and cached at
    /// slate-build time (spec §5); `None` when the integration is absent.
    pub serp_boost_raw: Option<f64>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            et_date: EtDate::from_ymd(2026, 1, 1).expect("valid default date"),
            event_start_time: DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is valid"),
            game_status: None,
            ai_features: AiFeatures::default(),
            odds_snapshot: None,
            splits: None,
            spread_line: None,
            total_line: None,
            season_high: None,
            season_low: None,
            pick_side_win_pct: None,
            projected_total_variance: None,
            environment_supports_prop: false,
            expert_consensus_pct: None,
            serp_boost_raw: None,
        }
    }
}
