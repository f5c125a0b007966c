//! A scored, persisted recommendation (spec §3: Pick) and its lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::candidate::{Candidate, Market, Side};
use super::event::Sport;

/// External tiers (spec §4.2.5). `Monitor` and `Pass` are internal
/// workflow states and must never be emitted by the hidden-tier filter —
/// they exist here only so the tier-assignment function has somewhere to
/// put candidates that don't clear `EDGE_LEAN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    TitaniumSmash,
    GoldStar,
    EdgeLean,
    Monitor,
    Pass,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::TitaniumSmash => "TITANIUM_SMASH",
            Tier::GoldStar => "GOLD_STAR",
            Tier::EdgeLean => "EDGE_LEAN",
            Tier::Monitor => "MONITOR",
            Tier::Pass => "PASS",
        }
    }

    /// Internal workflow states never returned to external consumers
    /// (spec §4.2.5: "Hidden-tier filter").
    pub fn is_hidden(&self) -> bool {
        matches!(self, Tier::Monitor | Tier::Pass)
    }

    /// Ordering used for deterministic output sort (spec §5:
    /// `(tier_rank desc, final_score desc, pick_id asc)`).
    pub fn rank(&self) -> u8 {
        match self {
            Tier::TitaniumSmash => 3,
            Tier::GoldStar => 2,
            Tier::EdgeLean => 1,
            Tier::Monitor => 0,
            Tier::Pass => 0,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeResult {
    Win,
    Loss,
    Push,
    Void,
}

impl GradeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeResult::Win => "WIN",
            GradeResult::Loss => "LOSS",
            GradeResult::Push => "PUSH",
            GradeResult::Void => "VOID",
        }
    }
}

/// AI engine's fallback transparency field (spec §4.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiMode {
    Model,
    HeuristicFallback,
}

/// Research engine's `sharp` sub-signal strength (spec §4.2.3). Never
/// inferred from line variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharpStrength {
    None,
    Mild,
    Moderate,
    Strong,
}

impl SharpStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharpStrength::None => "NONE",
            SharpStrength::Mild => "MILD",
            SharpStrength::Moderate => "MODERATE",
            SharpStrength::Strong => "STRONG",
        }
    }
}

/// Status of a research sub-signal provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    Success,
    NoData,
    Error,
    Disabled,
}

/// The 12-hex-char deterministic fingerprint that identifies a Pick and
/// serves as the idempotency key for both Pick Store dedup and
/// grading-result matching (spec §3).
///
/// `pick_id = SHA1(sport | event_id | market | UPPER(side) | round(line,2) | player_id_or_empty)[0:12]`
pub fn compute_pick_id(
    sport: Sport,
    event_id: &str,
    market: &Market,
    side: &Side,
    line: f64,
    player_id: Option<&str>,
) -> String {
    let rounded_line = (line * 100.0).round() / 100.0;
    let input = format!(
        "{}|{}|{}|{}|{:.2}|{}",
        sport.as_str(),
        event_id,
        market.market_str(),
        side.upper(),
        rounded_line,
        player_id.unwrap_or(""),
    );
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..12].to_string()
}

pub fn compute_pick_id_for(candidate: &Candidate) -> String {
    compute_pick_id(
        candidate.sport,
        &candidate.event_id,
        &candidate.market,
        &candidate.side,
        candidate.line,
        candidate.player_id.as_deref(),
    )
}

/// A scored, persisted recommendation. See spec §3 for the full field
/// list and §6.1 for the on-disk JSONL shape this struct serializes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    // --- Identity ---
    pub pick_id: String,
    pub sport: Sport,
    pub event_id: String,
    pub market: Market,
    pub side: Side,
    pub line: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub book: String,
    pub odds_american: Option<i32>,

    // --- Scoring ---
    pub ai_score: f64,
    pub research_score: f64,
    pub esoteric_score: f64,
    pub jarvis_score: f64,
    pub context_modifier: f64,
    /// Precursor to `context_modifier` (spec §9 open question, resolved
    /// in SPEC_FULL.md): the unclamped sum of context adjustments.
    /// Informational only; never fed back into scoring.
    pub context_score: f64,
    pub final_score: f64,
    pub tier: Tier,

    // --- Additive adjustments, each its own field for auditability (spec §4.2.2) ---
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

    // --- Reasoning ---
    pub ai_reasons: Vec<String>,
    pub research_reasons: Vec<String>,
    pub esoteric_reasons: Vec<String>,
    pub jarvis_reasons: Vec<String>,

    // --- AI engine transparency ---
    pub ai_mode: AiMode,

    // --- Research sub-signal transparency (spec §4.2.3: must stay unconflated) ---
    pub sharp_strength: SharpStrength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharp_source_api: Option<String>,
    pub sharp_status: SignalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharp_raw_inputs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_source_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_variance: Option<f64>,

    // --- Jarvis seven-field contract (spec §4.2.3), always emitted ---
    pub jarvis_rs: f64,
    pub jarvis_active: bool,
    pub jarvis_hits_count: u32,
    pub jarvis_triggers_hit: Vec<String>,
    pub jarvis_fail_reasons: Vec<String>,
    pub jarvis_inputs_used: HashMap<String, f64>,

    // --- Titanium transparency (spec §3, §4.2.5) ---
    pub titanium_triggered: bool,
    pub titanium_count: u8,
    pub titanium_qualified_engines: Vec<String>,

    // --- Timestamps ---
    pub created_at: DateTime<Utc>,
    pub event_start_time_et: String,
    pub et_date: String,

    // --- Grading, populated after game completion ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GradeResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_clv: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_grade: Option<String>,
}

impl Pick {
    pub fn is_graded(&self) -> bool {
        self.result.is_some()
    }

    /// The unique key used by the contradiction gate (spec §4.2.6):
    /// `sport | et_date | event_id | market | prop_type | subject | |line|`.
    pub fn unique_key(&self) -> String {
        let prop_type = if self.market.is_player_prop() {
            "PROP"
        } else {
            "GAME"
        };
        let subject = self.market.subject(self.player_id.as_deref());
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.sport.as_str(),
            self.et_date,
            self.event_id,
            self.market.market_str(),
            prop_type,
            subject,
            self.line.abs(),
        )
    }
}
