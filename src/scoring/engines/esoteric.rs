//! Engine 3: Esoteric — deterministic non-market signals (spec §4.2.1, §4.2.3).
//!
//! A set of pure functions (numerology, moon phase, Fibonacci retracement
//! of season range, vortex pattern, daily edge), composed generically
//! through a small capability trait (spec §9: "Duck-typed signals ->
//! interface with capability set") so adding a new signal needs no change
//! to the composite.

use chrono::Datelike;

use crate::domain::candidate::{Candidate, Market};

use super::super::context::Context;

/// Historical constant: the esoteric weights sum to 1.05, not 1.0
/// (spec §4.2.3). Enforced by `debug_assert!` in `composite_score`.
const EXPECTED_WEIGHT_SUM: f64 = 1.05;

pub trait EsotericSignal: Send + Sync {
    fn name(&self) -> &'static str;
    fn weight(&self) -> f64;
    /// Pure: `(magnitude, Context) -> (score in [0,10], reasons)`.
    fn compute(&self, magnitude: f64, ctx: &Context) -> (f64, Vec<String>);
}

pub struct Numerology;

impl EsotericSignal for Numerology {
    fn name(&self) -> &'static str {
        "numerology"
    }
    fn weight(&self) -> f64 {
        0.25
    }
    fn compute(&self, magnitude: f64, _ctx: &Context) -> (f64, Vec<String>) {
        let digit_sum = reduce_to_single_digit(magnitude);
        let score = match digit_sum {
            3 | 7 | 9 => 9.0,
            1 | 5 | 8 => 6.5,
            _ => 4.0,
        };
        (score, vec![format!("digit-root {} on magnitude {:.2}", digit_sum, magnitude)])
    }
}

pub struct MoonPhase;
impl EsotericSignal for MoonPhase {
    fn name(&self) -> &'static str {
        "moon_phase"
    }
    fn weight(&self) -> f64 {
        0.20
    }
    fn compute(&self, _magnitude: f64, ctx: &Context) -> (f64, Vec<String>) {
        let phase = lunar_phase_fraction(ctx.et_date.as_naive());
        // Full moon (phase near 0.5) and new moon (near 0.0/1.0) are the
        // two "edge" states this signal rewards.
        let distance_from_edge = (phase - 0.5).abs().min(phase.min(1.0 - phase));
        let score = (10.0 - distance_from_edge * 20.0).clamp(0.0, 10.0);
        (score, vec![format!("lunar phase fraction {:.2}", phase)])
    }
}

pub struct Fibonacci;
impl EsotericSignal for Fibonacci {
    fn name(&self) -> &'static str {
        "fibonacci"
    }
    fn weight(&self) -> f64 {
        0.20
    }
    fn compute(&self, magnitude: f64, ctx: &Context) -> (f64, Vec<String>) {
        let (Some(high), Some(low)) = (ctx.season_high, ctx.season_low) else {
            return (5.0, vec!["no season range available".to_string()]);
        };
        if (high - low).abs() < f64::EPSILON {
            return (5.0, vec!["degenerate season range".to_string()]);
        }
        let retracement = ((magnitude - low) / (high - low)).clamp(0.0, 1.0);
        const LEVELS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
        let closest = LEVELS
            .iter()
            .map(|l| (l - retracement).abs())
            .fold(f64::MAX, f64::min);
        let score = (10.0 - closest * 20.0).clamp(0.0, 10.0);
        (
            score,
            vec![format!("retracement {:.3} vs nearest Fibonacci level", retracement)],
        )
    }
}

pub struct Vortex;
impl EsotericSignal for Vortex {
    fn name(&self) -> &'static str {
        "vortex"
    }
    fn weight(&self) -> f64 {
        0.20
    }
    fn compute(&self, magnitude: f64, _ctx: &Context) -> (f64, Vec<String>) {
        // Vortex-math digit cycle: repeated doubling mod 9 (the 1-2-4-8-7-5
        // cycle). A magnitude whose digit-root lands on a cycle node scores
        // higher than one on a 3-6-9 axis node (treated separately by
        // Numerology).
        let root = reduce_to_single_digit(magnitude);
        const CYCLE: [u32; 6] = [1, 2, 4, 8, 7, 5];
        let score = if CYCLE.contains(&root) { 7.5 } else { 4.5 };
        (score, vec![format!("vortex cycle root {}", root)])
    }
}

pub struct DailyEdge;
impl EsotericSignal for DailyEdge {
    fn name(&self) -> &'static str {
        "daily_edge"
    }
    fn weight(&self) -> f64 {
        0.20
    }
    fn compute(&self, magnitude: f64, ctx: &Context) -> (f64, Vec<String>) {
        let day_of_year = ctx.et_date.as_naive().ordinal();
        let combined = reduce_to_single_digit(magnitude + day_of_year as f64);
        let score = 4.0 + (combined as f64 / 9.0) * 6.0;
        (score.clamp(0.0, 10.0), vec![format!("daily edge root {}", combined)])
    }
}

fn reduce_to_single_digit(value: f64) -> u32 {
    let mut n = value.abs().round() as u64;
    if n == 0 {
        return 0;
    }
    while n >= 10 {
        n = n.to_string().chars().filter_map(|c| c.to_digit(10)).map(|d| d as u64).sum();
    }
    n as u32
}

/// Very small lunar-phase approximation (synodic month ~29.53 days),
/// anchored to a known new moon. Deterministic and network-free, as
/// required of every esoteric signal.
fn lunar_phase_fraction(date: chrono::NaiveDate) -> f64 {
    const SYNODIC_DAYS: f64 = 29.530588;
    let known_new_moon = chrono::NaiveDate::from_ymd_opt(2000, 1, 6).expect("valid anchor date");
    let days_since = (date - known_new_moon).num_days() as f64;
    let phase = (days_since % SYNODIC_DAYS) / SYNODIC_DAYS;
    if phase < 0.0 {
        phase + 1.0
    } else {
        phase
    }
}

pub struct EsotericOutput {
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Priority order for selecting the magnitude a signal operates on: for
/// player props, `prop_line -> spread -> total/10`; for games, reversed
/// (spec §4.2.3).
fn select_magnitude(candidate: &Candidate, ctx: &Context) -> f64 {
    let prop_line = if candidate.market.is_player_prop() {
        Some(candidate.line)
    } else {
        None
    };
    let spread = ctx.spread_line;
    let total_tenth = ctx.total_line.map(|t| t / 10.0);

    let ordered: [Option<f64>; 3] = if candidate.market.is_player_prop() {
        [prop_line, spread, total_tenth]
    } else {
        [total_tenth, spread, prop_line]
    };

    ordered.into_iter().flatten().next().unwrap_or(candidate.line)
}

pub fn score(candidate: &Candidate, ctx: &Context) -> EsotericOutput {
    let signals: Vec<Box<dyn EsotericSignal>> = vec![
        Box::new(Numerology),
        Box::new(MoonPhase),
        Box::new(Fibonacci),
        Box::new(Vortex),
        Box::new(DailyEdge),
    ];

    let weight_sum: f64 = signals.iter().map(|s| s.weight()).sum();
    debug_assert!(
        (weight_sum - EXPECTED_WEIGHT_SUM).abs() < 1e-9,
        "esoteric weights must sum to {EXPECTED_WEIGHT_SUM}, got {weight_sum}"
    );

    let magnitude = select_magnitude(candidate, ctx);
    let mut weighted_total = 0.0;
    let mut reasons = Vec::with_capacity(signals.len());

    for signal in &signals {
        let (s, r) = signal.compute(magnitude, ctx);
        weighted_total += s * signal.weight();
        reasons.extend(r.into_iter().map(|reason| format!("{}: {}", signal.name(), reason)));
    }

    // Normalize by EXPECTED_WEIGHT_SUM (not 1.0) since the weights are
    // deliberately over-unity; this keeps the composite in [0,10].
    let score = (weighted_total / weight_sum).clamp(0.0, 10.0);

    EsotericOutput { score, reasons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::Side;
    use crate::domain::event::Sport;

    fn total_candidate(line: f64) -> Candidate {
        Candidate {
            sport: Sport::Nba,
            event_id: "e_1".into(),
            market: Market::Total,
            side: Side::Under,
            line,
            odds_american: Some(-110),
            book: "draftkings".into(),
            player_id: None,
            player_name: None,
        }
    }

    #[test]
    fn weights_sum_to_1_05() {
        let signals: Vec<Box<dyn EsotericSignal>> = vec![
            Box::new(Numerology),
            Box::new(MoonPhase),
            Box::new(Fibonacci),
            Box::new(Vortex),
            Box::new(DailyEdge),
        ];
        let sum: f64 = signals.iter().map(|s| s.weight()).sum();
        assert!((sum - 1.05).abs() < 1e-9);
    }

    #[test]
    fn score_is_bounded() {
        let ctx = Context::default();
        let out = score(&total_candidate(220.5), &ctx);
        assert!(out.score >= 0.0 && out.score <= 10.0);
        assert!(!out.reasons.is_empty());
    }

    #[test]
    fn game_magnitude_priority_prefers_total_over_spread() {
        let mut ctx = Context::default();
        ctx.total_line = Some(220.0);
        ctx.spread_line = Some(-3.5);
        let mag = select_magnitude(&total_candidate(220.5), &ctx);
        assert_eq!(mag, 22.0); // total/10, reversed-priority first for games
    }
}
