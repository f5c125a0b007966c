//! Tier assignment, output gates, and the Titanium three-of-four rule
//! (spec §4.2.5).

use crate::domain::pick::Tier;

/// Titanium qualification threshold: an engine score >= this qualifies.
/// Exactly 8.0 qualifies; 7.999... does not (spec §4.2.5, property P5).
const TITANIUM_ENGINE_THRESHOLD: f64 = 8.0;

pub struct EngineScores {
    pub ai: f64,
    pub research: f64,
    pub esoteric: f64,
    pub jarvis: f64,
}

/// The single, authoritative implementation of the Titanium three-of-four
/// rule (spec §4.2.5: "Implementation MUST live in a single function;
/// every other call site must invoke it, not re-implement it").
///
/// Returns `(titanium_count, qualified_engine_names, triggered)`, where
/// `triggered` additionally requires `final_score >= 8.0`.
pub fn titanium_check(scores: &EngineScores, final_score: f64) -> (u8, Vec<&'static str>, bool) {
    let named = [
        ("ai", scores.ai),
        ("research", scores.research),
        ("esoteric", scores.esoteric),
        ("jarvis", scores.jarvis),
    ];
    let qualified: Vec<&'static str> = named
        .iter()
        .filter(|(_, s)| *s >= TITANIUM_ENGINE_THRESHOLD)
        .map(|(name, _)| *name)
        .collect();
    let count = qualified.len() as u8;
    let triggered = count >= 3 && final_score >= TITANIUM_ENGINE_THRESHOLD;
    (count, qualified, triggered)
}

/// GOLD_STAR hard gates (spec §4.2.5): all must pass, else downgrade to
/// EDGE_LEAN.
pub fn passes_gold_star_gates(scores: &EngineScores) -> bool {
    scores.ai >= 6.8 && scores.research >= 6.5 && scores.jarvis >= 6.5 && scores.esoteric >= 5.5
}

/// Assign the internal tier for a scored candidate (spec §4.2.5). This
/// tier may still be a hidden state (`Monitor`/`Pass`) — the output-gate
/// filter (spec §4.2.7 step 5) is a separate, later step.
pub fn assign_tier(scores: &EngineScores, final_score: f64) -> Tier {
    let (_, _, titanium) = titanium_check(scores, final_score);
    if titanium {
        return Tier::TitaniumSmash;
    }
    if final_score >= 7.5 {
        if passes_gold_star_gates(scores) {
            return Tier::GoldStar;
        }
        return Tier::EdgeLean;
    }
    if final_score >= 6.5 {
        return Tier::EdgeLean;
    }
    if final_score >= 5.5 {
        return Tier::Monitor;
    }
    Tier::Pass
}

/// Output score thresholds applied after tier assignment (spec §4.2.5).
pub fn meets_output_threshold(is_player_prop: bool, final_score: f64) -> bool {
    if is_player_prop {
        final_score >= 6.5
    } else {
        final_score >= 7.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titanium_boundary_exactly_8_qualifies() {
        let scores = EngineScores {
            ai: 8.0,
            research: 8.0,
            esoteric: 8.0,
            jarvis: 7.99,
        };
        let (count, qualified, triggered) = titanium_check(&scores, 8.03);
        assert_eq!(count, 3);
        assert_eq!(qualified, vec!["ai", "research", "esoteric"]);
        assert!(triggered);
    }

    #[test]
    fn titanium_near_miss_on_final_score() {
        let scores = EngineScores {
            ai: 8.0,
            research: 8.0,
            esoteric: 7.99,
            jarvis: 8.0,
        };
        let (count, _, triggered_high) = titanium_check(&scores, 8.01);
        assert_eq!(count, 3);
        assert!(triggered_high);
        let (_, _, triggered_low) = titanium_check(&scores, 7.99);
        assert!(!triggered_low);
    }

    #[test]
    fn gold_star_downgrades_to_edge_lean_on_gate_failure() {
        let scores = EngineScores {
            ai: 5.0, // fails ai >= 6.8 gate
            research: 7.0,
            esoteric: 6.0,
            jarvis: 7.0,
        };
        let tier = assign_tier(&scores, 7.8);
        assert_eq!(tier, Tier::EdgeLean);
    }

    #[test]
    fn edge_lean_at_6_7_fails_game_output_threshold() {
        assert!(!meets_output_threshold(false, 6.7));
        assert!(meets_output_threshold(true, 6.7));
    }
}
