//! Contradiction Gate (spec §4.2.6): after scoring and threshold
//! filtering, picks sharing a unique key but opposite sides are resolved
//! down to one.

use std::collections::HashMap;

use crate::domain::candidate::book_preference_rank;
use crate::domain::pick::Pick;

#[derive(Debug, Default, Clone, Copy)]
pub struct ContradictionTelemetry {
    pub games_blocked: u64,
    pub props_blocked: u64,
}

/// Apply the contradiction gate in place: groups by `unique_key`, keeps
/// the higher `final_score` (book preference as tiebreak), and returns
/// telemetry of how many picks were dropped, split by props vs games
/// (spec §4.2.6: "never emit both").
pub fn apply_contradiction_gate(picks: Vec<Pick>) -> (Vec<Pick>, ContradictionTelemetry) {
    let mut best: HashMap<String, Pick> = HashMap::new();
    let mut telemetry = ContradictionTelemetry::default();

    for pick in picks {
        let key = pick.unique_key();
        match best.get(&key) {
            None => {
                best.insert(key, pick);
            }
            Some(existing) => {
                let is_prop = pick.market.is_player_prop();
                let replace = is_better(&pick, existing);
                if replace {
                    if is_prop {
                        telemetry.props_blocked += 1;
                    } else {
                        telemetry.games_blocked += 1;
                    }
                    best.insert(key, pick);
                } else if is_prop {
                    telemetry.props_blocked += 1;
                } else {
                    telemetry.games_blocked += 1;
                }
            }
        }
    }

    (best.into_values().collect(), telemetry)
}

fn is_better(candidate: &Pick, incumbent: &Pick) -> bool {
    if candidate.final_score != incumbent.final_score {
        return candidate.final_score > incumbent.final_score;
    }
    book_preference_rank(&candidate.book) < book_preference_rank(&incumbent.book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Market, Side};
    use crate::domain::event::Sport;
    use crate::domain::pick::{AiMode, GradeResult, SharpStrength, SignalStatus, Tier};
    use chrono::Utc;
    use std::collections::HashMap as Map;

    fn base_pick(side: Side, final_score: f64, book: &str) -> Pick {
        Pick {
            pick_id: format!("{:?}-{}", side, final_score),
            sport: Sport::Nba,
            event_id: "e_123".into(),
            market: Market::Total,
            side,
            line: 246.5,
            player_id: None,
            player_name: None,
            book: book.into(),
            odds_american: Some(-110),
            ai_score: 7.0,
            research_score: 7.0,
            esoteric_score: 7.0,
            jarvis_score: 7.0,
            context_modifier: 0.0,
            context_score: 0.0,
            final_score,
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
            et_date: "2026-01-29".into(),
            result: None as Option<GradeResult>,
            actual_value: None,
            graded_at: None,
            beat_clv: None,
            process_grade: None,
        }
    }

    #[test]
    fn only_higher_score_side_survives() {
        let over = base_pick(Side::Over, 7.8, "draftkings");
        let under = base_pick(Side::Under, 7.2, "draftkings");
        let (kept, telemetry) = apply_contradiction_gate(vec![over, under]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].side, Side::Over);
        assert_eq!(telemetry.games_blocked, 1);
        assert_eq!(telemetry.props_blocked, 0);
    }
}
