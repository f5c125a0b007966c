//! Additive post-base boosts — confluence, MSRF, Jason Sim, SERP
//! (spec §4.2.4). These are additive boosts, not engines: they must
//! never be folded into engine scores.

use crate::domain::candidate::Market;

use super::context::{Context, Variance};

/// The primary defense against score inflation (spec §4.2.2, §4.2.4,
/// property P6): the *sum* of confluence + MSRF + Jason Sim + SERP is
/// clamped here, individual boosts are clamped at their own call sites.
pub const TOTAL_BOOST_CAP: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfluenceLevel {
    HarmonicConvergence,
    Strong,
    Moderate,
    Divergent,
}

pub struct BoostInputs {
    pub research_score: f64,
    pub esoteric_score: f64,
    pub jarvis_active: bool,
    pub sharp_status_success: bool,
    pub jason_sim_boost: f64,
}

/// Confluence boost (spec §4.2.4). Evaluated after Jason Sim so its
/// active-signal gate can see `jason_sim_boost != 0`.
pub fn confluence_boost(inputs: &BoostInputs) -> (f64, ConfluenceLevel, Vec<String>) {
    let alignment = 1.0 - (inputs.research_score - inputs.esoteric_score).abs() / 10.0;

    if inputs.research_score >= 8.0 && inputs.esoteric_score >= 8.0 {
        return (
            1.5,
            ConfluenceLevel::HarmonicConvergence,
            vec!["harmonic convergence: research and esoteric both >= 8.0".to_string()],
        );
    }

    let has_active_signal =
        inputs.jarvis_active || inputs.sharp_status_success || inputs.jason_sim_boost != 0.0;

    if alignment >= 0.80 {
        if has_active_signal {
            (
                0.3,
                ConfluenceLevel::Strong,
                vec![format!("strong confluence, alignment {:.2} with an active signal", alignment)],
            )
        } else {
            (
                0.1,
                ConfluenceLevel::Moderate,
                vec![format!(
                    "alignment {:.2} would be strong but no active signal gates it; downgraded to moderate",
                    alignment
                )],
            )
        }
    } else if alignment >= 0.50 {
        (
            0.1,
            ConfluenceLevel::Moderate,
            vec![format!("moderate confluence, alignment {:.2}", alignment)],
        )
    } else {
        (0.0, ConfluenceLevel::Divergent, vec!["divergent research/esoteric".to_string()])
    }
}

/// Market-structure resonance factor: a discrete boost in
/// `{0, 0.25, 0.5, 1.0}` driven by how many independent books are
/// quoting this candidate (spec §4.2.4 names the discrete set; the
/// book-count rule is this implementation's choice — see DESIGN.md).
pub fn msrf_boost(ctx: &Context, candidate_key: &(String, String, String, String)) -> f64 {
    let book_count = ctx
        .odds_snapshot
        .as_ref()
        .and_then(|snap| snap.by_candidate.get(candidate_key))
        .map(|books| books.len())
        .unwrap_or(0);

    match book_count {
        0..=1 => 0.0,
        2..=3 => 0.25,
        4..=5 => 0.5,
        _ => 1.0,
    }
}

/// Jason Sim — post-pick confluence layer (spec §4.2.4). Signed, capped
/// at ±1.5. Can block low-confidence spread/ML picks outright.
pub fn jason_sim_boost(market: &Market, base_4: f64, ctx: &Context) -> (f64, Vec<String>) {
    match market {
        Market::Spread | Market::Moneyline | Market::Sharp => {
            let win_pct = ctx.pick_side_win_pct.unwrap_or(50.0);
            if win_pct <= 52.0 && base_4 < 7.2 {
                (
                    -1.5,
                    vec![format!(
                        "jason sim blocks: win% {:.1} <= 52 and base {:.2} < 7.2",
                        win_pct, base_4
                    )],
                )
            } else if win_pct >= 60.0 {
                (0.5, vec![format!("jason sim supports: win% {:.1} >= 60", win_pct)])
            } else {
                (0.0, vec![])
            }
        }
        Market::Total => match ctx.projected_total_variance {
            Some(Variance::High) => (
                -1.0,
                vec!["jason sim reduces confidence: projected variance HIGH".to_string()],
            ),
            Some(Variance::Low) => (0.3, vec!["jason sim supports: projected variance LOW".to_string()]),
            _ => (0.0, vec![]),
        },
        Market::PlayerStat(_) => {
            if base_4 >= 6.8 && ctx.environment_supports_prop {
                (
                    1.0,
                    vec!["jason sim supports: base score >= 6.8 and environment supports".to_string()],
                )
            } else {
                (0.0, vec![])
            }
        }
    }
    .clamp_boost()
}

trait ClampBoost {
    fn clamp_boost(self) -> Self;
}

impl ClampBoost for (f64, Vec<String>) {
    fn clamp_boost(self) -> Self {
        (self.0.clamp(-1.5, 1.5), self.1)
    }
}

/// SERP: optional per-call external-intelligence boost, cap +4.3
/// individually (spec §4.2.4) before the total-boost sum clamp applies.
/// Unlike Jason Sim, the spec never describes SERP as signed or able to
/// go negative, so this clamps to `[0, 4.3]` rather than `±4.3`.
pub fn serp_boost(ctx: &Context) -> f64 {
    ctx.serp_boost_raw.unwrap_or(0.0).clamp(0.0, 4.3)
}

/// Apply the primary anti-inflation clamp (spec §4.2.2, property P6).
pub fn total_boosts(confluence: f64, msrf: f64, jason_sim: f64, serp: f64) -> f64 {
    let raw = confluence + msrf + jason_sim + serp;
    raw.min(TOTAL_BOOST_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmonic_convergence_overrides_alignment_rule() {
        let inputs = BoostInputs {
            research_score: 8.5,
            esoteric_score: 8.2,
            jarvis_active: false,
            sharp_status_success: false,
            jason_sim_boost: 0.0,
        };
        let (boost, level, _) = confluence_boost(&inputs);
        assert_eq!(boost, 1.5);
        assert_eq!(level, ConfluenceLevel::HarmonicConvergence);
    }

    #[test]
    fn strong_downgrades_to_moderate_without_active_signal() {
        let inputs = BoostInputs {
            research_score: 7.5,
            esoteric_score: 7.9,
            jarvis_active: false,
            sharp_status_success: false,
            jason_sim_boost: 0.0,
        };
        let (boost, level, _) = confluence_boost(&inputs);
        assert_eq!(level, ConfluenceLevel::Moderate);
        assert_eq!(boost, 0.1);
    }

    #[test]
    fn total_boost_cap_applies_to_sum() {
        let total = total_boosts(1.5, 1.0, 1.0, 4.3);
        assert_eq!(total, TOTAL_BOOST_CAP);
    }

    #[test]
    fn total_boost_cap_does_not_floor_negative() {
        let total = total_boosts(0.0, 0.0, -1.5, 0.0);
        assert_eq!(total, -1.5);
    }
}
