//! Scoring Pipeline orchestration (spec §4.2): ties the four base
//! engines, post-base boosts, context modifier, tier assignment, and
//! the contradiction gate into one entry point, `score_candidate`.

pub mod boosts;
pub mod context;
pub mod contradiction;
pub mod engines;
pub mod tier;

use chrono::Utc;
use std::collections::HashMap;

use crate::domain::candidate::{Candidate, Market};
use crate::domain::pick::{compute_pick_id_for, Pick};
use crate::time_et::display_et_clock;

use boosts::{confluence_boost, jason_sim_boost, msrf_boost, serp_boost, total_boosts, BoostInputs};
use context::Context;
use engines::{ai, esoteric, jarvis, research, AI_WEIGHT, ESOTERIC_WEIGHT, JARVIS_WEIGHT, RESEARCH_WEIGHT};
use tier::{assign_tier, titanium_check, EngineScores};

/// Per-signal bounded adjustments added directly into the final-score
/// sum (spec §4.2.2 step 3), each independently clamped at the point of
/// computation so the persisted `Pick` field always reflects the value
/// the contract permits. Distinct from `context_modifier`, which is its
/// own term in the same sum (see `derive_context_modifier`).
#[derive(Debug, Clone, Default)]
pub struct ContextAdjustments {
    /// Discrete: spec §4.2.2 constrains this to `{-0.5, 0, +0.5}`, not a
    /// continuous clamp range.
    pub ensemble_adjustment: f64,
    pub live_adjustment: f64,
    pub totals_calibration_adjustment: f64,
    pub hook_penalty: f64,
    pub expert_consensus_boost: f64,
    pub prop_correlation_adjustment: f64,
}

/// Derive the six named per-signal adjustments (spec §4.2.2), each
/// already clamped to its own contractual range. `expert_consensus_boost`
/// here is always the unshadowed, computed value — SHADOW MODE is applied
/// by the caller only at the point it enters the final-score sum, so this
/// field stays visible on the persisted `Pick` for audit regardless.
pub fn derive_context_adjustments(candidate: &Candidate, ctx: &Context) -> ContextAdjustments {
    let mut adj = ContextAdjustments::default();

    // Ensemble adjustment: discrete, driven by how much of the AI
    // feature signature was actually available to the ensemble (spec
    // §4.2.3's fallback trigger is the same feature-completeness check).
    adj.ensemble_adjustment = match ctx.ai_features.present_count() {
        0..=2 => -0.5,
        3..=4 => 0.0,
        _ => 0.5,
    };

    // Live-game adjustment: applied iff game status == LIVE (spec §4.2.2).
    if matches!(
        ctx.game_status,
        Some(crate::domain::event::GameStatus::Live)
    ) {
        adj.live_adjustment = (-0.3_f64).clamp(-0.5, 0.5);
    }

    // Totals-only calibration: extreme totals are harder to project.
    if matches!(candidate.market, Market::Total) {
        if let Some(total) = ctx.total_line {
            if total > 240.0 || total < 195.0 {
                adj.totals_calibration_adjustment = (-0.4_f64).clamp(-0.75, 0.75);
            }
        }
    }

    // Hook penalty: a half-point spread/total is historically less
    // reliable than a whole number; always <= 0 (spec §4.2.2).
    if let Some(spread) = ctx.spread_line {
        let frac = spread.abs().fract();
        if (frac - 0.5).abs() < 1e-9 {
            adj.hook_penalty = (-0.1_f64).clamp(-0.25, 0.0);
        }
    }

    // SHADOW MODE (SPEC_FULL.md §2, resolving spec §9's open question):
    // the computed boost is always recorded on `Pick.expert_consensus_boost`
    // for audit visibility, shadowed or not. The formula's clamp is
    // `[0, +0.35]`, always non-negative, so a consensus *against* the pick
    // never produces a negative contribution here. Shadowing itself is
    // applied later, only to the term that enters the final-score sum.
    let raw_consensus_boost = match ctx.expert_consensus_pct {
        Some(pct) if pct >= 80.0 => 0.3,
        _ => 0.0,
    };
    adj.expert_consensus_boost = raw_consensus_boost.clamp(0.0, 0.35);

    // Prop correlation: only meaningful for player props, where a
    // supportive environment (pace, vegas total, injuries) correlates
    // the prop with the game script.
    if candidate.market.is_player_prop() {
        adj.prop_correlation_adjustment = if ctx.environment_supports_prop {
            0.15_f64.clamp(-0.20, 0.20)
        } else {
            (-0.1_f64).clamp(-0.20, 0.20)
        };
    }

    adj
}

/// Derive `context_modifier` (spec §3: `∈ [-0.35, +0.35]`), a term in
/// the final-score sum distinct from the six named adjustments above.
/// Grounded in situational factors already carried on `Context` for the
/// AI engine (rest days, recent form) rather than market/line signals —
/// this is literally the "context" the name suggests, separate from the
/// market-structure and discrete-trigger adjustments.
///
/// `context_score` (spec §9 open question, resolved in SPEC_FULL.md §2)
/// is this function's unclamped precursor: informational only, never
/// read back into scoring.
pub fn derive_context_modifier(ctx: &Context) -> (f64, f64) {
    let rest_component = ctx.ai_features.rest_days.unwrap_or(0.0) * 0.2;
    let form_component = ctx.ai_features.recent_form.unwrap_or(0.0) * 0.15;
    let context_score = rest_component + form_component;
    let context_modifier = context_score.clamp(-0.35, 0.35);
    (context_score, context_modifier)
}

/// The full output of scoring one candidate, before it is written into
/// a `Pick` (separated so the contradiction gate and slate builder can
/// inspect intermediate fields without re-deriving them).
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub pick: Pick,
}

/// Score a single candidate end to end (spec §4.2.2's pipeline order):
/// four base engines -> weighted `base_4` -> context adjustments
/// (clamped into `context_modifier`) -> additive boosts (clamped by
/// `TOTAL_BOOST_CAP`) -> final clamp to `[0, 10]` -> tier assignment.
///
/// Pure and non-suspending per engine (spec §5): this function itself
/// does no I/O — `ctx` must already hold every pre-fetched external
/// input.
pub fn score_candidate(
    candidate: &Candidate,
    ctx: &Context,
    shadow_expert_consensus: bool,
) -> Pick {
    let ai_out = ai::score(ctx);
    let research_out = research::score(candidate, ctx);
    let esoteric_out = esoteric::score(candidate, ctx);
    let jarvis_out = jarvis::score(candidate, ctx);

    let base_4 = ai_out.score * AI_WEIGHT
        + research_out.score * RESEARCH_WEIGHT
        + esoteric_out.score * ESOTERIC_WEIGHT
        + jarvis_out.score * JARVIS_WEIGHT;

    let context_adjustments = derive_context_adjustments(candidate, ctx);
    let (context_score, context_modifier) = derive_context_modifier(ctx);

    // Jason Sim's confidence gates (spec §4.2.4: "blocks if ... base_4 <
    // 7.2", "positive boost only if base_prop_score >= 6.8") read the
    // weighted four-engine sum literally — not `context_modifier`-shifted
    // — so `base_4` itself is passed here, unmodified.
    let (jason_sim, jason_sim_reasons) = jason_sim_boost(&candidate.market, base_4, ctx);
    let candidate_key = (
        candidate.event_id.clone(),
        candidate.market.market_str(),
        candidate.side.upper(),
        format!("{:.2}", candidate.rounded_line()),
    );
    let msrf = msrf_boost(ctx, &candidate_key);
    let (confluence, _confluence_level, confluence_reasons) = confluence_boost(&BoostInputs {
        research_score: research_out.score,
        esoteric_score: esoteric_out.score,
        jarvis_active: jarvis_out.jarvis_active,
        sharp_status_success: matches!(
            research_out.sharp_status,
            crate::domain::pick::SignalStatus::Success
        ),
        jason_sim_boost: jason_sim,
    });
    let serp = serp_boost(ctx);

    let boosts_total = total_boosts(confluence, msrf, jason_sim, serp);

    let prop_correlation_adjustment = context_adjustments.prop_correlation_adjustment;

    // Shadow mode zeroes the expert-consensus term only here, at the
    // point it enters the final-score sum — `Pick.expert_consensus_boost`
    // itself always carries the computed value, shadowed or not, so audit
    // tooling can see what the signal would have contributed.
    let expert_consensus_term = if shadow_expert_consensus {
        0.0
    } else {
        context_adjustments.expert_consensus_boost.clamp(0.0, 0.35)
    };

    // Final-score formula (spec §4.2.2): base_4, the clamped
    // context_modifier, total_boosts, and each of the six named
    // adjustments (already individually clamped in
    // `derive_context_adjustments`) are all distinct additive terms.
    let final_score = (base_4
        + context_modifier.clamp(-0.35, 0.35)
        + boosts_total
        + context_adjustments.ensemble_adjustment
        + context_adjustments.live_adjustment.clamp(-0.5, 0.5)
        + context_adjustments
            .totals_calibration_adjustment
            .clamp(-0.75, 0.75)
        + context_adjustments.hook_penalty.clamp(-0.25, 0.0)
        + expert_consensus_term
        + prop_correlation_adjustment.clamp(-0.20, 0.20))
    .clamp(0.0, 10.0);

    let engine_scores = EngineScores {
        ai: ai_out.score,
        research: research_out.score,
        esoteric: esoteric_out.score,
        jarvis: jarvis_out.jarvis_rs,
    };
    let tier = assign_tier(&engine_scores, final_score);
    let (titanium_count, titanium_qualified, titanium_triggered) =
        titanium_check(&engine_scores, final_score);

    let mut research_reasons = research_out.reasons;
    research_reasons.extend(confluence_reasons);
    research_reasons.extend(jason_sim_reasons);

    let pick_id = compute_pick_id_for(candidate);
    let mut jarvis_inputs_used: HashMap<String, f64> = HashMap::new();
    jarvis_inputs_used.extend(jarvis_out.jarvis_inputs_used);

    Pick {
        pick_id,
        sport: candidate.sport,
        event_id: candidate.event_id.clone(),
        market: candidate.market.clone(),
        side: candidate.side.clone(),
        line: candidate.line,
        player_id: candidate.player_id.clone(),
        player_name: candidate.player_name.clone(),
        book: candidate.book.clone(),
        odds_american: candidate.odds_american,

        ai_score: ai_out.score,
        research_score: research_out.score,
        esoteric_score: esoteric_out.score,
        jarvis_score: jarvis_out.jarvis_rs,
        context_modifier,
        context_score,
        final_score,
        tier,

        confluence_boost: confluence,
        msrf_boost: msrf,
        jason_sim_boost: jason_sim,
        serp_boost: serp,
        ensemble_adjustment: context_adjustments.ensemble_adjustment,
        live_adjustment: context_adjustments.live_adjustment,
        totals_calibration_adjustment: context_adjustments.totals_calibration_adjustment,
        hook_penalty: context_adjustments.hook_penalty,
        expert_consensus_boost: context_adjustments.expert_consensus_boost,
        prop_correlation_adjustment,

        ai_reasons: ai_out.reasons,
        research_reasons,
        esoteric_reasons: esoteric_out.reasons,
        jarvis_reasons: jarvis_out.jarvis_reasons,

        ai_mode: ai_out.mode,

        sharp_strength: research_out.sharp_strength,
        sharp_source_api: research_out.sharp_source_api,
        sharp_status: research_out.sharp_status,
        sharp_raw_inputs: research_out.sharp_raw_inputs,
        line_source_api: research_out.line_source_api,
        line_variance: research_out.line_variance,

        jarvis_rs: jarvis_out.jarvis_rs,
        jarvis_active: jarvis_out.jarvis_active,
        jarvis_hits_count: jarvis_out.jarvis_hits_count,
        jarvis_triggers_hit: jarvis_out.jarvis_triggers_hit,
        jarvis_fail_reasons: jarvis_out.jarvis_fail_reasons,
        jarvis_inputs_used,

        titanium_triggered,
        titanium_count,
        titanium_qualified_engines: titanium_qualified.into_iter().map(String::from).collect(),

        created_at: Utc::now(),
        event_start_time_et: display_et_clock(ctx.event_start_time),
        et_date: ctx.et_date.to_string(),

        result: None,
        actual_value: None,
        graded_at: None,
        beat_clv: None,
        process_grade: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Market, Side};
    use crate::domain::event::Sport;
    use crate::time_et::EtDate;

    fn total_candidate() -> Candidate {
        Candidate {
            sport: Sport::Nba,
            event_id: "e_1".into(),
            market: Market::Total,
            side: Side::Under,
            line: 220.5,
            odds_american: Some(-110),
            book: "draftkings".into(),
            player_id: None,
            player_name: None,
        }
    }

    #[test]
    fn score_candidate_stays_in_bounds_and_sets_pick_id() {
        let ctx = Context {
            et_date: EtDate::from_ymd(2026, 1, 29).unwrap(),
            ..Context::default()
        };
        let pick = score_candidate(&total_candidate(), &ctx, true);
        assert!(pick.final_score >= 0.0 && pick.final_score <= 10.0);
        assert_eq!(pick.pick_id.len(), 12);
    }

    #[test]
    fn shadow_mode_records_boost_but_excludes_it_from_final_score() {
        let ctx = Context {
            et_date: EtDate::from_ymd(2026, 1, 29).unwrap(),
            expert_consensus_pct: Some(90.0),
            ..Context::default()
        };
        let shadowed = score_candidate(&total_candidate(), &ctx, true);
        let unshadowed = score_candidate(&total_candidate(), &ctx, false);

        // Recorded for audit visibility regardless of shadow mode.
        assert_eq!(shadowed.expert_consensus_boost, 0.3);
        assert_eq!(unshadowed.expert_consensus_boost, 0.3);

        // Only the unshadowed pick's final_score actually includes it.
        assert!((unshadowed.final_score - shadowed.final_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn titanium_fields_consistent_with_tier_rs_authority() {
        let ctx = Context {
            et_date: EtDate::from_ymd(2026, 1, 29).unwrap(),
            ..Context::default()
        };
        let pick = score_candidate(&total_candidate(), &ctx, true);
        let engine_scores = EngineScores {
            ai: pick.ai_score,
            research: pick.research_score,
            esoteric: pick.esoteric_score,
            jarvis: pick.jarvis_score,
        };
        let (count, _, triggered) = titanium_check(&engine_scores, pick.final_score);
        assert_eq!(pick.titanium_count, count);
        assert_eq!(pick.titanium_triggered, triggered);
    }
}
