//! Engine 2: Research — market signals (spec §4.2.1, §4.2.3).
//!
//! Two independent sub-signals that must remain unconflated: `sharp`
//! (splits-provider only) and `line` (cross-book odds variance only).
//! When the sharp provider is unavailable, the Odds-only fallback is
//! permitted for the composite score, but `sharp_*` fields must never be
//! populated from line data.

use crate::domain::candidate::Candidate;
use crate::domain::pick::{SharpStrength, SignalStatus};
use crate::sources::splits::{SharpSide, SplitsResult};

use super::super::context::Context;

pub struct ResearchOutput {
    pub score: f64,
    pub reasons: Vec<String>,
    pub sharp_strength: SharpStrength,
    pub sharp_source_api: Option<String>,
    pub sharp_status: SignalStatus,
    pub sharp_raw_inputs: Option<serde_json::Value>,
    pub line_source_api: Option<String>,
    pub line_variance: Option<f64>,
}

pub fn score(candidate: &Candidate, ctx: &Context) -> ResearchOutput {
    let (sharp_strength, sharp_status, sharp_raw_inputs, sharp_reason) =
        compute_sharp(candidate, ctx);
    let (line_component, line_variance, line_reason) = compute_line_variance(candidate, ctx);

    let sharp_component = match sharp_strength {
        SharpStrength::None => 0.0,
        SharpStrength::Mild => 3.0,
        SharpStrength::Moderate => 6.0,
        SharpStrength::Strong => 9.0,
    };

    // Odds-only fallback permitted when sharp is unavailable, but the
    // fallback never writes into `sharp_*` (spec §4.2.3).
    let composite = if matches!(sharp_status, SignalStatus::NoData | SignalStatus::Disabled) {
        line_component
    } else {
        0.5 * sharp_component + 0.5 * line_component
    };

    let mut reasons = Vec::new();
    if let Some(r) = sharp_reason {
        reasons.push(r);
    }
    if let Some(r) = line_reason {
        reasons.push(r);
    }
    if reasons.is_empty() {
        reasons.push("no market signal available".to_string());
    }

    ResearchOutput {
        score: composite.clamp(0.0, 10.0),
        reasons,
        sharp_strength,
        sharp_source_api: if matches!(sharp_status, SignalStatus::Success) {
            Some("splits_provider".to_string())
        } else {
            None
        },
        sharp_status,
        sharp_raw_inputs,
        line_source_api: if ctx.odds_snapshot.is_some() {
            Some("odds_snapshot".to_string())
        } else {
            None
        },
        line_variance,
    }
}

fn compute_sharp(
    candidate: &Candidate,
    ctx: &Context,
) -> (SharpStrength, SignalStatus, Option<serde_json::Value>, Option<String>) {
    match &ctx.splits {
        None => (SharpStrength::None, SignalStatus::Disabled, None, None),
        Some(SplitsResult::Unavailable) => (SharpStrength::None, SignalStatus::NoData, None, None),
        Some(SplitsResult::Snapshot(snap)) => {
            let divergence = (snap.money_pct - snap.ticket_pct).abs();
            let side_matches = match (&candidate.side, snap.sharp_side) {
                (crate::domain::candidate::Side::Over, Some(SharpSide::Over)) => true,
                (crate::domain::candidate::Side::Under, Some(SharpSide::Under)) => true,
                (crate::domain::candidate::Side::Team(_), Some(SharpSide::Home))
                | (crate::domain::candidate::Side::Team(_), Some(SharpSide::Away)) => true,
                _ => false,
            };

            let strength = if !side_matches {
                SharpStrength::None
            } else if divergence >= 20.0 {
                SharpStrength::Strong
            } else if divergence >= 10.0 {
                SharpStrength::Moderate
            } else if divergence >= 5.0 {
                SharpStrength::Mild
            } else {
                SharpStrength::None
            };

            let raw = serde_json::json!({
                "ticket_pct": snap.ticket_pct,
                "money_pct": snap.money_pct,
                "divergence": divergence,
            });
            let reason = if strength != SharpStrength::None {
                Some(format!("sharp {} (divergence {:.1}pts)", strength.as_str(), divergence))
            } else {
                None
            };
            (strength, SignalStatus::Success, Some(raw), reason)
        }
    }
}

fn compute_line_variance(candidate: &Candidate, ctx: &Context) -> (f64, Option<f64>, Option<String>) {
    let Some(snapshot) = &ctx.odds_snapshot else {
        return (0.0, None, None);
    };
    let key = (
        candidate.event_id.clone(),
        candidate.market.market_str(),
        candidate.side.upper(),
        format!("{:.2}", candidate.rounded_line()),
    );
    let Some(by_book) = snapshot.by_candidate.get(&key) else {
        return (0.0, None, None);
    };
    if by_book.len() < 2 {
        return (0.0, None, None);
    }

    let values: Vec<f64> = by_book.values().map(|&o| o as f64).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let stdev = variance.sqrt();

    // Odds typically span hundreds of points; scale down so a ~50pt
    // stdev maps near the top of [0,10].
    let component = (stdev / 5.0).clamp(0.0, 10.0);
    let reason = if component > 2.0 {
        Some(format!("line variance across {} books (stdev {:.1})", by_book.len(), stdev))
    } else {
        None
    };
    (component, Some(stdev), reason)
}
