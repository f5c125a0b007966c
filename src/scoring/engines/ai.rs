//! Engine 1: AI — ensemble of statistical/ML features over player and
//! team features (spec §4.2.1, §4.2.3).

use crate::domain::pick::AiMode;

use super::super::context::{AiFeatures, Context};

pub struct AiOutput {
    pub score: f64,
    pub reasons: Vec<String>,
    pub mode: AiMode,
}

/// Full feature signature the trained ensemble expects. A mismatch (any
/// feature missing) triggers the heuristic fallback rather than a panic
/// (spec §4.2.3: "Never raises").
const ENSEMBLE_SIGNATURE_SIZE: usize = 5;

/// `(Candidate, Context) -> (score, reasons)`, pure and non-suspending
/// (spec §5). Never fails: an absent or malformed feature set degrades to
/// a heuristic, it never raises.
pub fn score(ctx: &Context) -> AiOutput {
    let f = &ctx.ai_features;
    if f.present_count() == ENSEMBLE_SIGNATURE_SIZE {
        ensemble_score(f)
    } else {
        heuristic_fallback(f)
    }
}

fn ensemble_score(f: &AiFeatures) -> AiOutput {
    // Weighted blend of normalized features. Each raw feature is assumed
    // pre-normalized to roughly [0,1] by the feature-assembly stage
    // (outside the scope of this pipeline); this blend just weights and
    // rescales to [0,10].
    let weights = [0.25, 0.2, 0.25, 0.15, 0.15];
    let values = [
        f.defensive_rank.unwrap(),
        f.pace.unwrap(),
        f.usage_vacuum.unwrap(),
        f.rest_days.unwrap(),
        f.recent_form.unwrap(),
    ];
    let blended: f64 = weights.iter().zip(values.iter()).map(|(w, v)| w * v).sum();
    let score = (blended * 10.0).clamp(0.0, 10.0);

    let mut reasons = vec![format!("ensemble blend over {} features", values.len())];
    if values[4] > 0.7 {
        reasons.push("strong recent form".to_string());
    }
    if values[2] > 0.7 {
        reasons.push("significant usage vacuum".to_string());
    }

    AiOutput {
        score,
        reasons,
        mode: AiMode::Model,
    }
}

fn heuristic_fallback(f: &AiFeatures) -> AiOutput {
    let present: Vec<f64> = [
        f.defensive_rank,
        f.pace,
        f.usage_vacuum,
        f.rest_days,
        f.recent_form,
    ]
    .into_iter()
    .flatten()
    .collect();

    let score = if present.is_empty() {
        5.0 // neutral: no signal either way
    } else {
        let avg: f64 = present.iter().sum::<f64>() / present.len() as f64;
        (avg * 10.0).clamp(0.0, 10.0)
    };

    AiOutput {
        score,
        reasons: vec![format!(
            "heuristic fallback over {} of {} features",
            present.len(),
            ENSEMBLE_SIGNATURE_SIZE
        )],
        mode: AiMode::HeuristicFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_when_features_incomplete() {
        let mut ctx = Context::default();
        ctx.ai_features.pace = Some(0.5);
        let out = score(&ctx);
        assert_eq!(out.mode, AiMode::HeuristicFallback);
        assert!(out.score >= 0.0 && out.score <= 10.0);
    }

    #[test]
    fn uses_ensemble_when_signature_complete() {
        let mut ctx = Context::default();
        ctx.ai_features = AiFeatures {
            defensive_rank: Some(0.8),
            pace: Some(0.6),
            usage_vacuum: Some(0.7),
            rest_days: Some(0.5),
            recent_form: Some(0.9),
        };
        let out = score(&ctx);
        assert_eq!(out.mode, AiMode::Model);
        assert!(out.score >= 0.0 && out.score <= 10.0);
    }

    #[test]
    fn neutral_score_with_zero_features() {
        let ctx = Context::default();
        let out = score(&ctx);
        assert_eq!(out.score, 5.0);
    }
}
