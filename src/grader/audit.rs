//! `Audit(days_back)` (spec §4.4): per-(sport, market) hit-rate, MAE,
//! CLV, and bias over a recent window of graded picks, followed by the
//! weight adjuster.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::domain::pick::{GradeResult, Pick};
use crate::domain::weights::{WeightVector, MAX_WEIGHT_ADJUST_PER_AUDIT, WEIGHT_ADJUST_STEP};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAuditReport {
    pub sport: String,
    pub market: String,
    pub sample_count: u64,
    pub hit_rate: f64,
    pub mae: f64,
    pub bias: f64,
    /// Fraction of graded picks that beat the closing line, among those
    /// where `beat_clv` was recorded. `None` when no pick in the group
    /// carries a `beat_clv` value (no closing-line integration wired).
    pub clv: Option<f64>,
    pub weight_diffs: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditReport {
    pub groups: Vec<GroupAuditReport>,
    pub generated_at: Option<DateTime<Utc>>,
}

/// `realized_result`: WIN -> 1.0, PUSH -> 0.5, LOSS -> 0.0. VOID picks
/// are excluded from every audit statistic (spec §4.4 doesn't define a
/// VOID contribution, and a void outcome carries no betting signal).
fn realized_result(result: GradeResult) -> Option<f64> {
    match result {
        GradeResult::Win => Some(1.0),
        GradeResult::Push => Some(0.5),
        GradeResult::Loss => Some(0.0),
        GradeResult::Void => None,
    }
}

/// `predicted_edge`: the engine's implied win probability, `final_score / 10`.
fn predicted_edge(pick: &Pick) -> f64 {
    pick.final_score / 10.0
}

/// Per-signal contribution proxies recorded on a graded `Pick`, keyed to
/// match `WeightVector`'s `signal_name` space for Research ("sharp",
/// "line") and Jarvis (one entry per sacred-number trigger name).
fn signal_contributions(pick: &Pick) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    use crate::domain::pick::SignalStatus;
    if matches!(pick.sharp_status, SignalStatus::Success) {
        let sharp_value = match pick.sharp_strength {
            crate::domain::pick::SharpStrength::Strong => 0.9,
            crate::domain::pick::SharpStrength::Moderate => 0.6,
            crate::domain::pick::SharpStrength::Mild => 0.3,
            crate::domain::pick::SharpStrength::None => 0.0,
        };
        out.insert("sharp".to_string(), sharp_value);
    }
    if let Some(variance) = pick.line_variance {
        out.insert("line".to_string(), (variance / 50.0).clamp(0.0, 1.0));
    }
    for trigger in &pick.jarvis_triggers_hit {
        out.insert(trigger.clone(), 1.0);
    }
    out
}

/// Pearson correlation coefficient between two equal-length series.
/// Returns `0.0` for a degenerate (zero-variance or too-short) series
/// rather than `NaN`, since a weight adjustment of `NaN` would corrupt
/// `weights.json`.
fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() < 2 || xs.len() != ys.len() {
        return 0.0;
    }
    let mean_x = xs.to_vec().mean();
    let mean_y = ys.to_vec().mean();
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Run the audit over `picks` (already filtered to the `days_back`
/// window by the caller) grouped by `(sport, market)`, producing a
/// report and the adjusted `WeightVector` (spec §4.4 steps 1-4).
pub fn run_audit(picks: &[Pick], weights: &WeightVector, now: DateTime<Utc>) -> (AuditReport, WeightVector) {
    let mut by_group: HashMap<(String, String), Vec<&Pick>> = HashMap::new();
    for pick in picks {
        if !pick.is_graded() {
            continue;
        }
        by_group
            .entry((pick.sport.as_str().to_string(), pick.market.market_str()))
            .or_default()
            .push(pick);
    }

    let mut new_weights = weights.clone();
    let mut groups = Vec::new();

    for ((sport, market), group_picks) in by_group {
        let graded: Vec<&&Pick> = group_picks
            .iter()
            .filter(|p| realized_result(p.result.unwrap()).is_some())
            .collect();
        if graded.is_empty() {
            continue;
        }

        let wins = graded
            .iter()
            .filter(|p| p.result == Some(GradeResult::Win))
            .count();
        let losses = graded
            .iter()
            .filter(|p| p.result == Some(GradeResult::Loss))
            .count();
        let hit_rate = if wins + losses > 0 {
            wins as f64 / (wins + losses) as f64
        } else {
            0.0
        };

        let errors: Vec<f64> = graded
            .iter()
            .map(|p| (predicted_edge(p) - realized_result(p.result.unwrap()).unwrap()).abs())
            .collect();
        let mae = errors.clone().mean();

        let biases: Vec<f64> = graded
            .iter()
            .map(|p| predicted_edge(p) - realized_result(p.result.unwrap()).unwrap())
            .collect();
        let bias = biases.mean();

        let clv_samples: Vec<bool> = graded.iter().filter_map(|p| p.beat_clv).collect();
        let clv = if clv_samples.is_empty() {
            None
        } else {
            Some(clv_samples.iter().filter(|b| **b).count() as f64 / clv_samples.len() as f64)
        };

        // Weight learning (spec §4.4 steps 1-4): correlate each signal's
        // recorded contribution against the realized outcome across the
        // group's graded picks, then nudge that signal's weight toward
        // or away from the realized result.
        let outcomes: Vec<f64> = graded
            .iter()
            .map(|p| realized_result(p.result.unwrap()).unwrap())
            .collect();

        let mut signal_series: HashMap<String, Vec<f64>> = HashMap::new();
        for pick in &graded {
            let contributions = signal_contributions(pick);
            for (signal, value) in contributions {
                signal_series.entry(signal).or_default().push(value);
            }
        }

        let mut weight_diffs = HashMap::new();
        let weight_group = new_weights.group_mut(&sport, &market);
        for (signal, series) in &signal_series {
            if series.len() != outcomes.len() {
                continue; // a signal absent on some picks in the group; skip rather than misalign series
            }
            let correlation = pearson_correlation(series, &outcomes);
            let before = weight_group.0.get(signal).copied().unwrap_or(0.0);
            let delta = (correlation * WEIGHT_ADJUST_STEP).clamp(
                -MAX_WEIGHT_ADJUST_PER_AUDIT,
                MAX_WEIGHT_ADJUST_PER_AUDIT,
            );
            weight_group.adjust(signal, delta);
            let after = weight_group.0.get(signal).copied().unwrap_or(0.0);
            weight_diffs.insert(signal.clone(), after - before);
        }

        groups.push(GroupAuditReport {
            sport,
            market,
            sample_count: graded.len() as u64,
            hit_rate,
            mae,
            bias,
            clv,
            weight_diffs,
        });
    }

    (
        AuditReport {
            groups,
            generated_at: Some(now),
        },
        new_weights,
    )
}
