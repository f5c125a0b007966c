//! Learned per-(sport, market) signal weights (spec §3: WeightVector).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maximum absolute change to any single weight per audit cycle (spec §3, §4.4).
pub const MAX_WEIGHT_ADJUST_PER_AUDIT: f64 = 0.05;
/// Per-signal learning step before capping (spec §4.4).
pub const WEIGHT_ADJUST_STEP: f64 = 0.01;

/// Signal name -> non-negative weight, used by Engine 2 (Research) and
/// Engine 4 (Jarvis). Weights in a group must sum to 1.0 after any
/// adjustment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightGroup(pub HashMap<String, f64>);

impl WeightGroup {
    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Renormalize in place so weights sum to exactly 1.0. No-op on an
    /// empty or all-zero group.
    pub fn renormalize(&mut self) {
        let total = self.sum();
        if total <= 0.0 {
            return;
        }
        for w in self.0.values_mut() {
            *w /= total;
        }
    }

    /// Apply a signed delta to one signal's weight, capped at
    /// `MAX_WEIGHT_ADJUST_PER_AUDIT` in magnitude, then renormalize.
    pub fn adjust(&mut self, signal: &str, delta: f64) {
        let capped = delta.clamp(-MAX_WEIGHT_ADJUST_PER_AUDIT, MAX_WEIGHT_ADJUST_PER_AUDIT);
        let entry = self.0.entry(signal.to_string()).or_insert(0.0);
        *entry = (*entry + capped).max(0.0);
        self.renormalize();
    }
}

/// `{sport: {market: {signal_name: weight}}}` — the on-disk shape of
/// `weights.json` (spec §6.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightVector(pub HashMap<String, HashMap<String, WeightGroup>>);

impl WeightVector {
    pub fn group(&self, sport: &str, market: &str) -> Option<&WeightGroup> {
        self.0.get(sport).and_then(|m| m.get(market))
    }

    pub fn group_mut(&mut self, sport: &str, market: &str) -> &mut WeightGroup {
        self.0
            .entry(sport.to_string())
            .or_default()
            .entry(market.to_string())
            .or_default()
    }
}
