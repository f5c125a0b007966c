//! `SplitsSource` — the opaque sharp-money splits interface (spec §6.2).

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharpSide {
    Home,
    Away,
    Over,
    Under,
}

#[derive(Debug, Clone)]
pub struct SplitsSnapshot {
    pub ticket_pct: f64,
    pub money_pct: f64,
    pub sharp_side: Option<SharpSide>,
}

/// Either a snapshot, or `Unavailable` — the caller must never synthesize
/// `sharp_strength` from a different data source when this is `Unavailable`
/// (spec §4.2.3).
#[derive(Debug, Clone)]
pub enum SplitsResult {
    Snapshot(SplitsSnapshot),
    Unavailable,
}

#[async_trait::async_trait]
pub trait SplitsSource: Send + Sync {
    async fn fetch_splits(&self, event_id: &str) -> Result<SplitsResult>;
}
