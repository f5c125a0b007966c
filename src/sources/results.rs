//! `ResultsSource` — the opaque upstream results interface (spec §6.2).

use anyhow::Result;

use crate::domain::event::FinalScore;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(T),
    NotFound,
}

#[async_trait::async_trait]
pub trait ResultsSource: Send + Sync {
    async fn fetch_final_score(&self, event_id: &str) -> Result<FetchOutcome<FinalScore>>;

    async fn fetch_player_stat(
        &self,
        player_id: &str,
        event_id: &str,
        stat: &str,
    ) -> Result<FetchOutcome<f64>>;
}
