//! Default adapters used when no vendor integration is configured
//! (spec §6.2: business logic never hard-codes a vendor identity, and
//! the concrete market-data/results/splits vendors are injected from
//! outside this crate). These let the service boot and the scheduler
//! run cleanly with zero upstreams wired — every call degrades to
//! "nothing available" rather than failing, so `StorageHealth` and
//! `SchedulerStatus` stay meaningful even before a real adapter exists.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::candidate::Candidate;
use crate::domain::event::{Event, Sport};
use crate::sources::market_data::{MarketDataSource, OddsSnapshot};
use crate::sources::results::{FetchOutcome, ResultsSource};
use crate::sources::splits::{SplitsResult, SplitsSource};

pub struct NullMarketDataSource;

#[async_trait]
impl MarketDataSource for NullMarketDataSource {
    async fn fetch_events(&self, _sport: Sport) -> Result<Vec<Event>> {
        Ok(vec![])
    }

    async fn fetch_props(&self, _sport: Sport) -> Result<Vec<Candidate>> {
        Ok(vec![])
    }

    async fn get_odds_snapshot(&self, _sport: Sport) -> Result<OddsSnapshot> {
        Ok(OddsSnapshot::empty())
    }
}

pub struct NullResultsSource;

#[async_trait]
impl ResultsSource for NullResultsSource {
    async fn fetch_final_score(
        &self,
        _event_id: &str,
    ) -> Result<FetchOutcome<crate::domain::event::FinalScore>> {
        Ok(FetchOutcome::NotFound)
    }

    async fn fetch_player_stat(
        &self,
        _player_id: &str,
        _event_id: &str,
        _stat: &str,
    ) -> Result<FetchOutcome<f64>> {
        Ok(FetchOutcome::NotFound)
    }
}

pub struct NullSplitsSource;

#[async_trait]
impl SplitsSource for NullSplitsSource {
    async fn fetch_splits(&self, _event_id: &str) -> Result<SplitsResult> {
        Ok(SplitsResult::Unavailable)
    }
}
