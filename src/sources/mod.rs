//! Upstream interfaces consumed by the core (spec §6.2). These are the
//! only seams to vendor-specific code; business logic never hard-codes
//! a vendor identity (spec §6.2).

pub mod market_data;
pub mod null;
pub mod results;
pub mod splits;

pub use market_data::{MarketDataSource, OddsSnapshot};
pub use null::{NullMarketDataSource, NullResultsSource, NullSplitsSource};
pub use results::ResultsSource;
pub use splits::{SharpSide, SplitsSource, SplitsSnapshot};
