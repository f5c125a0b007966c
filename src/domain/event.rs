//! Scheduled games (spec §3: Event).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    Nba,
    Nfl,
    Mlb,
    Nhl,
    Ncaab,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nba => "NBA",
            Sport::Nfl => "NFL",
            Sport::Mlb => "MLB",
            Sport::Nhl => "NHL",
            Sport::Ncaab => "NCAAB",
        }
    }

    pub const ALL: [Sport; 5] = [Sport::Nba, Sport::Nfl, Sport::Mlb, Sport::Nhl, Sport::Ncaab];
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled game, as reported by a `MarketDataSource`.
///
/// Invariant: for a `Candidate` derived from this event to be admitted by
/// the Slate Builder, `start_time` must fall within
/// `[00:00 ET on et_date, 00:00 ET on et_date+1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub sport: Sport,
    pub home: String,
    pub away: String,
    /// Always UTC. Rendered to ET only at the presentation edge.
    pub start_time: DateTime<Utc>,
}

/// Final result of a completed game, from a `ResultsSource`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalScore {
    pub home: f64,
    pub away: f64,
    pub status: GameStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Final,
    Live,
    Postponed,
    Cancelled,
}
