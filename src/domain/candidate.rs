//! (event, market, side, line) tuples considered for scoring (spec §3: Candidate).

use serde::{Deserialize, Serialize};

use super::event::Sport;

/// Betting markets. `PlayerStat` carries the uppercase stat name so that
/// `market_str()` reproduces the `PLAYER_<STAT>` wire form (e.g.
/// `PLAYER_POINTS`) without a combinatorial explosion of enum variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stat")]
pub enum Market {
    Spread,
    Moneyline,
    Total,
    PlayerStat(String),
    /// Legacy market kept only because the Auto-Grader must still grade
    /// it (as a moneyline, never by line variance — spec §4.4).
    Sharp,
}

impl Market {
    pub fn market_str(&self) -> String {
        match self {
            Market::Spread => "SPREAD".to_string(),
            Market::Moneyline => "MONEYLINE".to_string(),
            Market::Total => "TOTAL".to_string(),
            Market::PlayerStat(stat) => format!("PLAYER_{}", stat.to_uppercase()),
            Market::Sharp => "SHARP".to_string(),
        }
    }

    pub fn is_player_prop(&self) -> bool {
        matches!(self, Market::PlayerStat(_))
    }

    /// `subject` component of the contradiction-gate unique key (spec §4.2.6):
    /// player props key by player, everything else keys by `"Game"`.
    pub fn subject(&self, player_id: Option<&str>) -> String {
        if self.is_player_prop() {
            player_id.unwrap_or("unknown_player").to_string()
        } else {
            "Game".to_string()
        }
    }

    /// Inverse of [`Market::market_str`], for adapters that hand back
    /// the wire form (e.g. an odds snapshot key) and need a `Market`.
    pub fn from_market_str(s: &str) -> Option<Market> {
        match s {
            "SPREAD" => Some(Market::Spread),
            "MONEYLINE" => Some(Market::Moneyline),
            "TOTAL" => Some(Market::Total),
            "SHARP" => Some(Market::Sharp),
            other => other
                .strip_prefix("PLAYER_")
                .map(|stat| Market::PlayerStat(stat.to_string())),
        }
    }
}

/// Which side of a candidate was taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
    Team(String),
}

impl Side {
    pub fn as_str(&self) -> String {
        match self {
            Side::Over => "Over".to_string(),
            Side::Under => "Under".to_string(),
            Side::Team(name) => name.clone(),
        }
    }

    pub fn upper(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Inverse of [`Side::upper`] for the `Over`/`Under` cases; a team
    /// side round-trips through its own uppercase name (the `"HOME"`/
    /// `"AWAY"` sentinel convention grading uses — see `grading.rs`).
    pub fn from_side_str(s: &str) -> Option<Side> {
        match s {
            "OVER" => Some(Side::Over),
            "UNDER" => Some(Side::Under),
            other if !other.is_empty() => Some(Side::Team(other.to_string())),
            _ => None,
        }
    }

    /// The "opposite side" relation used by the contradiction gate
    /// (spec §4.2.6): Over/Under invert; team sides never compare equal
    /// to each other here (spreads/ML opposition is driven by sign of
    /// `line` and distinct team names, handled by the caller).
    pub fn is_opposite_of(&self, other: &Side) -> bool {
        matches!(
            (self, other),
            (Side::Over, Side::Under) | (Side::Under, Side::Over)
        )
    }
}

/// Sportsbook identifiers, ordered by preference (spec §3).
pub const BOOK_PREFERENCE: &[&str] = &["draftkings", "fanduel", "betmgm", "caesars", "pinnacle"];

/// Index into `BOOK_PREFERENCE`; unknown books sort after all known ones.
pub fn book_preference_rank(book: &str) -> usize {
    BOOK_PREFERENCE
        .iter()
        .position(|b| b.eq_ignore_ascii_case(book))
        .unwrap_or(BOOK_PREFERENCE.len())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub sport: Sport,
    pub event_id: String,
    pub market: Market,
    pub side: Side,
    /// May be 0 for pick'em spreads or moneylines.
    pub line: f64,
    /// Never fabricated: `None` when the book did not quote a price.
    pub odds_american: Option<i32>,
    pub book: String,
    pub player_id: Option<String>,
    pub player_name: Option<String>,
}

impl Candidate {
    /// `round(line, 2)` as used by the pick fingerprint (spec §3).
    pub fn rounded_line(&self) -> f64 {
        (self.line * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_prop_market_str() {
        let m = Market::PlayerStat("points".to_string());
        assert_eq!(m.market_str(), "PLAYER_POINTS");
        assert!(m.is_player_prop());
    }

    #[test]
    fn over_under_are_opposites() {
        assert!(Side::Over.is_opposite_of(&Side::Under));
        assert!(!Side::Over.is_opposite_of(&Side::Over));
    }

    #[test]
    fn book_preference_orders_known_books_first() {
        assert!(book_preference_rank("draftkings") < book_preference_rank("unknown_book"));
    }
}
