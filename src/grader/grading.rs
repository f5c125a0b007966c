//! Market-specific grading rules (spec §4.4). Each is a pure function
//! over a pick's `(market, side, line)` and the event's final outcome.

use crate::domain::candidate::{Market, Side};
use crate::domain::event::FinalScore;
use crate::domain::pick::GradeResult;

/// Grade a game-market pick (`SPREAD`, `MONEYLINE`, `TOTAL`, `SHARP`)
/// against the event's final score. `SHARP` is legacy and must be
/// graded exactly as `MONEYLINE`, never by line variance (spec §4.4).
pub fn grade_game_market(market: &Market, side: &Side, line: f64, score: &FinalScore) -> (GradeResult, f64) {
    match market {
        Market::Moneyline | Market::Sharp => grade_moneyline(side, score),
        Market::Spread => grade_spread(side, line, score),
        Market::Total => grade_total(side, line, score),
        Market::PlayerStat(_) => {
            unreachable!("player-stat markets are graded via grade_player_prop")
        }
    }
}

fn grade_moneyline(side: &Side, score: &FinalScore) -> (GradeResult, f64) {
    if (score.home - score.away).abs() < f64::EPSILON {
        return (GradeResult::Void, score.home - score.away);
    }
    let home_won = score.home > score.away;
    let picked_home = matches!(side, Side::Team(team) if is_home_label(team));
    let won = (home_won && picked_home) || (!home_won && !picked_home);
    let grade = if won { GradeResult::Win } else { GradeResult::Loss };
    (grade, score.home - score.away)
}

/// Whether a team label refers to the home side. The concrete adapter
/// that produces `Candidate.side` is responsible for always using the
/// literal string `"HOME"`/`"AWAY"` (or the team's own name consistently
/// matched against `Event.home`/`Event.away` upstream); this module only
/// understands the `"HOME"` sentinel, which callers normalize to before
/// scoring spread/moneyline candidates.
fn is_home_label(team: &str) -> bool {
    team.eq_ignore_ascii_case("HOME")
}

fn grade_spread(side: &Side, line: f64, score: &FinalScore) -> (GradeResult, f64) {
    let picked_home = matches!(side, Side::Team(team) if is_home_label(team));
    let (picked_score, opponent_score) = if picked_home {
        (score.home, score.away)
    } else {
        (score.away, score.home)
    };
    let adjusted = picked_score + line;
    if (adjusted - opponent_score).abs() < f64::EPSILON {
        return (GradeResult::Push, adjusted - opponent_score);
    }
    let grade = if adjusted > opponent_score {
        GradeResult::Win
    } else {
        GradeResult::Loss
    };
    (grade, adjusted - opponent_score)
}

fn grade_total(side: &Side, line: f64, score: &FinalScore) -> (GradeResult, f64) {
    let total = score.home + score.away;
    if (total - line).abs() < f64::EPSILON {
        return (GradeResult::Push, total);
    }
    let over_hits = total > line;
    let won = match side {
        Side::Over => over_hits,
        Side::Under => !over_hits,
        Side::Team(_) => false,
    };
    let grade = if won { GradeResult::Win } else { GradeResult::Loss };
    (grade, total)
}

/// Grade a `PLAYER_<stat>` pick against the player's actual stat value.
pub fn grade_player_prop(side: &Side, line: f64, actual: f64) -> (GradeResult, f64) {
    if (actual - line).abs() < f64::EPSILON {
        return (GradeResult::Push, actual);
    }
    let over_hits = actual > line;
    let won = match side {
        Side::Over => over_hits,
        Side::Under => !over_hits,
        Side::Team(_) => false,
    };
    let grade = if won { GradeResult::Win } else { GradeResult::Loss };
    (grade, actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(home: f64, away: f64) -> FinalScore {
        FinalScore {
            home,
            away,
            status: crate::domain::event::GameStatus::Final,
        }
    }

    #[test]
    fn total_grades_win_loss_push() {
        let (g, actual) = grade_total(&Side::Under, 223.5, &score(110.0, 113.0));
        assert_eq!(g, GradeResult::Win);
        assert_eq!(actual, 223.0);

        let (g, _) = grade_total(&Side::Over, 223.5, &score(110.0, 113.0));
        assert_eq!(g, GradeResult::Loss);

        let (g, _) = grade_total(&Side::Under, 223.0, &score(110.0, 113.0));
        assert_eq!(g, GradeResult::Push);
    }

    #[test]
    fn spread_covers_with_adjusted_margin() {
        // 100 - 5.5 = 94.5 < 96, favorite fails to cover.
        let (g, _) = grade_spread(&Side::Team("HOME".into()), -5.5, &score(100.0, 96.0));
        assert_eq!(g, GradeResult::Loss);

        // 100 - 3.0 = 97.0 > 96, favorite covers.
        let (g, _) = grade_spread(&Side::Team("HOME".into()), -3.0, &score(100.0, 96.0));
        assert_eq!(g, GradeResult::Win);
    }

    #[test]
    fn spread_push_on_exact_number() {
        let (g, _) = grade_spread(&Side::Team("AWAY".into()), 4.0, &score(100.0, 96.0));
        assert_eq!(g, GradeResult::Push); // 96 + 4 = 100 == 100
    }

    #[test]
    fn moneyline_ties_are_void() {
        let (g, _) = grade_moneyline(&Side::Team("HOME".into()), &score(100.0, 100.0));
        assert_eq!(g, GradeResult::Void);
    }
}
