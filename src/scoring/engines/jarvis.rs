//! Engine 4: Jarvis — sacred-number gematria triggers (spec §4.2.1, §4.2.3).
//!
//! Additive-from-baseline scoring: starts at 4.5, each trigger that fires
//! adds a contribution, and stacked triggers decay by 0.70 per additional
//! hit. Seven diagnostic fields are emitted unconditionally, even when no
//! trigger fires (spec §4.2.3, property P12).

use crate::domain::candidate::Candidate;

use super::super::context::Context;

const BASELINE: f64 = 4.5;
const DECAY: f64 = 0.70;
/// "Sacred" numbers the gematria triggers look for in a line, total, or
/// digit-sum.
const SACRED_NUMBERS: [i64; 5] = [3, 7, 9, 11, 21];

pub struct JarvisOutput {
    pub jarvis_rs: f64,
    pub jarvis_active: bool,
    pub jarvis_hits_count: u32,
    pub jarvis_triggers_hit: Vec<String>,
    pub jarvis_reasons: Vec<String>,
    pub jarvis_fail_reasons: Vec<String>,
    pub jarvis_inputs_used: std::collections::HashMap<String, f64>,
}

struct Trigger {
    name: &'static str,
    contribution: f64,
    hit: bool,
}

pub fn score(candidate: &Candidate, ctx: &Context) -> JarvisOutput {
    // `line` comes from the candidate itself and is always present
    // (including 0 for pick'em spreads/moneylines); only `spread`/`total`
    // are ever absent, so the trigger scan below always has at least one
    // input to check (spec §4.2.3's "numeric inputs present" case).
    let mut inputs_used = std::collections::HashMap::new();
    inputs_used.insert("line".to_string(), candidate.line);
    if let Some(spread) = ctx.spread_line {
        inputs_used.insert("spread".to_string(), spread);
    }
    if let Some(total) = ctx.total_line {
        inputs_used.insert("total".to_string(), total);
    }

    let mut triggers = Vec::new();
    triggers.push(check_sacred("line", candidate.line));
    if let Some(spread) = ctx.spread_line {
        triggers.push(check_sacred("spread", spread));
    }
    if let Some(total) = ctx.total_line {
        triggers.push(check_sacred("total", total));
        triggers.push(check_digit_sum("total_digit_sum", total));
    }

    let hits: Vec<&Trigger> = triggers.iter().filter(|t| t.hit).collect();

    let mut jarvis_rs = BASELINE;
    let mut triggers_hit = Vec::new();
    let mut reasons = Vec::new();
    for (k, t) in hits.iter().enumerate() {
        let decayed = t.contribution * DECAY.powi(k as i32);
        jarvis_rs += decayed;
        triggers_hit.push(t.name.to_string());
        reasons.push(format!("{} trigger +{:.2} (decay^{})", t.name, decayed, k));
    }
    jarvis_rs = jarvis_rs.min(10.0);

    let fail_reasons = if hits.is_empty() {
        vec!["no sacred-number trigger fired".to_string()]
    } else {
        vec![]
    };
    if hits.is_empty() {
        reasons.push(format!("baseline {BASELINE}, no triggers fired"));
    }

    JarvisOutput {
        jarvis_rs,
        jarvis_active: !hits.is_empty(),
        jarvis_hits_count: hits.len() as u32,
        jarvis_triggers_hit: triggers_hit,
        jarvis_reasons: reasons,
        jarvis_fail_reasons: fail_reasons,
        jarvis_inputs_used: inputs_used,
    }
}

fn check_sacred(name: &'static str, value: f64) -> Trigger {
    let rounded = value.abs().round() as i64;
    let hit = SACRED_NUMBERS.contains(&rounded);
    Trigger {
        name,
        contribution: 2.5,
        hit,
    }
}

fn check_digit_sum(name: &'static str, value: f64) -> Trigger {
    let mut n = value.abs().round() as i64;
    let mut sum = 0i64;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    let hit = SACRED_NUMBERS.contains(&sum);
    Trigger {
        name,
        contribution: 1.5,
        hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Market, Side};
    use crate::domain::event::Sport;

    fn candidate(line: f64) -> Candidate {
        Candidate {
            sport: Sport::Nba,
            event_id: "e_1".into(),
            market: Market::Total,
            side: Side::Under,
            line,
            odds_american: Some(-110),
            book: "draftkings".into(),
            player_id: None,
            player_name: None,
        }
    }

    #[test]
    fn seven_field_contract_on_no_inputs() {
        let ctx = Context {
            spread_line: None,
            total_line: None,
            ..Context::default()
        };
        let out = score(&candidate(0.0), &ctx);
        assert_eq!(out.jarvis_rs, BASELINE);
        assert!(!out.jarvis_fail_reasons.is_empty());
    }

    #[test]
    fn seven_field_contract_on_no_triggers() {
        let mut ctx = Context::default();
        ctx.spread_line = Some(2.0);
        ctx.total_line = Some(200.0);
        let out = score(&candidate(2.0), &ctx);
        // line=2.0, spread=2.0, total=200 digit sum=2 - none of these are sacred.
        assert_eq!(out.jarvis_rs, BASELINE);
        assert!(!out.jarvis_active);
        assert!(!out.jarvis_fail_reasons.is_empty());
    }

    #[test]
    fn stacked_triggers_decay() {
        let mut ctx = Context::default();
        ctx.spread_line = Some(7.0);
        ctx.total_line = Some(9.0);
        let out = score(&candidate(3.0), &ctx);
        assert!(out.jarvis_active);
        assert!(out.jarvis_hits_count >= 2);
        assert!(out.jarvis_rs <= 10.0);
    }
}
