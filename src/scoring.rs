use crate::equation::Equation;
use serde::Serialize;
use std::collections::BTreeMap;

/// Best total (in seconds) per question count
pub type ScoreBoard = BTreeMap<u32, f64>;

/// Outcome of one finished round
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RoundResult {
    /// seconds, `(base + penalty) / 1000` rounded to 4 places
    pub total: f64,
    /// elapsed milliseconds
    pub base: u64,
    /// penalty milliseconds
    pub penalty: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub result: RoundResult,
    pub score: ScoreBoard,
}

/// Round to 4 decimal places, half away from zero.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Penalty charged for every equation the player misjudged.
pub fn penalty_for(equations: &[Equation], penalty_ms: u64) -> u64 {
    equations
        .iter()
        .filter(|eq| !eq.is_judged_correctly())
        .map(|_| penalty_ms)
        .sum()
}

/// Compute the result of a finished round and fold it into the ledger.
pub fn score(
    equations: &[Equation],
    prior: &ScoreBoard,
    question_value: u32,
    start_ms: i64,
    end_ms: i64,
    penalty_ms: u64,
) -> Scored {
    let penalty = penalty_for(equations, penalty_ms);
    let base = end_ms.abs_diff(start_ms);
    let total = round4((base + penalty) as f64 / 1000.0);

    let mut score = prior.clone();
    score
        .entry(question_value)
        .and_modify(|best| {
            if total < *best {
                *best = total;
            }
        })
        .or_insert(total);

    Scored {
        result: RoundResult {
            total,
            base,
            penalty,
        },
        score,
    }
}
