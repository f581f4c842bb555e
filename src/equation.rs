use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Smallest and largest operand (and false-result offset) drawn for an equation.
const OPERAND_MIN: u32 = 1;
const OPERAND_MAX: u32 = 9;

/// A multiplication statement shown to the player, who judges it true or false
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Equation {
    pub values: (u32, u32),
    pub result: u32,
    pub answer: Option<bool>,
}

impl Equation {
    /// Build a statement whose displayed result is the real product when `right`
    /// is set, or the product plus a random offset otherwise.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, right: bool) -> Self {
        let a = random_integer(rng, OPERAND_MIN, OPERAND_MAX);
        let b = random_integer(rng, OPERAND_MIN, OPERAND_MAX);
        let mut result = a * b;
        if !right {
            result += random_integer(rng, OPERAND_MIN, OPERAND_MAX);
        }

        Self {
            values: (a, b),
            result,
            answer: None,
        }
    }

    pub fn product(&self) -> u32 {
        self.values.0 * self.values.1
    }

    /// Whether the displayed result really is the product, regardless of how
    /// the player judged it.
    pub fn is_true(&self) -> bool {
        self.product() == self.result
    }

    /// True once the player's judgement agrees with the objective truth
    pub fn is_judged_correctly(&self) -> bool {
        self.answer == Some(self.is_true())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} = {}", self.values.0, self.values.1, self.result)
    }
}

/// Uniform integer in `[min, max]` computed as `round(min - 0.5 + r * (max - min + 1))`.
pub fn random_integer<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }

    let r: f64 = rng.gen();
    let value = (min as f64 - 0.5 + r * (max - min + 1) as f64).round();

    (value as u32).clamp(min, max)
}

/// Forward partial-swap shuffle: at each index `i`, swap with `floor(r * (i + 1))`.
pub fn shuffle<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    for i in 0..items.len() {
        let r: f64 = rng.gen();
        let j = ((r * (i + 1) as f64).floor() as usize).min(i);
        items.swap(i, j);
    }
}

/// Generate `count` shuffled equations, between 1 and `count` of them true.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Equation> {
    if count == 0 {
        return Vec::new();
    }

    let right_count = random_integer(rng, 1, count as u32) as usize;

    let mut equations: Vec<Equation> = (0..count)
        .map(|idx| Equation::random(rng, idx < right_count))
        .collect();
    shuffle(rng, &mut equations);

    tracing::debug!(count, right_count, "generated equation set");
    equations
}
