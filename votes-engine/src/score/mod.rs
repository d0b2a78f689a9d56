//! Popularity score of a resource from its up/down counters.
//!
//! The score is the lower bound of the Wilson score interval for the share of
//! up votes, so a resource needs both a high ratio and enough votes to rank
//! high. Below a minimum sample size the score is forced to zero.
use crate::config::DEFAULT_MIN_SAMPLE_SIZE;

/// z-score of an 80% one-sided confidence level.
pub const Z_80: f64 = 1.281551565545;

/// Pure scoring function parameterized by the minimum sample size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEngine {
    min_sample_size: u64,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAMPLE_SIZE)
    }
}

impl ScoreEngine {
    pub fn new(min_sample_size: u64) -> Self {
        Self { min_sample_size }
    }

    /// Scores a resource with `up` up votes and `down` down votes.
    ///
    /// Returns `0.0` when there are no votes or fewer than the minimum sample
    /// size, otherwise a value in `[0, up / (up + down)]`.
    pub fn score(&self, up: u64, down: u64) -> f64 {
        let total = up.saturating_add(down);
        if total == 0 || total < self.min_sample_size {
            return 0.0;
        }
        wilson_lower_bound(up, total)
    }
}

fn wilson_lower_bound(up: u64, total: u64) -> f64 {
    let n = total as f64;
    let p = up as f64 / n;
    let z2 = Z_80 * Z_80;

    let center = p + z2 / (2.0 * n);
    let spread = Z_80 * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    let denom = 1.0 + z2 / n;

    ((center - spread) / denom).max(0.0)
}
