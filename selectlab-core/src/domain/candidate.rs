//! Candidate — a symbol proposed by a suggestion provider for a given date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A ranked candidate from a suggestion provider.
///
/// `score` is a confidence value in 0..=100 (the convention the suggestion
/// providers use). `asof_date` is the date the suggestion claims to be based
/// on; the simulation loop rejects candidates dated after the current
/// simulated date, so this field is load-bearing for the no-lookahead
/// guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub score: f64,
    pub asof_date: NaiveDate,
    /// Free-text rationale from the provider, carried for diagnostics only.
    #[serde(default)]
    pub note: Option<String>,
}

impl Candidate {
    pub fn new(symbol: impl Into<String>, score: f64, asof_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            score,
            asof_date,
            note: None,
        }
    }

    /// Providers must emit scores in 0..=100; out-of-range candidates are discarded.
    pub fn is_valid(&self) -> bool {
        self.score.is_finite() && (0.0..=100.0).contains(&self.score) && !self.symbol.is_empty()
    }
}

/// Sort candidates by descending score; equal scores fall back to symbol order
/// so the ranking is total and deterministic.
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}
