//! Equal weight across candidates clearing a minimum score.

use crate::domain::{Candidate, Ledger};
use crate::market::MarketView;

use super::{StrategyVariant, TargetWeights};

/// Admits only candidates with `score >= min_score`, equal-weighted.
///
/// A conservative basket: on dates where nothing clears the bar the variant
/// goes (or stays) flat instead of lowering its standards.
#[derive(Debug, Clone)]
pub struct ScoreThreshold {
    min_score: f64,
    max_names: usize,
    total_exposure: f64,
}

impl ScoreThreshold {
    pub fn new(min_score: f64, max_names: usize, total_exposure: f64) -> Self {
        Self {
            min_score,
            max_names,
            total_exposure,
        }
    }
}

impl StrategyVariant for ScoreThreshold {
    fn name(&self) -> &str {
        "score_threshold"
    }

    fn decide(
        &self,
        _view: &MarketView<'_>,
        candidates: &[Candidate],
        _ledger: &Ledger,
    ) -> TargetWeights {
        let mut targets = TargetWeights::new();
        let picks: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.score >= self.min_score)
            .take(self.max_names)
            .collect();
        if picks.is_empty() {
            return targets;
        }
        let weight = self.total_exposure / picks.len() as f64;
        for candidate in picks {
            targets.set(candidate.symbol.clone(), weight);
        }
        targets
    }
}
