//! Equal weight across the top K candidates.

use crate::domain::{Candidate, Ledger};
use crate::market::MarketView;

use super::{StrategyVariant, TargetWeights};

/// Takes the K best-scored candidates and splits `total_exposure` equally.
///
/// With `k = 1` and full exposure this is the "all in on the top pick"
/// policy the end-to-end scenarios use.
#[derive(Debug, Clone)]
pub struct TopKEqualWeight {
    k: usize,
    total_exposure: f64,
}

impl TopKEqualWeight {
    pub fn new(k: usize, total_exposure: f64) -> Self {
        Self { k, total_exposure }
    }
}

impl StrategyVariant for TopKEqualWeight {
    fn name(&self) -> &str {
        "top_k_equal_weight"
    }

    fn decide(
        &self,
        _view: &MarketView<'_>,
        candidates: &[Candidate],
        _ledger: &Ledger,
    ) -> TargetWeights {
        let mut targets = TargetWeights::new();
        let picks: Vec<&Candidate> = candidates.iter().take(self.k).collect();
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
