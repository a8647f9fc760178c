//! Confidence-weighted allocation across candidates.

use crate::domain::{Candidate, Ledger};
use crate::market::MarketView;

use super::{StrategyVariant, TargetWeights};

/// Weights candidates by their confidence scores.
///
/// Each of the top `max_names` candidates gets
/// `total_exposure * score / sum(scores)`. A degenerate all-zero score set
/// falls back to equal weights rather than dividing by zero.
#[derive(Debug, Clone)]
pub struct ConfidenceWeighted {
    max_names: usize,
    total_exposure: f64,
}

impl ConfidenceWeighted {
    pub fn new(max_names: usize, total_exposure: f64) -> Self {
        Self {
            max_names,
            total_exposure,
        }
    }
}

impl StrategyVariant for ConfidenceWeighted {
    fn name(&self) -> &str {
        "confidence_weighted"
    }

    fn decide(
        &self,
        _view: &MarketView<'_>,
        candidates: &[Candidate],
        _ledger: &Ledger,
    ) -> TargetWeights {
        let mut targets = TargetWeights::new();
        let picks: Vec<&Candidate> = candidates.iter().take(self.max_names).collect();
        if picks.is_empty() {
            return targets;
        }

        let total_score: f64 = picks.iter().map(|c| c.score).sum();
        for candidate in &picks {
            let fraction = if total_score > 0.0 {
                candidate.score / total_score
            } else {
                1.0 / picks.len() as f64
            };
            targets.set(candidate.symbol.clone(), self.total_exposure * fraction);
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::data::flat_series;
    use crate::market::MarketSeries;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn setup() -> (MarketSeries, Ledger) {
        let series = MarketSeries::from_bars(flat_series("AAA", d(2), &[10.0])).unwrap();
        (series, Ledger::new(10_000.0))
    }

    #[test]
    fn weights_proportional_to_scores() {
        let (series, ledger) = setup();
        let policy = ConfidenceWeighted::new(10, 1.0);
        let candidates = vec![
            Candidate::new("AAA", 75.0, d(2)),
            Candidate::new("BBB", 25.0, d(2)),
        ];

        let targets = policy.decide(&series.as_of(d(2)), &candidates, &ledger);
        assert!((targets.get("AAA") - 0.75).abs() < 1e-10);
        assert!((targets.get("BBB") - 0.25).abs() < 1e-10);
        assert!((targets.total() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn zero_scores_fall_back_to_equal_weights() {
        let (series, ledger) = setup();
        let policy = ConfidenceWeighted::new(10, 0.8);
        let candidates = vec![
            Candidate::new("AAA", 0.0, d(2)),
            Candidate::new("BBB", 0.0, d(2)),
        ];

        let targets = policy.decide(&series.as_of(d(2)), &candidates, &ledger);
        assert!((targets.get("AAA") - 0.4).abs() < 1e-10);
        assert!((targets.get("BBB") - 0.4).abs() < 1e-10);
    }

    #[test]
    fn truncates_to_max_names() {
        let (series, ledger) = setup();
        let policy = ConfidenceWeighted::new(1, 1.0);
        let candidates = vec![
            Candidate::new("AAA", 90.0, d(2)),
            Candidate::new("BBB", 85.0, d(2)),
        ];

        let targets = policy.decide(&series.as_of(d(2)), &candidates, &ledger);
        assert!((targets.get("AAA") - 1.0).abs() < 1e-10);
        assert_eq!(targets.get("BBB"), 0.0);
    }
}
