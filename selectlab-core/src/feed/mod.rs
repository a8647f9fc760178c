//! Candidate feed: suggestion provider trait and the prioritized fallback chain.
//!
//! Suggestion providers are external collaborators (AI-backed rankers, replay
//! fixtures). The engine composes one or more of them into a `ProviderChain`
//! tried in priority order: a provider failure falls through to the next, and
//! a fully failed chain yields an empty candidate list — a diagnostic, never
//! a fatal error. The chain does NOT enforce the no-lookahead boundary; the
//! simulation loop checks every returned `asof_date` itself.

pub mod momentum;
pub mod replay;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{rank_candidates, Candidate};
use crate::market::MarketView;

pub use momentum::MomentumProvider;
pub use replay::ReplayProvider;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("provider timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Read-only context handed to providers on each query.
///
/// The market view is the same as-of window the strategies see, so a
/// provider computing its ranking from prices cannot read the future either.
pub struct SuggestionContext<'a> {
    pub view: MarketView<'a>,
    /// Free-text market notes (news digest etc.), when a collaborator
    /// supplies them.
    pub market_notes: Option<&'a str>,
}

/// A source of ranked candidate symbols for a given date.
pub trait CandidateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Propose candidates from `universe` for `date`.
    fn suggest(
        &self,
        date: NaiveDate,
        universe: &[String],
        ctx: &SuggestionContext<'_>,
    ) -> Result<Vec<Candidate>, FeedError>;
}

/// Outcome of querying the chain for one date.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Valid candidates, ranked best score first.
    pub candidates: Vec<Candidate>,
    /// Which provider actually served the response, if any succeeded.
    pub served_by: Option<String>,
    /// (provider name, error text) for every provider that failed before one
    /// succeeded.
    pub failures: Vec<(String, String)>,
}

/// Ordered list of providers tried in sequence.
pub struct ProviderChain {
    providers: Vec<Box<dyn CandidateProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn CandidateProvider>>) -> Self {
        Self { providers }
    }

    pub fn single(provider: Box<dyn CandidateProvider>) -> Self {
        Self::new(vec![provider])
    }

    /// Query providers in priority order until one succeeds.
    ///
    /// Out-of-range or malformed candidates are discarded; the survivors are
    /// ranked by descending score. All providers failing is not an error —
    /// the date simply proceeds with no candidates.
    pub fn suggest(
        &self,
        date: NaiveDate,
        universe: &[String],
        ctx: &SuggestionContext<'_>,
    ) -> ChainOutcome {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.suggest(date, universe, ctx) {
                Ok(raw) => {
                    let mut candidates: Vec<Candidate> =
                        raw.into_iter().filter(Candidate::is_valid).collect();
                    rank_candidates(&mut candidates);
                    return ChainOutcome {
                        candidates,
                        served_by: Some(provider.name().to_string()),
                        failures,
                    };
                }
                Err(err) => {
                    failures.push((provider.name().to_string(), err.to_string()));
                }
            }
        }

        ChainOutcome {
            candidates: Vec::new(),
            served_by: None,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::flat_series;
    use crate::market::MarketSeries;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    struct FailingProvider;

    impl CandidateProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn suggest(
            &self,
            _date: NaiveDate,
            _universe: &[String],
            _ctx: &SuggestionContext<'_>,
        ) -> Result<Vec<Candidate>, FeedError> {
            Err(FeedError::Timeout { seconds: 30 })
        }
    }

    struct FixedProvider(Vec<Candidate>);

    impl CandidateProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn suggest(
            &self,
            _date: NaiveDate,
            _universe: &[String],
            _ctx: &SuggestionContext<'_>,
        ) -> Result<Vec<Candidate>, FeedError> {
            Ok(self.0.clone())
        }
    }

    fn test_ctx(series: &MarketSeries) -> SuggestionContext<'_> {
        SuggestionContext {
            view: series.as_of(d(5)),
            market_notes: None,
        }
    }

    #[test]
    fn chain_falls_back_past_failures() {
        let series = MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0])).unwrap();
        let chain = ProviderChain::new(vec![
            Box::new(FailingProvider),
            Box::new(FixedProvider(vec![Candidate::new("ACME", 80.0, d(4))])),
        ]);

        let outcome = chain.suggest(d(5), &["ACME".into()], &test_ctx(&series));
        assert_eq!(outcome.served_by.as_deref(), Some("fixed"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "failing");
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[test]
    fn chain_all_failing_yields_empty_not_error() {
        let series = MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0])).unwrap();
        let chain = ProviderChain::new(vec![Box::new(FailingProvider), Box::new(FailingProvider)]);

        let outcome = chain.suggest(d(5), &["ACME".into()], &test_ctx(&series));
        assert!(outcome.candidates.is_empty());
        assert!(outcome.served_by.is_none());
        assert_eq!(outcome.failures.len(), 2);
    }

    #[test]
    fn chain_discards_invalid_and_ranks() {
        let series = MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0])).unwrap();
        let chain = ProviderChain::single(Box::new(FixedProvider(vec![
            Candidate::new("LOW", 40.0, d(4)),
            Candidate::new("BAD", 140.0, d(4)), // out of range, discarded
            Candidate::new("HIGH", 90.0, d(4)),
        ])));

        let outcome = chain.suggest(d(5), &[], &test_ctx(&series));
        let symbols: Vec<&str> = outcome.candidates.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["HIGH", "LOW"]);
    }
}
