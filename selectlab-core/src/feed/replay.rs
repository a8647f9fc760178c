//! Replay provider — serves pre-recorded candidate responses keyed by date.
//!
//! Used to replay a captured AI session deterministically, and by tests to
//! stage exact feed behavior (including deliberately future-dated responses
//! for the lookahead tests).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Candidate;

use super::{CandidateProvider, FeedError, SuggestionContext};

#[derive(Debug, Default)]
pub struct ReplayProvider {
    responses: BTreeMap<NaiveDate, Vec<Candidate>>,
    /// Dates that should simulate a provider failure.
    failures: BTreeMap<NaiveDate, String>,
}

impl ReplayProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, date: NaiveDate, candidates: Vec<Candidate>) -> Self {
        self.responses.insert(date, candidates);
        self
    }

    /// Make the provider fail on `date` with the given message.
    pub fn with_failure(mut self, date: NaiveDate, message: impl Into<String>) -> Self {
        self.failures.insert(date, message.into());
        self
    }
}

impl CandidateProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn suggest(
        &self,
        date: NaiveDate,
        _universe: &[String],
        _ctx: &SuggestionContext<'_>,
    ) -> Result<Vec<Candidate>, FeedError> {
        if let Some(message) = self.failures.get(&date) {
            return Err(FeedError::Provider(message.clone()));
        }
        Ok(self.responses.get(&date).cloned().unwrap_or_default())
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

    #[test]
    fn replays_recorded_responses() {
        let provider = ReplayProvider::new()
            .with_response(d(3), vec![Candidate::new("ACME", 75.0, d(3))])
            .with_failure(d(4), "simulated outage");

        let series = MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0])).unwrap();
        let ctx = SuggestionContext {
            view: series.as_of(d(3)),
            market_notes: None,
        };

        let ok = provider.suggest(d(3), &[], &ctx).unwrap();
        assert_eq!(ok.len(), 1);

        assert!(provider.suggest(d(4), &[], &ctx).is_err());
        assert!(provider.suggest(d(5), &[], &ctx).unwrap().is_empty());
    }
}
