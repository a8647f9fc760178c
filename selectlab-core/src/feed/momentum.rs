//! Momentum provider — ranks the universe by trailing return.
//!
//! A deterministic, offline stand-in for the AI-backed suggestion services:
//! it reads only the as-of market view handed to it, so it can never leak
//! future data, and it gives the CLI something real to run without network
//! access. Scores map the trailing return onto the providers' 0..=100
//! confidence scale.

use chrono::NaiveDate;

use crate::domain::Candidate;

use super::{CandidateProvider, FeedError, SuggestionContext};

#[derive(Debug, Clone)]
pub struct MomentumProvider {
    /// Trailing window, in bars.
    lookback: usize,
}

impl MomentumProvider {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }

    /// Trailing return over the lookback window, or None without enough bars.
    fn trailing_return(&self, ctx: &SuggestionContext<'_>, symbol: &str) -> Option<f64> {
        let bars = ctx.view.bars(symbol);
        if bars.len() < self.lookback + 1 {
            return None;
        }
        let latest = bars[bars.len() - 1].close;
        let past = bars[bars.len() - 1 - self.lookback].close;
        if past <= 0.0 {
            return None;
        }
        Some((latest - past) / past)
    }
}

impl CandidateProvider for MomentumProvider {
    fn name(&self) -> &str {
        "momentum"
    }

    fn suggest(
        &self,
        date: NaiveDate,
        universe: &[String],
        ctx: &SuggestionContext<'_>,
    ) -> Result<Vec<Candidate>, FeedError> {
        let mut candidates = Vec::new();
        for symbol in universe {
            let Some(ret) = self.trailing_return(ctx, symbol) else {
                continue;
            };
            // Map return to 0..=100: 50 is flat, ±25% return saturates.
            let score = (50.0 + ret / 0.25 * 50.0).clamp(0.0, 100.0);
            let mut candidate = Candidate::new(symbol.clone(), score, date);
            candidate.note = Some(format!(
                "trailing {}-bar return {:+.2}%",
                self.lookback,
                ret * 100.0
            ));
            candidates.push(candidate);
        }
        Ok(candidates)
    }
}
