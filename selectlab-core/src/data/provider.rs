//! Historical data provider trait and structured error types.
//!
//! The trait abstracts over wherever bars actually come from (an HTTP
//! fetcher, CSV import, an in-memory fixture) so the engine can be tested
//! and run without any network dependency. Implementations must never
//! silently return a partial range: a gap is reported on the result so the
//! caller can decide what to do with it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Bar;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data available for '{symbol}' in {start}..={end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("provider failure for '{symbol}': {message}")]
    Provider { symbol: String, message: String },
}

/// A gap inside an otherwise served range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeGap {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Result of a successful fetch: the bars plus any gaps in the served range.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    /// Sub-ranges the provider could not serve. Empty means the range is
    /// complete at the provider's native calendar.
    pub gaps: Vec<RangeGap>,
}

impl FetchResult {
    pub fn is_partial(&self) -> bool {
        !self.gaps.is_empty()
    }
}

/// Source of historical bars.
pub trait HistoricalDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for a symbol over an inclusive date range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, FetchError>;
}
