//! Historical data access: provider trait plus in-memory fixtures.

pub mod fixture;
pub mod provider;

pub use fixture::{flat_bar, flat_series, FixtureProvider};
pub use provider::{FetchError, FetchResult, HistoricalDataProvider, RangeGap};
