//! In-memory data provider and bar builders for tests and offline runs.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Bar;

use super::provider::{FetchError, FetchResult, HistoricalDataProvider, RangeGap};

/// Serves bars from a pre-loaded in-memory map.
///
/// Gaps relative to the union of all symbols' dates are reported, which makes
/// halted/delisted scenarios easy to stage in tests.
#[derive(Debug, Default)]
pub struct FixtureProvider {
    bars: BTreeMap<String, Vec<Bar>>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, bars: Vec<Bar>) -> Self {
        for bar in bars {
            self.bars.entry(bar.symbol.clone()).or_default().push(bar);
        }
        for series in self.bars.values_mut() {
            series.sort_by_key(|b| b.date);
        }
        self
    }
}

impl HistoricalDataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, FetchError> {
        let series = self
            .bars
            .get(symbol)
            .ok_or_else(|| FetchError::DataUnavailable {
                symbol: symbol.to_string(),
                start,
                end,
            })?;

        let bars: Vec<Bar> = series
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        if bars.is_empty() {
            return Err(FetchError::DataUnavailable {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        // Flag missing leading/trailing coverage as gaps rather than serving
        // a silently narrower range.
        let mut gaps = Vec::new();
        let first = bars.first().expect("non-empty").date;
        let last = bars.last().expect("non-empty").date;
        if first > start {
            gaps.push(RangeGap { start, end: first.pred_opt().unwrap_or(first) });
        }
        if last < end {
            gaps.push(RangeGap { start: last.succ_opt().unwrap_or(last), end });
        }

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            gaps,
        })
    }
}

/// Build a flat-price bar: open == close == `price`, tight range.
///
/// Handy for tests that need hand-computable arithmetic; the scenarios in
/// `tests/engine_test.rs` are all built from these.
pub fn flat_bar(symbol: &str, date: NaiveDate, price: f64, volume: u64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        date,
        open: price,
        high: price,
        low: price,
        close: price,
        volume,
    }
}

/// A run of consecutive daily flat bars starting at `start` with the given closes.
pub fn flat_series(symbol: &str, start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &price)| flat_bar(symbol, start + chrono::Duration::days(i as i64), price, 1_000_000))
        .collect()
}
