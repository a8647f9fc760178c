//! Market data: immutable per-symbol bar series, as-of views, resampling.
//!
//! `MarketSeries` is loaded once, validated, and never mutated for the
//! duration of a run. The simulation loop hands strategies a `MarketView`
//! borrowed from it — a window containing only bars dated at or before the
//! current simulated date. That window is the central no-lookahead guarantee:
//! a strategy physically cannot read a bar the view does not expose.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Bar resolution of a simulation run.
///
/// Timeframes are independent simulations: resampling moves both the
/// decision boundary and the next-bar execution lag, so no state is ever
/// shared across timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl Timeframe {
    /// Default annualization factor for Sharpe-style ratios (periods per year).
    pub fn default_annualization(&self) -> f64 {
        match self {
            Timeframe::Daily => 252.0,
            Timeframe::Weekly => 52.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
        }
    }
}

/// Validation failures when constructing a series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("no bars supplied")]
    Empty,

    #[error("bars for '{symbol}' not strictly increasing at {date}")]
    OutOfOrder { symbol: String, date: NaiveDate },

    #[error("bar for '{symbol}' on {date} fails OHLC sanity check")]
    InsaneBar { symbol: String, date: NaiveDate },
}

/// Normalized historical bar data for a universe of symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSeries {
    bars: BTreeMap<String, Vec<Bar>>,
    /// Union of all symbols' bar dates, ascending. This is the date axis the
    /// simulation loop iterates.
    dates: Vec<NaiveDate>,
}

impl MarketSeries {
    /// Build a series from raw bars, validating the per-symbol date invariant:
    /// strictly increasing, no duplicates, sane OHLC.
    pub fn from_bars(all_bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if all_bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        let mut bars: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        for bar in all_bars {
            if !bar.is_sane() {
                return Err(SeriesError::InsaneBar {
                    symbol: bar.symbol.clone(),
                    date: bar.date,
                });
            }
            bars.entry(bar.symbol.clone()).or_default().push(bar);
        }

        let mut dates = BTreeSet::new();
        for (symbol, series) in &mut bars {
            series.sort_by_key(|b| b.date);
            for pair in series.windows(2) {
                if pair[1].date <= pair[0].date {
                    return Err(SeriesError::OutOfOrder {
                        symbol: symbol.clone(),
                        date: pair[1].date,
                    });
                }
            }
            dates.extend(series.iter().map(|b| b.date));
        }

        Ok(Self {
            bars,
            dates: dates.into_iter().collect(),
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }

    /// The union date axis, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// The bar for `symbol` on exactly `date`, if the symbol traded that day.
    pub fn bar(&self, symbol: &str, date: NaiveDate) -> Option<&Bar> {
        let series = self.bars.get(symbol)?;
        series
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|idx| &series[idx])
    }

    /// All bars for `symbol`, ascending.
    pub fn all_bars(&self, symbol: &str) -> &[Bar] {
        self.bars.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Restrict the series to bars within `[start, end]` (inclusive).
    pub fn clamp(&self, start: NaiveDate, end: NaiveDate) -> Result<Self, SeriesError> {
        let clamped: Vec<Bar> = self
            .bars
            .values()
            .flatten()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Self::from_bars(clamped)
    }

    /// The view of this series containing only data dated at or before `date`.
    pub fn as_of(&self, date: NaiveDate) -> MarketView<'_> {
        MarketView { series: self, asof: date }
    }

    /// Resample to a coarser timeframe.
    ///
    /// Weekly bars aggregate one ISO week per symbol: first open, max high,
    /// min low, last close, summed volume, stamped with the date of the last
    /// bar in the week so a weekly bar never carries a date earlier than the
    /// data it contains.
    pub fn resample(&self, timeframe: Timeframe) -> Result<Self, SeriesError> {
        match timeframe {
            Timeframe::Daily => Ok(self.clone()),
            Timeframe::Weekly => {
                let mut out = Vec::new();
                for series in self.bars.values() {
                    let mut bucket: Vec<&Bar> = Vec::new();
                    let mut current_week: Option<(i32, u32)> = None;
                    for bar in series {
                        let week = (bar.date.iso_week().year(), bar.date.iso_week().week());
                        if current_week.is_some() && current_week != Some(week) {
                            out.push(aggregate_bucket(&bucket));
                            bucket.clear();
                        }
                        current_week = Some(week);
                        bucket.push(bar);
                    }
                    if !bucket.is_empty() {
                        out.push(aggregate_bucket(&bucket));
                    }
                }
                Self::from_bars(out)
            }
        }
    }
}

fn aggregate_bucket(bucket: &[&Bar]) -> Bar {
    let first = bucket.first().expect("bucket is non-empty");
    let last = bucket.last().expect("bucket is non-empty");
    Bar {
        symbol: first.symbol.clone(),
        date: last.date,
        open: first.open,
        high: bucket.iter().map(|b| b.high).fold(f64::MIN, f64::max),
        low: bucket.iter().map(|b| b.low).fold(f64::MAX, f64::min),
        close: last.close,
        volume: bucket.iter().map(|b| b.volume).sum(),
    }
}

/// Read-only window over a `MarketSeries`: bars dated `<= asof` only.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    series: &'a MarketSeries,
    asof: NaiveDate,
}

impl<'a> MarketView<'a> {
    pub fn asof(&self) -> NaiveDate {
        self.asof
    }

    pub fn symbols(&self) -> impl Iterator<Item = &'a str> {
        self.series.symbols()
    }

    /// Bars for `symbol` up to and including the as-of date.
    pub fn bars(&self, symbol: &str) -> &'a [Bar] {
        let all = self.series.all_bars(symbol);
        let end = all.partition_point(|b| b.date <= self.asof);
        &all[..end]
    }

    /// The most recent bar at or before the as-of date.
    pub fn last_bar(&self, symbol: &str) -> Option<&'a Bar> {
        self.bars(symbol).last()
    }

    /// Last known close at or before the as-of date.
    pub fn last_close(&self, symbol: &str) -> Option<f64> {
        self.last_bar(symbol).map(|b| b.close)
    }

    /// Whether the symbol has a bar on exactly the as-of date.
    pub fn traded_today(&self, symbol: &str) -> bool {
        self.series.bar(symbol, self.asof).is_some()
    }
}
