//! Data loading: prefetch into an immutable series, CSV ingest, synthetic fallback.
//!
//! Prefetching fans out across the universe with rayon before any loop
//! starts. It only populates the series (a read-only value once built), so
//! it can never race ledger state — the one place parallelism touches data.

use std::path::Path;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;

use selectlab_core::data::{FetchError, HistoricalDataProvider};
use selectlab_core::domain::Bar;
use selectlab_core::error::{Diagnostic, DiagnosticKind};
use selectlab_core::market::{MarketSeries, SeriesError};

use crate::config::{DataConfig, RunConfig};
use crate::fixture::synthetic_series;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no symbol in the universe could be loaded")]
    NothingLoaded,

    #[error("market data error: {0}")]
    Series(#[from] SeriesError),

    #[error("csv read error at {path}: {message}")]
    Csv { path: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loaded bars plus per-symbol load incidents.
pub struct LoadedData {
    pub series: MarketSeries,
    /// Gaps and unavailable symbols, attached later to every result.
    pub diagnostics: Vec<Diagnostic>,
}

/// Prefetch the whole universe from a provider, in parallel.
///
/// Per-symbol failures degrade into diagnostics (the symbol is skipped);
/// only a fully empty load is an error.
pub fn prefetch_series(
    provider: &dyn HistoricalDataProvider,
    universe: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadedData, LoadError> {
    let fetched: Vec<(String, Result<_, FetchError>)> = universe
        .par_iter()
        .map(|symbol| (symbol.clone(), provider.fetch(symbol, start, end)))
        .collect();

    let mut bars: Vec<Bar> = Vec::new();
    let mut diagnostics = Vec::new();

    for (symbol, outcome) in fetched {
        match outcome {
            Ok(result) => {
                for gap in &result.gaps {
                    diagnostics.push(Diagnostic::for_subject(
                        gap.start,
                        DiagnosticKind::DataGap,
                        &symbol,
                        format!("provider served no bars for {}..={}", gap.start, gap.end),
                    ));
                }
                bars.extend(result.bars);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::for_subject(
                    start,
                    DiagnosticKind::DataGap,
                    &symbol,
                    err.to_string(),
                ));
            }
        }
    }

    if bars.is_empty() {
        return Err(LoadError::NothingLoaded);
    }

    Ok(LoadedData {
        series: MarketSeries::from_bars(bars)?,
        diagnostics,
    })
}

/// Load the series a run config describes.
pub fn load_series(config: &RunConfig) -> Result<LoadedData, LoadError> {
    let loaded = match &config.data {
        DataConfig::Synthetic { seed, days } => LoadedData {
            series: synthetic_series(&config.run.universe, *seed, *days)?,
            diagnostics: Vec::new(),
        },
        DataConfig::Csv { dir } => load_csv_dir(dir, &config.run.universe)?,
    };

    // Clamp to the configured window, when one is set.
    let series = match (config.run.start_date, config.run.end_date) {
        (None, None) => loaded.series,
        (start, end) => {
            let lo = start
                .or_else(|| loaded.series.first_date())
                .unwrap_or_default();
            let hi = end
                .or_else(|| loaded.series.last_date())
                .unwrap_or_default();
            loaded.series.clamp(lo, hi)?
        }
    };

    Ok(LoadedData {
        series,
        diagnostics: loaded.diagnostics,
    })
}

/// Read `<dir>/<SYMBOL>.csv` for each universe symbol.
///
/// Expected columns: `date,open,high,low,close,volume` with ISO dates.
/// Missing files degrade into diagnostics, matching the prefetch policy.
pub fn load_csv_dir(dir: &Path, universe: &[String]) -> Result<LoadedData, LoadError> {
    #[derive(serde::Deserialize)]
    struct CsvBar {
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    }

    let mut bars: Vec<Bar> = Vec::new();
    let mut diagnostics = Vec::new();

    for symbol in universe {
        let path = dir.join(format!("{symbol}.csv"));
        if !path.exists() {
            diagnostics.push(Diagnostic::for_subject(
                NaiveDate::default(),
                DiagnosticKind::DataGap,
                symbol,
                format!("no csv file at {}", path.display()),
            ));
            continue;
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| LoadError::Csv {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        for record in reader.deserialize::<CsvBar>() {
            let row = record.map_err(|e| LoadError::Csv {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            bars.push(Bar {
                symbol: symbol.clone(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
    }

    if bars.is_empty() {
        return Err(LoadError::NothingLoaded);
    }

    Ok(LoadedData {
        series: MarketSeries::from_bars(bars)?,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use selectlab_core::data::{flat_series, FixtureProvider};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn prefetch_collects_all_symbols() {
        let mut bars = flat_series("AAA", d(2), &[10.0, 11.0]);
        bars.extend(flat_series("BBB", d(2), &[20.0, 21.0]));
        let provider = FixtureProvider::new().with_bars(bars);

        let loaded = prefetch_series(
            &provider,
            &["AAA".to_string(), "BBB".to_string()],
            d(2),
            d(3),
        )
        .unwrap();

        assert_eq!(loaded.series.all_bars("AAA").len(), 2);
        assert_eq!(loaded.series.all_bars("BBB").len(), 2);
        assert!(loaded.diagnostics.is_empty());
    }

    #[test]
    fn prefetch_degrades_missing_symbols_into_diagnostics() {
        let provider =
            FixtureProvider::new().with_bars(flat_series("AAA", d(2), &[10.0, 11.0]));

        let loaded = prefetch_series(
            &provider,
            &["AAA".to_string(), "MISSING".to_string()],
            d(2),
            d(3),
        )
        .unwrap();

        assert_eq!(loaded.series.all_bars("MISSING").len(), 0);
        assert_eq!(loaded.diagnostics.len(), 1);
        assert_eq!(loaded.diagnostics[0].kind, DiagnosticKind::DataGap);
        assert_eq!(loaded.diagnostics[0].subject.as_deref(), Some("MISSING"));
    }

    #[test]
    fn prefetch_flags_partial_ranges() {
        let provider =
            FixtureProvider::new().with_bars(flat_series("AAA", d(4), &[10.0, 11.0]));

        let loaded =
            prefetch_series(&provider, &["AAA".to_string()], d(2), d(5)).unwrap();
        assert!(!loaded.diagnostics.is_empty());
        assert!(loaded.diagnostics.iter().all(|g| g.kind == DiagnosticKind::DataGap));
    }

    #[test]
    fn prefetch_empty_universe_is_an_error() {
        let provider = FixtureProvider::new();
        assert!(matches!(
            prefetch_series(&provider, &["NOPE".to_string()], d(2), d(3)),
            Err(LoadError::NothingLoaded)
        ));
    }

    #[test]
    fn csv_roundtrip_through_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("AAA.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-02,10.0,10.5,9.5,10.2,1000\n\
             2024-01-03,10.2,10.8,10.0,10.6,1200\n",
        )
        .unwrap();

        let loaded = load_csv_dir(dir.path(), &["AAA".to_string()]).unwrap();
        assert_eq!(loaded.series.all_bars("AAA").len(), 2);
        assert_eq!(loaded.series.all_bars("AAA")[1].close, 10.6);
    }
}
