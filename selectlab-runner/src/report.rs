//! Report sinks — hand finished results to whatever renders them.
//!
//! The engine's only obligation is a stable, serializable result set; these
//! sinks cover the two formats everything downstream understands (a JSON
//! artifact with the comparison attached, and flat CSV tapes per run).
//! Anything fancier lives outside this workspace.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::comparison::ComparisonReport;
use crate::result::SimulationResult;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Consumes a finished result set and renders it somewhere.
pub trait ReportSink {
    fn name(&self) -> &str;

    fn write(&self, results: &[SimulationResult]) -> Result<(), ReportError>;
}

/// Writes `results.json`: the full result set plus the cross-variant comparison.
pub struct JsonResultSink {
    out_dir: PathBuf,
}

#[derive(Serialize)]
struct JsonArtifact<'a> {
    results: &'a [SimulationResult],
    comparison: ComparisonReport,
}

impl JsonResultSink {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join("results.json")
    }
}

impl ReportSink for JsonResultSink {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, results: &[SimulationResult]) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.out_dir)?;
        let artifact = JsonArtifact {
            results,
            comparison: ComparisonReport::new(results),
        };
        let json = serde_json::to_string_pretty(&artifact)?;
        std::fs::write(self.output_path(), json)?;
        Ok(())
    }
}

/// Writes `<variant>_<timeframe>_trades.csv` and `..._equity.csv` per result.
pub struct CsvTapeSink {
    out_dir: PathBuf,
}

impl CsvTapeSink {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    fn trades_path(&self, result: &SimulationResult) -> PathBuf {
        self.out_dir.join(format!(
            "{}_{}_trades.csv",
            result.variant_id,
            result.timeframe.as_str()
        ))
    }

    fn equity_path(&self, result: &SimulationResult) -> PathBuf {
        self.out_dir.join(format!(
            "{}_{}_equity.csv",
            result.variant_id,
            result.timeframe.as_str()
        ))
    }
}

impl ReportSink for CsvTapeSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&self, results: &[SimulationResult]) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.out_dir)?;

        for result in results {
            let mut trades = csv::Writer::from_path(self.trades_path(result))?;
            trades.write_record([
                "symbol",
                "entry_date",
                "entry_price",
                "exit_date",
                "exit_price",
                "shares",
                "gross_pnl",
                "fees",
                "net_pnl",
                "holding_days",
            ])?;
            for trade in &result.ledger.trades {
                trades.write_record([
                    trade.symbol.clone(),
                    trade.entry_date.to_string(),
                    format!("{:.4}", trade.entry_price),
                    trade.exit_date.to_string(),
                    format!("{:.4}", trade.exit_price),
                    format!("{:.0}", trade.shares),
                    format!("{:.2}", trade.gross_pnl),
                    format!("{:.2}", trade.fees),
                    format!("{:.2}", trade.net_pnl),
                    trade.holding_days.to_string(),
                ])?;
            }
            trades.flush()?;

            let mut equity = csv::Writer::from_path(self.equity_path(result))?;
            equity.write_record(["date", "equity", "cash", "stale_symbols"])?;
            for point in &result.ledger.equity_curve {
                equity.write_record([
                    point.date.to_string(),
                    format!("{:.2}", point.equity),
                    format!("{:.2}", point.cash),
                    point.stale_symbols.join(";"),
                ])?;
            }
            equity.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use selectlab_core::domain::{Ledger, TradeRecord};
    use selectlab_core::market::Timeframe;

    use crate::metrics::PerformanceMetrics;
    use crate::result::SCHEMA_VERSION;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_result() -> SimulationResult {
        let mut ledger = Ledger::new(1_000.0);
        ledger.apply_buy("ACME", 10.0, 50.0, 0.0, d(2));
        ledger.apply_sell("ACME", 10.0, 60.0, 0.0, d(9));
        let trades: Vec<TradeRecord> = ledger.trades.clone();

        SimulationResult {
            schema_version: SCHEMA_VERSION,
            run_id: "test".into(),
            variant_id: "top1".into(),
            timeframe: Timeframe::Daily,
            start_date: Some(d(2)),
            end_date: Some(d(9)),
            initial_capital: 1_000.0,
            final_equity: 1_100.0,
            metrics: PerformanceMetrics::compute(&[1_000.0, 1_100.0], &trades, 0.0, 252.0),
            ledger,
            diagnostics: Vec::new(),
            incomplete: false,
        }
    }

    #[test]
    fn json_sink_writes_results_and_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonResultSink::new(dir.path());
        sink.write(&[sample_result()]).unwrap();

        let text = std::fs::read_to_string(sink.output_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
        assert_eq!(
            value["comparison"]["by_total_return"][0]["variant_id"],
            "top1"
        );
    }

    #[test]
    fn csv_sink_writes_trade_and_equity_tapes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvTapeSink::new(dir.path());
        sink.write(&[sample_result()]).unwrap();

        let trades = std::fs::read_to_string(dir.path().join("top1_daily_trades.csv")).unwrap();
        assert!(trades.lines().count() >= 2); // header + one trade
        assert!(trades.contains("ACME"));

        let equity = std::fs::read_to_string(dir.path().join("top1_daily_equity.csv")).unwrap();
        assert!(equity.starts_with("date,equity,cash,stale_symbols"));
    }
}
