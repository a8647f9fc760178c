//! Serializable simulation results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use selectlab_core::domain::Ledger;
use selectlab_core::error::Diagnostic;
use selectlab_core::market::Timeframe;

use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, immutable result of one (variant, timeframe) simulation.
///
/// This is the stable structure external reporters consume; everything in it
/// serializes deterministically, so byte-comparing two results is a valid
/// reproducibility check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Content hash of the run configuration that produced this result.
    pub run_id: String,
    pub variant_id: String,
    pub timeframe: Timeframe,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub metrics: PerformanceMetrics,
    /// Full ledger snapshot: positions, trades, equity curve, fees.
    pub ledger: Ledger,
    pub diagnostics: Vec<Diagnostic>,
    /// True when the run was cancelled before its final date.
    pub incomplete: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SimulationResult {
    /// Stable display key for leaderboards and file names.
    pub fn key(&self) -> String {
        format!("{}@{}", self.variant_id, self.timeframe.as_str())
    }
}
