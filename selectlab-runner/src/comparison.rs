//! Cross-variant comparison — rank finished results against each other.
//!
//! Rankings are total orders: the primary metric, then smaller max drawdown
//! (closer to zero), then lexical key. No hidden tie rule.

use serde::{Deserialize, Serialize};

use crate::result::SimulationResult;

/// What to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    TotalReturn,
    WinRate,
}

/// One comparable row distilled from a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub variant_id: String,
    pub timeframe: String,
    pub total_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub incomplete: bool,
}

impl ComparisonEntry {
    fn from_result(result: &SimulationResult) -> Self {
        Self {
            variant_id: result.variant_id.clone(),
            timeframe: result.timeframe.as_str().to_string(),
            total_return: result.metrics.total_return,
            win_rate: result.metrics.win_rate,
            max_drawdown: result.metrics.max_drawdown,
            trade_count: result.metrics.trade_count,
            incomplete: result.incomplete,
        }
    }

    fn key(&self) -> String {
        format!("{}@{}", self.variant_id, self.timeframe)
    }

    fn metric(&self, metric: RankingMetric) -> f64 {
        match metric {
            RankingMetric::TotalReturn => self.total_return,
            RankingMetric::WinRate => self.win_rate,
        }
    }
}

/// Cross-variant comparison over a set of finished results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// All entries, ranked best-first by total return.
    pub by_total_return: Vec<ComparisonEntry>,
    /// All entries, ranked best-first by win rate.
    pub by_win_rate: Vec<ComparisonEntry>,
}

impl ComparisonReport {
    pub fn new(results: &[SimulationResult]) -> Self {
        let entries: Vec<ComparisonEntry> =
            results.iter().map(ComparisonEntry::from_result).collect();
        Self {
            by_total_return: ranked(&entries, RankingMetric::TotalReturn),
            by_win_rate: ranked(&entries, RankingMetric::WinRate),
        }
    }

    pub fn best_by_total_return(&self) -> Option<&ComparisonEntry> {
        self.by_total_return.first()
    }

    pub fn worst_by_total_return(&self) -> Option<&ComparisonEntry> {
        self.by_total_return.last()
    }

    pub fn best_by_win_rate(&self) -> Option<&ComparisonEntry> {
        self.by_win_rate.first()
    }

    pub fn worst_by_win_rate(&self) -> Option<&ComparisonEntry> {
        self.by_win_rate.last()
    }
}

/// Rank entries best-first: metric desc, then max drawdown closer to zero,
/// then lexical key.
fn ranked(entries: &[ComparisonEntry], metric: RankingMetric) -> Vec<ComparisonEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.metric(metric)
            .partial_cmp(&a.metric(metric))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                // Drawdowns are negative; larger value = shallower drawdown wins.
                b.max_drawdown
                    .partial_cmp(&a.max_drawdown)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.key().cmp(&b.key()))
    });
    sorted
}
