//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. Zero-trade and single-observation inputs yield defined,
//! finite values — never NaN, never a panic — so degenerate runs still rank.

use serde::{Deserialize, Serialize};

use selectlab_core::domain::TradeRecord;

/// Aggregate performance metrics for a single (variant, timeframe) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    /// Annualized mean/std of periodic returns. The annualization factor is
    /// a configuration input, not an assumption baked in here.
    pub sharpe: f64,
    /// Peak-to-trough, as a negative fraction (-0.15 = 15% drawdown).
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// `win_rate * avg_win - loss_rate * avg_loss` — expected profit per trade.
    pub expectancy: f64,
    /// Expectancy clipped at zero, the feed-weighting convention.
    pub signal_strength: f64,
    pub total_pnl: f64,
    pub trade_count: usize,
    pub fees_paid: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade list.
    pub fn compute(
        equity_curve: &[f64],
        trades: &[TradeRecord],
        fees_paid: f64,
        annualization: f64,
    ) -> Self {
        let expectancy = expectancy(trades);
        Self {
            total_return: total_return(equity_curve),
            sharpe: sharpe_ratio(equity_curve, annualization),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            expectancy,
            signal_strength: expectancy.max(0.0),
            total_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            trade_count: trades.len(),
            fees_paid,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    let final_eq = *equity_curve.last().unwrap();
    if initial <= 0.0 {
        return 0.0;
    }
    (final_eq - initial) / initial
}

/// Annualized Sharpe-like ratio from periodic returns.
///
/// `mean(returns) / std(returns) * sqrt(annualization)`. Returns 0.0 when
/// variance is zero or fewer than 2 periods exist.
pub fn sharpe_ratio(equity_curve: &[f64], annualization: f64) -> f64 {
    let returns = periodic_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * annualization.max(0.0).sqrt()
}

/// Maximum drawdown as a negative fraction.
///
/// Returns 0.0 for constant or monotonically increasing equity.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of trades with positive net pnl.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Average profit per winning trade (0.0 with no winners).
pub fn avg_win(trades: &[TradeRecord]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&wins)
}

/// Average loss per losing trade, as a positive number (0.0 with no losers).
pub fn avg_loss(trades: &[TradeRecord]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .collect();
    mean_f64(&losses)
}

/// Expected profit per trade: `win_rate * avg_win - loss_rate * avg_loss`.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.net_pnl > 0.0).count();
    let losses = trades.iter().filter(|t| t.net_pnl < 0.0).count();
    let n = trades.len() as f64;
    (wins as f64 / n) * avg_win(trades) - (losses as f64 / n) * avg_loss(trades)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Period-over-period returns from an equity curve.
pub fn periodic_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
