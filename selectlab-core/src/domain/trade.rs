//! TradeRecord — a completed round-trip trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed trade: entry → exit. Append-only and immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: f64,
    pub gross_pnl: f64,
    pub fees: f64,
    pub net_pnl: f64,
    pub holding_days: i64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.shares == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.shares)
    }
}
