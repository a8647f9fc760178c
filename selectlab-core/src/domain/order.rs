//! Order — ephemeral instruction produced by the allocator, consumed by the fill path.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// A market order at bar-level granularity.
///
/// Orders are created when a variant's targets are allocated at date D and
/// fill at the next available bar's open. An order whose symbol has no bar
/// on the fill date stays pending and is retried on the next bar; `filled`
/// tracks cumulative fills so a liquidity-capped order can complete across
/// several bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: OrderSide,
    pub shares: f64,
    /// Shares filled so far (partial fills from the liquidity cap).
    pub filled: f64,
    pub requested: NaiveDate,
}

impl Order {
    pub fn new(symbol: impl Into<String>, side: OrderSide, shares: f64, requested: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            shares,
            filled: 0.0,
            requested,
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.shares - self.filled).max(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() < 1.0
    }
}

/// Record of one fill applied to a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: OrderSide,
    pub shares: f64,
    pub price: f64,
    pub fee: f64,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_tracks_remaining() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut order = Order::new("ACME", OrderSide::Buy, 100.0, date);
        assert_eq!(order.remaining(), 100.0);
        assert!(!order.is_complete());

        order.filled = 60.0;
        assert_eq!(order.remaining(), 40.0);

        order.filled = 99.5;
        assert!(order.is_complete());
    }
}
