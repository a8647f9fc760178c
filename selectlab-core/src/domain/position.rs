//! Position tracking.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position owned by exactly one ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: f64,
    /// Average entry price per share.
    pub cost_basis: f64,
    pub opened: NaiveDate,
}

impl Position {
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.shares * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.shares * (current_price - self.cost_basis)
    }

    pub fn is_flat(&self) -> bool {
        self.shares < 1.0
    }

    /// Merge an additional buy into this position, re-averaging the cost basis.
    pub fn add(&mut self, shares: f64, price: f64) {
        let total_cost = self.cost_basis * self.shares + price * shares;
        self.shares += shares;
        if self.shares > 0.0 {
            self.cost_basis = total_cost / self.shares;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_position() -> Position {
        Position {
            symbol: "ACME".into(),
            shares: 100.0,
            cost_basis: 50.0,
            opened: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[test]
    fn market_value_and_pnl() {
        let pos = open_position();
        assert_eq!(pos.market_value(55.0), 5_500.0);
        assert_eq!(pos.unrealized_pnl(55.0), 500.0);
        assert_eq!(pos.unrealized_pnl(45.0), -500.0);
    }

    #[test]
    fn add_reaverages_cost_basis() {
        let mut pos = open_position();
        pos.add(100.0, 60.0);
        assert_eq!(pos.shares, 200.0);
        assert!((pos.cost_basis - 55.0).abs() < 1e-10);
    }
}
