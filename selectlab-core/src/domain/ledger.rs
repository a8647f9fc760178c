//! Ledger — per-variant record of cash, open positions, closed trades, equity history.
//!
//! Exactly one ledger exists per (variant, timeframe) pair. It is mutated only
//! by the fill path during that variant's step, and the equity accounting
//! identity must hold at every snapshot: `equity == cash + sum(position
//! market values)`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::Position;
use super::trade::TradeRecord;

/// One mark-to-market equity observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
    /// Held symbols with no bar on this date, marked at last known price.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_symbols: Vec<String>,
}

/// Per-variant portfolio ledger.
///
/// Positions are keyed in a `BTreeMap` so every iteration over them is in
/// symbol order; the simulation's determinism guarantee depends on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: BTreeMap<String, Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub fees_paid: f64,
    /// Entry-side fees still attached to open positions, keyed by symbol.
    /// Released into trade records proportionally as positions close.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub open_entry_fees: BTreeMap<String, f64>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            fees_paid: 0.0,
            open_entry_fees: BTreeMap::new(),
        }
    }

    /// Total equity = cash + sum of position market values at the given prices.
    ///
    /// A symbol missing from `prices` falls back to its cost basis, which only
    /// happens before the symbol's first snapshot.
    pub fn equity(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.symbol).copied().unwrap_or(pos.cost_basis);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.get(symbol).is_some_and(|p| !p.is_flat())
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol).filter(|p| !p.is_flat())
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.values().filter(|p| !p.is_flat()).count()
    }

    /// Apply a buy fill: debit cash, open or extend the position.
    ///
    /// The caller (the fill path) is responsible for having sized the order so
    /// cash never goes negative; this is debug-asserted here.
    pub fn apply_buy(&mut self, symbol: &str, shares: f64, price: f64, fee: f64, date: NaiveDate) {
        self.cash -= shares * price + fee;
        self.fees_paid += fee;
        *self.open_entry_fees.entry(symbol.to_string()).or_insert(0.0) += fee;

        match self.positions.get_mut(symbol) {
            Some(pos) => pos.add(shares, price),
            None => {
                self.positions.insert(
                    symbol.to_string(),
                    Position {
                        symbol: symbol.to_string(),
                        shares,
                        cost_basis: price,
                        opened: date,
                    },
                );
            }
        }

        debug_assert!(
            self.cash > -1e-6,
            "buy fill drove cash negative: {}",
            self.cash
        );
    }

    /// Apply a sell fill: credit cash, shrink the position, and append a
    /// `TradeRecord` for the closed portion. Entry fees are attributed to the
    /// trade proportionally to the fraction of the position sold.
    pub fn apply_sell(
        &mut self,
        symbol: &str,
        shares: f64,
        price: f64,
        fee: f64,
        date: NaiveDate,
    ) -> Option<TradeRecord> {
        let pos = self.positions.get_mut(symbol)?;
        let sold = shares.min(pos.shares);
        if sold <= 0.0 {
            return None;
        }

        self.cash += sold * price - fee;
        self.fees_paid += fee;

        let fraction = sold / pos.shares;
        let entry_fee_share = {
            let held = self.open_entry_fees.entry(symbol.to_string()).or_insert(0.0);
            let share = *held * fraction;
            *held -= share;
            share
        };

        let gross_pnl = sold * (price - pos.cost_basis);
        let trade = TradeRecord {
            symbol: symbol.to_string(),
            entry_date: pos.opened,
            entry_price: pos.cost_basis,
            exit_date: date,
            exit_price: price,
            shares: sold,
            gross_pnl,
            fees: entry_fee_share + fee,
            net_pnl: gross_pnl - entry_fee_share - fee,
            holding_days: (date - pos.opened).num_days(),
        };

        pos.shares -= sold;
        if pos.is_flat() {
            self.positions.remove(symbol);
            self.open_entry_fees.remove(symbol);
        }

        self.trades.push(trade.clone());
        Some(trade)
    }

    /// Record a mark-to-market snapshot for `date` and return the equity.
    ///
    /// Debug builds assert the accounting identity against an independently
    /// recomputed position value.
    pub fn snapshot(
        &mut self,
        date: NaiveDate,
        prices: &BTreeMap<String, f64>,
        stale_symbols: Vec<String>,
    ) -> f64 {
        let equity = self.equity(prices);

        #[cfg(debug_assertions)]
        {
            let position_value: f64 = self
                .positions
                .values()
                .map(|pos| {
                    let price = prices.get(&pos.symbol).copied().unwrap_or(pos.cost_basis);
                    pos.market_value(price)
                })
                .sum();
            let expected = self.cash + position_value;
            assert!(
                (equity - expected).abs() < 1e-9,
                "equity accounting violated at {date}: equity={equity}, cash={} + positions={position_value}",
                self.cash
            );
        }

        self.equity_curve.push(EquityPoint {
            date,
            equity,
            cash: self.cash,
            stale_symbols,
        });
        equity
    }

    /// Equity values only, for metric functions that want a plain curve.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
