//! Per-variant mutable state that evolves date-by-date during the loop.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::{Ledger, Order};
use crate::error::{Diagnostic, DiagnosticKind};

/// Everything one variant owns while its simulation runs: its ledger, its
/// pending (not yet filled) orders, and its diagnostics trail.
pub struct VariantState {
    pub ledger: Ledger,
    /// Orders awaiting their fill bar. At most one per symbol; a newer plan
    /// for the same symbol replaces the older order (cancel/replace).
    pub pending: Vec<Order>,
    pub diagnostics: Vec<Diagnostic>,
    /// Symbols currently marked stale, so the diagnostic fires once per
    /// episode instead of every snapshot.
    stale: BTreeSet<String>,
    /// (symbol, requested date) pairs whose deferral was already recorded.
    deferral_noted: BTreeSet<(String, NaiveDate)>,
}

impl VariantState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            ledger: Ledger::new(initial_capital),
            pending: Vec::new(),
            diagnostics: Vec::new(),
            stale: BTreeSet::new(),
            deferral_noted: BTreeSet::new(),
        }
    }

    /// Queue new orders, superseding any pending order for the same symbol.
    pub fn queue_orders(&mut self, orders: Vec<Order>) {
        for order in orders {
            self.pending.retain(|p| p.symbol != order.symbol);
            self.pending.push(order);
        }
    }

    /// Record a deferral diagnostic once per (symbol, requested date).
    pub fn note_deferral(&mut self, date: NaiveDate, order: &Order) {
        let key = (order.symbol.clone(), order.requested);
        if self.deferral_noted.insert(key) {
            self.diagnostics.push(Diagnostic::for_subject(
                date,
                DiagnosticKind::DeferredFill,
                &order.symbol,
                format!("no bar on {date}; order from {} retried next bar", order.requested),
            ));
        }
    }

    /// Track a symbol turning stale; returns true the first time per episode.
    pub fn mark_stale(&mut self, symbol: &str) -> bool {
        self.stale.insert(symbol.to_string())
    }

    /// Clear the stale flag once the symbol trades again.
    pub fn clear_stale(&mut self, symbol: &str) {
        self.stale.remove(symbol);
    }
}
