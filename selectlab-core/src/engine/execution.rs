//! Fill application: pending orders meet the day's bars.
//!
//! Fills use the bar's open — the next available open after the decision,
//! given the loop plans orders after the prior close. Sells are applied
//! before buys so same-step sale proceeds fund the buys. Buys are re-checked
//! against actual cash at the fill price and size-reduced rather than ever
//! driving cash negative.

use chrono::NaiveDate;

use crate::config::{Constraints, FeeModel};
use crate::domain::{Fill, OrderSide};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::market::MarketSeries;

use super::state::VariantState;

/// Process one variant's pending orders against the bars for `date`.
///
/// Orders whose symbol has no bar today stay pending (deferred). Orders
/// truncated by the liquidity cap keep their remainder pending.
pub fn process_fills(
    state: &mut VariantState,
    series: &MarketSeries,
    date: NaiveDate,
    constraints: &Constraints,
    fees: &FeeModel,
) -> Vec<Fill> {
    let mut fills = Vec::new();
    let pending = std::mem::take(&mut state.pending);
    let mut still_pending = Vec::new();

    // Sells free cash for buys processed in the same pass.
    let (sells, buys): (Vec<_>, Vec<_>) = pending
        .into_iter()
        .partition(|o| o.side == OrderSide::Sell);

    for mut order in sells.into_iter().chain(buys) {
        let Some(bar) = series.bar(&order.symbol, date) else {
            state.note_deferral(date, &order);
            still_pending.push(order);
            continue;
        };

        let price = bar.open;
        let liquidity_cap = constraints
            .max_trade_pct_of_volume
            .map(|pct| (bar.volume as f64 * pct).floor())
            .unwrap_or(f64::INFINITY);

        if liquidity_cap < 1.0 {
            // Zero available liquidity on this bar: defer, don't fail.
            state.note_deferral(date, &order);
            still_pending.push(order);
            continue;
        }

        let mut shares = order.remaining().min(liquidity_cap);

        match order.side {
            OrderSide::Sell => {
                let held = state.ledger.position(&order.symbol).map_or(0.0, |p| p.shares);
                shares = shares.min(held);
                if shares < 1.0 {
                    // Position already gone (superseded elsewhere); drop.
                    continue;
                }
                let fee = fees.fee_for(shares * price);
                state.ledger.apply_sell(&order.symbol, shares, price, fee, date);
                fills.push(Fill {
                    symbol: order.symbol.clone(),
                    side: OrderSide::Sell,
                    shares,
                    price,
                    fee,
                    date,
                });
            }
            OrderSide::Buy => {
                // Never let a buy overdraw cash: size down to what the fill
                // price actually affords, fees included.
                let fee_rate = match fees {
                    FeeModel::None => 0.0,
                    FeeModel::FixedBps { bps } => bps / 10_000.0,
                };
                let affordable = (state.ledger.cash / (price * (1.0 + fee_rate))).floor();
                if affordable < shares {
                    state.diagnostics.push(Diagnostic::for_subject(
                        date,
                        DiagnosticKind::AllocationRejected,
                        &order.symbol,
                        format!(
                            "buy of {shares:.0} reduced to {affordable:.0} at fill price {price}"
                        ),
                    ));
                    shares = affordable;
                    // A cash reduction shrinks the order for good; only the
                    // liquidity cap defers a remainder to later bars.
                    order.shares = order.filled + shares;
                }
                if shares < 1.0 {
                    continue; // nothing affordable; order dropped, reason recorded
                }
                let fee = fees.fee_for(shares * price);
                state.ledger.apply_buy(&order.symbol, shares, price, fee, date);
                fills.push(Fill {
                    symbol: order.symbol.clone(),
                    side: OrderSide::Buy,
                    shares,
                    price,
                    fee,
                    date,
                });
            }
        }

        order.filled += shares;
        if !order.is_complete() {
            // Liquidity-capped remainder carries to the next bar.
            still_pending.push(order);
        }
    }

    state.pending = still_pending;
    fills
}
