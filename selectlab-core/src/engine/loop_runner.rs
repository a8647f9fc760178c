//! Date-by-date simulation loop — the heart of the engine.
//!
//! Four phases per date D:
//! 1. Fill pending orders at D's open (sells before buys, deferrals kept)
//! 2. Query the candidate feed for D and police the no-lookahead boundary
//! 3. Let each variant decide on the as-of-D view; allocate into new orders
//! 4. Mark every ledger to market at D's close and snapshot equity
//!
//! Orders planned in phase 3 first meet a bar in the NEXT date's phase 1 —
//! the fixed next-bar-open execution lag.

use std::collections::BTreeMap;

use crate::config::SimConfig;
use crate::domain::Ledger;
use crate::error::{Diagnostic, DiagnosticKind, SimError};
use crate::feed::{ProviderChain, SuggestionContext};
use crate::market::MarketSeries;
use crate::strategy::NamedVariant;
use crate::allocator::plan_allocation;

use super::execution::process_fills;
use super::state::VariantState;
use super::CancelToken;

/// Outcome of one variant's simulation over one series.
#[derive(Debug)]
pub struct VariantRun {
    pub variant_id: String,
    pub ledger: Ledger,
    pub diagnostics: Vec<Diagnostic>,
    /// True when the run was cancelled before the final date; the equity
    /// curve covers only completed dates.
    pub incomplete: bool,
}

/// Run every variant over the series, one shared feed, independent ledgers.
///
/// Returns one `VariantRun` per variant, in variant-id order. The only
/// fatal outcomes are an invalid configuration and a lookahead violation;
/// everything else degrades into per-variant diagnostics.
pub fn run_simulation(
    series: &MarketSeries,
    universe: &[String],
    feed: &ProviderChain,
    variants: &[NamedVariant],
    config: &SimConfig,
    cancel: &CancelToken,
) -> Result<Vec<VariantRun>, SimError> {
    config.validate()?;

    let mut states: Vec<VariantState> = variants
        .iter()
        .map(|_| VariantState::new(config.initial_capital))
        .collect();
    let mut cancelled = false;

    for &date in series.dates() {
        // Cancellation only lands on a step boundary: a step is atomic with
        // respect to ledger mutation.
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        // ─── Phase 1: fills at today's open ───
        for state in states.iter_mut() {
            process_fills(state, series, date, &config.constraints, &config.fees);
        }

        // ─── Phase 2: candidate feed ───
        let view = series.as_of(date);
        let ctx = SuggestionContext {
            view,
            market_notes: None,
        };
        let outcome = feed.suggest(date, universe, &ctx);

        for (provider, error) in &outcome.failures {
            let diag = Diagnostic::for_subject(
                date,
                DiagnosticKind::ProviderFailover,
                provider,
                error.clone(),
            );
            for state in states.iter_mut() {
                state.diagnostics.push(diag.clone());
            }
        }

        // The boundary is enforced here, not trusted from the feed: any
        // response claiming knowledge of a later date kills the run.
        for candidate in &outcome.candidates {
            if candidate.asof_date > date {
                return Err(SimError::Lookahead {
                    provider: outcome
                        .served_by
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                    asof: candidate.asof_date,
                    current: date,
                });
            }
        }

        let mut candidates = outcome.candidates;
        candidates.truncate(config.max_candidates);

        if candidates.is_empty() {
            let diag = Diagnostic::new(
                date,
                DiagnosticKind::EmptyCandidates,
                "no candidates for this date; variants hold or unwind",
            );
            for state in states.iter_mut() {
                state.diagnostics.push(diag.clone());
            }
        }

        // ─── Phase 3: decide + allocate, fixed variant order ───
        for (variant, state) in variants.iter().zip(states.iter_mut()) {
            let targets = variant.policy.decide(&view, &candidates, &state.ledger);

            // Reference prices: last known close for every symbol involved.
            let mut prices: BTreeMap<String, f64> = BTreeMap::new();
            for symbol in state.ledger.positions.keys() {
                if let Some(close) = view.last_close(symbol) {
                    prices.insert(symbol.clone(), close);
                }
            }
            for symbol in targets.symbols() {
                if let Some(close) = view.last_close(symbol) {
                    prices.insert(symbol.to_string(), close);
                }
            }

            let plan = plan_allocation(&state.ledger, &targets, &prices, &config.constraints, date);
            state.diagnostics.extend(plan.rejections);
            state.queue_orders(plan.orders);
        }

        // ─── Phase 4: mark-to-market snapshot at today's close ───
        for state in states.iter_mut() {
            let mut prices: BTreeMap<String, f64> = BTreeMap::new();
            let mut stale: Vec<String> = Vec::new();

            let held: Vec<String> = state.ledger.positions.keys().cloned().collect();
            for symbol in held {
                match series.bar(&symbol, date) {
                    Some(bar) => {
                        prices.insert(symbol.clone(), bar.close);
                        state.clear_stale(&symbol);
                    }
                    None => {
                        // Halted or delisted today: mark at last known close,
                        // flag the snapshot, never silently drop the position.
                        if let Some(close) = view.last_close(&symbol) {
                            prices.insert(symbol.clone(), close);
                        }
                        stale.push(symbol.clone());
                        if state.mark_stale(&symbol) {
                            state.diagnostics.push(Diagnostic::for_subject(
                                date,
                                DiagnosticKind::StaleMark,
                                &symbol,
                                "no bar today; marked at last known price",
                            ));
                        }
                    }
                }
            }

            state.ledger.snapshot(date, &prices, stale);
        }
    }

    Ok(variants
        .iter()
        .zip(states)
        .map(|(variant, state)| VariantRun {
            variant_id: variant.id.clone(),
            ledger: state.ledger,
            diagnostics: state.diagnostics,
            incomplete: cancelled,
        })
        .collect())
}
