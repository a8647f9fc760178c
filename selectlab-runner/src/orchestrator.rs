//! Timeframe orchestrator — one independent simulation per timeframe.
//!
//! Timeframes never share state: each gets its own resampled series and its
//! own set of ledgers, because resampling moves both the no-lookahead
//! boundary and the next-bar execution lag. The fan-out is rayon-parallel;
//! everything a worker touches is either owned by it or read-only.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use selectlab_core::engine::{run_simulation, CancelToken};
use selectlab_core::error::Diagnostic;
use selectlab_core::market::{MarketSeries, Timeframe};
use selectlab_core::strategy::build_variants;

use crate::config::{RunConfig, RunConfigError};
use crate::metrics::PerformanceMetrics;
use crate::result::{SimulationResult, SCHEMA_VERSION};

/// A timeframe whose run aborted, with the fatal cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeFailure {
    pub timeframe: Timeframe,
    pub error: String,
}

/// Everything a finished matrix run produced.
///
/// Degraded timeframes still yield results (with diagnostics); aborted ones
/// yield no results and appear in `failures` instead.
#[derive(Debug)]
pub struct MatrixOutcome {
    /// One result per (variant, timeframe), ordered by timeframe then variant.
    pub results: Vec<SimulationResult>,
    pub failures: Vec<TimeframeFailure>,
}

/// Run the full comparison matrix: every variant on every timeframe.
///
/// `base_series` is the native (daily) series; load diagnostics from the
/// data layer are attached to every produced result.
pub fn run_matrix(
    config: &RunConfig,
    base_series: &MarketSeries,
    load_diagnostics: &[Diagnostic],
    cancel: &CancelToken,
) -> Result<MatrixOutcome, RunConfigError> {
    config.validate()?;
    let run_id = config.run_id();
    let sim_config = config.to_sim_config();
    let feed = config.build_feed();

    let per_timeframe: Vec<Result<Vec<SimulationResult>, TimeframeFailure>> = config
        .run
        .timeframes
        .par_iter()
        .map(|&timeframe| {
            let fail = |error: String| TimeframeFailure { timeframe, error };

            let series = base_series
                .resample(timeframe)
                .map_err(|e| fail(e.to_string()))?;

            // Variants are rebuilt per timeframe: nothing is shared, not
            // even the policy objects.
            let specs: Vec<(String, _)> = config
                .variants
                .iter()
                .map(|spec| (spec.id.clone(), spec.policy.clone()))
                .collect();
            let variants = build_variants(&specs).map_err(|e| fail(e.to_string()))?;

            let runs = run_simulation(
                &series,
                &config.run.universe,
                &feed,
                &variants,
                &sim_config,
                cancel,
            )
            .map_err(|e| fail(e.to_string()))?;

            let annualization = config.annualization(timeframe);
            let results = runs
                .into_iter()
                .map(|run| {
                    let equities = run.ledger.equity_values();
                    let metrics = PerformanceMetrics::compute(
                        &equities,
                        &run.ledger.trades,
                        run.ledger.fees_paid,
                        annualization,
                    );

                    let mut diagnostics = load_diagnostics.to_vec();
                    diagnostics.extend(run.diagnostics);

                    SimulationResult {
                        schema_version: SCHEMA_VERSION,
                        run_id: run_id.clone(),
                        variant_id: run.variant_id,
                        timeframe,
                        start_date: series.first_date(),
                        end_date: run.ledger.equity_curve.last().map(|p| p.date),
                        initial_capital: sim_config.initial_capital,
                        final_equity: equities
                            .last()
                            .copied()
                            .unwrap_or(sim_config.initial_capital),
                        metrics,
                        ledger: run.ledger,
                        diagnostics,
                        incomplete: run.incomplete,
                    }
                })
                .collect();

            Ok(results)
        })
        .collect();

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in per_timeframe {
        match outcome {
            Ok(mut tf_results) => results.append(&mut tf_results),
            Err(failure) => failures.push(failure),
        }
    }

    // par_iter preserves input order, but make the contract explicit.
    results.sort_by(|a, b| {
        a.timeframe
            .cmp(&b.timeframe)
            .then_with(|| a.variant_id.cmp(&b.variant_id))
    });

    Ok(MatrixOutcome { results, failures })
}
