//! No-lookahead tests.
//!
//! Two angles:
//! 1. Injection: a feed response dated after the current simulated date must
//!    abort the run with a lookahead violation — the loop polices the
//!    boundary, it does not trust the feed.
//! 2. Truncation: anything computed from an as-of view must be identical
//!    whether or not the series contains later bars. Computed on truncated
//!    (bars 0..N) and full series, the first N values must match exactly.

use chrono::NaiveDate;

use selectlab_core::config::SimConfig;
use selectlab_core::data::flat_series;
use selectlab_core::domain::{Bar, Candidate};
use selectlab_core::engine::{run_simulation, CancelToken};
use selectlab_core::error::SimError;
use selectlab_core::feed::{
    CandidateProvider, MomentumProvider, ProviderChain, ReplayProvider, SuggestionContext,
};
use selectlab_core::market::MarketSeries;
use selectlab_core::strategy::{build_variants, NamedVariant, VariantConfig};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

/// Generate n bars of synthetic OHLCV data with deterministic variation.
fn make_test_bars(symbol: &str, n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price: f64 = 100.0;

    for i in 0..n {
        // Simple LCG keeps the walk reproducible without an RNG dependency.
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(Bar {
            symbol: symbol.to_string(),
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1_000 + (i as u64 * 100),
        });
    }

    bars
}

fn top1_variant() -> Vec<NamedVariant> {
    build_variants(&[(
        "top1".to_string(),
        VariantConfig::TopKEqualWeight { k: 1, total_exposure: 1.0 },
    )])
    .unwrap()
}

#[test]
fn future_dated_candidate_aborts_the_run() {
    let series =
        MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0, 11.0, 12.0])).unwrap();

    // Day 2's response claims knowledge of day 9.
    let provider = ReplayProvider::new()
        .with_response(d(2), vec![Candidate::new("ACME", 90.0, d(2))])
        .with_response(d(3), vec![Candidate::new("ACME", 90.0, d(9))]);
    let feed = ProviderChain::single(Box::new(provider));
    let variants = top1_variant();

    let result = run_simulation(
        &series,
        &["ACME".to_string()],
        &feed,
        &variants,
        &SimConfig::new(1_000.0),
        &CancelToken::new(),
    );

    match result {
        Err(SimError::Lookahead { asof, current, .. }) => {
            assert_eq!(asof, d(9));
            assert_eq!(current, d(3));
        }
        other => panic!("expected lookahead violation, got {other:?}"),
    }
}

#[test]
fn past_dated_candidate_is_accepted() {
    let series =
        MarketSeries::from_bars(flat_series("ACME", d(2), &[10.0, 11.0, 12.0])).unwrap();

    // Suggestions based on yesterday's data are legitimate.
    let provider =
        ReplayProvider::new().with_response(d(3), vec![Candidate::new("ACME", 90.0, d(2))]);
    let feed = ProviderChain::single(Box::new(provider));
    let variants = top1_variant();

    let result = run_simulation(
        &series,
        &["ACME".to_string()],
        &feed,
        &variants,
        &SimConfig::new(1_000.0),
        &CancelToken::new(),
    );
    assert!(result.is_ok());
}

/// As-of views never change when later bars are appended to the series.
#[test]
fn asof_views_identical_between_truncated_and_full_series() {
    let full_bars = make_test_bars("TEST", 200);
    let truncated_bars = full_bars[..100].to_vec();

    let full = MarketSeries::from_bars(full_bars).unwrap();
    let truncated = MarketSeries::from_bars(truncated_bars).unwrap();

    for &date in truncated.dates() {
        let full_view = full.as_of(date);
        let truncated_view = truncated.as_of(date);
        assert_eq!(
            full_view.bars("TEST"),
            truncated_view.bars("TEST"),
            "as-of view at {date} differs between truncated and full series"
        );
    }
}

/// Momentum scores computed from as-of views must be free of contamination:
/// the same date scores identically whether the series continues or not.
#[test]
fn momentum_scores_identical_between_truncated_and_full_series() {
    let full_bars = make_test_bars("TEST", 200);
    let truncated_bars = full_bars[..100].to_vec();

    let full = MarketSeries::from_bars(full_bars).unwrap();
    let truncated = MarketSeries::from_bars(truncated_bars).unwrap();

    let provider = MomentumProvider::new(20);
    let universe = vec!["TEST".to_string()];

    for &date in truncated.dates() {
        let full_ctx = SuggestionContext {
            view: full.as_of(date),
            market_notes: None,
        };
        let truncated_ctx = SuggestionContext {
            view: truncated.as_of(date),
            market_notes: None,
        };

        let from_full = provider.suggest(date, &universe, &full_ctx).unwrap();
        let from_truncated = provider.suggest(date, &universe, &truncated_ctx).unwrap();

        assert_eq!(
            from_full.len(),
            from_truncated.len(),
            "candidate count differs at {date}"
        );
        for (a, b) in from_full.iter().zip(&from_truncated) {
            assert!(
                (a.score - b.score).abs() < 1e-12,
                "look-ahead contamination at {date}: full={}, truncated={}",
                a.score,
                b.score
            );
        }
    }
}
