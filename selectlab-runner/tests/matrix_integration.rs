//! Matrix runs end-to-end: metrics sanity, cache hits, report artifacts.

use selectlab_core::engine::CancelToken;
use selectlab_runner::{
    load_series, run_matrix, ComparisonReport, CsvTapeSink, JsonResultSink, ReportSink,
    ResultCache, RunConfig,
};

const CONFIG: &str = r#"
    [run]
    initial_capital = 100000.0
    universe = ["AAA", "BBB", "CCC"]
    timeframes = ["daily"]

    [constraints]
    max_position_pct = 0.5
    max_open_positions = 3

    [[variants]]
    id = "top1"
    [variants.policy]
    type = "top_k_equal_weight"
    k = 1
    total_exposure = 1.0

    [[variants]]
    id = "weighted"
    [variants.policy]
    type = "confidence_weighted"
    max_names = 3
    total_exposure = 0.9

    [[feed]]
    provider = "momentum"
    lookback = 10

    [data]
    source = "synthetic"
    seed = 31
    days = 150
"#;

#[test]
fn metrics_are_finite_and_internally_consistent() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let loaded = load_series(&config).unwrap();
    let outcome = run_matrix(&config, &loaded.series, &loaded.diagnostics, &CancelToken::new())
        .unwrap();

    for result in &outcome.results {
        let m = &result.metrics;
        for value in [
            m.total_return,
            m.sharpe,
            m.max_drawdown,
            m.win_rate,
            m.avg_win,
            m.avg_loss,
            m.expectancy,
            m.signal_strength,
            m.total_pnl,
        ] {
            assert!(value.is_finite(), "non-finite metric in {}", result.key());
        }

        assert!(m.max_drawdown <= 0.0);
        assert!((0.0..=1.0).contains(&m.win_rate));
        assert_eq!(m.trade_count, result.ledger.trades.len());

        // Total return matches the equity curve endpoints.
        let curve = result.ledger.equity_values();
        if curve.len() >= 2 {
            let expected = (curve.last().unwrap() - curve[0]) / curve[0];
            assert!((m.total_return - expected).abs() < 1e-9);
        }

        // Equity curve covers every simulated date exactly once, in order.
        let dates: Vec<_> = result.ledger.equity_curve.iter().map(|p| p.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
    }
}

#[test]
fn comparison_report_ranks_all_results() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let loaded = load_series(&config).unwrap();
    let outcome = run_matrix(&config, &loaded.series, &loaded.diagnostics, &CancelToken::new())
        .unwrap();

    let report = ComparisonReport::new(&outcome.results);
    assert_eq!(report.by_total_return.len(), outcome.results.len());
    assert_eq!(report.by_win_rate.len(), outcome.results.len());

    // Best-first ordering.
    for pair in report.by_total_return.windows(2) {
        assert!(pair[0].total_return >= pair[1].total_return);
    }
}

#[test]
fn result_cache_serves_repeat_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(dir.path()).unwrap();

    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let run_id = config.run_id();
    assert!(!cache.contains(&run_id));

    let loaded = load_series(&config).unwrap();
    let outcome = run_matrix(&config, &loaded.series, &loaded.diagnostics, &CancelToken::new())
        .unwrap();
    cache.put(&run_id, &outcome.results).unwrap();

    assert!(cache.contains(&run_id));
    assert_eq!(cache.len().unwrap(), 1);

    let cached = cache.get(&run_id).unwrap().unwrap();
    assert_eq!(cached, outcome.results);
}

#[test]
fn sinks_write_artifacts_for_a_real_run() {
    let dir = tempfile::tempdir().unwrap();

    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let loaded = load_series(&config).unwrap();
    let outcome = run_matrix(&config, &loaded.series, &loaded.diagnostics, &CancelToken::new())
        .unwrap();

    JsonResultSink::new(dir.path()).write(&outcome.results).unwrap();
    CsvTapeSink::new(dir.path()).write(&outcome.results).unwrap();

    assert!(dir.path().join("results.json").exists());
    assert!(dir.path().join("top1_daily_trades.csv").exists());
    assert!(dir.path().join("top1_daily_equity.csv").exists());
    assert!(dir.path().join("weighted_daily_trades.csv").exists());
}
