//! SelectLab CLI — run strategy comparisons and inspect cached results.
//!
//! Commands:
//! - `run` — execute the comparison matrix from a TOML config, print the
//!   cross-variant ranking, optionally write JSON/CSV artifacts
//! - `inspect` — print the summary of a cached result set by run id

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use selectlab_core::engine::CancelToken;
use selectlab_runner::{
    load_series, run_matrix, ComparisonReport, CsvTapeSink, JsonResultSink, ReportSink,
    ResultCache, RunConfig, SimulationResult,
};

#[derive(Parser)]
#[command(name = "selectlab", about = "SelectLab — ranked-candidate strategy comparison engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the comparison matrix described by a TOML config.
    Run {
        /// Path to the run configuration.
        #[arg(long)]
        config: PathBuf,

        /// Directory for JSON/CSV artifacts (skipped when absent).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Result cache directory.
        #[arg(long, default_value = ".selectlab-cache")]
        cache_dir: PathBuf,

        /// Recompute even if the run id is already cached.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Print the summary of a cached result set.
    Inspect {
        /// Run id (as printed by `run`).
        run_id: String,

        #[arg(long, default_value = ".selectlab-cache")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            out,
            cache_dir,
            force,
        } => cmd_run(&config, out.as_deref(), &cache_dir, force),
        Commands::Inspect { run_id, cache_dir } => cmd_inspect(&run_id, &cache_dir),
    }
}

fn cmd_run(
    config_path: &std::path::Path,
    out: Option<&std::path::Path>,
    cache_dir: &std::path::Path,
    force: bool,
) -> Result<()> {
    let config = RunConfig::from_path(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let run_id = config.run_id();
    let cache = ResultCache::new(cache_dir)?;

    let results: Vec<SimulationResult> = if !force && cache.contains(&run_id) {
        println!("cache hit for run {run_id}");
        cache
            .get(&run_id)?
            .context("cache entry vanished between contains() and get()")?
    } else {
        let loaded = load_series(&config).context("loading market data")?;
        let outcome = run_matrix(&config, &loaded.series, &loaded.diagnostics, &CancelToken::new())?;

        for failure in &outcome.failures {
            eprintln!(
                "timeframe {} aborted: {}",
                failure.timeframe.as_str(),
                failure.error
            );
        }
        if outcome.results.is_empty() {
            bail!("no timeframe produced results");
        }

        cache.put(&run_id, &outcome.results)?;
        outcome.results
    };

    println!("run {run_id}");
    print_summary(&results);

    if let Some(out_dir) = out {
        JsonResultSink::new(out_dir).write(&results)?;
        CsvTapeSink::new(out_dir).write(&results)?;
        println!("artifacts written to {}", out_dir.display());
    }

    Ok(())
}

fn cmd_inspect(run_id: &str, cache_dir: &std::path::Path) -> Result<()> {
    let cache = ResultCache::new(cache_dir)?;
    let Some(results) = cache.get(run_id)? else {
        bail!("no cached results for run id {run_id}");
    };
    println!("run {run_id}");
    print_summary(&results);
    Ok(())
}

fn print_summary(results: &[SimulationResult]) {
    println!(
        "{:<24} {:>10} {:>9} {:>8} {:>9} {:>7}",
        "variant@timeframe", "return", "win rate", "trades", "max dd", "sharpe"
    );
    for result in results {
        let flag = if result.incomplete { " (incomplete)" } else { "" };
        println!(
            "{:<24} {:>9.2}% {:>8.1}% {:>8} {:>8.2}% {:>7.2}{flag}",
            result.key(),
            result.metrics.total_return * 100.0,
            result.metrics.win_rate * 100.0,
            result.metrics.trade_count,
            result.metrics.max_drawdown * 100.0,
            result.metrics.sharpe,
        );
    }

    let report = ComparisonReport::new(results);
    if let (Some(best), Some(worst)) = (report.best_by_total_return(), report.worst_by_total_return())
    {
        println!(
            "\nbest by return: {}@{} ({:+.2}%)   worst: {}@{} ({:+.2}%)",
            best.variant_id,
            best.timeframe,
            best.total_return * 100.0,
            worst.variant_id,
            worst.timeframe,
            worst.total_return * 100.0,
        );
    }
    if let Some(best) = report.best_by_win_rate() {
        println!(
            "best by win rate: {}@{} ({:.1}%)",
            best.variant_id,
            best.timeframe,
            best.win_rate * 100.0,
        );
    }

    let diag_count: usize = results.iter().map(|r| r.diagnostics.len()).sum();
    if diag_count > 0 {
        println!("{diag_count} diagnostics recorded (see results.json for detail)");
    }
}
