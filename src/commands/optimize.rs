//! Optimize command implementation with progress tracking and grid overrides

use anyhow::{Context, Result};
use averaging_strategies::data::{self, BarCache};
use averaging_strategies::grid::{self, ParamGrid};
use averaging_strategies::optimizer::{sort_results, OptimizationResult, Optimizer, SortKey};
use averaging_strategies::{Config, IndicatorEngine, SignalDetector, SignalIndex};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

pub fn run(
    config_path: String,
    sort_by: String,
    top: usize,
    overrides: Vec<String>,
    data_file: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    info!("Starting optimization");

    let sort_key: SortKey = sort_by.parse()?;

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let mut param_grid: ParamGrid = config.grid.clone().unwrap_or_default();
    grid::apply_overrides(&mut param_grid, &overrides)?;
    if param_grid.is_empty() {
        info!("No grid section or overrides given, evaluating base parameters only");
    }

    let sets = grid::generate_param_sets(&config.simulation, &param_grid)?;
    info!("Parameter combinations: {}", sets.len());

    // Load data
    let source = config.data_source(data_file.as_deref());
    info!("Loading data from: {}", source.path().display());
    let mut cache = BarCache::new(config.data.cache_max_age_secs);
    let key = BarCache::key(&config.data.symbol, &config.data.timeframe);
    let bars = cache.get_or_load(&key, &source)?;
    let (start, end) = config.data.date_range()?;
    let bars = data::filter_bars_by_date(bars, start, end);
    if bars.is_empty() {
        anyhow::bail!("No bars left after date filtering");
    }
    info!("Loaded {} bars", bars.len());

    // Indicators cover every condition in the grid
    let mut ma_periods = Vec::new();
    let mut lookbacks = Vec::new();
    for set in &sets {
        ma_periods.extend(set.params.hedge_entry_condition.required_ma_periods());
        lookbacks.extend(set.params.hedge_entry_condition.required_lookbacks());
    }
    let engine =
        IndicatorEngine::new(config.indicators.clone()).with_requirements(&ma_periods, &lookbacks);
    let frame = engine.compute(&bars);
    let signals = SignalDetector::new(config.signals.clone()).detect(&bars, &frame);
    let index = SignalIndex::build(&bars, &signals, config.lookup_policy)
        .context("Failed to index signals")?;

    println!("\n{}", "=".repeat(70));
    println!("OPTIMIZATION SUMMARY");
    println!("{}", "=".repeat(70));
    println!(
        "  Data:          {} {} ({} bars)",
        config.data.symbol,
        config.data.timeframe,
        bars.len()
    );
    println!("  Signals:       {}", index.len());
    println!("  Parameters:    {} combinations", sets.len());
    println!(
        "  Mode:          {}",
        if sequential { "sequential" } else { "parallel" }
    );
    println!("{}\n", "=".repeat(70));

    let optimizer = Optimizer::new(&bars, &frame, &index);

    let results: Vec<OptimizationResult> = if sequential {
        optimizer.optimize_sequential(&sets)
    } else {
        let pb = ProgressBar::new(sets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec}] ✓ {msg}",
                )?
                .progress_chars("█░ "),
        );
        pb.set_message("running...");
        pb.tick();

        let results = optimizer.optimize_with_progress(&sets, &pb);
        pb.finish_with_message(format!("{} valid", results.len()));
        println!();
        results
    };

    if results.is_empty() {
        info!("No valid results found.");
        println!("No valid results found.");
        return Ok(());
    }

    let mut results = results;
    sort_results(&mut results, sort_key);
    info!("Total results: {}, sorted by: {}", results.len(), sort_key);

    let display_count = top.min(results.len());
    println!("\n{}", "=".repeat(120));
    println!(
        "TOP {} OPTIMIZATION RESULTS (sorted by {})",
        display_count, sort_key
    );
    println!("{}", "=".repeat(120));
    println!(
        "{:<4} {:>11} {:>8} {:>9} {:>7} {:>6} {:>6} {:>10} | Parameters",
        "Rank", "Profit$", "WRet%", "Return%", "WinR%", "Trades", "Hedges", "Hedge$"
    );
    println!("{}", "-".repeat(120));

    for (i, result) in results.iter().take(display_count).enumerate() {
        let m = &result.metrics;
        println!(
            "{:<4} {:>11.2} {:>8.2} {:>9.2} {:>7.2} {:>6} {:>6} {:>10.2} | {}",
            i + 1,
            m.total_profit,
            m.weighted_return,
            m.total_return,
            m.win_rate,
            m.total_trades,
            m.hedge_trades,
            m.hedge_profit,
            grid::format_overrides(&result.overrides)
        );
    }
    println!("{}", "=".repeat(120));

    if let Some(best) = results.first() {
        info!(
            "Best: {} (profit ${:.2})",
            grid::format_overrides(&best.overrides),
            best.metrics.total_profit
        );
    }

    Ok(())
}
