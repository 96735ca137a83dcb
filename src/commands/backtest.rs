//! Backtest command implementation

use anyhow::{Context, Result};
use averaging_strategies::data::{self, BarCache};
use averaging_strategies::{
    report, Config, ConditionEvaluator, IndicatorEngine, MonthlyPnLMatrix, PerformanceMetrics,
    SignalDetector, SignalIndex, SimulationResult, TradeSimulator,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct BacktestArgs {
    pub config_path: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub stop_loss_long: Option<f64>,
    pub hedge: Option<bool>,
    pub data_file: Option<PathBuf>,
    pub export: bool,
    pub verbose: bool,
}

pub fn run(args: BacktestArgs) -> Result<()> {
    info!("Starting backtest");

    let mut config = Config::from_file(&args.config_path)?;
    info!("Loaded configuration from: {}", args.config_path);

    // Apply overrides
    if let Some(start) = args.start {
        info!("Overriding start date to: {}", start);
        config.data.start_date = Some(start);
    }
    if let Some(end) = args.end {
        info!("Overriding end date to: {}", end);
        config.data.end_date = Some(end);
    }
    if let Some(stop) = args.stop_loss_long {
        info!("Overriding long stop-loss to: {}%", stop);
        config.simulation.stop_loss_long = stop;
    }
    if let Some(hedge) = args.hedge {
        info!("Overriding hedge overlay to: {}", hedge);
        config.simulation.hedge_enabled = hedge;
    }

    // Load data
    let source = config.data_source(args.data_file.as_deref());
    info!("Loading data from: {}", source.path().display());
    let mut cache = BarCache::new(config.data.cache_max_age_secs);
    let key = BarCache::key(&config.data.symbol, &config.data.timeframe);
    let bars = cache.get_or_load(&key, &source)?;

    let (start, end) = config.data.date_range()?;
    let bars = data::filter_bars_by_date(bars, start, end);
    if bars.is_empty() {
        anyhow::bail!("No bars left after date filtering");
    }
    info!(
        "Loaded {} bars ({} to {})",
        bars.len(),
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );

    // Indicators and signals
    let condition = &config.simulation.hedge_entry_condition;
    let engine = IndicatorEngine::new(config.indicators.clone()).with_requirements(
        &condition.required_ma_periods(),
        &condition.required_lookbacks(),
    );
    let frame = engine.compute(&bars);
    let signals = SignalDetector::new(config.signals.clone()).detect(&bars, &frame);
    debug!(
        long_entry = signals.long_entry.len(),
        long_exit = signals.long_exit.len(),
        short_entry = signals.short_entry.len(),
        short_exit = signals.short_exit.len(),
        "Signals detected"
    );

    let index = SignalIndex::build(&bars, &signals, config.lookup_policy)
        .context("Failed to index signals")?;

    // Simulate
    let simulator = TradeSimulator::new(config.simulation.clone())?;
    let predicate = ConditionEvaluator::new(condition, &frame);
    info!("Running simulation...");
    let result = simulator.run(&bars, &index, &predicate)?;

    let capital_per_fill = config.simulation.capital_per_fill;
    let metrics = PerformanceMetrics::from_result(&result, capital_per_fill);

    print_summary(&config, &metrics);
    if args.verbose {
        print_trades(&result, capital_per_fill);
    }
    print_open(&result);
    if config.simulation.hedge_enabled {
        print_hedges(&result);
    }

    let matrix = MonthlyPnLMatrix::from_result(&result, capital_per_fill);
    println!("{}", matrix.render(std::io::stdout().is_terminal()));

    if args.export || config.backtest.export_trades {
        let name = format!("{}_{}", config.data.symbol, config.data.timeframe);
        let path = report::export_trades_csv(
            &config.backtest.results_dir,
            &name,
            &result,
            capital_per_fill,
        )?;
        println!("Trades exported to {}", path.display());
        info!("Trades exported to {}", path.display());
    }

    info!("Backtest completed successfully");

    Ok(())
}

fn print_summary(config: &Config, m: &PerformanceMetrics) {
    let params = &config.simulation;

    println!("\n{}", "=".repeat(60));
    println!(
        "BACKTEST RESULTS: {} {}",
        config.data.symbol, config.data.timeframe
    );
    println!("{}", "=".repeat(60));
    println!("Stop Loss (L/S):    {:.1}% / {:.1}%", params.stop_loss_long, params.stop_loss_short);
    println!("Capital per Fill:   ${:.2}", params.capital_per_fill);
    println!("Total Trades:       {}", m.total_trades);
    println!("Winning Trades:     {}", m.winning_trades);
    println!("Win Rate:           {:.2}%", m.win_rate);
    println!("Total Return:       {:.2}%", m.total_return);
    println!("Average Return:     {:.2}%", m.avg_return);
    println!("Return Std Dev:     {:.2}%", m.return_std_dev);
    println!("Avg / Max Fills:    {:.2} / {}", m.avg_fills, m.max_fills);
    println!("Stop-Loss Exits:    {}", m.stop_loss_count);
    println!("Expired Exits:      {}", m.expired_count);
    println!("{}", "-".repeat(60));
    println!(
        "Long:  {:>4} trades, {:>6.2}% win, ${:>10.2}",
        m.long.trades, m.long.win_rate, m.long.profit
    );
    println!(
        "Short: {:>4} trades, {:>6.2}% win, ${:>10.2}",
        m.short.trades, m.short.win_rate, m.short.profit
    );
    if params.hedge_enabled {
        println!("{}", "-".repeat(60));
        println!(
            "Hedge:              threshold {}, every {}, {:.0}% size, when {}",
            params.hedge_activation_threshold,
            params.hedge_upgrade_interval,
            params.hedge_capital_fraction * 100.0,
            params.hedge_entry_condition.label()
        );
        println!("Hedge Trades:       {}", m.hedge_trades);
        println!("Hedge Win Rate:     {:.2}%", m.hedge_win_rate);
        println!("Hedge Profit:       ${:.2}", m.hedge_profit);
    }
    println!("{}", "-".repeat(60));
    println!("Primary Invested:   ${:.2}", m.primary_invested);
    println!("Primary Profit:     ${:.2}", m.primary_profit);
    println!("Total Profit:       ${:.2}", m.total_profit);
    println!("Weighted Return:    {:.2}%", m.weighted_return);
    println!("{}", "=".repeat(60));
}

fn print_trades(result: &SimulationResult, capital_per_fill: f64) {
    if result.trades.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(100));
    println!("TRADES");
    println!("{}", "=".repeat(100));
    println!(
        "{:<4} {:<5} {:<19} {:>5} {:>12} {:<19} {:>12} {:>8} {:>10} {:<12}",
        "#", "Side", "Entry", "Fills", "Avg", "Exit", "Exit Px", "Ret%", "P&L", "Reason"
    );
    println!("{}", "-".repeat(100));

    for (i, t) in result.trades.iter().enumerate() {
        let entry = t
            .entry_timestamps
            .first()
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<4} {:<5} {:<19} {:>5} {:>12.2} {:<19} {:>12.2} {:>8.2} {:>10.2} {:<12}",
            i,
            t.side,
            entry,
            t.fill_count,
            t.average_price,
            t.exit_timestamp.format("%Y-%m-%d %H:%M"),
            t.exit_price,
            t.return_pct,
            t.profit(capital_per_fill),
            t.exit_reason
        );
    }
    println!("{}", "=".repeat(100));
}

fn print_open(result: &SimulationResult) {
    if let Some(pos) = &result.open_position {
        println!("\nOPEN POSITION");
        println!("{}", "-".repeat(60));
        println!("Side:               {}", pos.side);
        println!("Fills:              {}", pos.fill_count);
        println!("Average Price:      {:.2}", pos.average_price);
        println!("Last Price:         {:.2}", pos.last_price);
        println!("Unrealized:         {:.2}%", pos.unrealized_pct);
        println!("Bars Held:          {}", pos.bars_held);
    }

    if let Some(hedge) = &result.open_hedge {
        println!("\nOPEN HEDGE");
        println!("{}", "-".repeat(60));
        println!("Entry Price:        {:.2}", hedge.entry_price);
        println!("Capital:            ${:.2}", hedge.invested_capital);
        println!("Primary Fills:      {}", hedge.primary_fill_count);
        println!("Unrealized:         {:.2}%", hedge.unrealized_pct);
        println!("Bars Held:          {}", hedge.bars_held);
    }
}

fn print_hedges(result: &SimulationResult) {
    if result.hedge_trades.is_empty() {
        println!("\nNo hedge trades.");
        return;
    }

    println!("\n{}", "=".repeat(100));
    println!("HEDGE TRADES");
    println!("{}", "=".repeat(100));
    println!(
        "{:<19} {:>12} {:<19} {:>12} {:>8} {:>10} {:>5} {:<20} {:>7}",
        "Entry", "Entry Px", "Exit", "Exit Px", "Ret%", "Capital", "Fills", "Reason", "Trade"
    );
    println!("{}", "-".repeat(100));

    for h in &result.hedge_trades {
        let trade = h
            .primary_trade
            .map(|i| i.to_string())
            .unwrap_or_else(|| "open".to_string());
        println!(
            "{:<19} {:>12.2} {:<19} {:>12.2} {:>8.2} {:>10.2} {:>5} {:<20} {:>7}",
            h.entry_timestamp.format("%Y-%m-%d %H:%M"),
            h.entry_price,
            h.exit_timestamp.format("%Y-%m-%d %H:%M"),
            h.exit_price,
            h.return_pct,
            h.invested_capital,
            h.primary_fill_count,
            h.exit_reason,
            trade
        );
    }
    println!("{}", "=".repeat(100));
}
