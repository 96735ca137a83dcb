//! Averaging-down strategies - main entry point
//!
//! This binary provides two subcommands:
//! - backtest: Simulate the strategy on one symbol/timeframe
//! - optimize: Grid search over simulation parameters

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "averaging-strategies")]
#[command(about = "Averaging-down strategy backtester with hedge overlay and parameter sweeps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategy backtest
    Backtest {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/btc_4h.json")]
        config: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Long stop-loss percent (negative), overrides config
        #[arg(long, allow_hyphen_values = true)]
        stop_loss_long: Option<f64>,

        /// Enable the hedge overlay
        #[arg(long, conflicts_with = "no_hedge")]
        hedge: bool,

        /// Disable the hedge overlay
        #[arg(long)]
        no_hedge: bool,

        /// Read bars from this CSV instead of {data_dir}/{symbol}_{timeframe}.csv
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Export closed trades to the results directory
        #[arg(long)]
        export: bool,
    },

    /// Optimize simulation parameters (grid search from JSON config)
    Optimize {
        /// Path to configuration file with grid section
        #[arg(short, long, default_value = "configs/btc_4h.json")]
        config: String,

        /// Sort results by metric (profit, return, weighted_return, win_rate, hedge_profit)
        #[arg(long, default_value = "profit")]
        sort_by: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Override grid params. Format: "param=val1,val2,val3". Can be used multiple times.
        /// Example: --override "stop_loss_long=-20,-25,-30" --override "hedge_enabled=true,false"
        #[arg(short = 'O', long = "override", allow_hyphen_values = true)]
        overrides: Vec<String>,

        /// Read bars from this CSV instead of {data_dir}/{symbol}_{timeframe}.csv
        #[arg(long)]
        data_file: Option<PathBuf>,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Optimizer: keep the console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Backtest { .. } => ("backtest", false),
        Commands::Optimize { .. } => ("optimize", true),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Backtest {
            config,
            start,
            end,
            stop_loss_long,
            hedge,
            no_hedge,
            data_file,
            export,
        } => {
            let hedge_override = match (hedge, no_hedge) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::backtest::run(commands::backtest::BacktestArgs {
                config_path: config,
                start,
                end,
                stop_loss_long,
                hedge: hedge_override,
                data_file,
                export,
                verbose: cli.verbose,
            })
        }

        Commands::Optimize {
            config,
            sort_by,
            top,
            overrides,
            data_file,
            sequential,
        } => commands::optimize::run(config, sort_by, top, overrides, data_file, sequential),
    }
}
