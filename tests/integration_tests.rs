//! Integration tests for the averaging-strategies system
//!
//! These tests drive the simulator end to end through the public API.

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};

use averaging_strategies::data::{self, CsvDataSource, MarketDataSource};
use averaging_strategies::{
    simulate, Bar, Config, ExitReason, IndicatorEngine, IndicatorParams, LookupPolicy,
    PerformanceMetrics, Side, SignalDetector, SignalEvent, SignalKind, SignalSet,
    SimulationError, SimulationParams, SimulationResult,
};

// =============================================================================
// Test Utilities
// =============================================================================

fn ts(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(4 * i as i64)
}

fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::flat(ts(i), c))
        .collect()
}

/// Signal at bar `i`, priced at that bar's close
fn at_close(bars: &[Bar], i: usize, kind: SignalKind) -> SignalEvent {
    SignalEvent::new(bars[i].timestamp, bars[i].close, kind)
}

fn always(_: usize) -> bool {
    true
}

fn never(_: usize) -> bool {
    false
}

fn run(bars: &[Bar], signals: &SignalSet, params: SimulationParams) -> SimulationResult {
    simulate(bars, signals, params, &never, LookupPolicy::Exact).unwrap()
}

fn hedge_params() -> SimulationParams {
    SimulationParams {
        hedge_enabled: true,
        hedge_activation_threshold: 2,
        hedge_upgrade_interval: 3,
        hedge_capital_fraction: 0.5,
        hedge_profit_target_pct: 8.0,
        hedge_stop_loss_pct: -15.0,
        capital_per_fill: 1000.0,
        ..SimulationParams::default()
    }
}

// =============================================================================
// Primary Position Tests
// =============================================================================

#[test]
fn test_average_down_and_take_profit() {
    let bars = flat_bars(&[100.0, 95.0, 90.0, 85.0, 90.0, 95.0, 100.0, 105.0, 100.0, 95.0]);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 1, SignalKind::LongEntry),
            at_close(&bars, 2, SignalKind::LongEntry),
        ],
        // Bar 3 exit is at a loss and must be ignored
        long_exit: vec![
            at_close(&bars, 3, SignalKind::LongExit),
            at_close(&bars, 7, SignalKind::LongExit),
        ],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.fill_count, 2);
    assert_eq!(trade.entry_prices, vec![95.0, 90.0]);
    assert_eq!(trade.entry_timestamps, vec![ts(1), ts(2)]);
    assert_eq!(trade.exit_timestamp, ts(7));
    assert_eq!(trade.exit_price, 105.0);
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);

    let avg = 2.0 / (1.0 / 95.0 + 1.0 / 90.0);
    assert_relative_eq!(trade.average_price, avg, epsilon = 1e-9);
    assert_relative_eq!(trade.average_price, 92.4324, epsilon = 1e-4);
    assert_relative_eq!(trade.return_pct, 13.597, epsilon = 1e-3);

    assert!(result.open_position.is_none());
    assert!(result.hedge_trades.is_empty());
}

#[test]
fn test_average_down_then_stop_loss() {
    let bars = flat_bars(&[100.0, 95.0, 90.0, 85.0, 80.0, 60.0, 100.0, 105.0, 100.0, 95.0]);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 1, SignalKind::LongEntry),
            at_close(&bars, 2, SignalKind::LongEntry),
        ],
        long_exit: vec![at_close(&bars, 7, SignalKind::LongExit)],
        ..SignalSet::default()
    };
    let params = SimulationParams {
        stop_loss_long: -25.0,
        ..SimulationParams::default()
    };

    let result = run(&bars, &signals, params);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.fill_count, 2);
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_eq!(trade.exit_timestamp, ts(5));
    assert_eq!(trade.exit_price, 60.0);
    assert!(trade.return_pct <= -25.0);
    assert_relative_eq!(trade.average_price, 92.4324, epsilon = 1e-4);
    assert!(result.open_position.is_none());
}

#[test]
fn test_stop_loss_at_close() {
    let bars = flat_bars(&[100.0, 80.0, 70.0, 60.0]);
    let signals = SignalSet {
        long_entry: vec![at_close(&bars, 0, SignalKind::LongEntry)],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_eq!(trade.exit_timestamp, ts(2));
    assert_eq!(trade.exit_price, 70.0);
    assert_relative_eq!(trade.return_pct, -30.0, epsilon = 1e-9);
    assert!(result.open_position.is_none());
}

#[test]
fn test_stop_loss_beats_exit_signal() {
    let bars = flat_bars(&[100.0, 70.0]);
    let signals = SignalSet {
        long_entry: vec![at_close(&bars, 0, SignalKind::LongEntry)],
        // Profitable signal price, but the close is through the stop
        long_exit: vec![SignalEvent::new(ts(1), 110.0, SignalKind::LongExit)],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
    assert_eq!(result.trades[0].exit_price, 70.0);
}

#[test]
fn test_exit_only_in_profit() {
    let bars = flat_bars(&[100.0, 98.0, 100.0, 101.0]);
    let signals = SignalSet {
        long_entry: vec![at_close(&bars, 0, SignalKind::LongEntry)],
        long_exit: vec![
            at_close(&bars, 1, SignalKind::LongExit),
            // Zero return is not a profit
            at_close(&bars, 2, SignalKind::LongExit),
        ],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert!(result.trades.is_empty());
    let open = result.open_position.unwrap();
    assert_eq!(open.side, Side::Long);
    assert_eq!(open.fill_count, 1);
    assert_eq!(open.bars_held, 3);
    assert_relative_eq!(open.unrealized_pct, 1.0, epsilon = 1e-9);
}

#[test]
fn test_long_and_short_never_overlap() {
    let bars = flat_bars(&[100.0, 100.0, 110.0, 100.0, 100.0]);
    let signals = SignalSet {
        long_entry: vec![at_close(&bars, 0, SignalKind::LongEntry)],
        long_exit: vec![at_close(&bars, 2, SignalKind::LongExit)],
        short_entry: vec![
            at_close(&bars, 1, SignalKind::ShortEntry),
            at_close(&bars, 3, SignalKind::ShortEntry),
        ],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert_eq!(result.trades.len(), 1);
    let long = &result.trades[0];
    assert_eq!(long.side, Side::Long);
    assert_eq!(long.fill_count, 1);
    assert_relative_eq!(long.return_pct, 10.0, epsilon = 1e-9);

    let open = result.open_position.unwrap();
    assert_eq!(open.side, Side::Short);
    assert_eq!(open.entry_timestamps, vec![ts(3)]);
}

#[test]
fn test_long_wins_entry_tie() {
    let bars = flat_bars(&[100.0, 100.0]);
    let signals = SignalSet {
        long_entry: vec![at_close(&bars, 0, SignalKind::LongEntry)],
        short_entry: vec![at_close(&bars, 0, SignalKind::ShortEntry)],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    let open = result.open_position.unwrap();
    assert_eq!(open.side, Side::Long);
    assert_eq!(open.fill_count, 1);
}

#[test]
fn test_same_bar_reentry_after_exit() {
    let bars = flat_bars(&[100.0, 110.0, 110.0]);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 0, SignalKind::LongEntry),
            at_close(&bars, 1, SignalKind::LongEntry),
        ],
        long_exit: vec![at_close(&bars, 1, SignalKind::LongExit)],
        ..SignalSet::default()
    };

    let result = run(&bars, &signals, SimulationParams::default());

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].fill_count, 1);
    assert_eq!(result.trades[0].exit_timestamp, ts(1));

    let open = result.open_position.unwrap();
    assert_eq!(open.entry_timestamps, vec![ts(1)]);
    assert_eq!(open.entry_prices, vec![110.0]);
}

#[test]
fn test_short_fill_cap() {
    let bars = flat_bars(&[100.0; 6]);
    let signals = SignalSet {
        short_entry: (0..5)
            .map(|i| at_close(&bars, i, SignalKind::ShortEntry))
            .collect(),
        ..SignalSet::default()
    };
    let params = SimulationParams {
        hedge_max_fills: 3,
        ..SimulationParams::default()
    };

    let result = run(&bars, &signals, params);

    let open = result.open_position.unwrap();
    assert_eq!(open.side, Side::Short);
    assert_eq!(open.fill_count, 3);
    assert_eq!(open.entry_timestamps, vec![ts(0), ts(1), ts(2)]);
}

#[test]
fn test_short_expires_only_in_profit() {
    let params = SimulationParams {
        hedge_max_hold_bars: Some(2),
        ..SimulationParams::default()
    };

    let falling = flat_bars(&[100.0, 98.0, 97.0, 96.0]);
    let signals = SignalSet {
        short_entry: vec![at_close(&falling, 0, SignalKind::ShortEntry)],
        ..SignalSet::default()
    };
    let result = run(&falling, &signals, params.clone());

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Short);
    assert_eq!(trade.exit_reason, ExitReason::Expired);
    assert_eq!(trade.exit_timestamp, ts(2));
    assert_relative_eq!(trade.return_pct, 3.0, epsilon = 1e-9);

    let rising = flat_bars(&[100.0, 101.0, 102.0, 103.0]);
    let signals = SignalSet {
        short_entry: vec![at_close(&rising, 0, SignalKind::ShortEntry)],
        ..SignalSet::default()
    };
    let result = run(&rising, &signals, params);

    assert!(result.trades.is_empty());
    assert_eq!(result.open_position.unwrap().bars_held, 3);
}

// =============================================================================
// Hedge Overlay Tests
// =============================================================================

#[test]
fn test_hedge_activation_and_upgrades() {
    let closes: Vec<f64> = (0..9).map(|i| 100.0 - i as f64).collect();
    let bars = flat_bars(&closes);
    let signals = SignalSet {
        long_entry: (0..8)
            .map(|i| at_close(&bars, i, SignalKind::LongEntry))
            .collect(),
        ..SignalSet::default()
    };

    let result = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();

    // Activated at 2 fills, upgraded at 5 and 8
    assert_eq!(result.hedge_trades.len(), 2);
    let first = &result.hedge_trades[0];
    assert_eq!(first.entry_timestamp, ts(1));
    assert_eq!(first.entry_price, 99.0);
    assert_eq!(first.primary_fill_count, 2);
    assert_relative_eq!(first.invested_capital, 1000.0, epsilon = 1e-9);
    assert_eq!(first.exit_reason, ExitReason::Upgraded);
    assert_eq!(first.exit_timestamp, ts(4));
    assert_eq!(first.exit_price, 96.0);
    assert_eq!(first.primary_trade, None);

    let second = &result.hedge_trades[1];
    assert_eq!(second.primary_fill_count, 5);
    assert_relative_eq!(second.invested_capital, 2500.0, epsilon = 1e-9);
    assert_eq!(second.exit_reason, ExitReason::Upgraded);
    assert_eq!(second.exit_timestamp, ts(7));

    let open = result.open_hedge.unwrap();
    assert_eq!(open.primary_fill_count, 8);
    assert_eq!(open.entry_price, 93.0);
    assert_relative_eq!(open.invested_capital, 4000.0, epsilon = 1e-9);
    assert_eq!(open.bars_held, 1);

    assert_eq!(result.open_position.unwrap().fill_count, 8);
}

#[test]
fn test_hedge_requires_predicate_and_flag() {
    let bars = flat_bars(&[100.0, 99.0, 98.0]);
    let signals = SignalSet {
        long_entry: (0..3)
            .map(|i| at_close(&bars, i, SignalKind::LongEntry))
            .collect(),
        ..SignalSet::default()
    };

    let blocked = simulate(&bars, &signals, hedge_params(), &never, LookupPolicy::Exact).unwrap();
    assert!(blocked.hedge_trades.is_empty());
    assert!(blocked.open_hedge.is_none());

    let disabled = SimulationParams {
        hedge_enabled: false,
        ..hedge_params()
    };
    let result = simulate(&bars, &signals, disabled, &always, LookupPolicy::Exact).unwrap();
    assert!(result.open_hedge.is_none());
}

#[test]
fn test_no_upgrades_when_interval_zero() {
    let bars = flat_bars(&[100.0, 99.0, 98.0, 97.0, 96.0, 95.0]);
    let signals = SignalSet {
        long_entry: (0..6)
            .map(|i| at_close(&bars, i, SignalKind::LongEntry))
            .collect(),
        ..SignalSet::default()
    };
    let params = SimulationParams {
        hedge_upgrade_interval: 0,
        ..hedge_params()
    };

    let result = simulate(&bars, &signals, params, &always, LookupPolicy::Exact).unwrap();

    assert!(result.hedge_trades.is_empty());
    let open = result.open_hedge.unwrap();
    assert_eq!(open.primary_fill_count, 2);
    assert_eq!(open.entry_price, 99.0);
}

#[test]
fn test_hedge_take_profit_wins_intrabar() {
    let mut bars = flat_bars(&[100.0, 100.0, 100.0]);
    // Touches both the 92 target and the 115 stop
    bars[2] = Bar::new_unchecked(ts(2), 100.0, 120.0, 90.0, 100.0, 0.0);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 0, SignalKind::LongEntry),
            at_close(&bars, 1, SignalKind::LongEntry),
        ],
        ..SignalSet::default()
    };

    let result = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();

    assert_eq!(result.hedge_trades.len(), 1);
    let hedge = &result.hedge_trades[0];
    assert_eq!(hedge.exit_reason, ExitReason::HedgeTakeProfit);
    assert_eq!(hedge.exit_timestamp, ts(2));
    assert_relative_eq!(hedge.exit_price, 92.0, epsilon = 1e-9);
    assert_relative_eq!(hedge.return_pct, 8.0, epsilon = 1e-9);
    assert_relative_eq!(hedge.profit(), 80.0, epsilon = 1e-9);
    assert!(result.open_hedge.is_none());
}

#[test]
fn test_hedge_stop_loss_intrabar() {
    let mut bars = flat_bars(&[100.0, 100.0, 100.0]);
    bars[2] = Bar::new_unchecked(ts(2), 100.0, 116.0, 95.0, 100.0, 0.0);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 0, SignalKind::LongEntry),
            at_close(&bars, 1, SignalKind::LongEntry),
        ],
        ..SignalSet::default()
    };

    let result = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();

    assert_eq!(result.hedge_trades.len(), 1);
    let hedge = &result.hedge_trades[0];
    assert_eq!(hedge.exit_reason, ExitReason::HedgeStopLoss);
    assert_relative_eq!(hedge.exit_price, 115.0, epsilon = 1e-9);
    assert_relative_eq!(hedge.return_pct, -15.0, epsilon = 1e-9);
}

#[test]
fn test_hedge_closes_with_primary() {
    let bars = flat_bars(&[100.0, 100.0, 104.0]);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 0, SignalKind::LongEntry),
            at_close(&bars, 1, SignalKind::LongEntry),
        ],
        long_exit: vec![at_close(&bars, 2, SignalKind::LongExit)],
        ..SignalSet::default()
    };

    let result = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].exit_reason, ExitReason::TakeProfit);

    assert_eq!(result.hedge_trades.len(), 1);
    let hedge = &result.hedge_trades[0];
    assert_eq!(hedge.exit_reason, ExitReason::ClosedWithPrimary);
    assert_eq!(hedge.exit_timestamp, ts(2));
    assert_eq!(hedge.exit_price, 104.0);
    assert_relative_eq!(hedge.return_pct, -4.0, epsilon = 1e-9);
    assert_eq!(hedge.primary_trade, Some(0));
    assert!(result.open_hedge.is_none());

    let metrics = PerformanceMetrics::from_result(&result, 1000.0);
    // 2000 * 4% - 1000 * 4%
    assert_relative_eq!(metrics.total_profit, 40.0, epsilon = 1e-9);
}

#[test]
fn test_reentry_hedge_stays_unlinked_while_open() {
    let bars = flat_bars(&[100.0, 100.0, 110.0, 99.0]);
    let signals = SignalSet {
        long_entry: vec![
            at_close(&bars, 0, SignalKind::LongEntry),
            at_close(&bars, 2, SignalKind::LongEntry),
        ],
        long_exit: vec![at_close(&bars, 2, SignalKind::LongExit)],
        ..SignalSet::default()
    };
    let params = SimulationParams {
        hedge_activation_threshold: 1,
        ..hedge_params()
    };

    let result = simulate(&bars, &signals, params, &always, LookupPolicy::Exact).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].exit_timestamp, ts(2));
    assert_eq!(result.open_position.as_ref().unwrap().entry_timestamps, vec![ts(2)]);

    assert_eq!(result.hedge_trades.len(), 2);
    let closed_with_first = &result.hedge_trades[0];
    assert_eq!(closed_with_first.exit_reason, ExitReason::ClosedWithPrimary);
    assert_eq!(closed_with_first.primary_trade, Some(0));

    // Opened on the re-entry bar, same timestamp as trade 0's exit
    let reentry = &result.hedge_trades[1];
    assert_eq!(reentry.entry_timestamp, ts(2));
    assert_eq!(reentry.exit_reason, ExitReason::HedgeTakeProfit);
    assert_eq!(reentry.primary_trade, None);
}

// =============================================================================
// Signal Lookup Tests
// =============================================================================

#[test]
fn test_lookup_policy() {
    let bars = flat_bars(&[100.0, 100.0, 100.0]);
    let signals = SignalSet {
        long_entry: vec![SignalEvent::new(
            ts(0) + Duration::hours(1),
            99.0,
            SignalKind::LongEntry,
        )],
        ..SignalSet::default()
    };

    let exact = simulate(
        &bars,
        &signals,
        SimulationParams::default(),
        &never,
        LookupPolicy::Exact,
    )
    .unwrap();
    assert!(exact.open_position.is_none());

    let nearest = simulate(
        &bars,
        &signals,
        SimulationParams::default(),
        &never,
        LookupPolicy::NearestPrior,
    )
    .unwrap();
    let open = nearest.open_position.unwrap();
    assert_eq!(open.entry_timestamps, vec![ts(0)]);
    assert_eq!(open.entry_prices, vec![99.0]);
}

// =============================================================================
// Precondition Tests
// =============================================================================

#[test]
fn test_precondition_errors() {
    let signals = SignalSet::default();
    let params = SimulationParams::default;

    let err = simulate(&[], &signals, params(), &never, LookupPolicy::Exact).unwrap_err();
    assert_eq!(err, SimulationError::EmptySeries);

    let mut bars = flat_bars(&[100.0, 101.0, 102.0]);
    bars.swap(1, 2);
    let err = simulate(&bars, &signals, params(), &never, LookupPolicy::Exact).unwrap_err();
    assert!(matches!(err, SimulationError::NonMonotonicTimestamp { index: 2, .. }));

    let mut bars = flat_bars(&[100.0, 101.0]);
    bars[1] = Bar::new_unchecked(ts(1), 100.0, 90.0, 110.0, 100.0, 0.0);
    let err = simulate(&bars, &signals, params(), &never, LookupPolicy::Exact).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidBar { index: 1, .. }));

    let bars = flat_bars(&[100.0, 101.0]);
    let bad_signal = SignalSet {
        long_entry: vec![SignalEvent::new(ts(0), 0.0, SignalKind::LongEntry)],
        ..SignalSet::default()
    };
    let err = simulate(&bars, &bad_signal, params(), &never, LookupPolicy::Exact).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidSignalPrice { .. }));

    let bad_params = SimulationParams {
        stop_loss_short: 10.0,
        ..SimulationParams::default()
    };
    let err = simulate(&bars, &signals, bad_params, &never, LookupPolicy::Exact).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::InvalidParameter {
            name: "stop_loss_short",
            ..
        }
    ));
}

#[test]
fn test_deterministic_results() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + 10.0 * ((i as f64) * 0.3).sin())
        .collect();
    let bars = flat_bars(&closes);
    let signals = SignalSet {
        long_entry: (0..60)
            .step_by(3)
            .map(|i| at_close(&bars, i, SignalKind::LongEntry))
            .collect(),
        long_exit: (1..60)
            .step_by(4)
            .map(|i| at_close(&bars, i, SignalKind::LongExit))
            .collect(),
        ..SignalSet::default()
    };

    let first = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();
    let second = simulate(&bars, &signals, hedge_params(), &always, LookupPolicy::Exact).unwrap();

    assert!(!first.trades.is_empty());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_csv_to_simulation_pipeline() {
    let closes: Vec<f64> = (0..300)
        .map(|i| 100.0 + 20.0 * ((i as f64) * 0.05).sin() + (i % 7) as f64)
        .collect();
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(ts(i), c, c * 1.01, c * 0.99, c, 10.0).unwrap())
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("TESTUSDT_4h.csv");
    data::write_csv(&path, &bars).unwrap();

    let loaded = CsvDataSource::new(&path).load().unwrap();
    assert_eq!(loaded.len(), bars.len());

    let frame = IndicatorEngine::new(IndicatorParams::default()).compute(&loaded);
    assert_eq!(frame.len(), loaded.len());
    let signals = SignalDetector::default().detect(&loaded, &frame);

    let result = simulate(
        &loaded,
        &signals,
        hedge_params(),
        &always,
        LookupPolicy::NearestPrior,
    )
    .unwrap();

    for trade in &result.trades {
        assert_eq!(trade.fill_count, trade.entry_prices.len());
        if trade.exit_reason == ExitReason::TakeProfit {
            assert!(trade.return_pct > 0.0);
        }
    }
    for hedge in &result.hedge_trades {
        if let Some(idx) = hedge.primary_trade {
            assert!(result.trades[idx].exit_timestamp >= hedge.entry_timestamp);
        }
    }
}

#[test]
fn test_shipped_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/btc_4h.json");
    let config = Config::from_file(path).unwrap();

    assert_eq!(config.data.symbol, "BTCUSDT");
    assert!(config.simulation.validate().is_ok());
    assert!(config.grid.is_some());
}
