//! Trade export
//!
//! Flattens primary and hedge trades into CSV rows for offline analysis.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::simulator::SimulationResult;

#[derive(Debug, Serialize)]
struct TradeRow {
    kind: &'static str,
    side: String,
    entry_time: String,
    entry_prices: String,
    average_price: f64,
    fill_count: usize,
    exit_time: String,
    exit_price: f64,
    return_pct: f64,
    exit_reason: String,
    invested: f64,
    profit: f64,
    primary_trade: Option<usize>,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn rows(result: &SimulationResult, capital_per_fill: f64) -> Vec<TradeRow> {
    let primary = result.trades.iter().map(|t| TradeRow {
        kind: "primary",
        side: t.side.to_string(),
        entry_time: t
            .entry_timestamps
            .first()
            .map(|ts| ts.format(TIME_FORMAT).to_string())
            .unwrap_or_default(),
        entry_prices: t
            .entry_prices
            .iter()
            .map(|p| format!("{:.2}", p))
            .collect::<Vec<_>>()
            .join(";"),
        average_price: t.average_price,
        fill_count: t.fill_count,
        exit_time: t.exit_timestamp.format(TIME_FORMAT).to_string(),
        exit_price: t.exit_price,
        return_pct: t.return_pct,
        exit_reason: t.exit_reason.to_string(),
        invested: t.invested(capital_per_fill),
        profit: t.profit(capital_per_fill),
        primary_trade: None,
    });

    let hedges = result.hedge_trades.iter().map(|h| TradeRow {
        kind: "hedge",
        side: "short".to_string(),
        entry_time: h.entry_timestamp.format(TIME_FORMAT).to_string(),
        entry_prices: format!("{:.2}", h.entry_price),
        average_price: h.entry_price,
        fill_count: 1,
        exit_time: h.exit_timestamp.format(TIME_FORMAT).to_string(),
        exit_price: h.exit_price,
        return_pct: h.return_pct,
        exit_reason: h.exit_reason.to_string(),
        invested: h.invested_capital,
        profit: h.profit(),
        primary_trade: h.primary_trade,
    });

    primary.chain(hedges).collect()
}

/// Write all closed trades to `{dir}/{name}_trades.csv`, returning the path
pub fn export_trades_csv(
    dir: impl AsRef<Path>,
    name: &str,
    result: &SimulationResult,
    capital_per_fill: f64,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

    let path = dir.join(format!("{}_trades.csv", name));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows(result, capital_per_fill) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExitReason, HedgeTrade, Side, Trade};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_export_trades_csv() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let result = SimulationResult {
            trades: vec![Trade {
                side: Side::Long,
                entry_timestamps: vec![t, t + Duration::hours(4)],
                entry_prices: vec![95.0, 90.0],
                average_price: 92.43,
                fill_count: 2,
                exit_timestamp: t + Duration::hours(24),
                exit_price: 105.0,
                return_pct: 13.6,
                exit_reason: ExitReason::TakeProfit,
            }],
            hedge_trades: vec![HedgeTrade {
                entry_timestamp: t + Duration::hours(4),
                entry_price: 90.0,
                exit_timestamp: t + Duration::hours(24),
                exit_price: 105.0,
                return_pct: -16.67,
                exit_reason: ExitReason::ClosedWithPrimary,
                invested_capital: 1000.0,
                primary_fill_count: 2,
                primary_trade: Some(0),
            }],
            ..SimulationResult::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = export_trades_csv(dir.path().join("out"), "BTCUSDT_4h", &result, 1000.0).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("kind,side,entry_time"));
        assert!(lines[1].starts_with("primary,long,2024-03-01 00:00:00,95.00;90.00"));
        assert!(lines[1].contains("take_profit"));
        assert!(lines[2].starts_with("hedge,short"));
        assert!(lines[2].contains("closed_with_primary"));
        assert!(lines[2].ends_with(",0"));
    }
}
