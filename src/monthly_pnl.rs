//! Monthly P&L analysis and matrix rendering
//!
//! Buckets capital-weighted profit of primary and hedge trades by the month
//! they closed in, and renders a year × month table with yearly totals.

use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

use crate::simulator::SimulationResult;

/// Monthly P&L data for a specific month
#[derive(Debug, Clone, Default)]
pub struct MonthlyPnL {
    pub primary_pnl: f64,
    pub hedge_pnl: f64,
    /// Primary trades closed in the month
    pub trade_count: usize,
    pub winning_trades: usize,
    pub hedge_count: usize,
}

impl MonthlyPnL {
    pub fn net_pnl(&self) -> f64 {
        self.primary_pnl + self.hedge_pnl
    }

    pub fn win_rate(&self) -> f64 {
        if self.trade_count > 0 {
            (self.winning_trades as f64 / self.trade_count as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Year-Month key for organizing data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

/// Monthly P&L matrix organized by year and month
pub struct MonthlyPnLMatrix {
    data: BTreeMap<YearMonth, MonthlyPnL>,
}

impl MonthlyPnLMatrix {
    pub fn from_result(result: &SimulationResult, capital_per_fill: f64) -> Self {
        let mut data: BTreeMap<YearMonth, MonthlyPnL> = BTreeMap::new();

        for trade in &result.trades {
            let month = data
                .entry(YearMonth::from_datetime(trade.exit_timestamp))
                .or_default();
            month.primary_pnl += trade.profit(capital_per_fill);
            month.trade_count += 1;
            if trade.is_win() {
                month.winning_trades += 1;
            }
        }

        for hedge in &result.hedge_trades {
            let month = data
                .entry(YearMonth::from_datetime(hedge.exit_timestamp))
                .or_default();
            month.hedge_pnl += hedge.profit();
            month.hedge_count += 1;
        }

        Self { data }
    }

    /// Get unique years in the data
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.data.keys().map(|ym| ym.year).collect();
        years.dedup();
        years
    }

    pub fn get(&self, year: i32, month: u32) -> Option<&MonthlyPnL> {
        self.data.get(&YearMonth::new(year, month))
    }

    pub fn yearly_total(&self, year: i32) -> f64 {
        self.data
            .iter()
            .filter(|(ym, _)| ym.year == year)
            .map(|(_, pnl)| pnl.net_pnl())
            .sum()
    }

    pub fn total_pnl(&self) -> f64 {
        self.data.values().map(|pnl| pnl.net_pnl()).sum()
    }

    pub fn total_hedge_pnl(&self) -> f64 {
        self.data.values().map(|pnl| pnl.hedge_pnl).sum()
    }

    /// Render the matrix; `colored` adds ANSI colors for terminals
    pub fn render(&self, colored: bool) -> String {
        if self.data.is_empty() {
            return "No trades to display monthly P&L matrix.".to_string();
        }

        let (green, red, reset, bold) = if colored {
            ("\x1b[32m", "\x1b[31m", "\x1b[0m", "\x1b[1m")
        } else {
            ("", "", "", "")
        };
        let paint = |value: f64| if value > 0.0 { green } else { red };

        let mut output = String::new();

        output.push_str(&format!("\n{}{}{}\n", bold, "=".repeat(120), reset));
        output.push_str(&format!("{}MONTHLY P&L MATRIX ($, primary + hedge){}\n", bold, reset));
        output.push_str(&format!("{}{}{}\n", bold, "=".repeat(120), reset));

        output.push_str(&format!(
            "{}{:>6} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>7} │ {:>10}{}\n",
            bold, "Year", "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Total", reset
        ));
        output.push_str(&format!("{}\n", "-".repeat(120)));

        for year in self.years() {
            output.push_str(&format!("{:>6} │", year));

            for month in 1..=12 {
                let cell = match self.get(year, month) {
                    Some(pnl) => {
                        let value = pnl.net_pnl();
                        format!("{}{:>7.0}{}", paint(value), value, reset)
                    }
                    None => " ".repeat(7),
                };
                output.push_str(&format!(" {} │", cell));
            }

            let year_total = self.yearly_total(year);
            output.push_str(&format!(" {}{:>10.2}{}\n", paint(year_total), year_total, reset));
        }

        output.push_str(&format!("{}\n", "=".repeat(120)));

        let total = self.total_pnl();
        output.push_str(&format!(
            "{}Total P&L: {}${:.2}{} (hedge ${:.2})\n",
            bold,
            paint(total),
            total,
            reset,
            self.total_hedge_pnl()
        ));

        let profitable_months = self.data.values().filter(|pnl| pnl.net_pnl() > 0.0).count();
        let total_months = self.data.len();
        let monthly_win_rate = (profitable_months as f64 / total_months as f64) * 100.0;

        output.push_str(&format!(
            "Monthly Win Rate: {:.1}% ({} profitable months / {} total months)\n",
            monthly_win_rate, profitable_months, total_months
        ));
        output.push_str(&format!("{}\n", "=".repeat(120)));

        output
    }
}
