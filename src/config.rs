//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. Every section falls
//! back to its defaults when absent.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{parse_date, CsvDataSource};
use crate::grid::ParamGrid;
use crate::indicators::IndicatorParams;
use crate::signal_index::LookupPolicy;
use crate::signals::SignalParams;
use crate::simulator::SimulationParams;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub indicators: IndicatorParams,
    pub signals: SignalParams,
    pub simulation: SimulationParams,
    pub lookup_policy: LookupPolicy,
    pub backtest: BacktestConfig,
    /// Grid search parameters for optimization (optional)
    /// Each key is a simulation param name, value is array of values to test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<ParamGrid>,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Data source for the configured symbol, or an explicit file
    pub fn data_source(&self, data_file: Option<&Path>) -> CsvDataSource {
        match data_file {
            Some(path) => CsvDataSource::new(path),
            None => CsvDataSource::for_symbol(
                &self.data.data_dir,
                &self.data.symbol,
                &self.data.timeframe,
            ),
        }
    }
}

/// Market data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub symbol: String,
    pub timeframe: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub cache_max_age_secs: i64,
}

impl DataConfig {
    /// Parsed (start, end) date filter
    pub fn date_range(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let start = self.start_date.as_deref().map(parse_date).transpose()?;
        let end = self.end_date.as_deref().map(parse_date).transpose()?;
        Ok((start, end))
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: PathBuf::from("data"),
            symbol: "BTCUSDT".to_string(),
            timeframe: "4h".to_string(),
            start_date: None,
            end_date: None,
            cache_max_age_secs: 3600,
        }
    }
}

/// Backtest output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub results_dir: PathBuf,
    pub export_trades: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            results_dir: PathBuf::from("results"),
            export_trades: false,
        }
    }
}
