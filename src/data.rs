//! Data loading and management
//!
//! Loads OHLCV bars from CSV files, filters them by date and validates a series
//! before it reaches the simulator. Also provides a small in-memory bar cache.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::SimulationError;
use crate::types::Bar;

// =============================================================================
// Data Sources
// =============================================================================

/// Anything that can produce an ordered bar series
pub trait MarketDataSource {
    fn load(&self) -> Result<Vec<Bar>>;
}

/// Bars from a `datetime,open,high,low,close,volume` CSV file
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvDataSource { path: path.into() }
    }

    /// `{data_dir}/{symbol}_{timeframe}.csv`
    pub fn for_symbol(data_dir: impl AsRef<Path>, symbol: &str, timeframe: &str) -> Self {
        Self::new(data_dir.as_ref().join(format!("{}_{}.csv", symbol, timeframe)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarketDataSource for CsvDataSource {
    fn load(&self) -> Result<Vec<Bar>> {
        let mut bars = load_csv(&self.path)?;
        let loaded = bars.len();

        bars.sort_by_key(|b| b.timestamp);
        // Keep the last row for a repeated timestamp
        bars.reverse();
        bars.dedup_by_key(|b| b.timestamp);
        bars.reverse();

        if bars.len() < loaded {
            warn!(
                "Dropped {} duplicate timestamps in {}",
                loaded - bars.len(),
                self.path.display()
            );
        }

        info!("Loaded {} bars from {}", bars.len(), self.path.display());
        Ok(bars)
    }
}

// =============================================================================
// CSV Data Loading
// =============================================================================

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64> {
    record
        .get(idx)
        .with_context(|| format!("Missing {} column", name))?
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))
}

/// Load OHLCV data from CSV file, skipping rows that fail bar validation
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut bars = Vec::new();
    let mut invalid_count = 0;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?.trim();
        let timestamp = parse_date(dt_str)?;

        let open = parse_field(&record, 1, "open")?;
        let high = parse_field(&record, 2, "high")?;
        let low = parse_field(&record, 3, "low")?;
        let close = parse_field(&record, 4, "close")?;
        let volume = parse_field(&record, 5, "volume")?;

        match Bar::new(timestamp, open, high, low, close, volume) {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                invalid_count += 1;
                warn!(
                    "Skipping invalid bar at row {} in {:?}: {}",
                    row_idx + 2, // +2 for 1-indexed and header row
                    path.file_name().unwrap_or_default(),
                    e
                );
            }
        }
    }

    if invalid_count > 0 {
        warn!(
            "Skipped {} invalid bars out of {} in {:?}",
            invalid_count,
            invalid_count + bars.len(),
            path.file_name().unwrap_or_default()
        );
    }

    Ok(bars)
}

/// Write bars in the same layout `load_csv` reads
pub fn write_csv(path: impl AsRef<Path>, bars: &[Bar]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    writer.write_record(["datetime", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        writer.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Filter bars by date range (both ends inclusive)
pub fn filter_bars_by_date(
    bars: Vec<Bar>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Bar> {
    bars.into_iter()
        .filter(|b| {
            let after_start = start.map_or(true, |s| b.timestamp >= s);
            let before_end = end.map_or(true, |e| b.timestamp <= e);
            after_start && before_end
        })
        .collect()
}

/// Parse a date string (RFC 3339, YYYY-MM-DD HH:MM:SS or YYYY-MM-DD) to DateTime<Utc>
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }

    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
    }

    // Date only: start of day
    if let Ok(nd) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    anyhow::bail!(
        "Failed to parse date: {}. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS format",
        date_str
    )
}

// =============================================================================
// Validation
// =============================================================================

/// Simulator preconditions: non-empty, every bar valid, timestamps strictly increasing
pub fn validate_series(bars: &[Bar]) -> std::result::Result<(), SimulationError> {
    if bars.is_empty() {
        return Err(SimulationError::EmptySeries);
    }

    for (index, bar) in bars.iter().enumerate() {
        bar.validate()
            .map_err(|source| SimulationError::InvalidBar {
                index,
                timestamp: bar.timestamp,
                source,
            })?;

        if index > 0 {
            let previous = bars[index - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(SimulationError::NonMonotonicTimestamp {
                    index,
                    previous,
                    current: bar.timestamp,
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Bar Cache
// =============================================================================

/// In-memory bar cache with a maximum entry age
pub struct BarCache {
    data: HashMap<String, CachedBars>,
    max_age: Duration,
}

struct CachedBars {
    bars: Vec<Bar>,
    last_updated: DateTime<Utc>,
}

impl BarCache {
    pub fn new(max_age_secs: i64) -> Self {
        BarCache {
            data: HashMap::new(),
            max_age: Duration::seconds(max_age_secs),
        }
    }

    /// Cache key for a symbol/timeframe pair
    pub fn key(symbol: &str, timeframe: &str) -> String {
        format!("{}_{}", symbol, timeframe)
    }

    /// Get bars for a key (returns None if stale or missing)
    pub fn get(&self, key: &str) -> Option<&[Bar]> {
        self.data
            .get(key)
            .filter(|cached| self.is_within_age(cached))
            .map(|cached| cached.bars.as_slice())
    }

    pub fn set(&mut self, key: impl Into<String>, bars: Vec<Bar>) {
        self.data.insert(
            key.into(),
            CachedBars {
                bars,
                last_updated: Utc::now(),
            },
        );
    }

    pub fn is_fresh(&self, key: &str) -> bool {
        self.data
            .get(key)
            .is_some_and(|cached| self.is_within_age(cached))
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Cached bars for the source, loading and storing them when stale or missing
    pub fn get_or_load(
        &mut self,
        key: &str,
        source: &dyn MarketDataSource,
    ) -> Result<Vec<Bar>> {
        if let Some(bars) = self.get(key) {
            return Ok(bars.to_vec());
        }
        let bars = source.load()?;
        self.set(key, bars.clone());
        Ok(bars)
    }

    fn is_within_age(&self, cached: &CachedBars) -> bool {
        Utc::now() - cached.last_updated < self.max_age
    }
}
