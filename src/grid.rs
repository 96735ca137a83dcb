//! Grid search parameter generation
//!
//! Expands a `grid` section (parameter name → list of JSON values) into concrete
//! [`SimulationParams`] by taking the cartesian product over the base params.

use anyhow::{Context, Result};
use itertools::Itertools;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::simulator::SimulationParams;

/// Parameter grid; a BTreeMap keeps combination order deterministic
pub type ParamGrid = BTreeMap<String, Vec<Value>>;

/// One grid point: the overridden values and the resulting params
#[derive(Debug, Clone)]
pub struct ParamSet {
    pub overrides: BTreeMap<String, Value>,
    pub params: SimulationParams,
}

/// Generate every combination of grid values applied to `base`.
///
/// Unknown parameter names and values of the wrong shape are errors. Range
/// checks are left to [`SimulationParams::validate`].
pub fn generate_param_sets(base: &SimulationParams, grid: &ParamGrid) -> Result<Vec<ParamSet>> {
    let base_json = serde_json::to_value(base).context("Failed to serialize base params")?;
    let base_obj = base_json
        .as_object()
        .context("Simulation params must serialize to an object")?;

    for key in grid.keys() {
        if !base_obj.contains_key(key) {
            anyhow::bail!("Unknown grid parameter: {}", key);
        }
    }

    if grid.is_empty() || grid.values().any(|v| v.is_empty()) {
        return Ok(vec![ParamSet {
            overrides: BTreeMap::new(),
            params: base.clone(),
        }]);
    }

    grid.iter()
        .map(|(key, values)| values.iter().map(move |v| (key.clone(), v.clone())))
        .multi_cartesian_product()
        .map(|combo| -> Result<ParamSet> {
            let mut obj = base_obj.clone();
            for (key, value) in &combo {
                obj.insert(key.clone(), value.clone());
            }
            let params: SimulationParams = serde_json::from_value(Value::Object(obj))
                .with_context(|| format!("Invalid grid values: {}", format_overrides_pairs(&combo)))?;
            Ok(ParamSet {
                overrides: combo.into_iter().collect(),
                params,
            })
        })
        .collect()
}

/// Get total number of grid combinations
pub fn total_combinations(grid: &ParamGrid) -> usize {
    if grid.is_empty() {
        1
    } else {
        grid.values().map(|v| v.len()).product()
    }
}

/// Parse CLI override into grid format
/// Format: "param=val1,val2,val3"
pub fn parse_grid_override(s: &str) -> Option<(String, Vec<Value>)> {
    let (key, values) = s.split_once('=')?;

    let values: Vec<Value> = values
        .split(',')
        .filter_map(|v| {
            let v = v.trim();
            if let Ok(n) = v.parse::<i64>() {
                Some(serde_json::json!(n))
            } else if let Ok(n) = v.parse::<f64>() {
                Some(serde_json::json!(n))
            } else if v == "true" || v == "false" {
                Some(serde_json::json!(v == "true"))
            } else if v == "null" {
                Some(Value::Null)
            } else if !v.is_empty() {
                Some(serde_json::json!(v))
            } else {
                None
            }
        })
        .collect();

    if values.is_empty() {
        None
    } else {
        Some((key.trim().to_string(), values))
    }
}

/// Apply CLI overrides to a grid
pub fn apply_overrides(grid: &mut ParamGrid, overrides: &[String]) -> Result<()> {
    for override_str in overrides {
        let (key, values) = parse_grid_override(override_str)
            .with_context(|| format!("Invalid grid override: {}", override_str))?;
        grid.insert(key, values);
    }
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn format_overrides_pairs(pairs: &[(String, Value)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, format_value(v)))
        .join(", ")
}

/// Format overrides for display
pub fn format_overrides(overrides: &BTreeMap<String, Value>) -> String {
    overrides
        .iter()
        .map(|(k, v)| format!("{}={}", k, format_value(v)))
        .join(", ")
}
