//! Configuration validation.
//!
//! Checks the `[inputs]` and `[portfolio]` sections before any file is read.

use crate::domain::aggregation::ZERO_QUANTITY_EPSILON;
use crate::domain::error::PortviewError;
use crate::domain::portfolio::{PortfolioConfig, DEFAULT_BENCHMARK};
use crate::ports::config_port::ConfigPort;

const INPUT_KEYS: [&str; 3] = ["transactions", "symbols", "quotes"];

/// Benchmark values that switch the benchmark column off.
const BENCHMARK_OFF: [&str; 2] = ["none", "off"];

pub fn validate_inputs_config(config: &dyn ConfigPort) -> Result<(), PortviewError> {
    for key in INPUT_KEYS {
        if config.get_non_empty("inputs", key).is_none() {
            return Err(PortviewError::ConfigMissing {
                section: "inputs".to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), PortviewError> {
    epsilon(config)?;
    Ok(())
}

/// Validated portfolio settings, with defaults for absent keys.
pub fn portfolio_config(config: &dyn ConfigPort) -> Result<PortfolioConfig, PortviewError> {
    let benchmark_symbol = match config.get_string("portfolio", "benchmark_symbol") {
        None => Some(DEFAULT_BENCHMARK.to_string()),
        Some(s) => {
            let s = s.trim();
            if s.is_empty() || BENCHMARK_OFF.iter().any(|off| s.eq_ignore_ascii_case(off)) {
                None
            } else {
                Some(s.to_string())
            }
        }
    };
    Ok(PortfolioConfig {
        benchmark_symbol,
        epsilon: epsilon(config)?,
    })
}

fn epsilon(config: &dyn ConfigPort) -> Result<f64, PortviewError> {
    let Some(raw) = config.get_non_empty("portfolio", "zero_quantity_epsilon") else {
        return Ok(ZERO_QUANTITY_EPSILON);
    };
    let invalid = |reason: &str| PortviewError::ConfigInvalid {
        section: "portfolio".to_string(),
        key: "zero_quantity_epsilon".to_string(),
        reason: reason.to_string(),
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid("zero_quantity_epsilon must be a number"))?;
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(invalid("zero_quantity_epsilon must be between 0 and 1"));
    }
    Ok(value)
}
