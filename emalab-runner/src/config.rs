//! TOML run configuration.
//!
//! ```toml
//! symbol = "NEPSE"
//!
//! [strategy]
//! ema_period = 20
//! min_holding_days = 3
//!
//! [source]
//! type = "csv"
//! path = "data/nepse.csv"
//!
//! [repository]
//! type = "json"
//! dir = "out"
//! ```
//!
//! Strategy parameters are read as signed integers so that a negative value in
//! a hand-edited file surfaces as a validation error, not a parse error.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emalab_core::{EngineError, SignalParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Params(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub symbol: String,
    pub strategy: StrategyConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub ema_period: i64,
    pub min_holding_days: i64,
}

/// Where price history comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// `date,index_value` CSV file.
    Csv { path: PathBuf },
    /// Seeded random walk over weekdays.
    Synthetic {
        seed: u64,
        days: usize,
        start_date: NaiveDate,
        #[serde(default = "default_start_value")]
        start_value: f64,
        #[serde(default = "default_max_daily_move")]
        max_daily_move: f64,
    },
}

fn default_start_value() -> f64 {
    2000.0
}

fn default_max_daily_move() -> f64 {
    0.02
}

/// Where signal and trade history is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositoryConfig {
    #[default]
    Memory,
    Json { dir: PathBuf },
    Sqlite { path: PathBuf },
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if let SourceConfig::Synthetic {
            days,
            start_value,
            max_daily_move,
            ..
        } = &self.source
        {
            if *days == 0 {
                return Err(ConfigError::Invalid("synthetic days must be > 0".into()));
            }
            if !(start_value.is_finite() && *start_value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "synthetic start_value must be positive, got {start_value}"
                )));
            }
            if !(max_daily_move.is_finite() && (0.0..1.0).contains(max_daily_move)) {
                return Err(ConfigError::Invalid(format!(
                    "synthetic max_daily_move must be in [0, 1), got {max_daily_move}"
                )));
            }
        }
        self.params()?;
        Ok(())
    }

    pub fn params(&self) -> Result<SignalParams, ConfigError> {
        Ok(SignalParams::new(
            self.strategy.ema_period,
            self.strategy.min_holding_days,
        )?)
    }
}
