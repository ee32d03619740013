//! Run fingerprinting: which data and which parameters produced a stored result.
//!
//! - `DatasetHash`: BLAKE3 over the canonical `(date, price)` series.
//! - `ParamsHash`: BLAKE3 over the fixed-width encoding of `SignalParams`.
//! - `RunFingerprint`: both hashes plus the series extent, stored with each snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::PricePoint;
use crate::params::SignalParams;

/// Content hash of a canonical price series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of(points: &[PricePoint]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for p in points {
            hasher.update(p.date.to_string().as_bytes());
            hasher.update(&p.price.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of the strategy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamsHash(pub String);

impl ParamsHash {
    /// Hashes `ema_period` then `min_holding_days`, each as a little-endian `u64`.
    pub fn of(params: &SignalParams) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(params.ema_period() as u64).to_le_bytes());
        hasher.update(&u64::from(params.min_holding_days()).to_le_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for ParamsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single signal run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub symbol: String,
    pub params: SignalParams,
    pub params_hash: ParamsHash,
    pub dataset_hash: DatasetHash,
    pub points: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl RunFingerprint {
    pub fn new(symbol: &str, params: &SignalParams, points: &[PricePoint]) -> Self {
        Self {
            symbol: symbol.to_string(),
            params: *params,
            params_hash: ParamsHash::of(params),
            dataset_hash: DatasetHash::of(points),
            points: points.len(),
            first_date: points.first().map(|p| p.date),
            last_date: points.last().map(|p| p.date),
        }
    }

    /// Short run id: first 16 hex chars of BLAKE3 over symbol, params hash and dataset hash.
    pub fn run_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.params_hash.0.as_bytes());
        hasher.update(self.dataset_hash.0.as_bytes());
        hasher.finalize().to_hex()[..16].to_string()
    }
}
