//! Price samples: the raw daily index series and its EMA-annotated form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of the index: date plus closing index value.
///
/// Series of `PricePoint` are ordered by date ascending with no duplicate dates
/// once they have passed through `data::ingest` or `data::canonicalize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// A price sample paired with the EMA value at the same index.
///
/// At index 0 the EMA equals the price (the series is seeded with the first sample).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub ema: f64,
}

impl EmaPoint {
    /// Which side of the EMA the price sits on.
    pub fn side(&self) -> Side {
        if self.price > self.ema {
            Side::Above
        } else if self.price < self.ema {
            Side::Below
        } else {
            Side::On
        }
    }
}

/// Relative position of price against its EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Above,
    On,
    Below,
}
