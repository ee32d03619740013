//! Ingestion of raw `(date, index_value)` rows into a canonical price series.
//!
//! Bad rows are skipped and recorded, not raised: a malformed date or a NaN
//! price on one day must not abort a run over hundreds of good days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::canonicalize::{canonicalize, is_canonical};
use crate::domain::PricePoint;

/// A row as delivered by the time-series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub date: String,
    pub index_value: f64,
}

impl RawSample {
    pub fn new(date: impl Into<String>, index_value: f64) -> Self {
        Self {
            date: date.into(),
            index_value,
        }
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDate,
    NonFinitePrice,
    NonPositivePrice,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidDate => write!(f, "invalid date"),
            SkipReason::NonFinitePrice => write!(f, "non-finite price"),
            SkipReason::NonPositivePrice => write!(f, "non-positive price"),
        }
    }
}

/// A dropped input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSample {
    /// Zero-based position in the input.
    pub row: usize,
    pub date: String,
    pub reason: SkipReason,
}

/// Outcome of ingesting a batch of raw rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub points: Vec<PricePoint>,
    pub skipped: Vec<SkippedSample>,
    pub duplicates_collapsed: usize,
}

/// Price rule shared by raw rows and already-typed points.
pub fn check_price(price: f64) -> Result<(), SkipReason> {
    if !price.is_finite() {
        return Err(SkipReason::NonFinitePrice);
    }
    if price <= 0.0 {
        return Err(SkipReason::NonPositivePrice);
    }
    Ok(())
}

/// Validate a single row.
pub fn parse_sample(sample: &RawSample) -> Result<PricePoint, SkipReason> {
    let date = NaiveDate::parse_from_str(sample.date.trim(), "%Y-%m-%d")
        .map_err(|_| SkipReason::InvalidDate)?;
    check_price(sample.index_value)?;
    Ok(PricePoint::new(date, sample.index_value))
}

/// Parse, filter, sort and deduplicate (keep-latest) raw rows.
pub fn ingest<'a, I>(rows: I) -> IngestReport
where
    I: IntoIterator<Item = &'a RawSample>,
{
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();

    for (row, sample) in rows.into_iter().enumerate() {
        match parse_sample(sample) {
            Ok(point) => accepted.push(point),
            Err(reason) => skipped.push(SkippedSample {
                row,
                date: sample.date.clone(),
                reason,
            }),
        }
    }

    let (points, duplicates_collapsed) = canonicalize(&accepted);
    IngestReport {
        points,
        skipped,
        duplicates_collapsed,
    }
}

/// Apply the price rule to typed points, then canonicalize the survivors.
///
/// Already-canonical input with no bad prices is returned as is.
pub fn screen_points(points: &[PricePoint]) -> IngestReport {
    let skipped: Vec<SkippedSample> = points
        .iter()
        .enumerate()
        .filter_map(|(row, p)| {
            check_price(p.price).err().map(|reason| SkippedSample {
                row,
                date: p.date.to_string(),
                reason,
            })
        })
        .collect();

    if skipped.is_empty() && is_canonical(points) {
        return IngestReport {
            points: points.to_vec(),
            skipped,
            duplicates_collapsed: 0,
        };
    }

    let accepted: Vec<PricePoint> = points
        .iter()
        .filter(|p| check_price(p.price).is_ok())
        .copied()
        .collect();
    let (points, duplicates_collapsed) = canonicalize(&accepted);
    IngestReport {
        points,
        skipped,
        duplicates_collapsed,
    }
}
