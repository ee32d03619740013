//! Price history sources: CSV file, seeded synthetic walk, in-memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use emalab_core::data::{ingest, screen_points, IngestReport, RawSample};
use emalab_core::domain::PricePoint;
use emalab_core::repository::{PriceHistorySource, RepositoryError};
use emalab_core::rng::{synthetic_series, RngHierarchy, SyntheticSpec};

use crate::config::SourceConfig;

const DATE_COLUMN: &str = "date";
const VALUE_COLUMN: &str = "index_value";

/// Reads `date,index_value` rows from a CSV file.
///
/// Extra columns are ignored and column order does not matter. Rows that
/// fail to parse are skipped and reported, not raised.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    symbol: String,
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(symbol: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            symbol: symbol.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, RepositoryError> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RepositoryError::NotFound {
                symbol: self.symbol.clone(),
            },
            _ => RepositoryError::Io(e),
        })
    }
}

impl PriceHistorySource for CsvPriceSource {
    fn name(&self) -> &str {
        &self.symbol
    }

    fn load_price_history(&self) -> Result<Vec<PricePoint>, RepositoryError> {
        Ok(self.load_ingest_report()?.points)
    }

    fn load_ingest_report(&self) -> Result<IngestReport, RepositoryError> {
        let samples = read_raw_samples(self.open()?)?;
        let report = ingest(&samples);
        for skip in &report.skipped {
            warn!(
                symbol = %self.symbol,
                row = skip.row,
                date = %skip.date,
                reason = %skip.reason,
                "skipping price row"
            );
        }
        debug!(
            symbol = %self.symbol,
            path = %self.path.display(),
            rows = samples.len(),
            points = report.points.len(),
            duplicates = report.duplicates_collapsed,
            "loaded CSV price history"
        );
        Ok(report)
    }
}

/// Read raw rows from CSV. Fails only when the header lacks a required column.
///
/// A value that does not parse as a number is carried as NaN, so ingestion
/// records it as a non-finite price.
pub fn read_raw_samples<R: Read>(reader: R) -> Result<Vec<RawSample>, RepositoryError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| RepositoryError::Malformed(format!("CSV header: {e}")))?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| RepositoryError::Malformed(format!("CSV is missing '{name}' column")))
    };
    let date_col = column(DATE_COLUMN)?;
    let value_col = column(VALUE_COLUMN)?;

    let mut samples = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| RepositoryError::Malformed(format!("CSV row: {e}")))?;
        let date = record.get(date_col).unwrap_or_default();
        let value = record
            .get(value_col)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        samples.push(RawSample::new(date, value));
    }
    Ok(samples)
}

/// Deterministic weekday random walk; stands in for a live index feed.
#[derive(Debug, Clone)]
pub struct SyntheticPriceSource {
    symbol: String,
    hierarchy: RngHierarchy,
    spec: SyntheticSpec,
}

impl SyntheticPriceSource {
    pub fn new(symbol: impl Into<String>, seed: u64, spec: SyntheticSpec) -> Self {
        Self {
            symbol: symbol.into(),
            hierarchy: RngHierarchy::new(seed),
            spec,
        }
    }
}

impl PriceHistorySource for SyntheticPriceSource {
    fn name(&self) -> &str {
        &self.symbol
    }

    fn load_price_history(&self) -> Result<Vec<PricePoint>, RepositoryError> {
        Ok(synthetic_series(&self.hierarchy, &self.symbol, &self.spec))
    }
}

/// Fixed, caller-supplied history. Screened and canonicalized on load.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    name: String,
    points: Vec<PricePoint>,
}

impl MemoryPriceSource {
    pub fn new(name: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

impl PriceHistorySource for MemoryPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_price_history(&self) -> Result<Vec<PricePoint>, RepositoryError> {
        Ok(screen_points(&self.points).points)
    }

    fn load_ingest_report(&self) -> Result<IngestReport, RepositoryError> {
        Ok(screen_points(&self.points))
    }
}

/// Build the source a config names for `symbol`.
pub fn source_from_config(config: &SourceConfig, symbol: &str) -> Box<dyn PriceHistorySource> {
    match config {
        SourceConfig::Csv { path } => Box::new(CsvPriceSource::new(symbol, path.clone())),
        SourceConfig::Synthetic {
            seed,
            days,
            start_date,
            start_value,
            max_daily_move,
        } => Box::new(SyntheticPriceSource::new(
            symbol,
            *seed,
            SyntheticSpec {
                start_date: *start_date,
                days: *days,
                start_value: *start_value,
                max_daily_move: *max_daily_move,
            },
        )),
    }
}
