//! Data-access contracts the engine consumes.
//!
//! Storage technology is the adapter's business: the runner crate ships an
//! in-memory store, a JSON snapshot store, and a SQLite store. Adapters map
//! their own row shapes onto the typed records here.

use thiserror::Error;

use crate::data::{screen_points, IngestReport};
use crate::domain::{PricePoint, SignalRow, TradeRecord};
use crate::fingerprint::RunFingerprint;

/// Failures raised by sources and repositories. Propagated unchanged by the engine.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("malformed stored data: {0}")]
    Malformed(String),

    #[error("no price history for '{symbol}'")]
    NotFound { symbol: String },
}

/// Supplies the historical index series.
pub trait PriceHistorySource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Ordered (ascending by date), deduplicated price history.
    fn load_price_history(&self) -> Result<Vec<PricePoint>, RepositoryError>;

    /// Price history together with the rows dropped on the way in.
    ///
    /// Sources that parse raw rows override this. The default screens the typed
    /// points with the same price rule as raw rows and records what it drops.
    fn load_ingest_report(&self) -> Result<IngestReport, RepositoryError> {
        Ok(screen_points(&self.load_price_history()?))
    }
}

/// Persists the output of a run.
///
/// Writes use full-replace semantics: each run supersedes the previous one.
/// Callers must serialize concurrent runs against the same repository target.
pub trait SignalRepository: Send + Sync {
    /// Replace all stored trades and signals with the given ones.
    fn clear_and_store(
        &self,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError>;

    /// Full replace that also records which data and parameters produced the rows.
    ///
    /// Adapters that can store the fingerprint in the same write override this.
    fn store_run(
        &self,
        _fingerprint: &RunFingerprint,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        self.clear_and_store(trades, signals)
    }

    /// Fingerprint of the last `store_run`, if the adapter keeps one.
    fn load_fingerprint(&self) -> Result<Option<RunFingerprint>, RepositoryError> {
        Ok(None)
    }

    /// Most recent persisted actionable signal, if any.
    fn get_latest_signal(&self) -> Result<Option<SignalRow>, RepositoryError>;

    /// Stored trades in chronological order.
    fn load_trades(&self) -> Result<Vec<TradeRecord>, RepositoryError>;

    /// Stored signal rows in chronological order.
    fn load_signals(&self) -> Result<Vec<SignalRow>, RepositoryError>;
}

/// Pick the latest actionable row out of a chronological signal list.
///
/// Shared by adapters whose storage has no native "latest" query.
pub fn latest_actionable(signals: &[SignalRow]) -> Option<SignalRow> {
    signals
        .iter()
        .filter(|s| s.is_actionable())
        .max_by_key(|s| (s.date, s.index))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SignalStatus, SignalType};
    use chrono::NaiveDate;

    fn row(index: usize, status: SignalStatus) -> SignalRow {
        SignalRow {
            index,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(index as i64),
            signal_type: SignalType::Buy,
            price: 100.0,
            ema: 99.0,
            status,
        }
    }

    #[test]
    fn latest_actionable_skips_current_rows() {
        let rows = vec![
            row(1, SignalStatus::Completed),
            row(3, SignalStatus::OpenPosition),
            row(6, SignalStatus::Current),
        ];
        assert_eq!(latest_actionable(&rows).unwrap().index, 3);
    }

    #[test]
    fn latest_actionable_empty() {
        assert!(latest_actionable(&[]).is_none());
        assert!(latest_actionable(&[row(2, SignalStatus::Current)]).is_none());
    }

    struct FixedSource(Vec<PricePoint>);

    impl PriceHistorySource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn load_price_history(&self) -> Result<Vec<PricePoint>, RepositoryError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn default_ingest_report_screens_bad_prices() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let source = FixedSource(vec![
            PricePoint::new(day(1), 100.0),
            PricePoint::new(day(2), f64::NAN),
            PricePoint::new(day(3), 0.0),
            PricePoint::new(day(4), 101.0),
        ]);
        let report = source.load_ingest_report().unwrap();
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.points.iter().all(|p| p.price > 0.0));
    }
}
