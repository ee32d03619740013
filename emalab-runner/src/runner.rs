//! Signal runner: load once, compute, persist once.
//!
//! Entry points:
//! - `SignalRunner::run()`: explicit source, repository and parameters.
//! - `SignalRunner::run_config()`: builds source and repository from a `RunConfig`. Used by the CLI.
//! - `SignalRunner::run_batch()`: several symbols in parallel on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use emalab_core::data::SkippedSample;
use emalab_core::domain::{IgnoredSignalRecord, OpenPosition, SignalRow, TradeRecord};
use emalab_core::engine::{run_pipeline, CurrentSignal, LatestSignal};
use emalab_core::fingerprint::RunFingerprint;
use emalab_core::repository::{PriceHistorySource, RepositoryError, SignalRepository};
use emalab_core::stats::SignalStatistics;
use emalab_core::{EngineError, SignalParams};

use crate::config::{ConfigError, RunConfig};
use crate::lock::RunLocks;
use crate::report::TradeSummary;
use crate::repository::open_repository;
use crate::sources::source_from_config;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<RepositoryError> for RunError {
    fn from(e: RepositoryError) -> Self {
        RunError::Engine(EngineError::Repository(e))
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub symbol: String,
    pub fingerprint: RunFingerprint,
    pub latest: LatestSignal,
    pub current: Option<CurrentSignal>,
    pub summary: TradeSummary,
    pub statistics: SignalStatistics,
    pub trades: Vec<TradeRecord>,
    pub signals: Vec<SignalRow>,
    pub ignored: Vec<IgnoredSignalRecord>,
    pub open_position: Option<OpenPosition>,
    pub skipped_rows: Vec<SkippedSample>,
}

/// One entry of a batch.
pub struct RunJob<'a> {
    pub symbol: String,
    pub source: &'a dyn PriceHistorySource,
    pub repository: &'a dyn SignalRepository,
    pub params: SignalParams,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub symbol: String,
    pub result: Result<RunReport, RunError>,
}

/// Orchestrates runs. Holds the per-symbol locks, so share one runner across
/// threads rather than creating one per call.
#[derive(Debug, Default)]
pub struct SignalRunner {
    locks: RunLocks,
}

impl SignalRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(
        &self,
        symbol: &str,
        source: &dyn PriceHistorySource,
        repository: &dyn SignalRepository,
        params: &SignalParams,
    ) -> Result<RunReport, RunError> {
        self.locks
            .with_lock(symbol, || run_unlocked(symbol, source, repository, params))
    }

    pub fn run_config(&self, config: &RunConfig) -> Result<RunReport, RunError> {
        config.validate()?;
        let params = config.params()?;
        let source = source_from_config(&config.source, &config.symbol);
        let repository = open_repository(&config.repository, &config.symbol)?;
        self.run(&config.symbol, source.as_ref(), repository.as_ref(), &params)
    }

    /// Run every job on the rayon pool. Outcomes come back in job order and
    /// each carries its own result.
    pub fn run_batch(&self, jobs: &[RunJob<'_>]) -> Vec<BatchOutcome> {
        jobs.par_iter()
            .map(|job| BatchOutcome {
                symbol: job.symbol.clone(),
                result: self.run(&job.symbol, job.source, job.repository, &job.params),
            })
            .collect()
    }

    pub fn run_config_batch(&self, configs: &[RunConfig]) -> Vec<BatchOutcome> {
        configs
            .par_iter()
            .map(|config| BatchOutcome {
                symbol: config.symbol.clone(),
                result: self.run_config(config),
            })
            .collect()
    }
}

fn run_unlocked(
    symbol: &str,
    source: &dyn PriceHistorySource,
    repository: &dyn SignalRepository,
    params: &SignalParams,
) -> Result<RunReport, RunError> {
    info!(
        symbol,
        source = source.name(),
        ema_period = params.ema_period(),
        min_holding_days = params.min_holding_days(),
        "signal run started"
    );

    let ingest = source.load_ingest_report()?;
    let output = run_pipeline(&ingest.points, params).map_err(|e| {
        warn!(symbol, error = %e, "signal run failed");
        e
    })?;

    let mut skipped_rows = ingest.skipped;
    skipped_rows.extend(output.skipped.iter().cloned());
    if !skipped_rows.is_empty() || ingest.duplicates_collapsed > 0 {
        warn!(
            symbol,
            skipped = skipped_rows.len(),
            duplicates = ingest.duplicates_collapsed,
            "price rows dropped"
        );
    }
    let fingerprint = RunFingerprint::new(symbol, params, &output.points);

    repository.store_run(&fingerprint, &output.simulation.trades, &output.signals)?;

    info!(
        symbol,
        run_id = %fingerprint.run_id(),
        points = output.points.len(),
        signals = output.statistics.total_signals,
        trades = output.statistics.completed_trades,
        ignored = output.simulation.ignored.len(),
        "signal run finished"
    );

    Ok(RunReport {
        symbol: symbol.to_string(),
        fingerprint,
        latest: output.latest,
        current: output.current,
        summary: TradeSummary::from(&output.statistics),
        statistics: output.statistics,
        trades: output.simulation.trades,
        signals: output.signals,
        ignored: output.simulation.ignored,
        open_position: output.simulation.open_position,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use emalab_core::domain::{PricePoint, SignalStatus};
    use emalab_core::engine::LatestSignalType;

    use crate::repository::MemorySignalRepository;
    use crate::sources::MemoryPriceSource;

    fn points(prices: &[f64]) -> Vec<PricePoint> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(base + chrono::Duration::days(i as i64), p))
            .collect()
    }

    const REFERENCE: [f64; 8] = [100.0, 102.0, 101.0, 99.0, 98.0, 103.0, 105.0, 104.0];

    #[test]
    fn run_persists_and_reports() {
        let source = MemoryPriceSource::new("NEPSE", points(&REFERENCE));
        let repo = MemorySignalRepository::new();
        let params = SignalParams::new(3, 2).unwrap();

        let report = SignalRunner::new()
            .run("NEPSE", &source, &repo, &params)
            .unwrap();

        assert_eq!(report.summary.total_signals, 3);
        assert_eq!(report.summary.total_trades, 1);
        assert_eq!(report.latest.signal_type, LatestSignalType::Buy);
        assert_eq!(repo.load_trades().unwrap(), report.trades);
        assert_eq!(repo.load_signals().unwrap(), report.signals);
        assert_eq!(repo.load_fingerprint().unwrap(), Some(report.fingerprint.clone()));
        assert_eq!(
            repo.get_latest_signal().unwrap().unwrap().status,
            SignalStatus::OpenPosition
        );
    }

    #[test]
    fn insufficient_data_leaves_repository_untouched() {
        let repo = MemorySignalRepository::new();
        let params = SignalParams::new(3, 2).unwrap();
        let runner = SignalRunner::new();

        runner
            .run("NEPSE", &MemoryPriceSource::new("NEPSE", points(&REFERENCE)), &repo, &params)
            .unwrap();
        let before = repo.load_signals().unwrap();

        let err = runner
            .run("NEPSE", &MemoryPriceSource::new("NEPSE", points(&[100.0, 101.0])), &repo, &params)
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Engine(EngineError::InsufficientData { required: 4, available: 2 })
        ));
        assert_eq!(repo.load_signals().unwrap(), before);
    }

    #[test]
    fn batch_reports_each_job_independently() {
        let good = MemoryPriceSource::new("A", points(&REFERENCE));
        let short = MemoryPriceSource::new("B", points(&[100.0]));
        let (repo_a, repo_b) = (MemorySignalRepository::new(), MemorySignalRepository::new());
        let params = SignalParams::new(3, 2).unwrap();
        let jobs = vec![
            RunJob {
                symbol: "A".into(),
                source: &good,
                repository: &repo_a,
                params,
            },
            RunJob {
                symbol: "B".into(),
                source: &short,
                repository: &repo_b,
                params,
            },
        ];

        let outcomes = SignalRunner::new().run_batch(&jobs);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].symbol, "A");
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
    }

    #[test]
    fn bad_prices_from_memory_source_are_reported_and_excluded() {
        const ELEVEN: [f64; 11] = [
            100.0, 102.0, 104.0, 101.0, 98.0, 97.0, 103.0, 106.0, 100.0, 96.0, 99.0,
        ];
        let params = SignalParams::new(3, 2).unwrap();
        let runner = SignalRunner::new();

        let clean = runner
            .run(
                "NEPSE",
                &MemoryPriceSource::new("NEPSE", points(&ELEVEN)),
                &MemorySignalRepository::new(),
                &params,
            )
            .unwrap();

        let mut dirty_points = points(&ELEVEN);
        let extra_day = dirty_points[10].date + chrono::Duration::days(1);
        dirty_points.insert(2, PricePoint::new(dirty_points[2].date, f64::NAN));
        dirty_points.push(PricePoint::new(extra_day, 0.0));
        let repo = MemorySignalRepository::new();
        let dirty = runner
            .run(
                "NEPSE",
                &MemoryPriceSource::new("NEPSE", dirty_points),
                &repo,
                &params,
            )
            .unwrap();

        assert_eq!(clean.trades.len(), 2);
        assert_eq!(dirty.trades, clean.trades);
        assert_eq!(dirty.signals, clean.signals);
        assert_eq!(dirty.fingerprint.dataset_hash, clean.fingerprint.dataset_hash);
        assert_eq!(dirty.skipped_rows.len(), 2);
        assert_eq!(repo.load_signals().unwrap(), clean.signals);
    }
}
