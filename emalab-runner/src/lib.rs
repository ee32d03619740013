//! EmaLab Runner: signal run orchestration on top of `emalab-core`.
//!
//! This crate provides:
//! - TOML run configuration
//! - Price sources (CSV, synthetic, in-memory)
//! - Signal repositories (in-memory, JSON snapshot, SQLite)
//! - Per-symbol single-flight locking and parallel batch runs
//! - Trade summaries, history views and JSON/CSV export

pub mod config;
pub mod lock;
pub mod report;
pub mod repository;
pub mod runner;
pub mod sources;

pub use config::{ConfigError, RepositoryConfig, RunConfig, SourceConfig, StrategyConfig};
pub use lock::RunLocks;
pub use report::{
    export_json, export_signals_csv, export_trades_csv, import_json, render_summary,
    save_report, signal_history, trade_history, ReportError, SignalHistoryEntry,
    TradeHistoryEntry, TradeSummary,
};
pub use repository::{
    open_repository, JsonSignalRepository, MemorySignalRepository, SqliteSignalRepository,
};
pub use runner::{BatchOutcome, RunError, RunJob, RunReport, SignalRunner};
pub use sources::{
    read_raw_samples, source_from_config, CsvPriceSource, MemoryPriceSource,
    SyntheticPriceSource,
};
