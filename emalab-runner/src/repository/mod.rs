//! Signal repository adapters.
//!
//! All three honor full-replace semantics: a store supersedes everything the
//! previous store wrote for the same symbol.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonSignalRepository;
pub use memory::MemorySignalRepository;
pub use sqlite::SqliteSignalRepository;

use emalab_core::repository::{RepositoryError, SignalRepository};

use crate::config::RepositoryConfig;

/// Build the repository a config names, scoped to `symbol`.
pub fn open_repository(
    config: &RepositoryConfig,
    symbol: &str,
) -> Result<Box<dyn SignalRepository>, RepositoryError> {
    Ok(match config {
        RepositoryConfig::Memory => Box::new(MemorySignalRepository::new()),
        RepositoryConfig::Json { dir } => Box::new(JsonSignalRepository::new(dir, symbol)?),
        RepositoryConfig::Sqlite { path } => Box::new(SqliteSignalRepository::open(path, symbol)?),
    })
}
