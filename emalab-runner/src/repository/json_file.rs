//! One JSON snapshot file per symbol: `{dir}/{symbol}.signals.json`.
//!
//! Writes go to a sibling temp file which is then renamed over the snapshot,
//! so readers see either the previous run or the new one, never a mix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use emalab_core::domain::{SignalRow, TradeRecord};
use emalab_core::fingerprint::RunFingerprint;
use emalab_core::repository::{latest_actionable, RepositoryError, SignalRepository};

/// Current snapshot layout.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    symbol: String,
    #[serde(default)]
    fingerprint: Option<RunFingerprint>,
    trades: Vec<TradeRecord>,
    signals: Vec<SignalRow>,
}

#[derive(Debug, Clone)]
pub struct JsonSignalRepository {
    symbol: String,
    path: PathBuf,
}

impl JsonSignalRepository {
    /// Repository for `symbol` under `dir`. Creates `dir` if needed.
    pub fn new(dir: impl AsRef<Path>, symbol: &str) -> Result<Self, RepositoryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            symbol: symbol.to_string(),
            path: dir.join(format!("{}.signals.json", file_stem(symbol))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Snapshot, RepositoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            RepositoryError::Malformed(format!("{}: {e}", self.path.display()))
        })?;
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(RepositoryError::Malformed(format!(
                "{}: unsupported schema version {} (expected {SCHEMA_VERSION})",
                self.path.display(),
                snapshot.schema_version
            )));
        }
        Ok(snapshot)
    }

    fn write(
        &self,
        fingerprint: Option<&RunFingerprint>,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            symbol: self.symbol.clone(),
            fingerprint: fingerprint.cloned(),
            trades: trades.to_vec(),
            signals: signals.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| RepositoryError::Storage(format!("serialize snapshot: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            symbol = %self.symbol,
            path = %self.path.display(),
            trades = trades.len(),
            signals = signals.len(),
            "wrote signal snapshot"
        );
        Ok(())
    }
}

/// Keep symbols like `NEPSE/BANKING` from escaping the directory.
pub(crate) fn file_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl SignalRepository for JsonSignalRepository {
    fn clear_and_store(
        &self,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        self.write(None, trades, signals)
    }

    fn store_run(
        &self,
        fingerprint: &RunFingerprint,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        self.write(Some(fingerprint), trades, signals)
    }

    fn load_fingerprint(&self) -> Result<Option<RunFingerprint>, RepositoryError> {
        Ok(self.read()?.fingerprint)
    }

    fn get_latest_signal(&self) -> Result<Option<SignalRow>, RepositoryError> {
        Ok(latest_actionable(&self.read()?.signals))
    }

    fn load_trades(&self) -> Result<Vec<TradeRecord>, RepositoryError> {
        Ok(self.read()?.trades)
    }

    fn load_signals(&self) -> Result<Vec<SignalRow>, RepositoryError> {
        Ok(self.read()?.signals)
    }
}
