//! In-process repository. Used by tests and one-shot CLI runs.

use std::sync::{Mutex, MutexGuard, PoisonError};

use emalab_core::domain::{SignalRow, TradeRecord};
use emalab_core::fingerprint::RunFingerprint;
use emalab_core::repository::{latest_actionable, RepositoryError, SignalRepository};

#[derive(Debug, Default, Clone)]
struct Stored {
    fingerprint: Option<RunFingerprint>,
    trades: Vec<TradeRecord>,
    signals: Vec<SignalRow>,
}

#[derive(Debug, Default)]
pub struct MemorySignalRepository {
    state: Mutex<Stored>,
}

impl MemorySignalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write is a single assignment, so a poisoned lock still holds a whole snapshot.
    fn state(&self) -> MutexGuard<'_, Stored> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(
        &self,
        fingerprint: Option<&RunFingerprint>,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) {
        *self.state() = Stored {
            fingerprint: fingerprint.cloned(),
            trades: trades.to_vec(),
            signals: signals.to_vec(),
        };
    }
}

impl SignalRepository for MemorySignalRepository {
    fn clear_and_store(
        &self,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        self.replace(None, trades, signals);
        Ok(())
    }

    fn store_run(
        &self,
        fingerprint: &RunFingerprint,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        self.replace(Some(fingerprint), trades, signals);
        Ok(())
    }

    fn load_fingerprint(&self) -> Result<Option<RunFingerprint>, RepositoryError> {
        Ok(self.state().fingerprint.clone())
    }

    fn get_latest_signal(&self) -> Result<Option<SignalRow>, RepositoryError> {
        Ok(latest_actionable(&self.state().signals))
    }

    fn load_trades(&self) -> Result<Vec<TradeRecord>, RepositoryError> {
        Ok(self.state().trades.clone())
    }

    fn load_signals(&self) -> Result<Vec<SignalRow>, RepositoryError> {
        Ok(self.state().signals.clone())
    }
}
