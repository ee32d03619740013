//! SQLite-backed repository.
//!
//! One database can hold many symbols; every row is keyed by symbol and a
//! per-store sequence number. A store deletes the symbol's rows and inserts
//! the new ones inside a single transaction.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use emalab_core::domain::{SignalRow, SignalStatus, SignalType, TradeRecord, TradeResult};
use emalab_core::fingerprint::RunFingerprint;
use emalab_core::repository::{RepositoryError, SignalRepository};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trades (
    symbol      TEXT    NOT NULL,
    seq         INTEGER NOT NULL,
    entry_index INTEGER NOT NULL,
    entry_date  TEXT    NOT NULL,
    entry_price REAL    NOT NULL,
    exit_index  INTEGER NOT NULL,
    exit_date   TEXT    NOT NULL,
    exit_price  REAL    NOT NULL,
    days_held   INTEGER NOT NULL,
    return_pct  REAL    NOT NULL,
    result      TEXT    NOT NULL,
    PRIMARY KEY (symbol, seq)
);
CREATE TABLE IF NOT EXISTS signals (
    symbol       TEXT    NOT NULL,
    seq          INTEGER NOT NULL,
    signal_index INTEGER NOT NULL,
    date         TEXT    NOT NULL,
    signal_type  TEXT    NOT NULL,
    price        REAL    NOT NULL,
    ema          REAL    NOT NULL,
    status       TEXT    NOT NULL,
    PRIMARY KEY (symbol, seq)
);
CREATE INDEX IF NOT EXISTS idx_signals_symbol_date ON signals(symbol, date);
CREATE TABLE IF NOT EXISTS runs (
    symbol      TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL
);
";

fn storage(e: rusqlite::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

pub struct SqliteSignalRepository {
    conn: Arc<Mutex<Connection>>,
    symbol: String,
}

impl SqliteSignalRepository {
    /// Open (or create) the database at `path`, scoped to `symbol`.
    pub fn open(path: impl AsRef<Path>, symbol: &str) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage)?;
        let repo = Self::from_connection(conn, symbol)?;
        info!(path = %path.display(), symbol, "SQLite signal store opened");
        Ok(repo)
    }

    pub fn open_in_memory(symbol: &str) -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory().map_err(storage)?, symbol)
    }

    fn from_connection(conn: Connection, symbol: &str) -> Result<Self, RepositoryError> {
        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            symbol: symbol.to_string(),
        })
    }

    /// Same database, different symbol.
    pub fn for_symbol(&self, symbol: &str) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            symbol: symbol.to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Storage("SQLite connection lock poisoned".into()))
    }

    fn write(
        &self,
        fingerprint: Option<&RunFingerprint>,
        trades: &[TradeRecord],
        signals: &[SignalRow],
    ) -> Result<(), RepositoryError> {
        let fingerprint_json = fingerprint
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Storage(format!("serialize fingerprint: {e}")))?;

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(storage)?;

        for table in ["trades", "signals", "runs"] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE symbol = ?1"),
                params![self.symbol],
            )
            .map_err(storage)?;
        }

        {
            let mut insert = tx
                .prepare(
                    "INSERT INTO trades (symbol, seq, entry_index, entry_date, entry_price,
                        exit_index, exit_date, exit_price, days_held, return_pct, result)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .map_err(storage)?;
            for (seq, t) in trades.iter().enumerate() {
                insert
                    .execute(params![
                        self.symbol,
                        seq as i64,
                        t.entry_index as i64,
                        t.entry_date.format(DATE_FORMAT).to_string(),
                        t.entry_price,
                        t.exit_index as i64,
                        t.exit_date.format(DATE_FORMAT).to_string(),
                        t.exit_price,
                        t.days_held as i64,
                        t.return_pct,
                        t.result.as_str(),
                    ])
                    .map_err(storage)?;
            }

            let mut insert = tx
                .prepare(
                    "INSERT INTO signals (symbol, seq, signal_index, date, signal_type,
                        price, ema, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(storage)?;
            for (seq, s) in signals.iter().enumerate() {
                insert
                    .execute(params![
                        self.symbol,
                        seq as i64,
                        s.index as i64,
                        s.date.format(DATE_FORMAT).to_string(),
                        s.signal_type.as_str(),
                        s.price,
                        s.ema,
                        s.status.as_str(),
                    ])
                    .map_err(storage)?;
            }

            if let Some(json) = &fingerprint_json {
                tx.execute(
                    "INSERT INTO runs (symbol, fingerprint) VALUES (?1, ?2)",
                    params![self.symbol, json],
                )
                .map_err(storage)?;
            }
        }

        tx.commit().map_err(storage)?;
        debug!(
            symbol = %self.symbol,
            trades = trades.len(),
            signals = signals.len(),
            "replaced stored signals"
        );
        Ok(())
    }

    fn query_signals(&self, sql: &str) -> Result<Vec<SignalRow>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(storage)?;
        let raw = stmt
            .query_map(params![self.symbol], |row| {
                Ok(RawSignal {
                    index: row.get(0)?,
                    date: row.get(1)?,
                    signal_type: row.get(2)?,
                    price: row.get(3)?,
                    ema: row.get(4)?,
                    status: row.get(5)?,
                })
            })
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        raw.into_iter().map(RawSignal::into_row).collect()
    }
}

struct RawSignal {
    index: i64,
    date: String,
    signal_type: String,
    price: f64,
    ema: f64,
    status: String,
}

impl RawSignal {
    fn into_row(self) -> Result<SignalRow, RepositoryError> {
        Ok(SignalRow {
            index: to_index(self.index)?,
            date: parse_date(&self.date)?,
            signal_type: SignalType::parse(&self.signal_type).ok_or_else(|| {
                RepositoryError::Malformed(format!("unknown signal type '{}'", self.signal_type))
            })?,
            price: self.price,
            ema: self.ema,
            status: SignalStatus::parse(&self.status).ok_or_else(|| {
                RepositoryError::Malformed(format!("unknown signal status '{}'", self.status))
            })?,
        })
    }
}

struct RawTrade {
    entry_index: i64,
    entry_date: String,
    entry_price: f64,
    exit_index: i64,
    exit_date: String,
    exit_price: f64,
    days_held: i64,
    return_pct: f64,
    result: String,
}

impl RawTrade {
    fn into_record(self) -> Result<TradeRecord, RepositoryError> {
        Ok(TradeRecord {
            entry_index: to_index(self.entry_index)?,
            entry_date: parse_date(&self.entry_date)?,
            entry_price: self.entry_price,
            exit_index: to_index(self.exit_index)?,
            exit_date: parse_date(&self.exit_date)?,
            exit_price: self.exit_price,
            days_held: to_index(self.days_held)?,
            return_pct: self.return_pct,
            result: TradeResult::parse(&self.result).ok_or_else(|| {
                RepositoryError::Malformed(format!("unknown trade result '{}'", self.result))
            })?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| RepositoryError::Malformed(format!("date '{s}': {e}")))
}

fn to_index(v: i64) -> Result<usize, RepositoryError> {
    usize::try_from(v).map_err(|_| RepositoryError::Malformed(format!("negative index {v}")))
}

impl SignalRepository for SqliteSignalRepository {
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
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT fingerprint FROM runs WHERE symbol = ?1",
                params![self.symbol],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)?;
        json.map(|j| {
            serde_json::from_str(&j)
                .map_err(|e| RepositoryError::Malformed(format!("stored fingerprint: {e}")))
        })
        .transpose()
    }

    fn get_latest_signal(&self) -> Result<Option<SignalRow>, RepositoryError> {
        let mut rows = self.query_signals(
            "SELECT signal_index, date, signal_type, price, ema, status FROM signals
             WHERE symbol = ?1 AND status != 'CURRENT'
             ORDER BY date DESC, signal_index DESC
             LIMIT 1",
        )?;
        Ok(rows.pop())
    }

    fn load_trades(&self) -> Result<Vec<TradeRecord>, RepositoryError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT entry_index, entry_date, entry_price, exit_index, exit_date,
                        exit_price, days_held, return_pct, result
                 FROM trades WHERE symbol = ?1 ORDER BY seq",
            )
            .map_err(storage)?;
        let raw = stmt
            .query_map(params![self.symbol], |row| {
                Ok(RawTrade {
                    entry_index: row.get(0)?,
                    entry_date: row.get(1)?,
                    entry_price: row.get(2)?,
                    exit_index: row.get(3)?,
                    exit_date: row.get(4)?,
                    exit_price: row.get(5)?,
                    days_held: row.get(6)?,
                    return_pct: row.get(7)?,
                    result: row.get(8)?,
                })
            })
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        raw.into_iter().map(RawTrade::into_record).collect()
    }

    fn load_signals(&self) -> Result<Vec<SignalRow>, RepositoryError> {
        self.query_signals(
            "SELECT signal_index, date, signal_type, price, ema, status FROM signals
             WHERE symbol = ?1 ORDER BY seq",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::contract;

    #[test]
    fn satisfies_repository_contract_in_memory() {
        contract::all(&SqliteSignalRepository::open_in_memory("NEPSE").unwrap());
    }

    #[test]
    fn satisfies_repository_contract_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteSignalRepository::open(dir.path().join("db/signals.sqlite"), "NEPSE")
            .unwrap();
        contract::all(&repo);
    }

    #[test]
    fn symbols_are_isolated_within_one_database() {
        let a = SqliteSignalRepository::open_in_memory("A").unwrap();
        let b = a.for_symbol("B");
        a.clear_and_store(&[contract::trade(1, 3, 10.0, 12.0)], &[])
            .unwrap();
        b.clear_and_store(&[], &[]).unwrap();
        assert_eq!(a.load_trades().unwrap().len(), 1);
        assert!(b.load_trades().unwrap().is_empty());
    }

    #[test]
    fn reopening_sees_previous_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.sqlite");
        let trades = vec![contract::trade(2, 6, 100.0, 104.0)];
        SqliteSignalRepository::open(&path, "NEPSE")
            .unwrap()
            .clear_and_store(&trades, &[])
            .unwrap();
        let reopened = SqliteSignalRepository::open(&path, "NEPSE").unwrap();
        assert_eq!(reopened.load_trades().unwrap(), trades);
    }

    #[test]
    fn bad_stored_date_is_malformed() {
        let repo = SqliteSignalRepository::open_in_memory("NEPSE").unwrap();
        repo.conn()
            .unwrap()
            .execute(
                "INSERT INTO signals VALUES ('NEPSE', 0, 1, 'yesterday', 'BUY', 1.0, 1.0, 'COMPLETED')",
                [],
            )
            .unwrap();
        assert!(matches!(
            repo.load_signals(),
            Err(RepositoryError::Malformed(_))
        ));
    }
}
