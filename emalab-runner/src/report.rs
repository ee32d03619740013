//! Downstream report shapes and export.
//!
//! `TradeSummary` and the history entries are the payloads API layers serve;
//! export writes them as pretty JSON or CSV.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emalab_core::domain::{SignalRow, SignalStatus, SignalType, TradeRecord, TradeResult};
use emalab_core::stats::SignalStatistics;

use crate::repository::json_file::file_stem;
use crate::runner::RunReport;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Headline numbers for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub total_signals: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent of trades won, 0 to 100.
    pub win_rate: f64,
    /// Mean per-trade return in percent.
    pub avg_profit_loss: f64,
    /// Sum of per-trade returns in percent.
    pub total_return: f64,
}

impl From<&SignalStatistics> for TradeSummary {
    fn from(s: &SignalStatistics) -> Self {
        Self {
            total_signals: s.total_signals,
            buy_signals: s.buy_count,
            sell_signals: s.sell_count,
            total_trades: s.completed_trades,
            winning_trades: s.winning_trades,
            losing_trades: s.losing_trades,
            win_rate: s.win_rate_pct,
            avg_profit_loss: s.avg_return_pct,
            total_return: s.total_return_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHistoryEntry {
    pub date: NaiveDate,
    pub signal_type: SignalType,
    pub price: f64,
    pub ema: f64,
    pub status: SignalStatus,
}

impl From<&SignalRow> for SignalHistoryEntry {
    fn from(row: &SignalRow) -> Self {
        Self {
            date: row.date,
            signal_type: row.signal_type,
            price: row.price,
            ema: row.ema,
            status: row.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeHistoryEntry {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub days_held: usize,
    pub return_pct: f64,
    pub result: TradeResult,
}

impl From<&TradeRecord> for TradeHistoryEntry {
    fn from(t: &TradeRecord) -> Self {
        Self {
            entry_date: t.entry_date,
            entry_price: t.entry_price,
            exit_date: t.exit_date,
            exit_price: t.exit_price,
            days_held: t.days_held,
            return_pct: t.return_pct,
            result: t.result,
        }
    }
}

/// Newest first, as history endpoints list them.
pub fn signal_history(rows: &[SignalRow]) -> Vec<SignalHistoryEntry> {
    rows.iter().rev().map(SignalHistoryEntry::from).collect()
}

/// Newest first.
pub fn trade_history(trades: &[TradeRecord]) -> Vec<TradeHistoryEntry> {
    trades.iter().rev().map(TradeHistoryEntry::from).collect()
}

pub fn export_json(report: &RunReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn import_json(json: &str) -> Result<RunReport, ReportError> {
    Ok(serde_json::from_str(json)?)
}

/// Trade list as CSV, chronological.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "days_held",
        "return_pct",
        "result",
    ])?;
    for t in trades {
        wtr.write_record([
            t.entry_date.to_string(),
            format!("{:.2}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.2}", t.exit_price),
            t.days_held.to_string(),
            format!("{:.4}", t.return_pct),
            t.result.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Signal rows as CSV, chronological.
pub fn export_signals_csv(rows: &[SignalRow]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "signal_type", "price", "ema", "status"])?;
    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            r.signal_type.to_string(),
            format!("{:.2}", r.price),
            format!("{:.4}", r.ema),
            r.status.as_str().to_string(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ReportError> {
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

/// Write `{symbol}.report.json`, `{symbol}.trades.csv` and `{symbol}.signals.csv`
/// under `dir`. Returns the report path.
pub fn save_report(report: &RunReport, dir: &Path) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let stem = file_stem(&report.symbol);

    let json_path = dir.join(format!("{stem}.report.json"));
    std::fs::write(&json_path, export_json(report)?)?;
    std::fs::write(
        dir.join(format!("{stem}.trades.csv")),
        export_trades_csv(&report.trades)?,
    )?;
    std::fs::write(
        dir.join(format!("{stem}.signals.csv")),
        export_signals_csv(&report.signals)?,
    )?;
    Ok(json_path)
}

/// Plain-text summary for terminal output.
pub fn render_summary(report: &RunReport) -> String {
    let s = &report.summary;
    let l = &report.latest;
    let mut out = String::with_capacity(512);
    out.push_str(&format!("Symbol:            {}\n", report.symbol));
    if let (Some(first), Some(last)) = (report.fingerprint.first_date, report.fingerprint.last_date)
    {
        out.push_str(&format!(
            "Period:            {first} to {last} ({} points)\n",
            report.fingerprint.points
        ));
    }
    out.push_str(&format!(
        "Latest signal:     {:?} on {} at {:.2} (EMA {:.2})\n",
        l.signal_type, l.date, l.price, l.ema
    ));
    if l.holding_period_active {
        out.push_str(&format!(
            "Holding period:    active, {} day(s) remaining\n",
            l.holding_days_remaining
        ));
    } else {
        out.push_str("Holding period:    inactive\n");
    }
    out.push_str(&format!(
        "Signals:           {} ({} buy / {} sell)\n",
        s.total_signals, s.buy_signals, s.sell_signals
    ));
    out.push_str(&format!(
        "Trades:            {} ({} won / {} lost)\n",
        s.total_trades, s.winning_trades, s.losing_trades
    ));
    out.push_str(&format!("Win rate:          {:.1}%\n", s.win_rate));
    out.push_str(&format!("Avg P/L per trade: {:.2}%\n", s.avg_profit_loss));
    out.push_str(&format!("Total return:      {:.2}%\n", s.total_return));
    if !report.skipped_rows.is_empty() {
        out.push_str(&format!("Skipped rows:      {}\n", report.skipped_rows.len()));
    }
    out
}
