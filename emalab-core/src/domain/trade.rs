//! TradeRecord: a completed long round trip, BUY entry to SELL exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeResult {
    Win,
    Loss,
}

impl TradeResult {
    /// WIN iff the return is strictly positive. Break-even counts as a loss.
    pub fn from_return(return_pct: f64) -> Self {
        if return_pct > 0.0 {
            TradeResult::Win
        } else {
            TradeResult::Loss
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeResult::Win => "WIN",
            TradeResult::Loss => "LOSS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WIN" => Some(TradeResult::Win),
            "LOSS" => Some(TradeResult::Loss),
            _ => None,
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A realized trade. Immutable once created by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    /// Index distance between entry and exit (trading-day steps).
    pub days_held: usize,
    /// `(exit - entry) / entry * 100`.
    pub return_pct: f64,
    pub result: TradeResult,
}

impl TradeRecord {
    pub fn close(
        entry_index: usize,
        entry_date: NaiveDate,
        entry_price: f64,
        exit_index: usize,
        exit_date: NaiveDate,
        exit_price: f64,
    ) -> Self {
        let return_pct = percent_change(entry_price, exit_price);
        Self {
            entry_index,
            entry_date,
            entry_price,
            exit_index,
            exit_date,
            exit_price,
            days_held: exit_index.saturating_sub(entry_index),
            return_pct,
            result: TradeResult::from_return(return_pct),
        }
    }

    pub fn is_winner(&self) -> bool {
        self.result == TradeResult::Win
    }
}

/// Percentage change from `from` to `to`; 0 when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}
