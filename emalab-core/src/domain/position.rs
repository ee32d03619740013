//! Simulator position state. Long-only, at most one position at a time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::percent_change;

/// An open long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
}

impl Position {
    /// Steps elapsed between entry and `index`.
    pub fn days_held_at(&self, index: usize) -> usize {
        index.saturating_sub(self.entry_index)
    }
}

/// Unrealized state of a position still open at end of data.
///
/// Diagnostic only: it is never turned into a trade or counted in statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub last_date: NaiveDate,
    pub last_price: f64,
    pub days_open: usize,
    pub unrealized_pct: f64,
}

impl OpenPosition {
    pub fn mark(
        position: &Position,
        last_index: usize,
        last_date: NaiveDate,
        last_price: f64,
    ) -> Self {
        Self {
            entry_index: position.entry_index,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            last_date,
            last_price,
            days_open: position.days_held_at(last_index),
            unrealized_pct: percent_change(position.entry_price, last_price),
        }
    }
}
