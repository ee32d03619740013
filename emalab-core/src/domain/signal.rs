//! Crossover events and what the simulator did with them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a price/EMA crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    /// Price crossed above its EMA.
    Buy,
    /// Price crossed below its EMA.
    Sell,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Buy => "BUY",
            SignalType::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(SignalType::Buy),
            "SELL" => Some(SignalType::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A crossover detected between samples `index - 1` and `index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    /// Position in the underlying series (always >= 1).
    pub index: usize,
    pub date: NaiveDate,
    pub signal_type: SignalType,
    pub price: f64,
    pub ema: f64,
}

/// Why a crossover did not open or close a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IgnoreReason {
    /// A SELL arrived while flat.
    NoOpenPosition,
    /// A position was open but had not been held long enough.
    HoldingPeriodNotMet { days_held: usize, min_holding_days: u32 },
    /// A BUY arrived while already long.
    PositionAlreadyOpen { since: NaiveDate },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NoOpenPosition => write!(f, "No open position"),
            IgnoreReason::HoldingPeriodNotMet {
                days_held,
                min_holding_days,
            } => write!(
                f,
                "Position held only {days_held} days (min: {min_holding_days})"
            ),
            IgnoreReason::PositionAlreadyOpen { since } => {
                write!(f, "Position already open since {since}")
            }
        }
    }
}

/// A suppressed crossover, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredSignalRecord {
    pub index: usize,
    pub date: NaiveDate,
    pub signal_type: SignalType,
    pub price: f64,
    pub reason: IgnoreReason,
}

/// How a persisted signal row relates to the trade history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    /// Part of a closed round trip.
    Completed,
    /// Opened a position that is still open at end of data.
    OpenPosition,
    /// Latest crossover on the series; reported even though it was not actionable.
    Current,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Completed => "COMPLETED",
            SignalStatus::OpenPosition => "OPEN_POSITION",
            SignalStatus::Current => "CURRENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COMPLETED" => Some(SignalStatus::Completed),
            "OPEN_POSITION" => Some(SignalStatus::OpenPosition),
            "CURRENT" => Some(SignalStatus::Current),
            _ => None,
        }
    }
}

/// One row of the signal history handed to the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub index: usize,
    pub date: NaiveDate,
    pub signal_type: SignalType,
    pub price: f64,
    pub ema: f64,
    pub status: SignalStatus,
}

impl SignalRow {
    pub fn from_event(event: &CrossoverEvent, status: SignalStatus) -> Self {
        Self {
            index: event.index,
            date: event.date,
            signal_type: event.signal_type,
            price: event.price,
            ema: event.ema,
            status,
        }
    }

    /// Whether this row opened or closed a position.
    pub fn is_actionable(&self) -> bool {
        !matches!(self.status, SignalStatus::Current)
    }
}
