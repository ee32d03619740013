//! Current market state: the latest crossover, whether or not it was actionable.
//!
//! Completed round trips tell you what happened; this module tells you what the
//! market is doing now. The latest crossover is always reported, tagged
//! `CURRENT` when the holding rules kept it from being acted on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::simulator::SimulationResult;
use crate::domain::{CrossoverEvent, EmaPoint, SignalRow, SignalStatus, SignalType};

/// Signal type in the latest-signal view; HOLD when the series has no crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LatestSignalType {
    Buy,
    Sell,
    Hold,
}

impl From<SignalType> for LatestSignalType {
    fn from(t: SignalType) -> Self {
        match t {
            SignalType::Buy => LatestSignalType::Buy,
            SignalType::Sell => LatestSignalType::Sell,
        }
    }
}

/// The most recent crossover and how the simulator treated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSignal {
    pub event: CrossoverEvent,
    pub status: SignalStatus,
}

/// Latest-signal view consumed by downstream API layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSignal {
    pub date: NaiveDate,
    pub signal_type: LatestSignalType,
    pub price: f64,
    pub ema: f64,
    pub can_trade: bool,
    pub holding_period_active: bool,
    pub holding_days_remaining: u32,
    pub days_since_last_signal: usize,
}

/// Classify one event against a finished simulation.
pub fn signal_status(event: &CrossoverEvent, sim: &SimulationResult) -> SignalStatus {
    if !sim.actionable_signal_indices.contains(&event.index) {
        return SignalStatus::Current;
    }
    match &sim.open_position {
        Some(open) if open.entry_index == event.index => SignalStatus::OpenPosition,
        _ => SignalStatus::Completed,
    }
}

pub fn current_signal(events: &[CrossoverEvent], sim: &SimulationResult) -> Option<CurrentSignal> {
    events.last().map(|event| CurrentSignal {
        event: *event,
        status: signal_status(event, sim),
    })
}

/// Rows to persist: every actionable event, plus the latest crossover as
/// `CURRENT` when it was not actionable.
pub fn signal_rows(events: &[CrossoverEvent], sim: &SimulationResult) -> Vec<SignalRow> {
    let mut rows: Vec<SignalRow> = events
        .iter()
        .filter(|e| sim.actionable_signal_indices.contains(&e.index))
        .map(|e| SignalRow::from_event(e, signal_status(e, sim)))
        .collect();

    if let Some(current) = current_signal(events, sim) {
        if current.status == SignalStatus::Current {
            rows.push(SignalRow::from_event(&current.event, SignalStatus::Current));
        }
    }
    rows
}

/// Build the latest-signal view as of the last sample of `series`.
///
/// Returns `None` only for an empty series.
pub fn latest_signal(
    series: &[EmaPoint],
    events: &[CrossoverEvent],
    sim: &SimulationResult,
    min_holding_days: u32,
) -> Option<LatestSignal> {
    let last_index = series.len().checked_sub(1)?;
    let last = &series[last_index];

    let (holding_period_active, holding_days_remaining) = match &sim.open_position {
        Some(open) if open.days_open < min_holding_days as usize => {
            (true, min_holding_days - open.days_open as u32)
        }
        _ => (false, 0),
    };

    let view = match events.last() {
        Some(event) => LatestSignal {
            date: event.date,
            signal_type: event.signal_type.into(),
            price: event.price,
            ema: event.ema,
            can_trade: !holding_period_active,
            holding_period_active,
            holding_days_remaining,
            days_since_last_signal: last_index - event.index,
        },
        None => LatestSignal {
            date: last.date,
            signal_type: LatestSignalType::Hold,
            price: last.price,
            ema: last.ema,
            can_trade: !holding_period_active,
            holding_period_active,
            holding_days_remaining,
            days_since_last_signal: last_index,
        },
    };
    Some(view)
}
