//! Holding-period filter and trade simulator.
//!
//! Single pass over chronological crossover events with one piece of state:
//! the open long position, if any.
//!
//! ```text
//!   NONE --BUY--> OPEN                      (actionable)
//!   NONE --SELL-> NONE                      ignored: no open position
//!   OPEN --any--> OPEN   if held < min      ignored: holding period not met
//!   OPEN --SELL-> NONE   if held >= min     actionable, trade recorded
//!   OPEN --BUY--> OPEN   if held >= min     ignored: already open
//! ```
//!
//! `held` is the index distance from the entry event, i.e. trading-day steps
//! within the series, not calendar days. A position still open when the events
//! run out is reported as `open_position` and never becomes a trade.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{
    CrossoverEvent, EmaPoint, IgnoreReason, IgnoredSignalRecord, OpenPosition, Position,
    SignalType, TradeRecord,
};
use crate::error::EngineError;

/// What the simulator did with one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Opened(Position),
    Closed(TradeRecord),
    Ignored(IgnoreReason),
}

impl Action {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Action::Ignored(_))
    }
}

/// Position state machine. Feed events in chronological order through `step`.
#[derive(Debug, Clone)]
pub struct Simulator {
    min_holding_days: u32,
    position: Option<Position>,
}

impl Simulator {
    pub fn new(min_holding_days: u32) -> Self {
        Self {
            min_holding_days,
            position: None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn min_holding_days(&self) -> u32 {
        self.min_holding_days
    }

    pub fn step(&mut self, event: &CrossoverEvent) -> Action {
        let Some(position) = self.position else {
            return match event.signal_type {
                SignalType::Buy => {
                    let opened = Position {
                        entry_index: event.index,
                        entry_date: event.date,
                        entry_price: event.price,
                    };
                    self.position = Some(opened);
                    Action::Opened(opened)
                }
                SignalType::Sell => Action::Ignored(IgnoreReason::NoOpenPosition),
            };
        };

        let days_held = position.days_held_at(event.index);
        if days_held < self.min_holding_days as usize {
            return Action::Ignored(IgnoreReason::HoldingPeriodNotMet {
                days_held,
                min_holding_days: self.min_holding_days,
            });
        }

        match event.signal_type {
            SignalType::Sell => {
                self.position = None;
                Action::Closed(TradeRecord::close(
                    position.entry_index,
                    position.entry_date,
                    position.entry_price,
                    event.index,
                    event.date,
                    event.price,
                ))
            }
            SignalType::Buy => Action::Ignored(IgnoreReason::PositionAlreadyOpen {
                since: position.entry_date,
            }),
        }
    }
}

/// Output of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trades: Vec<TradeRecord>,
    pub ignored: Vec<IgnoredSignalRecord>,
    /// Series indices of events that opened or closed a position.
    pub actionable_signal_indices: BTreeSet<usize>,
    /// Unrealized state of a position left open at end of data.
    pub open_position: Option<OpenPosition>,
}

/// Run the holding-period filter over `events`.
///
/// `series` is the EMA-annotated price series the events were detected on; it
/// is used to bounds-check the events and to mark any open position to the
/// last sample. Events must be strictly increasing by index.
pub fn simulate(
    series: &[EmaPoint],
    events: &[CrossoverEvent],
    min_holding_days: u32,
) -> Result<SimulationResult, EngineError> {
    validate_events(series, events)?;

    let mut sim = Simulator::new(min_holding_days);
    let mut result = SimulationResult::default();

    for event in events {
        match sim.step(event) {
            Action::Opened(_) => {
                result.actionable_signal_indices.insert(event.index);
            }
            Action::Closed(trade) => {
                result.actionable_signal_indices.insert(event.index);
                result.trades.push(trade);
            }
            Action::Ignored(reason) => result.ignored.push(IgnoredSignalRecord {
                index: event.index,
                date: event.date,
                signal_type: event.signal_type,
                price: event.price,
                reason,
            }),
        }
    }

    if let (Some(position), Some(last)) = (sim.position(), series.last()) {
        result.open_position = Some(OpenPosition::mark(
            position,
            series.len() - 1,
            last.date,
            last.price,
        ));
    }

    Ok(result)
}

fn validate_events(series: &[EmaPoint], events: &[CrossoverEvent]) -> Result<(), EngineError> {
    let mut prev: Option<usize> = None;
    for event in events {
        if event.index >= series.len() {
            return Err(EngineError::invalid(format!(
                "crossover index {} outside series of length {}",
                event.index,
                series.len()
            )));
        }
        if prev.is_some_and(|p| event.index <= p) {
            return Err(EngineError::invalid(format!(
                "crossover events out of order at index {}",
                event.index
            )));
        }
        prev = Some(event.index);
    }
    Ok(())
}
