//! Domain types for EmaLab

pub mod position;
pub mod price;
pub mod signal;
pub mod trade;

pub use position::{OpenPosition, Position};
pub use price::{EmaPoint, PricePoint, Side};
pub use signal::{
    CrossoverEvent, IgnoreReason, IgnoredSignalRecord, SignalRow, SignalStatus, SignalType,
};
pub use trade::{percent_change, TradeRecord, TradeResult};

/// Symbol type alias
pub type Symbol = String;
