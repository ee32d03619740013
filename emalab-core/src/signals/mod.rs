//! Signal generation: crossover events derived purely from the price series.
//!
//! Crossover detection never looks at position state; the simulator decides
//! which events are actionable.

pub mod crossover;

pub use crossover::{classify, detect_crossovers, Crossovers};
