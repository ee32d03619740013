//! EmaLab Core: EMA crossover signal engine with a minimum-holding-period rule.
//!
//! This crate contains the pure, synchronous engine:
//! - Domain types (price points, crossover events, positions, trades)
//! - Ingestion with explicit skip records, canonical ordering
//! - EMA calculator seeded at the first sample
//! - Crossover detector
//! - Holding-period filter / trade simulator
//! - Current-signal view and signal statistics
//! - Repository traits for the storage adapters in `emalab-runner`

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod params;
pub mod repository;
pub mod rng;
pub mod signals;
pub mod stats;

pub use error::EngineError;
pub use params::SignalParams;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine inputs and outputs are Send + Sync, so runs
    /// for different symbols can execute on separate threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PricePoint>();
        require_sync::<domain::PricePoint>();
        require_send::<domain::EmaPoint>();
        require_sync::<domain::EmaPoint>();
        require_send::<domain::CrossoverEvent>();
        require_sync::<domain::CrossoverEvent>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<domain::SignalRow>();
        require_sync::<domain::SignalRow>();

        require_send::<SignalParams>();
        require_sync::<SignalParams>();
        require_send::<engine::PipelineOutput>();
        require_sync::<engine::PipelineOutput>();
        require_send::<stats::SignalStatistics>();
        require_sync::<stats::SignalStatistics>();
        require_send::<fingerprint::RunFingerprint>();
        require_sync::<fingerprint::RunFingerprint>();
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
    }

    /// Architecture contract: crossover detection never sees position state.
    ///
    /// `detect_crossovers` takes only the EMA-annotated series. If a position
    /// parameter is ever added, this stops compiling.
    #[test]
    fn crossover_detection_has_no_position_parameter() {
        fn _check(series: &[domain::EmaPoint]) -> Vec<domain::CrossoverEvent> {
            signals::detect_crossovers(series)
        }
    }
}
