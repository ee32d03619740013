//! Signal engine: holding-period simulator, current-state derivation, pipeline.

pub mod current;
pub mod pipeline;
pub mod simulator;

pub use current::{
    current_signal, latest_signal, signal_rows, signal_status, CurrentSignal, LatestSignal,
    LatestSignalType,
};
pub use pipeline::{run_pipeline, PipelineOutput};
pub use simulator::{simulate, Action, SimulationResult, Simulator};
