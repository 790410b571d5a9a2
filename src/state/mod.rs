//! Simulation state services: undo/redo history and per-frame metrics.

mod history;
mod metrics;

pub use history::{History, Snapshot};
pub use metrics::{force_vectors, FpsCounter, SimulationMetrics};
