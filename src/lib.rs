//! Physics Maze - interactive 2D simulation engine for maze-like geometry
//!
//! Two cores share a particle representation, Verlet integration, and a
//! uniform-grid spatial index: a constraint-based particle grid with
//! gravity and contacts, and a curve-evolution engine that grows
//! labyrinthine poly-lines from Brownian noise, Laplacian fairing, and a
//! Lennard-Jones attraction-repulsion potential.

pub mod config;
pub mod engine;
pub mod export;
pub mod field;
pub mod geometry;
pub mod physics;
pub mod spatial;
pub mod state;

pub use config::{EngineConfig, EvolutionConfig};
pub use engine::{EngineKind, MazeEngine, Mode};
pub use field::ParameterField;
pub use geometry::{Curve, CurveKind, CurveParams, Sample};
pub use physics::{CurveEvolver, DistanceConstraint, GridSolver, Particle};
pub use spatial::SpatialIndex;
pub use state::{History, SimulationMetrics, Snapshot};
