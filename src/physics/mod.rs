//! Simulation cores.
//!
//! Two engines share the particle representation and Verlet integration:
//! - the constraint grid (particles, rigid-distance constraints, contacts)
//! - the curve evolver (Brownian noise, fairing, attraction-repulsion)

pub mod constraint;
pub mod evolver;
pub mod grid_solver;
pub mod particle;

pub use constraint::DistanceConstraint;
pub use evolver::CurveEvolver;
pub use grid_solver::GridSolver;
pub use particle::Particle;
