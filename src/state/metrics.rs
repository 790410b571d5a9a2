//! Per-frame inspection outputs.
//!
//! The facade publishes a small metrics struct every tick: a rolling FPS
//! estimate, entity counts, and optional per-particle debug vectors for a
//! force-overlay display.

use glam::Vec2;
use serde::Serialize;

use crate::physics::Particle;

/// Scale applied to the implicit velocity when exposing debug vectors.
const FORCE_VECTOR_SCALE: f32 = 10.0;

/// Exponential-moving-average FPS estimator.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    average: f32,
    smoothing: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            average: 60.0,
            smoothing: 0.9,
        }
    }

    /// Record one frame of `frame_seconds` duration.
    pub fn record_frame(&mut self, frame_seconds: f32) {
        if frame_seconds <= 0.0 {
            return;
        }
        let instantaneous = 1.0 / frame_seconds;
        self.average = self.average * self.smoothing + instantaneous * (1.0 - self.smoothing);
    }

    pub fn average(&self) -> f32 {
        self.average
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the engine's observable quantities for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetrics {
    /// Rolling-averaged frames per second
    pub avg_fps: f32,
    /// Live grid particles
    pub particle_count: usize,
    /// Live distance constraints
    pub constraint_count: usize,
    /// Live curve samples across all curves
    pub sample_count: usize,
    /// Live curves
    pub curve_count: usize,
    /// Ticks simulated since construction
    pub tick_count: u64,
}

/// Debug overlay vectors: one `(origin, offset)` pair per moving particle,
/// where the offset is the implicit velocity scaled for visibility.
pub fn force_vectors(particles: &[Particle]) -> Vec<(Vec2, Vec2)> {
    particles
        .iter()
        .filter(|p| !p.locked)
        .map(|p| (p.pos, p.velocity() * FORCE_VECTOR_SCALE))
        .collect()
}
