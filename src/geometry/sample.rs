//! Curve sample points.
//!
//! Samples are the curve engine's mass points. Unlike grid particles they
//! carry no mass and receive no gravity; forces are applied as positional
//! impulses before the Verlet step. Each sample knows which curve it
//! belongs to and where, and those back-references are reconciled after
//! every structural mutation.

use glam::Vec2;

/// A vertex of an evolving curve.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Current position
    pub pos: Vec2,
    /// Position one step ago; `pos - prev` is the velocity
    pub prev: Vec2,
    /// Local scale factor, dilates the desired segment length around this
    /// sample. Strictly positive.
    pub delta: f32,
    /// Locked samples skip integration, forces, and merge removal
    pub locked: bool,
    /// Excluded from attraction-repulsion when set
    pub ignore_neighbors: bool,
    /// Id of the owning curve
    pub curve_id: u32,
    /// Index of this sample within the owning curve
    pub index_in_curve: usize,
}

impl Sample {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            prev: pos,
            delta: 1.0,
            locked: false,
            ignore_neighbors: false,
            curve_id: 0,
            index_in_curve: 0,
        }
    }

    pub fn with_delta(pos: Vec2, delta: f32) -> Self {
        Self {
            delta,
            ..Self::new(pos)
        }
    }

    /// One position-Verlet step; samples have no intrinsic acceleration.
    pub fn verlet(&mut self) {
        if self.locked {
            return;
        }
        let velocity = self.pos - self.prev;
        self.prev = self.pos;
        self.pos += velocity;
    }

    /// Apply a positional impulse.
    pub fn apply_force(&mut self, force: Vec2) {
        if self.locked {
            return;
        }
        self.pos += force;
    }

    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev
    }

    /// Teleport, destroying any velocity.
    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
        self.prev = pos;
    }

    pub fn distance_to(&self, other: &Sample) -> f32 {
        self.pos.distance(other.pos)
    }
}
