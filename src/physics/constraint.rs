//! Rigid-distance constraints between particle pairs.
//!
//! Constraints store index handles into the particle list rather than
//! references, so removing a particle invalidates its constraints without
//! any lifetime entanglement; the solver audits and drops dangling
//! constraints at tick entry.

use glam::Vec2;

use super::particle::Particle;

/// A position-based distance constraint between two particles.
#[derive(Debug, Clone)]
pub struct DistanceConstraint {
    /// Index of the first endpoint
    pub a: usize,
    /// Index of the second endpoint
    pub b: usize,
    /// Target distance, non-negative
    pub rest_length: f32,
    /// Fraction of the error corrected per solve, in (0, 1]
    pub stiffness: f32,
}

impl DistanceConstraint {
    /// Constrain `a` and `b` to their current separation.
    pub fn from_current(a: usize, b: usize, particles: &[Particle]) -> Self {
        let rest_length = particles[a].pos.distance(particles[b].pos);
        Self {
            a,
            b,
            rest_length,
            stiffness: 1.0,
        }
    }

    /// Constrain `a` and `b` to an explicit rest length.
    pub fn with_length(a: usize, b: usize, rest_length: f32) -> Self {
        Self {
            a,
            b,
            rest_length,
            stiffness: 1.0,
        }
    }

    /// Both endpoints are valid indices into `particles`.
    pub fn is_valid(&self, particle_count: usize) -> bool {
        self.a < particle_count && self.b < particle_count && self.a != self.b
    }

    /// One mass-weighted relaxation pass.
    ///
    /// Moves the endpoints toward (or away from) each other so their
    /// distance approaches the rest length, splitting the correction by
    /// inverse mass. Degenerate (zero-length) and fully-locked constraints
    /// are skipped.
    pub fn solve(&self, particles: &mut [Particle]) {
        let delta = particles[self.b].pos - particles[self.a].pos;
        let current_length = delta.length();

        if current_length == 0.0 {
            return;
        }

        let difference = (current_length - self.rest_length) / current_length;
        let inv_mass_a = if particles[self.a].locked { 0.0 } else { 1.0 / particles[self.a].mass };
        let inv_mass_b = if particles[self.b].locked { 0.0 } else { 1.0 / particles[self.b].mass };
        let total_inv_mass = inv_mass_a + inv_mass_b;

        if total_inv_mass == 0.0 {
            return;
        }

        let correction = delta * (self.stiffness * difference * 0.5);

        if !particles[self.a].locked {
            particles[self.a].pos += correction * (inv_mass_a / total_inv_mass);
        }
        if !particles[self.b].locked {
            particles[self.b].pos -= correction * (inv_mass_b / total_inv_mass);
        }
    }

    /// Relative strain: |L - rest| / rest.
    pub fn stress(&self, particles: &[Particle]) -> f32 {
        let current_length = particles[self.a].pos.distance(particles[self.b].pos);
        (current_length - self.rest_length).abs() / self.rest_length
    }
}
