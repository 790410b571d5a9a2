//! Constraint-grid solver: Verlet integration, Gauss-Seidel constraint
//! relaxation, and pairwise contact resolution.
//!
//! Tick pipeline:
//! 1. audit constraints, dropping any that reference removed particles
//! 2. integrate all particles under gravity
//! 3. rebuild the spatial index from current positions
//! 4. K iterations of { solve every constraint, sweep contacts }
//! 5. clamp every particle to the interior rectangle
//!
//! Iteration follows insertion order everywhere, so a run is deterministic
//! for identical inputs.

use glam::Vec2;

use crate::config::EngineConfig;
use crate::spatial::SpatialIndex;

use super::constraint::DistanceConstraint;
use super::particle::Particle;

/// Position-based dynamics solver for the particle grid.
pub struct GridSolver {
    index: SpatialIndex<usize>,
    neighbor_scratch: Vec<(Vec2, usize)>,
}

impl GridSolver {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            index: SpatialIndex::new(config.cell_size),
            neighbor_scratch: Vec::new(),
        }
    }

    /// Advance the grid by one fixed timestep.
    pub fn step(
        &mut self,
        particles: &mut Vec<Particle>,
        constraints: &mut Vec<DistanceConstraint>,
        config: &EngineConfig,
    ) {
        self.audit(particles.len(), constraints);

        let dt = config.dt;
        let gravity = Vec2::new(0.0, config.gravity);
        for particle in particles.iter_mut() {
            particle.verlet(gravity, dt);
        }

        self.rebuild_index(particles);

        for _ in 0..config.solver_iterations {
            for constraint in constraints.iter() {
                constraint.solve(particles);
            }
            self.resolve_contacts(particles, config.contact_distance);
        }

        self.clamp_to_world(particles, config);
    }

    /// Drop constraints whose endpoints no longer exist.
    fn audit(&self, particle_count: usize, constraints: &mut Vec<DistanceConstraint>) {
        let before = constraints.len();
        constraints.retain(|c| c.is_valid(particle_count));
        let dropped = before - constraints.len();
        if dropped > 0 {
            log::warn!("dropped {} constraint(s) with dangling endpoints", dropped);
        }
    }

    fn rebuild_index(&mut self, particles: &[Particle]) {
        self.index.clear();
        for (i, particle) in particles.iter().enumerate() {
            self.index.insert(particle.pos, i);
        }
    }

    /// Push apart any pair closer than the contact distance.
    ///
    /// The correction is split half-and-half between two free particles;
    /// if one side is locked the free side absorbs the whole overlap.
    fn resolve_contacts(&mut self, particles: &mut [Particle], min_distance: f32) {
        for i in 0..particles.len() {
            let pos = particles[i].pos;
            // Scratch is swapped out to appease the borrow checker; the
            // query only reads the index.
            let mut neighbors = std::mem::take(&mut self.neighbor_scratch);
            self.index.query_neighbors(pos, &mut neighbors);

            for &(_, j) in &neighbors {
                if i == j {
                    continue;
                }

                let delta = particles[i].pos - particles[j].pos;
                let distance = delta.length();
                if distance <= 0.0 || distance >= min_distance {
                    continue;
                }

                let direction = delta / distance;
                let overlap = min_distance - distance;

                match (particles[i].locked, particles[j].locked) {
                    (false, false) => {
                        let push = direction * (overlap * 0.5);
                        particles[i].pos += push;
                        particles[j].pos -= push;
                    }
                    (false, true) => {
                        particles[i].pos += direction * overlap;
                    }
                    (true, false) => {
                        particles[j].pos -= direction * overlap;
                    }
                    (true, true) => {}
                }
            }

            self.neighbor_scratch = neighbors;
        }
    }

    fn clamp_to_world(&self, particles: &mut [Particle], config: &EngineConfig) {
        let min_x = config.edge_margin;
        let max_x = config.width - config.edge_margin;
        let min_y = config.edge_margin;
        let max_y = config.bottom();

        for particle in particles.iter_mut() {
            if particle.locked {
                continue;
            }
            particle.pos.x = particle.pos.x.clamp(min_x, max_x);
            particle.pos.y = particle.pos.y.clamp(min_y, max_y);
        }
    }

}
