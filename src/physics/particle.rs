//! Verlet mass points for the constraint-grid engine.
//!
//! A particle stores its current and previous position; velocity is the
//! difference between the two. This makes the position-based constraint
//! solver trivially stable: any direct positional correction implicitly
//! adjusts velocity as well.

use glam::Vec2;

/// A mass point integrated with position Verlet.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current position
    pub pos: Vec2,
    /// Position one step ago; `pos - prev` is the velocity
    pub prev: Vec2,
    /// Locked particles are immovable anchors
    pub locked: bool,
    /// Mass, strictly positive
    pub mass: f32,
}

impl Particle {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            prev: pos,
            locked: false,
            mass: 1.0,
        }
    }

    pub fn locked_at(pos: Vec2) -> Self {
        Self {
            locked: true,
            ..Self::new(pos)
        }
    }

    /// One position-Verlet step with acceleration `accel`.
    ///
    /// new pos = pos + (pos - prev) + accel * dt^2
    pub fn verlet(&mut self, accel: Vec2, dt: f32) {
        if self.locked {
            return;
        }
        let velocity = self.pos - self.prev;
        self.prev = self.pos;
        self.pos += velocity + accel * dt * dt;
    }

    /// Implicit velocity.
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev
    }

    /// Teleport, destroying any velocity.
    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
        self.prev = pos;
    }

    /// Apply a force impulse as a positional nudge of `F/m * dt^2`.
    pub fn apply_force(&mut self, force: Vec2, dt: f32) {
        if self.locked {
            return;
        }
        self.pos += force / self.mass * dt * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_particle_has_zero_velocity() {
        let p = Particle::new(Vec2::new(3.0, 4.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert!(!p.locked);
        assert!((p.mass - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_verlet_preserves_velocity_without_acceleration() {
        let mut p = Particle::new(Vec2::new(0.0, 0.0));
        p.prev = Vec2::new(-1.0, 0.0); // moving +x at 1 unit/step

        p.verlet(Vec2::ZERO, 1.0 / 60.0);
        assert!((p.pos.x - 1.0).abs() < 1e-6);
        assert!((p.velocity().x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_verlet_applies_acceleration() {
        let mut p = Particle::new(Vec2::ZERO);
        let dt = 1.0 / 60.0;
        p.verlet(Vec2::new(0.0, 980.0), dt);
        assert!((p.pos.y - 980.0 * dt * dt).abs() < 1e-6);
    }

    #[test]
    fn test_locked_particle_ignores_integration_and_forces() {
        let mut p = Particle::locked_at(Vec2::new(5.0, 5.0));
        p.verlet(Vec2::new(0.0, 980.0), 1.0 / 60.0);
        p.apply_force(Vec2::new(100.0, 0.0), 1.0 / 60.0);
        assert_eq!(p.pos, Vec2::new(5.0, 5.0));
        assert_eq!(p.prev, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_set_position_kills_velocity() {
        let mut p = Particle::new(Vec2::ZERO);
        p.prev = Vec2::new(-2.0, -2.0);
        p.set_position(Vec2::new(10.0, 10.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert_eq!(p.pos, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_apply_force_scales_with_inverse_mass() {
        let dt = 1.0;
        let mut light = Particle::new(Vec2::ZERO);
        let mut heavy = Particle::new(Vec2::ZERO);
        heavy.mass = 4.0;

        light.apply_force(Vec2::new(1.0, 0.0), dt);
        heavy.apply_force(Vec2::new(1.0, 0.0), dt);
        assert!((light.pos.x - 4.0 * heavy.pos.x).abs() < 1e-6);
    }
}
