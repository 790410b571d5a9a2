//! Undo/redo history.
//!
//! A bounded deque of immutable snapshots with a cursor. Saving truncates
//! any forward history, appends, and evicts the oldest snapshot at
//! capacity. Snapshots are deep copies: particles and curves by value,
//! constraints as endpoint indices plus scalars, so no snapshot ever
//! aliases live state.

use std::collections::VecDeque;

use crate::geometry::Curve;
use crate::physics::{DistanceConstraint, Particle};

/// A deep copy of the full simulation state at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub particles: Vec<Particle>,
    pub constraints: Vec<DistanceConstraint>,
    pub curves: Vec<Curve>,
}

impl Snapshot {
    /// Capture live state. Constraints with endpoints outside the particle
    /// list are not recorded.
    pub fn capture(
        particles: &[Particle],
        constraints: &[DistanceConstraint],
        curves: &[Curve],
    ) -> Self {
        Self {
            particles: particles.to_vec(),
            constraints: constraints
                .iter()
                .filter(|c| c.is_valid(particles.len()))
                .cloned()
                .collect(),
            curves: curves.to_vec(),
        }
    }

    /// Rebuild live state from the snapshot, re-linking constraints
    /// through their stored endpoint indices.
    pub fn restore(&self) -> (Vec<Particle>, Vec<DistanceConstraint>, Vec<Curve>) {
        (
            self.particles.clone(),
            self.constraints.clone(),
            self.curves.clone(),
        )
    }
}

/// Bounded snapshot deque with an undo/redo cursor.
#[derive(Debug)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
}

impl History {
    /// Capacity is clamped to at least one slot; a zero-capacity history
    /// could never hold the snapshot it just saved.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Record a snapshot, dropping any redo tail and evicting the oldest
    /// entry when at capacity.
    pub fn save(&mut self, snapshot: Snapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step the cursor back and return the snapshot there. A no-op at the
    /// beginning of history.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step the cursor forward and return the snapshot there. A no-op at
    /// the end of history.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn snapshot_with_x(x: f32) -> Snapshot {
        Snapshot::capture(&[Particle::new(Vec2::new(x, 0.0))], &[], &[])
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::new(50);
        history.save(snapshot_with_x(1.0));
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut history = History::new(50);
        history.save(snapshot_with_x(1.0));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_walks_cursor() {
        let mut history = History::new(50);
        history.save(snapshot_with_x(1.0));
        history.save(snapshot_with_x(2.0));
        history.save(snapshot_with_x(3.0));

        let back = history.undo().unwrap();
        assert!((back.particles[0].pos.x - 2.0).abs() < 1e-6);

        let forward = history.redo().unwrap();
        assert!((forward.particles[0].pos.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_save_truncates_redo_tail() {
        let mut history = History::new(50);
        history.save(snapshot_with_x(1.0));
        history.save(snapshot_with_x(2.0));
        history.undo();
        history.save(snapshot_with_x(9.0));

        assert_eq!(history.len(), 2);
        assert!(history.redo().is_none(), "redo tail was discarded");
        let back = history.undo().unwrap();
        assert!((back.particles[0].pos.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.save(snapshot_with_x(i as f32));
        }
        assert_eq!(history.len(), 3);

        // Surviving snapshots are x = 2, 3, 4 with the cursor at the end
        let x2 = history.undo().unwrap().particles[0].pos.x;
        assert!((x2 - 3.0).abs() < 1e-6);
        let x1 = history.undo().unwrap().particles[0].pos.x;
        assert!((x1 - 2.0).abs() < 1e-6);
        assert!(history.undo().is_none(), "oldest snapshots were evicted");
    }

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        // A zero capacity from a hand-edited config file must not panic
        let mut history = History::new(0);
        history.save(snapshot_with_x(1.0));
        history.save(snapshot_with_x(2.0));

        assert_eq!(history.len(), 1, "clamped capacity keeps one snapshot");
        assert_eq!(history.cursor(), 0);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_snapshot_skips_invalid_constraints() {
        let particles = vec![Particle::new(Vec2::ZERO), Particle::new(Vec2::new(10.0, 0.0))];
        let constraints = vec![
            DistanceConstraint::with_length(0, 1, 10.0),
            DistanceConstraint::with_length(0, 9, 10.0),
        ];
        let snap = Snapshot::capture(&particles, &constraints, &[]);
        assert_eq!(snap.constraints.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent_of_live_state() {
        let mut particles = vec![Particle::new(Vec2::ZERO)];
        let snap = Snapshot::capture(&particles, &[], &[]);
        particles[0].pos = Vec2::new(99.0, 99.0);

        let (restored, _, _) = snap.restore();
        assert_eq!(restored[0].pos, Vec2::ZERO);
    }
}
