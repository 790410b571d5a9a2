//! Engine facade.
//!
//! `MazeEngine` owns all live simulation state (particles, constraints,
//! curves), both solver cores, and the undo history, and exposes the
//! command surface the presentation layer drives: ticking, mode and pause
//! toggles, edit operations, and history hooks.
//!
//! History policy: single-shot topology commands (erase, sample
//! insert/remove, curve add/remove, clear, generate, import) snapshot
//! once when they complete. Incremental builders (`add_particle`,
//! `add_constraint`) do not snapshot; a stroke of them is one gesture,
//! and the caller invokes `save_state` when the gesture ends, exactly as
//! `end_drag` does for dragging.

use anyhow::{bail, ensure, Result};
use glam::Vec2;

use crate::config::{EngineConfig, EvolutionConfig};
use crate::export;
use crate::geometry::{Curve, Sample};
use crate::physics::{CurveEvolver, DistanceConstraint, GridSolver, Particle};
use crate::state::{force_vectors, FpsCounter, History, SimulationMetrics, Snapshot};

/// Which simulation core a tick advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Grid,
    Curves,
}

/// Interaction mode selected in the toolbar.
///
/// `Drag` doubles as curve selection when the curve engine is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Erase,
    Drag,
}

/// The simulation facade consumed by the presentation layer.
pub struct MazeEngine {
    pub config: EngineConfig,
    particles: Vec<Particle>,
    constraints: Vec<DistanceConstraint>,
    curves: Vec<Curve>,
    next_curve_id: u32,
    grid_solver: GridSolver,
    evolver: CurveEvolver,
    history: History,
    mode: Mode,
    active: EngineKind,
    paused: bool,
    show_forces: bool,
    dragged: Option<usize>,
    fps: FpsCounter,
    tick_count: u64,
}

impl MazeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_evolution(config, EvolutionConfig::default())
    }

    pub fn with_evolution(config: EngineConfig, evolution: EvolutionConfig) -> Self {
        let grid_solver = GridSolver::new(&config);
        let evolver = CurveEvolver::new(&config, evolution);
        let history = History::new(config.history_capacity);

        let mut engine = Self {
            grid_solver,
            evolver,
            history,
            particles: Vec::new(),
            constraints: Vec::new(),
            curves: Vec::new(),
            next_curve_id: 0,
            mode: Mode::Draw,
            active: EngineKind::Grid,
            paused: false,
            show_forces: false,
            dragged: None,
            fps: FpsCounter::new(),
            tick_count: 0,
            config,
        };
        engine.save_state();
        engine
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advance the active engine by one fixed timestep. Does nothing while
    /// paused; edits and queries stay available either way.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }

        match self.active {
            EngineKind::Grid => {
                self.grid_solver
                    .step(&mut self.particles, &mut self.constraints, &self.config);
            }
            EngineKind::Curves => {
                self.audit_curves();
                self.evolver.evolve(&mut self.curves, self.config.dt);
            }
        }
        self.tick_count += 1;
    }

    /// Reconcile any curve whose sample back-references went stale.
    fn audit_curves(&mut self) {
        for curve in &mut self.curves {
            if !curve.indices_consistent() {
                log::warn!("curve {} had stale sample indices, reconciling", curve.id);
                curve.reconcile_indices();
            }
        }
    }

    /// Record a wall-clock frame duration for the FPS estimate.
    pub fn record_frame(&mut self, frame_seconds: f32) {
        self.fps.record_frame(frame_seconds);
    }

    // ------------------------------------------------------------------
    // Toggles and modes
    // ------------------------------------------------------------------

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_active_engine(&mut self, kind: EngineKind) {
        self.active = kind;
    }

    pub fn active_engine(&self) -> EngineKind {
        self.active
    }

    pub fn toggle_forces(&mut self) {
        self.show_forces = !self.show_forces;
    }

    pub fn shows_forces(&self) -> bool {
        self.show_forces
    }

    /// Keyboard command dispatch: Space pause, Z undo, Y redo, F forces,
    /// C clear, G generate. Unknown keys are ignored.
    pub fn key_command(&mut self, key: char) {
        match key.to_ascii_lowercase() {
            ' ' => self.toggle_paused(),
            'z' => self.undo(),
            'y' => self.redo(),
            'f' => self.toggle_forces(),
            'c' => self.clear(),
            'g' => self.generate(),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Grid edits
    // ------------------------------------------------------------------

    /// Append a particle; part of a draw stroke, so no snapshot is taken.
    pub fn add_particle(&mut self, pos: Vec2, locked: bool) -> usize {
        let mut particle = Particle::new(pos);
        particle.locked = locked;
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Append a particle with an explicit mass.
    pub fn add_particle_with_mass(&mut self, pos: Vec2, locked: bool, mass: f32) -> Result<usize> {
        ensure!(mass > 0.0, "particle mass must be positive, got {}", mass);
        let index = self.add_particle(pos, locked);
        self.particles[index].mass = mass;
        Ok(index)
    }

    /// Connect two particles at their current separation.
    pub fn add_constraint(&mut self, a: usize, b: usize) -> Result<usize> {
        self.validate_endpoints(a, b)?;
        self.constraints
            .push(DistanceConstraint::from_current(a, b, &self.particles));
        Ok(self.constraints.len() - 1)
    }

    /// Connect two particles with an explicit rest length.
    pub fn add_constraint_with_length(&mut self, a: usize, b: usize, rest_length: f32) -> Result<usize> {
        self.validate_endpoints(a, b)?;
        ensure!(
            rest_length >= 0.0,
            "rest length must be non-negative, got {}",
            rest_length
        );
        self.constraints
            .push(DistanceConstraint::with_length(a, b, rest_length));
        Ok(self.constraints.len() - 1)
    }

    fn validate_endpoints(&self, a: usize, b: usize) -> Result<()> {
        if a >= self.particles.len() || b >= self.particles.len() {
            bail!(
                "constraint endpoints ({}, {}) out of range for {} particles",
                a,
                b,
                self.particles.len()
            );
        }
        if a == b {
            bail!("constraint endpoints must differ, got {} twice", a);
        }
        Ok(())
    }

    /// Erase the particle nearest to `point` within `tolerance`, cascading
    /// to its constraints. Snapshots on success.
    pub fn remove_at(&mut self, point: Vec2, tolerance: f32) -> Option<usize> {
        let index = self.nearest_particle(point, tolerance)?;

        self.particles.remove(index);
        self.constraints.retain(|c| c.a != index && c.b != index);
        for constraint in &mut self.constraints {
            if constraint.a > index {
                constraint.a -= 1;
            }
            if constraint.b > index {
                constraint.b -= 1;
            }
        }
        match self.dragged {
            Some(d) if d == index => self.dragged = None,
            Some(d) if d > index => self.dragged = Some(d - 1),
            _ => {}
        }

        self.save_state();
        Some(index)
    }

    fn nearest_particle(&self, point: Vec2, tolerance: f32) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, particle) in self.particles.iter().enumerate() {
            let distance = point.distance(particle.pos);
            if distance < tolerance && best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| i)
    }

    // ------------------------------------------------------------------
    // Drag gesture
    // ------------------------------------------------------------------

    /// Pick the particle nearest to `point` within `tolerance` and start
    /// dragging it.
    pub fn begin_drag(&mut self, point: Vec2, tolerance: f32) -> Option<usize> {
        self.dragged = self.nearest_particle(point, tolerance);
        self.dragged
    }

    /// Move the dragged particle, killing its velocity so it does not
    /// slingshot on release.
    pub fn drag_to(&mut self, point: Vec2) {
        if let Some(index) = self.dragged {
            self.particles[index].set_position(point);
        }
    }

    /// Finish the gesture; snapshots once if anything was dragged.
    pub fn end_drag(&mut self) {
        if self.dragged.take().is_some() {
            self.save_state();
        }
    }

    // ------------------------------------------------------------------
    // Curve edits
    // ------------------------------------------------------------------

    /// Adopt a curve, assigning it a fresh id. Snapshots.
    pub fn add_curve(&mut self, mut curve: Curve) -> u32 {
        let id = self.next_curve_id;
        self.next_curve_id += 1;
        curve.id = id;
        curve.reconcile_indices();
        self.curves.push(curve);
        self.save_state();
        id
    }

    /// Remove a curve by id. Snapshots on success.
    pub fn remove_curve(&mut self, id: u32) -> bool {
        let before = self.curves.len();
        self.curves.retain(|c| c.id != id);
        let removed = self.curves.len() != before;
        if removed {
            self.save_state();
        }
        removed
    }

    /// Insert a sample at the closest point of the nearest segment within
    /// `tolerance`. Snapshots on success and returns `(curve id, index)`.
    pub fn insert_sample_on_nearest_segment(&mut self, point: Vec2, tolerance: f32) -> Option<(u32, usize)> {
        let mut best: Option<(usize, usize, f32)> = None;
        for (ci, curve) in self.curves.iter().enumerate() {
            if let Some((segment, distance)) = curve.nearest_segment(point) {
                if distance < tolerance && best.map_or(true, |(_, _, d)| distance < d) {
                    best = Some((ci, segment, distance));
                }
            }
        }

        let (ci, segment, _) = best?;
        let curve = &mut self.curves[ci];
        let (a, b) = curve.segment(segment);
        let position = crate::geometry::closest_point_on_segment(point, a, b);
        let n = curve.samples.len();
        let delta = (curve.samples[segment].delta + curve.samples[(segment + 1) % n].delta) * 0.5;

        let insert_at = segment + 1;
        curve.insert_sample(insert_at, Sample::with_delta(position, delta));
        let id = curve.id;

        self.save_state();
        Some((id, insert_at))
    }

    /// Remove the sample nearest to `point` within `tolerance`. Locked
    /// samples are not eligible. Snapshots on success.
    pub fn remove_nearest_sample(&mut self, point: Vec2, tolerance: f32) -> Option<(u32, usize)> {
        let mut best: Option<(usize, usize, f32)> = None;
        for (ci, curve) in self.curves.iter().enumerate() {
            if let Some((index, distance)) = curve.nearest_sample(point) {
                if distance < tolerance
                    && !curve.samples[index].locked
                    && best.map_or(true, |(_, _, d)| distance < d)
                {
                    best = Some((ci, index, distance));
                }
            }
        }

        let (ci, index, _) = best?;
        let id = self.curves[ci].id;
        self.curves[ci].remove_sample(index);

        self.save_state();
        Some((id, index))
    }

    // ------------------------------------------------------------------
    // Bulk commands
    // ------------------------------------------------------------------

    /// Drop all particles, constraints, and curves. Snapshots.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.constraints.clear();
        self.curves.clear();
        self.dragged = None;
        self.save_state();
    }

    /// Rebuild the default content for the active engine: a bordered
    /// particle grid, or a seed circle for the curve engine. Snapshots.
    pub fn generate(&mut self) {
        match self.active {
            EngineKind::Grid => self.generate_grid_maze(),
            EngineKind::Curves => self.generate_seed_circle(),
        }
    }

    fn generate_grid_maze(&mut self) {
        self.particles.clear();
        self.constraints.clear();
        self.dragged = None;

        let spacing = 20.0;
        let origin = Vec2::new(60.0, 80.0);
        let cols = ((self.config.width - 2.0 * origin.x) / spacing) as usize;
        let rows = ((self.config.bottom() - origin.y) / spacing) as usize;

        for row in 0..rows {
            for col in 0..cols {
                let pos = origin + Vec2::new(col as f32 * spacing, row as f32 * spacing);
                let border = row == 0 || row == rows - 1 || col == 0 || col == cols - 1;
                self.add_particle(pos, border);
            }
        }

        for row in 0..rows {
            for col in 0..cols {
                let index = row * cols + col;
                if col + 1 < cols {
                    let _ = self.add_constraint(index, index + 1);
                }
                if row + 1 < rows {
                    let _ = self.add_constraint(index, index + cols);
                }
            }
        }

        log::info!(
            "generated grid maze: {} particles, {} constraints",
            self.particles.len(),
            self.constraints.len()
        );
        self.save_state();
    }

    fn generate_seed_circle(&mut self) {
        self.curves.clear();
        let center = Vec2::new(self.config.width * 0.5, self.config.height * 0.5);
        let id = self.next_curve_id;
        self.next_curve_id += 1;
        let circle = Curve::circle(id, center, 100.0, 40);
        self.curves.push(circle);

        log::info!("seeded circle curve with 40 samples");
        self.save_state();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the grid state to a maze JSON string.
    pub fn export_maze(&self) -> Result<String> {
        export::export_maze_json(&self.particles, &self.constraints)
    }

    /// Replace the grid state from a maze JSON string. On any validation
    /// error the current state is left untouched. Snapshots on success.
    pub fn import_maze(&mut self, json: &str) -> Result<()> {
        let (particles, constraints) = export::import_maze_json(json)?;
        self.particles = particles;
        self.constraints = constraints;
        self.dragged = None;
        self.save_state();
        Ok(())
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Snapshot the full live state.
    pub fn save_state(&mut self) {
        self.history
            .save(Snapshot::capture(&self.particles, &self.constraints, &self.curves));
    }

    /// Restore the previous snapshot; silent no-op at the start of history.
    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            let (particles, constraints, curves) = snapshot.restore();
            self.apply_restored(particles, constraints, curves);
        }
    }

    /// Restore the next snapshot; silent no-op at the end of history.
    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            let (particles, constraints, curves) = snapshot.restore();
            self.apply_restored(particles, constraints, curves);
        }
    }

    fn apply_restored(
        &mut self,
        particles: Vec<Particle>,
        constraints: Vec<DistanceConstraint>,
        curves: Vec<Curve>,
    ) {
        self.particles = particles;
        self.constraints = constraints;
        self.curves = curves;
        self.dragged = None;
        self.next_curve_id = self
            .curves
            .iter()
            .map(|c| c.id + 1)
            .max()
            .unwrap_or(self.next_curve_id);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Mutable access to a curve's parameters by id.
    pub fn curve_mut(&mut self, id: u32) -> Option<&mut Curve> {
        self.curves.iter_mut().find(|c| c.id == id)
    }

    /// The evolver, for painting parameter fields.
    pub fn evolver_mut(&mut self) -> &mut CurveEvolver {
        &mut self.evolver
    }

    pub fn metrics(&self) -> SimulationMetrics {
        SimulationMetrics {
            avg_fps: self.fps.average(),
            particle_count: self.particles.len(),
            constraint_count: self.constraints.len(),
            sample_count: self.curves.iter().map(|c| c.samples.len()).sum(),
            curve_count: self.curves.len(),
            tick_count: self.tick_count,
        }
    }

    /// Debug overlay vectors, empty while the overlay is toggled off.
    pub fn force_vectors(&self) -> Vec<(Vec2, Vec2)> {
        if !self.show_forces {
            return Vec::new();
        }
        force_vectors(&self.particles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MazeEngine {
        MazeEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_paused_engine_does_not_integrate() {
        let mut e = engine();
        let index = e.add_particle(Vec2::new(100.0, 100.0), false);
        e.set_paused(true);
        e.tick();
        assert_eq!(e.particles()[index].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_add_constraint_validates_indices() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);
        assert!(e.add_constraint(0, 5).is_err());
        assert!(e.add_constraint(0, 0).is_err());
        assert!(e.constraints().is_empty(), "no partial application");
    }

    #[test]
    fn test_remove_at_cascades_and_reindexes() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);
        e.add_particle(Vec2::new(120.0, 100.0), false);
        e.add_particle(Vec2::new(140.0, 100.0), false);
        e.add_constraint(0, 1).unwrap();
        e.add_constraint(1, 2).unwrap();

        let removed = e.remove_at(Vec2::new(121.0, 100.0), 5.0);
        assert_eq!(removed, Some(1));
        assert!(e.constraints().is_empty(), "both constraints referenced particle 1");
        assert_eq!(e.particles().len(), 2);

        // Constraints referencing shifted indices stay coherent
        e.add_constraint(0, 1).unwrap();
        assert!((e.particles()[1].pos.x - 140.0).abs() < 1e-6);
    }

    #[test]
    fn test_drag_gesture_saves_once_on_release() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);
        e.save_state();

        let picked = e.begin_drag(Vec2::new(102.0, 100.0), 20.0);
        assert_eq!(picked, Some(0));
        e.drag_to(Vec2::new(200.0, 200.0));
        e.drag_to(Vec2::new(300.0, 300.0));
        e.end_drag();

        assert_eq!(e.particles()[0].pos, Vec2::new(300.0, 300.0));
        assert_eq!(e.particles()[0].velocity(), Vec2::ZERO);

        // One undo steps over the whole gesture
        e.undo();
        assert_eq!(e.particles()[0].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);
        e.add_particle(Vec2::new(130.0, 100.0), true);
        e.add_constraint(0, 1).unwrap();
        e.save_state();

        e.clear();
        assert!(e.particles().is_empty());

        e.undo();
        assert_eq!(e.particles().len(), 2);
        assert_eq!(e.constraints().len(), 1);
        assert!(e.particles()[1].locked);

        e.redo();
        assert!(e.particles().is_empty());
    }

    #[test]
    fn test_generate_grid_maze_locks_border() {
        let mut e = engine();
        e.generate();
        assert!(!e.particles().is_empty());
        assert!(!e.constraints().is_empty());
        assert!(e.particles()[0].locked, "first particle is a border anchor");
    }

    #[test]
    fn test_generate_circle_for_curve_engine() {
        let mut e = engine();
        e.set_active_engine(EngineKind::Curves);
        e.generate();
        assert_eq!(e.curves().len(), 1);
        assert_eq!(e.curves()[0].samples.len(), 40);
        assert!(e.curves()[0].closed);
    }

    #[test]
    fn test_insert_and_remove_sample_via_facade() {
        let mut e = engine();
        e.set_active_engine(EngineKind::Curves);
        let id = e.add_curve(Curve::line(0, Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0), 3));

        let inserted = e.insert_sample_on_nearest_segment(Vec2::new(125.0, 104.0), 10.0);
        assert_eq!(inserted, Some((id, 1)));
        assert_eq!(e.curves()[0].samples.len(), 4);
        assert!(e.curves()[0].indices_consistent());

        let removed = e.remove_nearest_sample(Vec2::new(125.0, 100.0), 10.0);
        assert_eq!(removed.map(|(c, _)| c), Some(id));
        assert_eq!(e.curves()[0].samples.len(), 3);
        assert!(e.curves()[0].indices_consistent());
    }

    #[test]
    fn test_import_failure_leaves_state_untouched() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);

        let bad = r#"{"particles": [{"x": 0, "y": 0, "locked": false, "mass": 0.0}], "constraints": []}"#;
        assert!(e.import_maze(bad).is_err());
        assert_eq!(e.particles().len(), 1, "failed import must not clobber state");
    }

    #[test]
    fn test_mode_switching() {
        let mut e = engine();
        assert_eq!(e.mode(), Mode::Draw);
        e.set_mode(Mode::Erase);
        assert_eq!(e.mode(), Mode::Erase);
        e.set_mode(Mode::Drag);
        assert_eq!(e.mode(), Mode::Drag);
    }

    #[test]
    fn test_key_commands() {
        let mut e = engine();
        assert!(!e.is_paused());
        e.key_command(' ');
        assert!(e.is_paused());
        e.key_command('f');
        assert!(e.shows_forces());
        e.key_command('q'); // unknown, ignored
        assert!(e.is_paused());
    }

    #[test]
    fn test_force_vectors_gated_by_toggle() {
        let mut e = engine();
        e.add_particle(Vec2::new(100.0, 100.0), false);
        assert!(e.force_vectors().is_empty());
        e.toggle_forces();
        assert_eq!(e.force_vectors().len(), 1);
    }
}
