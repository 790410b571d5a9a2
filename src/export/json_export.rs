//! Maze JSON save/load.
//!
//! The persisted document stores particles as `{x, y, locked, mass?}` and
//! constraints as `{a, b, rest_length, stiffness?}` with endpoint indices
//! into the particle array. Solver state is not persisted: on load every
//! particle starts at rest (`prev == pos`).
//!
//! Loading is strict about values but lenient about references: a
//! non-positive mass fails the whole import, while a constraint pointing
//! at a missing particle is dropped with a warning.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::{DistanceConstraint, Particle};
use crate::state::SimulationMetrics;

fn default_unit() -> f32 {
    1.0
}

/// Persisted particle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub x: f32,
    pub y: f32,
    pub locked: bool,
    #[serde(default = "default_unit")]
    pub mass: f32,
}

/// Persisted constraint record; `a` and `b` index into `particles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
    #[serde(default = "default_unit")]
    pub stiffness: f32,
}

/// The maze document root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MazeDocument {
    pub particles: Vec<ParticleRecord>,
    pub constraints: Vec<ConstraintRecord>,
}

impl MazeDocument {
    /// Capture live grid state into a document.
    pub fn from_state(particles: &[Particle], constraints: &[DistanceConstraint]) -> Self {
        Self {
            particles: particles
                .iter()
                .map(|p| ParticleRecord {
                    x: p.pos.x,
                    y: p.pos.y,
                    locked: p.locked,
                    mass: p.mass,
                })
                .collect(),
            constraints: constraints
                .iter()
                .filter(|c| c.is_valid(particles.len()))
                .map(|c| ConstraintRecord {
                    a: c.a,
                    b: c.b,
                    rest_length: c.rest_length,
                    stiffness: c.stiffness,
                })
                .collect(),
        }
    }

    /// Validate the document and build live state from it.
    ///
    /// Fails without side effects on invalid values (non-positive mass,
    /// negative rest length, out-of-range stiffness). Constraints with
    /// out-of-range endpoint indices are dropped with a warning rather
    /// than failing the import.
    pub fn into_state(self) -> Result<(Vec<Particle>, Vec<DistanceConstraint>)> {
        for (i, record) in self.particles.iter().enumerate() {
            if record.mass <= 0.0 {
                bail!("particle {} has non-positive mass {}", i, record.mass);
            }
            if !record.x.is_finite() || !record.y.is_finite() {
                bail!("particle {} has a non-finite position", i);
            }
        }
        for (i, record) in self.constraints.iter().enumerate() {
            if record.rest_length < 0.0 {
                bail!("constraint {} has negative rest length {}", i, record.rest_length);
            }
            if record.stiffness <= 0.0 || record.stiffness > 1.0 {
                bail!("constraint {} has stiffness {} outside (0, 1]", i, record.stiffness);
            }
        }

        let particles: Vec<Particle> = self
            .particles
            .iter()
            .map(|record| {
                let mut p = Particle::new(Vec2::new(record.x, record.y));
                p.locked = record.locked;
                p.mass = record.mass;
                p
            })
            .collect();

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for record in &self.constraints {
            if record.a >= particles.len() || record.b >= particles.len() || record.a == record.b {
                log::warn!(
                    "dropping constraint ({}, {}): index out of range for {} particles",
                    record.a,
                    record.b,
                    particles.len()
                );
                continue;
            }
            let mut constraint = DistanceConstraint::with_length(record.a, record.b, record.rest_length);
            constraint.stiffness = record.stiffness;
            constraints.push(constraint);
        }

        Ok((particles, constraints))
    }
}

/// Serialize grid state to a JSON string.
pub fn export_maze_json(particles: &[Particle], constraints: &[DistanceConstraint]) -> Result<String> {
    let document = MazeDocument::from_state(particles, constraints);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse a JSON string into grid state.
pub fn import_maze_json(json: &str) -> Result<(Vec<Particle>, Vec<DistanceConstraint>)> {
    let document: MazeDocument = serde_json::from_str(json).context("malformed maze document")?;
    document.into_state()
}

/// Write grid state to a file.
pub fn save_maze<P: AsRef<Path>>(
    path: P,
    particles: &[Particle],
    constraints: &[DistanceConstraint],
) -> Result<()> {
    let json = export_maze_json(particles, constraints)?;
    std::fs::write(path.as_ref(), json)
        .with_context(|| format!("writing maze to {:?}", path.as_ref()))?;
    log::info!("Maze saved: {}", path.as_ref().display());
    Ok(())
}

/// Read grid state from a file.
pub fn load_maze<P: AsRef<Path>>(path: P) -> Result<(Vec<Particle>, Vec<DistanceConstraint>)> {
    let json = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("reading maze from {:?}", path.as_ref()))?;
    import_maze_json(&json)
}

/// Metrics export wrapper with a timestamp and format version.
#[derive(Debug, Clone, Serialize)]
struct MetricsExport<'a> {
    exported_at: String,
    version: &'static str,
    metrics: &'a SimulationMetrics,
}

/// Export metrics to `exports/metrics_YYYYMMDD_HHMMSS.json`.
///
/// Returns the path to the written file.
pub fn export_metrics_json(metrics: &SimulationMetrics) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    std::fs::create_dir_all(&dir)?;

    let timestamp = Local::now();
    let filename = format!("metrics_{}.json", timestamp.format("%Y%m%d_%H%M%S"));
    let path = dir.join(&filename);

    let export = MetricsExport {
        exported_at: timestamp.to_rfc3339(),
        version: "1.0.0",
        metrics,
    };

    let file = std::fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, &export)?;

    log::info!("Metrics exported: {}", path.display());
    Ok(path)
}
