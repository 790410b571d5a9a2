//! Engine configuration.
//!
//! All knobs that the original prototype kept as globals (window size,
//! gravity, spatial cell size, solver iteration count) live in explicit
//! config structs passed at construction. Both structs can be loaded from
//! JSON files and fall back to defaults when the file is missing or broken.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the constraint-grid engine and the shared world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// World width in pixels
    pub width: f32,
    /// World height in pixels
    pub height: f32,
    /// Margin kept clear along the left, right and top edges
    pub edge_margin: f32,
    /// Extra margin at the bottom of the world (the original reserved this
    /// strip for a toolbar; the core keeps it as a plain clamp offset)
    pub bottom_margin: f32,
    /// Gravitational acceleration in pixels/s², applied along +y
    pub gravity: f32,
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Gauss-Seidel iterations per tick for constraints + contacts
    pub solver_iterations: usize,
    /// Minimum center distance between two particles before contact
    /// resolution pushes them apart
    pub contact_distance: f32,
    /// Spatial hash cell size in pixels
    pub cell_size: f32,
    /// Maximum number of undo snapshots retained
    pub history_capacity: usize,
    /// Seed for the curve evolver's RNG
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            edge_margin: 10.0,
            bottom_margin: 60.0,
            gravity: 980.0,
            dt: 1.0 / 60.0,
            solver_iterations: 6,
            contact_distance: 8.0,
            cell_size: 32.0,
            history_capacity: 50,
            rng_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file or return defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded engine config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse engine config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Engine config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Lowest y a particle may occupy after the boundary clamp.
    pub fn bottom(&self) -> f32 {
        self.height - self.bottom_margin
    }
}

/// Configuration for the curve-evolution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Standard deviation of the per-component Brownian Gaussian
    pub sigma: f32,
    /// Lennard-Jones sigma parameter in pixels
    pub sigma_lj: f32,
    /// Attraction-repulsion query radius multiplier: R1 = k1 * delta
    pub k1: f32,
    /// Symmetric clamp for the Lennard-Jones kernel value
    pub kernel_clamp: f32,
    /// Segment distances below this are treated as singular and skipped
    pub singularity_epsilon: f32,
    /// Anisotropy gradients shorter than this are ignored
    pub gradient_epsilon: f32,
    /// Resolution of the square parameter fields
    pub field_resolution: usize,
    /// Default value of the Brownian strength field
    pub default_brownian: f32,
    /// Default value of the fairing strength field
    pub default_fairing: f32,
    /// Default value of the attraction-repulsion strength field
    pub default_attraction: f32,
    /// Default value of the local scale field
    pub default_delta: f32,
    /// Default value of the anisotropy field
    pub default_anisotropy: f32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            sigma: 0.1,
            sigma_lj: 5.0,
            k1: 0.4,
            kernel_clamp: 10.0,
            singularity_epsilon: 1e-3,
            gradient_epsilon: 1e-3,
            field_resolution: 128,
            default_brownian: 0.1,
            default_fairing: 0.05,
            default_attraction: 2.0,
            default_delta: 1.0,
            default_anisotropy: 0.0,
        }
    }
}

impl EvolutionConfig {
    /// Load from a JSON file or return defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded evolution config from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse evolution config: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Evolution config file not found, using defaults");
                Self::default()
            }
        }
    }
}
