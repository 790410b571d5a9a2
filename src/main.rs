//! Physics Maze - headless entry point
//!
//! Runs both simulation cores for a few seconds of simulated time and
//! exports the resulting maze and metrics. The interactive front-end
//! lives in a separate presentation crate; this binary exercises the
//! engine end to end.

use anyhow::Result;
use physics_maze::config::{EngineConfig, EvolutionConfig};
use physics_maze::engine::{EngineKind, MazeEngine};
use physics_maze::export;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Physics Maze starting...");

    let config = EngineConfig::load_or_default("data/engine.json");
    let evolution = EvolutionConfig::load_or_default("data/evolution.json");
    let mut engine = MazeEngine::with_evolution(config, evolution);

    // Settle the default grid maze under gravity
    engine.generate();
    log::info!(
        "grid: {} particles, {} constraints",
        engine.particles().len(),
        engine.constraints().len()
    );
    for _ in 0..600 {
        engine.tick();
        engine.record_frame(engine.config.dt);
    }

    std::fs::create_dir_all("exports")?;
    export::save_maze("exports/maze.json", engine.particles(), engine.constraints())?;
    let (reloaded, reloaded_constraints) = export::load_maze("exports/maze.json")?;
    log::info!(
        "round trip: {} particles, {} constraints",
        reloaded.len(),
        reloaded_constraints.len()
    );

    // Grow a labyrinth from a seed circle
    engine.set_active_engine(EngineKind::Curves);
    engine.generate();
    for _ in 0..600 {
        engine.tick();
        engine.record_frame(engine.config.dt);
    }

    let metrics = engine.metrics();
    log::info!(
        "after {} ticks: {} curves, {} samples, fps ~{:.1}",
        metrics.tick_count,
        metrics.curve_count,
        metrics.sample_count,
        metrics.avg_fps
    );
    export::export_metrics_json(&metrics)?;

    Ok(())
}
