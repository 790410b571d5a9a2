//! Maze document persistence.
//!
//! Saves and loads the grid engine's state as a small JSON document, plus
//! a timestamped metrics export.

mod json_export;

pub use json_export::{
    export_maze_json, export_metrics_json, import_maze_json, load_maze, save_maze, MazeDocument,
};
