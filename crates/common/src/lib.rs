//! Shared types for the gridview engine: grid configuration, cell coordinates
//! and world-space view bounds.
//!
//! # Invariants
//! - A `GridConfig` that passed validation has positive width and height.
//! - `ViewBounds` handed out by the camera always have positive area.

mod types;

pub use types::{CellCoord, GridConfig, GridError, ViewBounds};
