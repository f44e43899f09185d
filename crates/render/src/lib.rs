//! Rendering adapter: renderer-agnostic frame plans.
//!
//! # Invariants
//! - Renderers never mutate scene state; they receive a `FramePlan` and the
//!   visible instance offsets.
//! - The grid pass always precedes the highlight pass.
//! - Static geometry is built once from the grid configuration.
//!
//! The `DebugTextRenderer` implements the same trait as the GPU backend so the
//! scene can be driven and inspected headless.

mod geometry;
mod lod;
mod renderer;

pub use geometry::{HIGHLIGHT_INSET, grid_line_vertices, grid_vertex_count, highlight_quad};
pub use lod::GridLod;
pub use renderer::{DebugTextRenderer, FramePlan, GridPass, HighlightPass, Palette, Renderer};

pub fn crate_info() -> &'static str {
    concat!("gridview-render v", env!("CARGO_PKG_VERSION"))
}
