//! wgpu render backend for the grid viewer.
//!
//! Draws grid lines (LOD-faded) and instanced highlight quads. Shader compile
//! and pipeline link failures are fatal and reported as `RenderInitError`.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - The instance buffer object persists; only its contents are rewritten.
//! - Grid lines are drawn before highlights within one render pass.

mod gpu;
mod shaders;

pub use gpu::{RenderInitError, WgpuFrame, WgpuRenderer};
