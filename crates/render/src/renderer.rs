use crate::lod::GridLod;
use glam::{Mat4, Vec2, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Colors used by both passes and the clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: [f32; 3],
    pub grid: [f32; 3],
    pub highlight: [f32; 3],
    pub highlight_alpha: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: [13.0 / 255.0, 18.0 / 255.0, 28.0 / 255.0],
            grid: [0.32, 0.38, 0.48],
            highlight: [0.99, 0.52, 0.1],
            highlight_alpha: 0.9,
        }
    }
}

/// Grid line pass parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPass {
    pub zoom: f32,
    /// Opacity the LOD policy yields at `zoom`.
    pub alpha: f32,
    pub color: [f32; 3],
    pub lod: GridLod,
}

/// Instanced highlight pass parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightPass {
    pub instance_count: u32,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Everything a backend needs to draw one frame. Passes run in field order;
/// a `None` pass is skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub projection: Mat4,
    pub grid: Option<GridPass>,
    pub highlights: Option<HighlightPass>,
}

impl FramePlan {
    /// Build the plan for a frame: the grid pass is LOD-gated, the highlight
    /// pass is dropped when no instance is visible.
    pub fn new(
        projection: Mat4,
        zoom: f32,
        instance_count: usize,
        lod: &GridLod,
        palette: &Palette,
    ) -> Self {
        let grid = lod.grid_alpha(zoom).map(|alpha| GridPass {
            zoom,
            alpha,
            color: palette.grid,
            lod: *lod,
        });
        let highlights = (instance_count > 0).then(|| HighlightPass {
            instance_count: instance_count as u32,
            color: palette.highlight,
            alpha: palette.highlight_alpha,
        });
        Self {
            projection,
            grid,
            highlights,
        }
    }
}

/// Backend interface used by the scene.
///
/// Instance offsets are pushed only when the visible subset changes; `render`
/// draws with whatever was last uploaded.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Replace the GPU-resident instance offsets with `offsets`.
    fn upload_instances(&mut self, offsets: &[Vec2]);

    /// Draw one frame.
    fn render(&mut self, plan: &FramePlan) -> Self::Output;
}

/// Text renderer that records what it was asked to do.
///
/// Used by the CLI and by tests to observe uploads and passes without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    instances: Vec<Vec2>,
    uploads: u64,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets from the last upload.
    pub fn instances(&self) -> &[Vec2] {
        &self.instances
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn upload_instances(&mut self, offsets: &[Vec2]) {
        self.instances.clear();
        self.instances.extend_from_slice(offsets);
        self.uploads += 1;
    }

    fn render(&mut self, plan: &FramePlan) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(out, "=== Frame {} ===", self.frames);

        // Lower-left and upper-right NDC corners mapped back to world space.
        let inverse = plan.projection.inverse();
        let lo = inverse * Vec4::new(-1.0, -1.0, 0.0, 1.0);
        let hi = inverse * Vec4::new(1.0, 1.0, 0.0, 1.0);
        let _ = writeln!(
            out,
            "View: x=[{:.2}, {:.2}] y=[{:.2}, {:.2}]",
            lo.x, hi.x, lo.y, hi.y
        );

        match &plan.grid {
            Some(grid) => {
                let _ = writeln!(out, "Grid: zoom={:.3} alpha={:.3}", grid.zoom, grid.alpha);
            }
            None => out.push_str("Grid: skipped\n"),
        }
        match &plan.highlights {
            Some(pass) => {
                let _ = writeln!(out, "Highlights: {} instances", pass.instance_count);
            }
            None => out.push_str("Highlights: none\n"),
        }
        out
    }
}
