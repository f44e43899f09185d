use glam::Vec2;
use gridview_common::ViewBounds;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Culling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullSettings {
    /// World-space margin added on every side of the view so quads at the
    /// edge do not pop in late. Must cover at least one cell.
    pub margin: f64,
}

impl Default for CullSettings {
    fn default() -> Self {
        Self { margin: 2.0 }
    }
}

/// Result of a [`VisibilityCuller::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullOutcome {
    /// Bounds equal the last pass; nothing was scanned.
    BoundsUnchanged,
    /// Bounds moved but the visible subset is identical to the uploaded one.
    SubsetUnchanged,
    /// The visible subset changed and must be re-uploaded.
    Upload,
}

impl CullOutcome {
    pub fn needs_upload(&self) -> bool {
        matches!(self, CullOutcome::Upload)
    }
}

/// Counters for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct CullStats {
    pub passes: u64,
    pub skipped_passes: u64,
    pub uploads: u64,
    pub last_visible: usize,
    pub last_pass_time: Duration,
}

/// Keeps the subset of highlights inside the (margin-expanded) view.
///
/// The scan runs only when the bounds differ by value from the previous pass,
/// and an upload is requested only when the resulting subset differs from the
/// one last handed out.
#[derive(Debug, Clone)]
pub struct VisibilityCuller {
    margin: f64,
    last_bounds: Option<ViewBounds>,
    visible: Vec<Vec2>,
    scratch: Vec<Vec2>,
    stats: CullStats,
}

impl VisibilityCuller {
    pub fn new(settings: CullSettings) -> Self {
        Self {
            margin: settings.margin,
            last_bounds: None,
            visible: Vec::new(),
            scratch: Vec::new(),
            stats: CullStats::default(),
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Recompute the visible subset of `all` for `bounds`.
    pub fn refresh(&mut self, all: &[Vec2], bounds: ViewBounds) -> CullOutcome {
        if self.last_bounds == Some(bounds) {
            self.stats.skipped_passes += 1;
            return CullOutcome::BoundsUnchanged;
        }

        let _span = tracing::info_span!("visibility_cull", total = all.len()).entered();
        let start = Instant::now();
        self.last_bounds = Some(bounds);

        let window = bounds.expand(self.margin);
        self.scratch.clear();
        self.scratch
            .extend(all.iter().copied().filter(|p| window.contains(*p)));

        // Count first; the element-wise comparison only runs on equal sizes.
        let changed =
            self.scratch.len() != self.visible.len() || self.scratch[..] != self.visible[..];

        self.stats.passes += 1;
        self.stats.last_visible = self.scratch.len();
        self.stats.last_pass_time = start.elapsed();

        if !changed {
            tracing::trace!(visible = self.visible.len(), "visible subset unchanged");
            return CullOutcome::SubsetUnchanged;
        }

        std::mem::swap(&mut self.visible, &mut self.scratch);
        self.stats.uploads += 1;
        tracing::debug!(
            visible = self.visible.len(),
            total = all.len(),
            "visible subset changed"
        );
        CullOutcome::Upload
    }

    /// Forget the last bounds so the next refresh always rescans. Called when
    /// the full highlight set is replaced.
    pub fn invalidate(&mut self) {
        self.last_bounds = None;
    }

    /// The subset produced by the most recent upload-worthy pass.
    pub fn visible(&self) -> &[Vec2] {
        &self.visible
    }

    pub fn last_bounds(&self) -> Option<ViewBounds> {
        self.last_bounds
    }

    pub fn stats(&self) -> &CullStats {
        &self.stats
    }
}

impl Default for VisibilityCuller {
    fn default() -> Self {
        Self::new(CullSettings::default())
    }
}
