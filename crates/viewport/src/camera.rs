use glam::{DMat4, DVec2, Mat4};
use gridview_common::{GridConfig, ViewBounds};
use serde::{Deserialize, Serialize};

/// Relative tolerance under which a zoom change counts as no change.
const ZOOM_EPSILON: f64 = 1e-6;

/// Zoom limits and wheel sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Per wheel-unit zoom factor; one 120-unit notch scales by `zoom_base^120`.
    pub zoom_base: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            min_zoom: 0.05,
            max_zoom: 64.0,
            zoom_base: 1.0015,
        }
    }
}

/// Orthographic 2D camera over a grid.
///
/// Math is done in `f64`; the projection is narrowed to `f32` for the GPU.
/// Zoom is always inside `[min_zoom, max_zoom]` and the aspect ratio is always
/// positive.
#[derive(Debug, Clone)]
pub struct Camera {
    content: DVec2,
    settings: CameraSettings,
    zoom: f64,
    center: DVec2,
    viewport: DVec2,
    aspect: f64,
}

impl Camera {
    pub fn new(grid: &GridConfig, settings: CameraSettings) -> Self {
        Self {
            content: grid.extent(),
            settings,
            zoom: 1.0_f64.clamp(settings.min_zoom, settings.max_zoom),
            center: grid.center(),
            viewport: DVec2::ONE,
            aspect: 1.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    /// Viewport size in pixels, each dimension floored at 1.
    pub fn viewport_size(&self) -> DVec2 {
        self.viewport
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Record a new viewport size. A zero-sized dimension falls back to an
    /// aspect of 1.0.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = if width > 0 && height > 0 {
            width as f64 / height as f64
        } else {
            1.0
        };
        self.viewport = DVec2::new(width.max(1) as f64, height.max(1) as f64);
    }

    /// Place the camera directly. Zoom is clamped.
    pub fn look_at(&mut self, center: DVec2, zoom: f64) {
        self.center = center;
        self.zoom = self.clamp_zoom(zoom);
    }

    /// Back to zoom 1 centered on the grid.
    pub fn reset(&mut self) {
        self.look_at(self.content * 0.5, 1.0);
    }

    /// Zoom by `zoom_base^wheel_delta` keeping the world point under
    /// `screen_point` fixed. Returns `false` when the clamped zoom is
    /// indistinguishable from the current one.
    pub fn zoom_at(&mut self, screen_point: DVec2, wheel_delta: f64) -> bool {
        let factor = self.settings.zoom_base.powf(wheel_delta);
        if factor.is_nan() {
            return false;
        }
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() <= ZOOM_EPSILON * new_zoom.abs().max(self.zoom.abs()) {
            return false;
        }

        let world_before = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let world_after = self.screen_to_world(screen_point);
        self.center += world_before - world_after;
        tracing::trace!(zoom = self.zoom, center = ?self.center, "zoom_at");
        true
    }

    /// Drag the view so the world point under `before` ends up under `after`.
    pub fn pan(&mut self, before: DVec2, after: DVec2) -> bool {
        let delta = self.screen_to_world(before) - self.screen_to_world(after);
        if delta == DVec2::ZERO {
            return false;
        }
        self.center += delta;
        true
    }

    /// Visible world rectangle. The limiting content dimension fills the
    /// viewport at zoom 1; both axes scale by the same factor.
    pub fn view_bounds(&self) -> ViewBounds {
        let content_aspect = self.content.x / self.content.y;
        let (half_width, half_height) = if self.aspect >= content_aspect {
            let half_height = (self.content.y / 2.0) / self.zoom;
            (half_height * self.aspect, half_height)
        } else {
            let half_width = (self.content.x / 2.0) / self.zoom;
            (half_width, half_width / self.aspect)
        };
        ViewBounds::new(
            self.center.x - half_width,
            self.center.x + half_width,
            self.center.y - half_height,
            self.center.y + half_height,
        )
    }

    /// Map a pixel position (y down) to world space (y up).
    pub fn screen_to_world(&self, screen_point: DVec2) -> DVec2 {
        let b = self.view_bounds();
        let x_ratio = screen_point.x / self.viewport.x;
        let y_ratio = 1.0 - screen_point.y / self.viewport.y;
        DVec2::new(
            b.left + x_ratio * b.width(),
            b.bottom + y_ratio * b.height(),
        )
    }

    pub fn world_to_screen(&self, world_point: DVec2) -> DVec2 {
        let b = self.view_bounds();
        let x_ratio = (world_point.x - b.left) / b.width();
        let y_ratio = (world_point.y - b.bottom) / b.height();
        DVec2::new(x_ratio * self.viewport.x, (1.0 - y_ratio) * self.viewport.y)
    }

    /// Orthographic world-to-NDC matrix for the current bounds, near/far at -1/1.
    pub fn projection(&self) -> Mat4 {
        let b = self.view_bounds();
        DMat4::orthographic_rh_gl(b.left, b.right, b.bottom, b.top, -1.0, 1.0).as_mat4()
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.settings.min_zoom, self.settings.max_zoom)
    }
}
