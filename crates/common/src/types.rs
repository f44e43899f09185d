use glam::{DVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Errors raised when building grid-level types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Integer coordinate of a single grid cell, as produced by a highlight feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space position of the cell's lower-left corner.
    pub fn lower_left(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Immutable description of the grid: world extent is `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    width: u32,
    height: u32,
    highlight_count: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            highlight_count: 50_000,
        }
    }
}

impl GridConfig {
    pub fn new(width: u32, height: u32, highlight_count: usize) -> Result<Self, GridError> {
        let config = Self {
            width,
            height,
            highlight_count,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the positive-dimension invariant. Deserialized configs must pass
    /// through here before use.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.width == 0 || self.height == 0 {
            return Err(GridError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of highlights the feed is asked to produce at startup.
    pub fn highlight_count(&self) -> usize {
        self.highlight_count
    }

    pub fn with_highlight_count(self, highlight_count: usize) -> Self {
        Self {
            highlight_count,
            ..self
        }
    }

    pub fn extent(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    pub fn center(&self) -> DVec2 {
        self.extent() * 0.5
    }

    /// Width over height of the world content.
    pub fn content_aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }
}

/// Axis-aligned world-space rectangle visible through the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl ViewBounds {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.left + self.right) * 0.5,
            (self.bottom + self.top) * 0.5,
        )
    }

    /// Grow the rectangle by `margin` on all four sides.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            right: self.right + margin,
            bottom: self.bottom - margin,
            top: self.top + margin,
        }
    }

    /// Inclusive containment test on both axes.
    pub fn contains(&self, point: Vec2) -> bool {
        let x = point.x as f64;
        let y = point.y as f64;
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.left, self.right, self.bottom, self.top)
    }
}
