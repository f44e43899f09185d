use serde::{Deserialize, Serialize};

/// Level-of-detail policy for grid lines.
///
/// Below `discard_below` the grid pass is dropped entirely. Between
/// `fade_low` and `fade_high` line opacity ramps linearly up to `base_alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLod {
    pub discard_below: f32,
    pub fade_low: f32,
    pub fade_high: f32,
    pub base_alpha: f32,
}

impl Default for GridLod {
    fn default() -> Self {
        Self {
            discard_below: 0.15,
            fade_low: 0.2,
            fade_high: 0.8,
            base_alpha: 0.7,
        }
    }
}

impl GridLod {
    /// Whether the grid pass runs at all for `zoom`.
    pub fn draws_grid(&self, zoom: f32) -> bool {
        zoom >= self.discard_below
    }

    /// Line opacity for `zoom`, or `None` when the grid is discarded.
    pub fn grid_alpha(&self, zoom: f32) -> Option<f32> {
        if !self.draws_grid(zoom) {
            return None;
        }
        let span = self.fade_high - self.fade_low;
        let t = if span > 0.0 {
            ((zoom - self.fade_low) / span).clamp(0.0, 1.0)
        } else if zoom >= self.fade_high {
            1.0
        } else {
            0.0
        };
        Some(self.base_alpha * t)
    }
}
