//! Viewport: orthographic camera over the grid.
//!
//! # Invariants
//! - Zoom is clamped on every mutation; callers never see an out-of-range zoom.
//! - Zoom-to-cursor and pan keep the world point under the pointer fixed.
//! - View bounds are derived on demand, never cached.

mod camera;

pub use camera::{Camera, CameraSettings};
