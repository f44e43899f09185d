//! Scene core for the grid viewer.
//!
//! Wires camera, visibility culling, frame scheduling and input handling into
//! one owned [`Scene`] driven by host events and periodic `tick` calls.
//!
//! # Invariants
//! - Every camera or highlight mutation marks the scene dirty.
//! - A click toggles only the cell under the pointer; a cancelled drag changes nothing.
//! - A skipped frame performs no renderer calls.
//! - Instances are uploaded only when the visible subset changes.
//! - Single-threaded; events apply in arrival order.

mod config;
mod scene;

pub use config::{ConfigError, ConfigOverrides, FeedSettings, SceneConfig};
pub use scene::{Scene, SceneStats};
