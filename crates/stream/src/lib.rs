//! Streaming: which highlight instances reach the GPU, and when frames run.
//!
//! # Invariants
//! - The culler rescans only when the view bounds change by value.
//! - An upload is requested only when the visible subset actually differs.
//! - A dirty scene is never throttled; an idle scene redraws at most once per
//!   frame interval.

mod budget;
mod cull;

pub use budget::{FrameDecision, FrameScheduler, FrameSettings, FrameTimer};
pub use cull::{CullOutcome, CullSettings, CullStats, VisibilityCuller};
