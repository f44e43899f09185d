//! Interaction handling: host pointer and wheel events mapped to scene actions.
//!
//! # Invariants
//! - Pure event-to-action mapping; the only state is the drag origin and last position.
//! - A primary release within `CLICK_SLOP` of its press is a click, not a pan.
//! - A cancelled drag emits nothing; later moves are ignored until the next press.
//! - Only the primary button drags. Other buttons are ignored, not consumed.
//! - Wheel events are always consumed.

pub mod action;
mod handler;

pub use action::{Action, Dispatch, InputEvent, PointerButton};
pub use handler::{CLICK_SLOP, InteractionHandler};
