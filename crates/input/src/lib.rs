//! Input Tracker: latest pointer position and host events mapped to actions.
//!
//! # Invariants
//! - Pointer state is last-write-wins; nothing is queued.
//! - The tracker is read, not consumed, by the frame updater.

pub mod action;
pub mod pointer;

pub use action::Action;
pub use pointer::{PointerState, PointerTracker};

pub fn crate_info() -> &'static str {
    "nebula-input v0.1.0"
}
