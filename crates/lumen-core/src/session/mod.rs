//! Editing session domain module.
//!
//! - `tool`: the tool palette ([`Tool`])
//! - `geometry`: edit targeting types ([`PixelPoint`], [`Hotspot`], [`CropRect`])
//! - `state`: the mutable session ([`SessionState`], [`ErrorNotice`], [`StyleImage`])

mod geometry;
mod state;
mod tool;

// Re-export public API
pub use geometry::{CropRect, Hotspot, PixelPoint};
pub use state::{ErrorNotice, SessionState, StyleImage};
pub use tool::Tool;
