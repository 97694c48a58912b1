//! The tool palette.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The editing tool a session currently has active.
///
/// The active tool selects which transient inputs (prompt, hotspot, crop
/// rectangle, style reference) the UI edits; it does not gate which
/// actions may run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    /// Text-to-image generation; the entry point when no image is loaded.
    #[default]
    Generate,
    Retouch,
    Colorize,
    Adjust,
    Filters,
    Crop,
    Style,
}
