//! History snapshots.

use chrono::Utc;
use uuid::Uuid;

use crate::handle::DisplayHandle;
use crate::image::ImageData;

/// Label given to the first history item after an upload.
pub const ORIGINAL_IMAGE_LABEL: &str = "Original Image";

/// A single snapshot in the editing history: the image an operation
/// produced, plus the display handle the rendering layer uses to show it.
///
/// Items are only ever constructed by [`super::HistoryStore`], which mints
/// the handle on insertion and revokes it on eviction.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    id: String,
    image: ImageData,
    handle: DisplayHandle,
    label: String,
    created_at: String,
}

impl HistoryItem {
    pub(crate) fn new(image: ImageData, handle: DisplayHandle, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image,
            handle,
            label: label.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Unique id, stable for the session.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The image payload owned by this snapshot.
    pub fn image(&self) -> &ImageData {
        &self.image
    }

    /// The live display handle for this snapshot.
    pub fn handle(&self) -> DisplayHandle {
        self.handle
    }

    /// Human-readable name of the operation that produced this snapshot.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// RFC 3339 creation timestamp.
    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}
