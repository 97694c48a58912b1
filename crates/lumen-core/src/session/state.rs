//! The mutable editing session.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::handle::{DisplayHandle, HandleRegistry};
use crate::history::{HistoryItem, HistoryStore, ORIGINAL_IMAGE_LABEL};
use crate::image::ImageData;

use super::geometry::{CropRect, Hotspot};
use super::tool::Tool;

/// The most recent user-visible error.
///
/// The id is fresh on every set so UI auto-dismiss timers re-arm even when
/// the same message is reported twice in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    id: String,
    message: String,
}

impl ErrorNotice {
    fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A style-reference image and the display handle the UI previews it with.
#[derive(Debug, Clone)]
pub struct StyleImage {
    image: ImageData,
    handle: DisplayHandle,
}

impl StyleImage {
    pub fn image(&self) -> &ImageData {
        &self.image
    }

    pub fn handle(&self) -> DisplayHandle {
        self.handle
    }
}

/// All mutable state of one editing session: the history store, the active
/// tool, the per-tool transient inputs, and the loading/error flags.
///
/// The session owns every display handle it mints (history snapshots
/// through [`HistoryStore`], the style reference directly) and revokes
/// them when the underlying image leaves the session.
///
/// `SessionState` itself is synchronous; the application layer wraps it in
/// a lock and drives the asynchronous edit protocol.
pub struct SessionState {
    history: HistoryStore,
    registry: Arc<dyn HandleRegistry>,
    active_tool: Tool,
    busy: bool,
    enhancing_prompt: bool,
    last_error: Option<ErrorNotice>,
    generate_prompt: String,
    retouch_prompt: String,
    filter_prompt: String,
    adjustment_prompt: String,
    hotspot: Option<Hotspot>,
    pending_crop: Option<CropRect>,
    style_image: Option<StyleImage>,
}

impl SessionState {
    /// Creates an empty session whose handles live in `registry`.
    pub fn new(registry: Arc<dyn HandleRegistry>) -> Self {
        Self {
            history: HistoryStore::new(registry.clone()),
            registry,
            active_tool: Tool::default(),
            busy: false,
            enhancing_prompt: false,
            last_error: None,
            generate_prompt: String::new(),
            retouch_prompt: String::new(),
            filter_prompt: String::new(),
            adjustment_prompt: String::new(),
            hotspot: None,
            pending_crop: None,
            style_image: None,
        }
    }

    // ============================================================================
    // Read access for the rendering layer
    // ============================================================================

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_enhancing_prompt(&self) -> bool {
        self.enhancing_prompt
    }

    pub fn last_error(&self) -> Option<&ErrorNotice> {
        self.last_error.as_ref()
    }

    pub fn generate_prompt(&self) -> &str {
        &self.generate_prompt
    }

    pub fn retouch_prompt(&self) -> &str {
        &self.retouch_prompt
    }

    pub fn filter_prompt(&self) -> &str {
        &self.filter_prompt
    }

    pub fn adjustment_prompt(&self) -> &str {
        &self.adjustment_prompt
    }

    pub fn hotspot(&self) -> Option<Hotspot> {
        self.hotspot
    }

    pub fn pending_crop(&self) -> Option<CropRect> {
        self.pending_crop
    }

    pub fn style_image(&self) -> Option<&StyleImage> {
        self.style_image.as_ref()
    }

    /// The image at the history cursor, if any.
    pub fn current_image(&self) -> Option<&ImageData> {
        self.history.current_image()
    }

    // ============================================================================
    // Tool and transient-input setters
    // ============================================================================

    pub fn set_active_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
    }

    pub fn set_generate_prompt(&mut self, prompt: impl Into<String>) {
        self.generate_prompt = prompt.into();
    }

    pub fn set_retouch_prompt(&mut self, prompt: impl Into<String>) {
        self.retouch_prompt = prompt.into();
    }

    pub fn set_filter_prompt(&mut self, prompt: impl Into<String>) {
        self.filter_prompt = prompt.into();
    }

    pub fn set_adjustment_prompt(&mut self, prompt: impl Into<String>) {
        self.adjustment_prompt = prompt.into();
    }

    pub fn set_hotspot(&mut self, hotspot: Option<Hotspot>) {
        self.hotspot = hotspot;
    }

    pub fn set_pending_crop(&mut self, crop: Option<CropRect>) {
        self.pending_crop = crop;
    }

    /// Replaces the style-reference image, revoking the previous preview
    /// handle and minting one for the replacement.
    pub fn set_style_image(&mut self, image: Option<ImageData>) {
        self.revoke_style_handle();
        self.style_image = match image {
            Some(image) => {
                let handle = self.registry.register(&image);
                Some(StyleImage { image, handle })
            }
            None => None,
        };
    }

    // ============================================================================
    // Error notice
    // ============================================================================

    /// Records a user-visible error, superseding any previous one.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(ErrorNotice::new(message));
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ============================================================================
    // Edit protocol primitives (driven by the action executor)
    // ============================================================================

    /// Marks an edit as in flight, clearing any stale error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LumenError::Busy`] if an edit is already in
    /// flight; the session is left untouched in that case.
    pub fn try_begin_edit(&mut self) -> Result<()> {
        if self.busy {
            return Err(crate::LumenError::Busy);
        }
        self.busy = true;
        self.last_error = None;
        Ok(())
    }

    /// Marks the in-flight edit as finished, whatever its outcome.
    pub fn end_edit(&mut self) {
        self.busy = false;
    }

    pub fn set_enhancing_prompt(&mut self, enhancing: bool) {
        self.enhancing_prompt = enhancing;
    }

    /// Appends the result of a successful edit. Spatial selections were
    /// made against the previous snapshot, so both are cleared.
    pub fn record_edit(&mut self, image: ImageData, label: impl Into<String>) -> &HistoryItem {
        self.hotspot = None;
        self.pending_crop = None;
        self.history.append(image, label)
    }

    // ============================================================================
    // History lifecycle and navigation
    // ============================================================================

    /// Starts a fresh session over an uploaded image: history becomes the
    /// single "Original Image" snapshot, every previous handle (including
    /// the style preview) is revoked, transient inputs and the error are
    /// cleared, and the retouch tool becomes active.
    pub fn initialize_history(&mut self, image: ImageData) -> &HistoryItem {
        self.revoke_style_handle();
        self.style_image = None;
        self.generate_prompt.clear();
        self.retouch_prompt.clear();
        self.filter_prompt.clear();
        self.adjustment_prompt.clear();
        self.hotspot = None;
        self.pending_crop = None;
        self.last_error = None;
        self.active_tool = Tool::Retouch;
        self.history.initialize(image, ORIGINAL_IMAGE_LABEL)
    }

    /// Tears the session down to its initial empty state, revoking every
    /// live handle.
    pub fn reset(&mut self) {
        self.history.reset();
        self.revoke_style_handle();
        self.style_image = None;
        self.active_tool = Tool::default();
        self.busy = false;
        self.enhancing_prompt = false;
        self.last_error = None;
        self.generate_prompt.clear();
        self.retouch_prompt.clear();
        self.filter_prompt.clear();
        self.adjustment_prompt.clear();
        self.hotspot = None;
        self.pending_crop = None;
    }

    pub fn undo(&mut self) -> bool {
        self.clear_spatial_selection();
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.clear_spatial_selection();
        self.history.redo()
    }

    /// Rewinds to the original snapshot, keeping the redo tail.
    pub fn rewind(&mut self) {
        self.clear_spatial_selection();
        self.history.rewind();
    }

    /// Jumps the cursor to an arbitrary history index.
    pub fn move_cursor(&mut self, index: usize) -> Result<()> {
        self.history.move_cursor(index)?;
        self.clear_spatial_selection();
        Ok(())
    }

    // A hotspot or crop picked on one snapshot is meaningless on another.
    fn clear_spatial_selection(&mut self) {
        self.hotspot = None;
        self.pending_crop = None;
    }

    fn revoke_style_handle(&mut self) {
        if let Some(style) = self.style_image.take() {
            if let Err(err) = self.registry.revoke(style.handle) {
                tracing::warn!("[SessionState] Failed to revoke style handle: {}", err);
            }
        }
    }
}
