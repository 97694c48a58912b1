//! Editor use case implementation.
//!
//! This module provides the `EditorUseCase` which drives one editing
//! session: it serializes asynchronous edit operations against the
//! session state, translates their outcome into history mutations or
//! error state, and exposes the synchronous session operations (history
//! navigation, tool and prompt setters) to the rendering layer.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use lumen_core::error::{LumenError, Result};
use lumen_core::gateway::EditGateway;
use lumen_core::handle::HandleRegistry;
use lumen_core::image::ImageData;
use lumen_core::session::{CropRect, ErrorNotice, Hotspot, SessionState, Tool};
use lumen_infrastructure::InMemoryHandleRegistry;

use crate::imaging;

/// Orchestrates one editing session.
///
/// All state lives behind a [`RwLock`]; the lock is never held across the
/// gateway await, so synchronous operations (undo, redo, setters) remain
/// available while an edit is in flight. Edits themselves are serialized
/// by the session's busy flag: a second edit started while one is in
/// flight is refused with [`LumenError::Busy`]. The UI is expected to
/// disable its triggers while busy; the refusal is a backstop, not a
/// queue.
pub struct EditorUseCase {
    /// Session state shared with the rendering layer (read access only)
    state: RwLock<SessionState>,
    /// The remote edit gateway
    gateway: Arc<dyn EditGateway>,
    /// Registry the session mints display handles in
    handle_registry: Arc<dyn HandleRegistry>,
}

impl EditorUseCase {
    /// Creates a use case with a process-local handle registry.
    pub fn new(gateway: Arc<dyn EditGateway>) -> Self {
        Self::with_handle_registry(gateway, Arc::new(InMemoryHandleRegistry::new()))
    }

    /// Creates a use case whose display handles live in `handle_registry`.
    pub fn with_handle_registry(
        gateway: Arc<dyn EditGateway>,
        handle_registry: Arc<dyn HandleRegistry>,
    ) -> Self {
        Self {
            state: RwLock::new(SessionState::new(handle_registry.clone())),
            gateway,
            handle_registry,
        }
    }

    /// The registry the rendering layer resolves display handles against.
    pub fn handle_registry(&self) -> Arc<dyn HandleRegistry> {
        self.handle_registry.clone()
    }

    // ============================================================================
    // Read access
    // ============================================================================

    /// Runs `reader` against the current session state.
    pub async fn with_state<R>(&self, reader: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.state.read().await;
        reader(&state)
    }

    pub async fn is_busy(&self) -> bool {
        self.state.read().await.is_busy()
    }

    pub async fn last_error(&self) -> Option<ErrorNotice> {
        self.state.read().await.last_error().cloned()
    }

    // ============================================================================
    // Synchronous session operations
    // ============================================================================

    /// Starts a fresh session over an uploaded image.
    pub async fn upload_image(&self, image: ImageData) {
        self.state.write().await.initialize_history(image);
        tracing::info!("[EditorUseCase] Session initialized from upload");
    }

    pub async fn set_active_tool(&self, tool: Tool) {
        self.state.write().await.set_active_tool(tool);
    }

    pub async fn set_generate_prompt(&self, prompt: impl Into<String>) {
        self.state.write().await.set_generate_prompt(prompt);
    }

    pub async fn set_retouch_prompt(&self, prompt: impl Into<String>) {
        self.state.write().await.set_retouch_prompt(prompt);
    }

    pub async fn set_filter_prompt(&self, prompt: impl Into<String>) {
        self.state.write().await.set_filter_prompt(prompt);
    }

    pub async fn set_adjustment_prompt(&self, prompt: impl Into<String>) {
        self.state.write().await.set_adjustment_prompt(prompt);
    }

    pub async fn set_hotspot(&self, hotspot: Option<Hotspot>) {
        self.state.write().await.set_hotspot(hotspot);
    }

    pub async fn set_pending_crop(&self, crop: Option<CropRect>) {
        self.state.write().await.set_pending_crop(crop);
    }

    pub async fn set_style_image(&self, image: Option<ImageData>) {
        self.state.write().await.set_style_image(image);
    }

    pub async fn clear_error(&self) {
        self.state.write().await.clear_error();
    }

    pub async fn undo(&self) -> bool {
        self.state.write().await.undo()
    }

    pub async fn redo(&self) -> bool {
        self.state.write().await.redo()
    }

    /// Rewinds to the original snapshot, keeping the redo tail.
    pub async fn rewind(&self) {
        self.state.write().await.rewind();
    }

    /// Jumps the history cursor to `index`.
    pub async fn move_cursor(&self, index: usize) -> Result<()> {
        self.state.write().await.move_cursor(index)
    }

    /// Tears the session down to its initial empty state.
    pub async fn reset(&self) {
        self.state.write().await.reset();
        tracing::info!("[EditorUseCase] Session reset");
    }

    // ============================================================================
    // Edit actions
    // ============================================================================

    /// Generates a new image from the generate prompt. On success the new
    /// snapshot joins the history and the retouch tool becomes active.
    pub async fn generate_from_prompt(&self) -> Result<()> {
        let prompt = self.state.read().await.generate_prompt().to_string();
        if prompt.trim().is_empty() {
            return Err(self
                .reject(LumenError::validation(
                    "Please describe the image you want to create.",
                ))
                .await);
        }

        let gateway = self.gateway.clone();
        self.perform("Generate Image", async move {
            gateway.generate(&prompt).await.map_err(LumenError::from)
        })
        .await?;

        self.state.write().await.set_active_tool(Tool::Retouch);
        Ok(())
    }

    /// Performs a localized edit at the selected hotspot.
    pub async fn retouch(&self) -> Result<()> {
        let (image, prompt, hotspot) = {
            let state = self.state.read().await;
            (
                state.current_image().cloned(),
                state.retouch_prompt().to_string(),
                state.hotspot(),
            )
        };

        let (image, hotspot) = match (image, hotspot) {
            (Some(image), Some(hotspot)) if !prompt.trim().is_empty() => (image, hotspot),
            _ => {
                return Err(self
                    .reject(LumenError::validation(
                        "Please select an area on the image and provide a prompt.",
                    ))
                    .await);
            }
        };

        let gateway = self.gateway.clone();
        self.perform("Retouch", async move {
            gateway
                .edit(&image, &prompt, hotspot.edit)
                .await
                .map_err(LumenError::from)
        })
        .await
    }

    /// Applies a stylistic filter; the prompt text becomes the history label.
    pub async fn apply_filter(&self) -> Result<()> {
        let (image, prompt) = {
            let state = self.state.read().await;
            (
                state.current_image().cloned(),
                state.filter_prompt().to_string(),
            )
        };

        let Some(image) = image else {
            return Err(self.reject(LumenError::NoCurrentImage).await);
        };
        if prompt.trim().is_empty() {
            return Err(self
                .reject(LumenError::validation(
                    "Please describe the filter you want to apply.",
                ))
                .await);
        }

        let gateway = self.gateway.clone();
        let label = prompt.clone();
        self.perform(&label, async move {
            gateway.filter(&image, &prompt).await.map_err(LumenError::from)
        })
        .await
    }

    /// Applies a global adjustment; the prompt text becomes the history label.
    pub async fn apply_adjustment(&self) -> Result<()> {
        let (image, prompt) = {
            let state = self.state.read().await;
            (
                state.current_image().cloned(),
                state.adjustment_prompt().to_string(),
            )
        };

        let Some(image) = image else {
            return Err(self.reject(LumenError::NoCurrentImage).await);
        };
        if prompt.trim().is_empty() {
            return Err(self
                .reject(LumenError::validation(
                    "Please describe the adjustment you want to apply.",
                ))
                .await);
        }

        let gateway = self.gateway.clone();
        let label = prompt.clone();
        self.perform(&label, async move {
            gateway.adjust(&image, &prompt).await.map_err(LumenError::from)
        })
        .await
    }

    /// Colorizes the current image.
    pub async fn apply_colorize(&self) -> Result<()> {
        let image = self.state.read().await.current_image().cloned();
        let Some(image) = image else {
            return Err(self.reject(LumenError::NoCurrentImage).await);
        };

        let gateway = self.gateway.clone();
        self.perform("Colorize", async move {
            gateway.colorize(&image).await.map_err(LumenError::from)
        })
        .await
    }

    /// Transfers the style of the reference image onto the current image.
    pub async fn apply_style(&self) -> Result<()> {
        let (image, style) = {
            let state = self.state.read().await;
            (
                state.current_image().cloned(),
                state.style_image().map(|style| style.image().clone()),
            )
        };

        let (image, style) = match (image, style) {
            (Some(image), Some(style)) => (image, style),
            _ => {
                return Err(self
                    .reject(LumenError::validation(
                        "Please provide a content image and a style image.",
                    ))
                    .await);
            }
        };

        let gateway = self.gateway.clone();
        self.perform("Style Transfer", async move {
            gateway
                .style_transfer(&image, &style)
                .await
                .map_err(LumenError::from)
        })
        .await
    }

    /// Crops the current image to the pending crop rectangle. This is a
    /// local operation; it goes through the same protocol as the remote
    /// ones so the result lands in history the same way.
    pub async fn apply_crop(&self) -> Result<()> {
        let (image, crop) = {
            let state = self.state.read().await;
            (state.current_image().cloned(), state.pending_crop())
        };

        let Some(image) = image else {
            return Err(self.reject(LumenError::NoCurrentImage).await);
        };
        let Some(crop) = crop.filter(|crop| !crop.is_empty()) else {
            return Err(self
                .reject(LumenError::validation("Please select an area to crop."))
                .await);
        };

        self.perform("Crop", async move { imaging::rasterize_crop(&image, crop) })
            .await
    }

    /// Rewrites the generate prompt to be more descriptive. Never touches
    /// history or the busy flag; a blank prompt is silently ignored.
    pub async fn enhance_prompt(&self) -> Result<()> {
        let prompt = self.state.read().await.generate_prompt().to_string();
        if prompt.trim().is_empty() {
            return Ok(());
        }

        self.state.write().await.set_enhancing_prompt(true);
        let outcome = self.gateway.enhance_prompt(&prompt).await;

        let mut state = self.state.write().await;
        state.set_enhancing_prompt(false);
        match outcome {
            Ok(enhanced) => {
                state.set_generate_prompt(enhanced);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[EditorUseCase] Prompt enhancement failed: {}", err);
                state.set_error(format!("Failed to enhance prompt: {err}"));
                Err(err.into())
            }
        }
    }

    // ============================================================================
    // The action protocol
    // ============================================================================

    /// Runs one asynchronous edit operation under the session protocol:
    /// mark busy and clear the stale error, await the operation without
    /// holding the state lock, then commit the outcome. Both outcome arms
    /// go through the same completion block, so busy is cleared on every
    /// path.
    async fn perform<F>(&self, label: &str, operation: F) -> Result<()>
    where
        F: Future<Output = Result<ImageData>>,
    {
        self.state.write().await.try_begin_edit()?;
        tracing::info!("[EditorUseCase] '{}' started", label);

        let outcome = operation.await;

        let mut state = self.state.write().await;
        state.end_edit();
        match outcome {
            Ok(image) => {
                state.record_edit(image, label);
                tracing::info!("[EditorUseCase] '{}' succeeded", label);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[EditorUseCase] '{}' failed: {}", label, err);
                state.set_error(action_failure_message(label, &err));
                Err(err)
            }
        }
    }

    /// Records a precondition failure and hands the error back to the
    /// caller. No gateway call has been made and history is untouched.
    async fn reject(&self, err: LumenError) -> LumenError {
        tracing::warn!("[EditorUseCase] Action rejected: {}", err);
        self.state.write().await.set_error(err.to_string());
        err
    }
}

/// "Failed to {action}. {cause}", with a blank cause normalized to the
/// generic unknown-error message.
fn action_failure_message(label: &str, err: &LumenError) -> String {
    let cause = err.to_string();
    let cause = if cause.trim().is_empty() {
        "An unknown error occurred.".to_string()
    } else {
        cause
    };
    format!("Failed to {}. {}", label.to_lowercase(), cause)
}
