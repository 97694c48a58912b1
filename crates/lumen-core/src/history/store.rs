//! The ordered sequence of snapshots and its cursor.

use std::sync::Arc;

use crate::error::{LumenError, Result};
use crate::handle::HandleRegistry;
use crate::image::ImageData;

use super::item::HistoryItem;

/// Owns the ordered sequence of image snapshots and their display handles.
///
/// The sequence is append-only except for two things: appending while the
/// cursor is not at the tail truncates the redo branch, and
/// [`initialize`](Self::initialize) / [`reset`](Self::reset) replace or
/// drop the whole sequence. Every item evicted by one of those paths has
/// its handle revoked exactly once, through the registry the store was
/// built with; items still in the sequence are never revoked.
///
/// The cursor is `None` exactly when the sequence is empty; otherwise it
/// indexes a live item.
pub struct HistoryStore {
    items: Vec<HistoryItem>,
    cursor: Option<usize>,
    registry: Arc<dyn HandleRegistry>,
}

impl HistoryStore {
    /// Creates an empty store that mints and revokes handles through
    /// `registry`.
    pub fn new(registry: Arc<dyn HandleRegistry>) -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            registry,
        }
    }

    /// The full snapshot sequence, oldest first.
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current cursor position; `None` iff the store is empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The snapshot the cursor points at.
    pub fn current(&self) -> Option<&HistoryItem> {
        self.cursor.map(|index| &self.items[index])
    }

    /// The image the cursor points at.
    pub fn current_image(&self) -> Option<&ImageData> {
        self.current().map(HistoryItem::image)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|index| index > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|index| index + 1 < self.items.len())
    }

    /// Appends a new snapshot produced by `label`, discarding any redo
    /// branch first. The cursor ends on the new item.
    pub fn append(&mut self, image: ImageData, label: impl Into<String>) -> &HistoryItem {
        if let Some(cursor) = self.cursor {
            for evicted in self.items.split_off(cursor + 1) {
                self.release(&evicted);
            }
        }

        let handle = self.registry.register(&image);
        self.items.push(HistoryItem::new(image, handle, label));
        self.cursor = Some(self.items.len() - 1);
        // Safe to unwrap because we just pushed an element
        self.items.last().unwrap()
    }

    /// Replaces the whole sequence with a single snapshot, revoking every
    /// previous handle. Used for a fresh upload.
    pub fn initialize(&mut self, image: ImageData, label: impl Into<String>) -> &HistoryItem {
        self.clear_items();

        let handle = self.registry.register(&image);
        self.items.push(HistoryItem::new(image, handle, label));
        self.cursor = Some(0);
        self.items.last().unwrap()
    }

    /// Revokes every handle and restores the empty state.
    pub fn reset(&mut self) {
        self.clear_items();
        self.cursor = None;
    }

    /// Moves the cursor to `index` without touching the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LumenError::IndexOutOfBounds`] if `index` does not point
    /// at a live item.
    pub fn move_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(LumenError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Steps the cursor back one snapshot. A no-op at the first item.
    /// Returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(index) if index > 0 => {
                self.cursor = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Steps the cursor forward one snapshot. A no-op at the tail.
    /// Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(index) if index + 1 < self.items.len() => {
                self.cursor = Some(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Rewinds the cursor to the original snapshot without truncating, so
    /// later edits stay reachable through redo. Revokes nothing.
    pub fn rewind(&mut self) {
        if !self.items.is_empty() {
            self.cursor = Some(0);
        }
    }

    fn clear_items(&mut self) {
        for evicted in std::mem::take(&mut self.items) {
            self.release(&evicted);
        }
    }

    fn release(&self, item: &HistoryItem) {
        if let Err(err) = self.registry.revoke(item.handle()) {
            tracing::warn!(
                "[HistoryStore] Failed to revoke handle for '{}': {}",
                item.label(),
                err
            );
        }
    }
}
