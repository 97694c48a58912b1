//! In-memory display handle registry.

use std::collections::HashMap;
use std::sync::RwLock;

use lumen_core::error::Result;
use lumen_core::handle::{DisplayHandle, HandleRegistry};
use lumen_core::image::ImageData;
use lumen_core::LumenError;

/// Process-local [`HandleRegistry`].
///
/// Registered payloads share bytes with the snapshots that own them, so an
/// entry costs a map slot, not a pixel copy. Revoking an unknown handle is
/// an error: the store revokes exactly once per eviction, and anything
/// else is a lifecycle bug worth surfacing.
#[derive(Default)]
pub struct InMemoryHandleRegistry {
    entries: RwLock<HashMap<DisplayHandle, ImageData>>,
}

impl InMemoryHandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently live handles.
    pub fn live_count(&self) -> usize {
        self.entries.read().expect("handle registry lock poisoned").len()
    }
}

impl HandleRegistry for InMemoryHandleRegistry {
    fn register(&self, image: &ImageData) -> DisplayHandle {
        let handle = DisplayHandle::mint();
        self.entries
            .write()
            .expect("handle registry lock poisoned")
            .insert(handle, image.clone());
        tracing::debug!("[HandleRegistry] Registered handle {}", handle);
        handle
    }

    fn resolve(&self, handle: DisplayHandle) -> Option<ImageData> {
        self.entries
            .read()
            .expect("handle registry lock poisoned")
            .get(&handle)
            .cloned()
    }

    fn revoke(&self, handle: DisplayHandle) -> Result<()> {
        let removed = self
            .entries
            .write()
            .expect("handle registry lock poisoned")
            .remove(&handle);
        match removed {
            Some(_) => {
                tracing::debug!("[HandleRegistry] Revoked handle {}", handle);
                Ok(())
            }
            None => Err(LumenError::UnknownHandle(handle.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: u8) -> ImageData {
        ImageData::png(vec![tag])
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = InMemoryHandleRegistry::new();
        let handle = registry.register(&image(7));

        let resolved = registry.resolve(handle).expect("handle should resolve");
        assert_eq!(resolved.bytes(), &[7]);
        assert_eq!(resolved.mime_type(), "image/png");
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_handles_are_unique() {
        let registry = InMemoryHandleRegistry::new();
        let payload = image(1);
        let first = registry.register(&payload);
        let second = registry.register(&payload);
        assert_ne!(first, second);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_revoke_removes_entry() {
        let registry = InMemoryHandleRegistry::new();
        let handle = registry.register(&image(1));

        registry.revoke(handle).expect("first revoke succeeds");
        assert!(registry.resolve(handle).is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_double_revoke_is_an_error() {
        let registry = InMemoryHandleRegistry::new();
        let handle = registry.register(&image(1));

        registry.revoke(handle).unwrap();
        let err = registry.revoke(handle).unwrap_err();
        assert!(matches!(err, LumenError::UnknownHandle(_)));
    }

    #[test]
    fn test_revoke_unknown_handle_is_an_error() {
        let registry = InMemoryHandleRegistry::new();
        let err = registry.revoke(DisplayHandle::mint()).unwrap_err();
        assert!(matches!(err, LumenError::UnknownHandle(_)));
    }
}
