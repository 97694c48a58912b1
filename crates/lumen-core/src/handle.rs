//! Display handles and the registry that mints them.
//!
//! A display handle is the engine's rendering of a browser object URL: a
//! transient, revocable reference that lets the rendering layer show an
//! image without owning its bytes. The store or session that registers a
//! handle is the only component that revokes it, and it does so exactly
//! once, when the underlying snapshot is evicted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::image::ImageData;

/// A transient, revocable reference to a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayHandle(Uuid);

impl DisplayHandle {
    /// Mints a fresh handle token. Called by registry implementations only.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Owns the mapping from display handles to renderable images.
///
/// Revoking a handle that is unknown (never registered, or already revoked)
/// is an error: a second revocation is the resource-management bug class
/// this boundary exists to catch, so it must surface rather than be ignored.
pub trait HandleRegistry: Send + Sync {
    /// Registers an image and mints a unique handle for it.
    ///
    /// The registered payload shares bytes with `image`; nothing is copied.
    fn register(&self, image: &ImageData) -> DisplayHandle;

    /// Resolves a handle to its image, or `None` if it was revoked.
    ///
    /// This is the rendering layer's read path.
    fn resolve(&self, handle: DisplayHandle) -> Option<ImageData>;

    /// Revokes a handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LumenError::UnknownHandle`] if the handle is not
    /// currently registered.
    fn revoke(&self, handle: DisplayHandle) -> Result<()>;
}
