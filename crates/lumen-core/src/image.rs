//! Image payloads.

use std::fmt;
use std::sync::Arc;

/// MIME type used for all images the engine produces itself.
pub const PNG_MIME: &str = "image/png";

/// A MIME-typed binary image payload.
///
/// Clones share the underlying bytes, so snapshotting an image into history
/// or registering it with a handle registry never copies pixel data.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl ImageData {
    /// Creates a payload from raw bytes and a MIME type.
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Creates a PNG payload.
    pub fn png(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(bytes, PNG_MIME)
    }

    /// The raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length of the payload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads can be megabytes; keep Debug output to the metadata.
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
