//! Filesystem image loading for uploads.

use std::path::Path;

use lumen_core::error::Result;
use lumen_core::image::ImageData;

/// Reads an image file into an [`ImageData`] payload, resolving the MIME
/// type from the file extension.
pub async fn load_image(path: impl AsRef<Path>) -> Result<ImageData> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    tracing::debug!(
        "[ImageLoader] Loaded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    Ok(ImageData::new(bytes, mime_type.essence_str()))
}
