//! Local raster operations.
//!
//! The crop tool is the one edit that never leaves the process: the UI
//! collects a rectangle and the engine cuts it out of the current
//! snapshot before feeding the result through the normal action protocol.

use std::io::Cursor;

use image::ImageFormat;

use lumen_core::error::{LumenError, Result};
use lumen_core::image::ImageData;
use lumen_core::session::CropRect;

/// Cuts `rect` out of `source` and re-encodes it as PNG.
///
/// The rectangle is clamped to the image bounds first. A selection that is
/// empty, or lies entirely outside the image, is a validation error.
pub fn rasterize_crop(source: &ImageData, rect: CropRect) -> Result<ImageData> {
    if rect.is_empty() {
        return Err(LumenError::validation("Please select an area to crop."));
    }

    let decoded =
        image::load_from_memory(source.bytes()).map_err(|err| LumenError::image(err.to_string()))?;

    let (image_width, image_height) = (decoded.width(), decoded.height());
    let x = rect.x.min(image_width);
    let y = rect.y.min(image_height);
    let width = rect.width.min(image_width - x);
    let height = rect.height.min(image_height - y);
    if width == 0 || height == 0 {
        return Err(LumenError::validation(
            "The crop selection lies outside the image.",
        ));
    }

    let cropped = decoded.crop_imm(x, y, width, height);
    let mut bytes = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| LumenError::image(err.to_string()))?;
    Ok(ImageData::png(bytes))
}
