//! Skeleton image decoding and PNG encoding.
//!
//! Skeletons are binary masks, so decoding never converts color: a
//! multi-channel image is rejected rather than collapsed to luminance,
//! which could silently produce marker values that were never drawn.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder};

use crate::types::{InputDefect, PruneError};

/// Decode raw image bytes into a single-channel skeleton raster.
///
/// Supports whatever the `image` crate can decode with the enabled
/// formats (PNG, JPEG, BMP, WebP). Only 8-bit single-channel images are
/// accepted.
///
/// # Errors
///
/// Returns [`PruneError::EmptyInput`] if `bytes` is empty,
/// [`PruneError::ImageDecode`] if the data is corrupt or the format is
/// unrecognized, and [`PruneError::InvalidInput`] if the image has more
/// than one channel or a wider sample type.
#[must_use = "returns the decoded skeleton"]
pub fn decode_skeleton(bytes: &[u8]) -> Result<GrayImage, PruneError> {
    if bytes.is_empty() {
        return Err(PruneError::EmptyInput);
    }

    match image::load_from_memory(bytes)? {
        DynamicImage::ImageLuma8(gray) => Ok(gray),
        other => Err(InputDefect::NotSingleChannel(format!("{:?}", other.color())).into()),
    }
}

/// Encode a skeleton raster as an 8-bit grayscale PNG.
///
/// # Errors
///
/// Returns [`PruneError::ImageDecode`] if the encoder fails.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, PruneError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::L8,
    )?;
    Ok(buf)
}
