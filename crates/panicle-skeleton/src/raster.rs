//! Raster helpers: input validation, the border-zeroed working copy, and
//! 3×3 neighbor windows.
//!
//! The neighbor window of a pixel is only defined away from the image
//! border. [`working_copy`] zeroes the outermost ring of pixels so every
//! remaining foreground pixel has all eight neighbors in bounds.

use image::{GrayImage, Luma};

use crate::types::{InputDefect, Pixel, PruneError};

/// Offsets `(d_row, d_col)` of the eight neighbors in raster order:
/// row-major over the 3×3 window, top-left to bottom-right, center skipped.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Build a raster from a row-major byte buffer.
///
/// # Errors
///
/// Returns [`InputDefect::ShapeMismatch`] if `data` does not hold exactly
/// `width * height` bytes.
pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage, PruneError> {
    let len = data.len();
    let expected = u64::from(width) * u64::from(height);
    if u64::try_from(len).ok() != Some(expected) {
        return Err(InputDefect::ShapeMismatch { width, height, len }.into());
    }
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| InputDefect::ShapeMismatch { width, height, len }.into())
}

/// Check that every pixel is background (0) or the foreground marker.
///
/// # Errors
///
/// Returns [`InputDefect::NonBinary`] naming the first offending pixel in
/// raster order.
pub fn validate_binary(image: &GrayImage, foreground: u8) -> Result<(), PruneError> {
    match image
        .enumerate_pixels()
        .find(|(_, _, p)| p.0[0] != 0 && p.0[0] != foreground)
    {
        Some((x, y, p)) => Err(InputDefect::NonBinary {
            x,
            y,
            value: p.0[0],
            foreground,
        }
        .into()),
        None => Ok(()),
    }
}

/// Copy of `image` with its 1-pixel border forced to background.
#[must_use = "returns the working copy"]
pub fn working_copy(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            Luma([0])
        } else {
            *image.get_pixel(x, y)
        }
    })
}

/// Whether `pixel` is inside the image and nonzero.
#[must_use]
pub fn is_foreground(image: &GrayImage, pixel: Pixel) -> bool {
    let (x, y) = pixel.xy();
    x < image.width() && y < image.height() && image.get_pixel(x, y).0[0] != 0
}

/// Foreground pixels in raster order.
pub fn foreground_pixels(image: &GrayImage) -> impl Iterator<Item = Pixel> + '_ {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != 0)
        .map(|(x, y, _)| Pixel::new(y, x))
}

/// Number of foreground pixels.
#[must_use]
pub fn count_foreground(image: &GrayImage) -> u64 {
    image.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
}

/// The eight neighbors of `pixel` that exist inside the image, in raster
/// order.
pub fn neighbors(image: &GrayImage, pixel: Pixel) -> impl Iterator<Item = Pixel> + '_ {
    NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
        let row = pixel.row.checked_add_signed(dr)?;
        let col = pixel.col.checked_add_signed(dc)?;
        (row < image.height() && col < image.width()).then_some(Pixel::new(row, col))
    })
}

/// Foreground neighbors of `pixel` in raster order.
pub fn foreground_neighbors(image: &GrayImage, pixel: Pixel) -> impl Iterator<Item = Pixel> + '_ {
    neighbors(image, pixel).filter(|&n| is_foreground(image, n))
}

/// Foreground pixels in the 3×3 window centered on `pixel`, minus the
/// pixel itself.
#[must_use]
pub fn neighbor_count(image: &GrayImage, pixel: Pixel) -> usize {
    foreground_neighbors(image, pixel).count()
}
