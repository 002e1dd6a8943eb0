//! Shared types for the skeleton pruning pipeline.

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::trace::ParentMap;

/// Re-export `GrayImage` so downstream crates can pass skeleton rasters
/// without depending on `image` directly.
pub use image::GrayImage;

/// A pixel coordinate in the skeleton raster.
///
/// Ordering is row-major (`row` first, then `col`), which is the raster
/// scan order used everywhere a deterministic tie-break is needed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Pixel {
    /// Vertical position (rows from the top edge).
    pub row: u32,
    /// Horizontal position (columns from the left edge).
    pub col: u32,
}

impl Pixel {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// `image` crate coordinates `(x, y)` for this pixel.
    #[must_use]
    pub const fn xy(self) -> (u32, u32) {
        (self.col, self.row)
    }

    /// Whether `other` is one of the eight pixels surrounding `self`.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr <= 1 && dc <= 1 && (dr | dc) != 0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing raster.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// How a traced branch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// The last pixel is a junction. Other branches may end on the same
    /// junction pixel.
    Junction,
    /// The walk ran out of unclaimed neighbors: a free end, or a collision
    /// with a neighborhood already consumed by an earlier branch.
    DeadEnd,
}

/// An ordered chain of pixels from an end-point inward.
///
/// The first pixel is the tip; the last pixel is the one whose parent is
/// "no parent" (a junction or a dead end) and is included in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pixels: Vec<Pixel>,
    terminal: Terminal,
}

impl Branch {
    /// Create a branch from its ordered pixels.
    #[must_use]
    pub const fn new(pixels: Vec<Pixel>, terminal: Terminal) -> Self {
        Self { pixels, terminal }
    }

    /// Number of pixels in the branch; the metric compared against the
    /// minimum branch length.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` if the branch has no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The end-point the branch was traced from.
    #[must_use]
    pub fn tip(&self) -> Option<Pixel> {
        self.pixels.first().copied()
    }

    /// The innermost pixel (junction or dead end).
    #[must_use]
    pub fn base(&self) -> Option<Pixel> {
        self.pixels.last().copied()
    }

    /// How the branch ended.
    #[must_use]
    pub const fn terminal(&self) -> Terminal {
        self.terminal
    }

    /// Pixels from tip to base.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Pixels claimed by this branch alone: every pixel except a terminal
    /// junction, which may be shared with other branches.
    #[must_use]
    pub fn own_pixels(&self) -> &[Pixel] {
        match self.terminal {
            Terminal::Junction => &self.pixels[..self.pixels.len().saturating_sub(1)],
            Terminal::DeadEnd => &self.pixels,
        }
    }

    /// Consumes the branch and returns its pixels.
    #[must_use]
    pub fn into_pixels(self) -> Vec<Pixel> {
        self.pixels
    }
}

/// Configuration for skeleton pruning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    /// Branches with fewer pixels than this are removed. Zero and one
    /// remove no branches; debris is removed regardless.
    pub min_branch_length: usize,

    /// Marker value of skeleton (foreground) pixels. Every pixel of the
    /// input must be either 0 or this value.
    pub foreground: u8,
}

impl PruneConfig {
    /// Default minimum branch length in pixels.
    pub const DEFAULT_MIN_BRANCH_LENGTH: usize = 10;

    /// Default foreground marker value.
    pub const DEFAULT_FOREGROUND: u8 = 255;

    /// Config with the given threshold and the default marker value.
    #[must_use]
    pub const fn with_min_branch_length(min_branch_length: usize) -> Self {
        Self {
            min_branch_length,
            foreground: Self::DEFAULT_FOREGROUND,
        }
    }

    /// Check construction-time invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PruneError::InvalidConfig`] if `foreground` is 0, which
    /// would make skeleton and background indistinguishable.
    pub fn validate(&self) -> Result<(), PruneError> {
        if self.foreground == 0 {
            return Err(PruneError::InvalidConfig(
                "foreground marker must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self::with_min_branch_length(Self::DEFAULT_MIN_BRANCH_LENGTH)
    }
}

/// Result of a pruning run with every intermediate preserved.
///
/// Does not derive serde traits: the parent map is keyed by pixel and
/// only meaningful next to the rasters it was traced from.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// The caller's skeleton, unmodified.
    pub original: GrayImage,
    /// Copy of the skeleton with its 1-pixel border cleared.
    pub working: GrayImage,
    /// End-points and debris of the working copy.
    pub classification: Classification,
    /// Links recorded while tracing.
    pub parents: ParentMap,
    /// One branch per traced end-point.
    pub branches: Vec<Branch>,
    /// The cleaned skeleton.
    pub pruned: GrayImage,
    /// Threshold the run was pruned with.
    pub min_branch_length: usize,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Branches that were shorter than the threshold.
    pub fn removed_branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches
            .iter()
            .filter(|b| b.len() < self.min_branch_length)
    }
}

/// Why an input raster was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputDefect {
    /// A pixel holds a value other than background (0) or the marker.
    #[error("pixel ({x}, {y}) has value {value}, expected 0 or {foreground}")]
    NonBinary {
        /// Column of the first offending pixel.
        x: u32,
        /// Row of the first offending pixel.
        y: u32,
        /// The offending value.
        value: u8,
        /// The configured foreground marker.
        foreground: u8,
    },

    /// The decoded image is not an 8-bit single-channel raster.
    #[error("expected an 8-bit single-channel image, got {0}")]
    NotSingleChannel(String),

    /// A raw buffer does not hold exactly `width * height` bytes.
    #[error("buffer of {len} bytes does not match a {width}x{height} raster")]
    ShapeMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual buffer length.
        len: usize,
    },
}

/// Errors that can occur during pruning.
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input raster is not a valid binary skeleton.
    #[error("invalid skeleton input: {0}")]
    InvalidInput(#[from] InputDefect),

    /// Prune configuration is invalid.
    #[error("invalid prune configuration: {0}")]
    InvalidConfig(String),
}
