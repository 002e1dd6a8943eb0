//! panicle-skeleton: Pruning of rice-panicle skeleton images (sans-IO).
//!
//! Removes spurious short branches and isolated debris pixels from a
//! one-pixel-wide binary skeleton through:
//! validation -> neighborhood classification -> branch tracing ->
//! pruning and debris sweeping.
//!
//! This crate has **no filesystem dependencies**: it operates on
//! in-memory rasters and byte slices. Reading and writing files lives in
//! the `panicle-prune` binary.

pub mod classify;
pub mod codec;
pub mod diagnostics;
pub mod graph;
pub mod pipeline;
pub mod prune;
pub mod raster;
pub mod trace;
pub mod types;

pub use classify::{Classification, PixelRole};
pub use codec::{decode_skeleton, encode_png};
pub use diagnostics::{Clock, PruneDiagnostics, prune_with_diagnostics};
pub use graph::{JUNCTION_NEIGHBOR_THRESHOLD, SkeletonGraph};
pub use pipeline::Pipeline;
pub use trace::{Link, ParentMap, Trace};
pub use types::{
    Branch, Dimensions, GrayImage, InputDefect, Pixel, PruneConfig, PruneError, StagedResult,
    Terminal,
};

/// Prune a skeleton raster.
///
/// Returns a new raster of the same size in which every branch shorter
/// than `config.min_branch_length` and every isolated pixel has been
/// cleared. The input is not modified.
///
/// # Pipeline steps
///
/// 1. Validate the config and the binary raster
/// 2. Copy the raster with its 1-pixel border cleared
/// 3. Classify every foreground pixel by its 8-neighbor count
/// 4. Trace one branch from each unclaimed end-point
/// 5. Clear short branches and debris in a copy of the input
///
/// # Errors
///
/// Returns [`PruneError::InvalidConfig`] if the foreground marker is 0.
/// Returns [`PruneError::InvalidInput`] if any pixel is neither 0 nor the
/// foreground marker.
pub fn prune(skeleton: &GrayImage, config: &PruneConfig) -> Result<GrayImage, PruneError> {
    prune_staged(skeleton, config).map(|staged| staged.pruned)
}

/// Prune a skeleton, preserving every intermediate.
///
/// Equivalent to [`prune`] but returns a [`StagedResult`] carrying the
/// working copy, classification, parent map and traced branches
/// alongside the pruned raster.
///
/// # Errors
///
/// Same as [`prune`].
pub fn prune_staged(skeleton: &GrayImage, config: &PruneConfig) -> Result<StagedResult, PruneError> {
    Ok(Pipeline::new(skeleton.clone(), config.clone())
        .prepare()?
        .classify()
        .trace()
        .prune()
        .into_result())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;
    use crate::raster::count_foreground;

    fn image_with(width: u32, height: u32, pixels: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &(row, col) in pixels {
            img.put_pixel(col, row, Luma([255]));
        }
        img
    }

    fn segment() -> GrayImage {
        image_with(7, 7, &[(3, 2), (3, 3), (3, 4)])
    }

    /// Stem in column 3 rows 1..=5 with a two-pixel spur to the right
    /// of row 3.
    fn t_shape() -> GrayImage {
        image_with(
            7,
            7,
            &[(1, 3), (2, 3), (3, 3), (4, 3), (5, 3), (3, 4), (3, 5)],
        )
    }

    #[test]
    fn short_segment_is_removed() {
        let pruned = prune(&segment(), &PruneConfig::with_min_branch_length(4)).unwrap();
        assert_eq!(count_foreground(&pruned), 0);
        assert_eq!(pruned.dimensions(), (7, 7));
    }

    #[test]
    fn segment_at_low_threshold_is_unchanged() {
        let pruned = prune(&segment(), &PruneConfig::with_min_branch_length(2)).unwrap();
        assert_eq!(pruned, segment());
    }

    #[test]
    fn t_shape_loses_its_spur() {
        let pruned = prune(&t_shape(), &PruneConfig::with_min_branch_length(3)).unwrap();
        let expected = image_with(7, 7, &[(1, 3), (2, 3), (3, 3), (4, 3), (5, 3)]);
        assert_eq!(pruned, expected);
    }

    #[test]
    fn t_shape_staged_intermediates() {
        let staged = prune_staged(&t_shape(), &PruneConfig::with_min_branch_length(3)).unwrap();
        assert_eq!(staged.branches.len(), 3);
        assert_eq!(staged.classification.end_points.len(), 3);
        assert!(staged.classification.debris.is_empty());

        let removed: Vec<_> = staged.removed_branches().collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(
            removed[0].pixels(),
            &[Pixel::new(3, 5), Pixel::new(3, 4)]
        );
        assert_eq!(removed[0].terminal(), Terminal::Junction);
    }

    #[test]
    fn empty_raster_is_unchanged() {
        let img = GrayImage::new(5, 5);
        assert_eq!(prune(&img, &PruneConfig::default()).unwrap(), img);
    }

    #[test]
    fn zero_sized_raster_is_accepted() {
        let img = GrayImage::new(0, 0);
        let pruned = prune(&img, &PruneConfig::default()).unwrap();
        assert_eq!(pruned.dimensions(), (0, 0));
    }

    #[test]
    fn tiny_raster_keeps_its_pixels() {
        // Every pixel of a 2x2 raster lies on the border.
        let img = image_with(2, 2, &[(0, 0), (1, 1)]);
        assert_eq!(prune(&img, &PruneConfig::default()).unwrap(), img);
    }

    #[test]
    fn isolated_pixels_are_swept() {
        let img = image_with(9, 9, &[(2, 2), (6, 6)]);
        let pruned = prune(&img, &PruneConfig::with_min_branch_length(0)).unwrap();
        assert_eq!(count_foreground(&pruned), 0);
    }

    #[test]
    fn non_binary_input_is_rejected() {
        let mut img = segment();
        img.put_pixel(5, 5, Luma([128]));
        let result = prune(&img, &PruneConfig::default());
        assert!(matches!(
            result,
            Err(PruneError::InvalidInput(InputDefect::NonBinary { x: 5, y: 5, value: 128, .. }))
        ));
    }

    #[test]
    fn custom_marker_is_honored() {
        let mut img = GrayImage::new(7, 7);
        for col in 2..=4 {
            img.put_pixel(col, 3, Luma([1]));
        }
        let config = PruneConfig {
            min_branch_length: 4,
            foreground: 1,
        };
        let pruned = prune(&img, &config).unwrap();
        assert_eq!(count_foreground(&pruned), 0);

        assert!(prune(&segment(), &config).is_err());
    }

    #[test]
    fn input_is_not_mutated() {
        let img = t_shape();
        let before = img.clone();
        let _ = prune(&img, &PruneConfig::with_min_branch_length(100)).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn border_pixels_survive() {
        // A long border run is never traced, so it is never pruned.
        let mut pixels: Vec<(u32, u32)> = (0..9).map(|col| (0, col)).collect();
        pixels.extend([(4, 3), (4, 4), (4, 5)]);
        let img = image_with(9, 9, &pixels);
        let pruned = prune(&img, &PruneConfig::with_min_branch_length(5)).unwrap();
        assert_eq!(pruned, image_with(9, 9, &(0..9).map(|col| (0, col)).collect::<Vec<_>>()));
    }
}
