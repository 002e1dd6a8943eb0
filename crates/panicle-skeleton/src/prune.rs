//! Pruning and sweeping: clear short branches and debris.
//!
//! Both operations write into a copy of the **original** raster, not the
//! border-zeroed working copy, so border pixels of the input survive
//! untouched.

use image::{GrayImage, Luma};

use crate::types::{Branch, Pixel};

/// What [`apply`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneCounts {
    /// Branches shorter than the threshold.
    pub branches_removed: usize,
    /// Foreground pixels cleared by branch pruning.
    pub branch_pixels_cleared: u64,
    /// Foreground pixels cleared by debris sweeping.
    pub debris_cleared: u64,
}

/// Clear every short branch and every debris pixel in a copy of
/// `original`.
#[must_use = "returns the pruned skeleton"]
pub fn apply(
    original: &GrayImage,
    branches: &[Branch],
    debris: &[Pixel],
    min_branch_length: usize,
) -> (GrayImage, PruneCounts) {
    let mut pruned = original.clone();
    let (branches_removed, branch_pixels_cleared) =
        prune_branches(&mut pruned, branches, min_branch_length);
    let debris_cleared = sweep_debris(&mut pruned, debris);
    (
        pruned,
        PruneCounts {
            branches_removed,
            branch_pixels_cleared,
            debris_cleared,
        },
    )
}

/// Clear every pixel of each branch with fewer than `min_branch_length`
/// pixels. Returns the number of branches removed and of pixels cleared.
///
/// Overlapping branches (two tips ending on one junction) clear their
/// shared pixel once.
pub fn prune_branches(
    image: &mut GrayImage,
    branches: &[Branch],
    min_branch_length: usize,
) -> (usize, u64) {
    let mut removed = 0;
    let mut cleared = 0;
    for branch in branches.iter().filter(|b| b.len() < min_branch_length) {
        removed += 1;
        cleared += clear(image, branch.pixels());
    }
    (removed, cleared)
}

/// Clear every debris pixel. The length threshold does not apply.
pub fn sweep_debris(image: &mut GrayImage, debris: &[Pixel]) -> u64 {
    clear(image, debris)
}

/// Set `pixels` to background, returning how many were foreground.
fn clear(image: &mut GrayImage, pixels: &[Pixel]) -> u64 {
    let mut cleared = 0;
    for &pixel in pixels {
        let (x, y) = pixel.xy();
        if let Some(p) = image.get_pixel_mut_checked(x, y)
            && p.0[0] != 0
        {
            *p = Luma([0]);
            cleared += 1;
        }
    }
    cleared
}
