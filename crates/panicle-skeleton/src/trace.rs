//! Branch tracing: walk from each end-point inward until a junction or a
//! dead end.
//!
//! # Algorithm
//!
//! A single [`ClaimedPixels`] grid is shared by every walk of a run and is
//! never reset. For each end-point, in raster order:
//!
//! 1. An end-point already claimed by an earlier walk starts no branch.
//! 2. Claim the current pixel and pick the first unclaimed neighbor in
//!    window scan order as the candidate parent.
//! 3. No candidate: the current pixel is a root ("no parent"). Stop.
//! 4. Candidate is a junction: it becomes the parent and a root. Stop.
//!    Junctions are never claimed, so several branches can end on one.
//! 5. Otherwise the candidate becomes the parent and the walk continues
//!    from it.
//!
//! Every pixel is claimed at most once, so walks cannot cross and the
//! whole trace is bounded by the number of foreground pixels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::SkeletonGraph;
use crate::types::{Branch, Dimensions, Pixel, Terminal};

/// Pixels already consumed by a walk, as a same-size boolean grid.
#[derive(Debug, Clone)]
pub struct ClaimedPixels {
    width: u32,
    claimed: Vec<bool>,
    count: usize,
}

impl ClaimedPixels {
    /// An empty claim grid for a raster of the given size.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        let len = usize::try_from(dimensions.pixel_count()).unwrap_or(0);
        Self {
            width: dimensions.width,
            claimed: vec![false; len],
            count: 0,
        }
    }

    fn offset(&self, pixel: Pixel) -> Option<usize> {
        if pixel.col >= self.width {
            return None;
        }
        let offset = u64::from(pixel.row) * u64::from(self.width) + u64::from(pixel.col);
        usize::try_from(offset)
            .ok()
            .filter(|&i| i < self.claimed.len())
    }

    /// Whether `pixel` has been claimed.
    #[must_use]
    pub fn is_claimed(&self, pixel: Pixel) -> bool {
        self.offset(pixel).is_some_and(|i| self.claimed[i])
    }

    /// Claim `pixel`. Returns `false` if it was already claimed or lies
    /// outside the grid.
    pub fn claim(&mut self, pixel: Pixel) -> bool {
        match self.offset(pixel) {
            Some(i) if !self.claimed[i] => {
                self.claimed[i] = true;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    /// Number of claimed pixels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if nothing has been claimed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Where a traced pixel points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Link {
    /// The inward neighbor along the branch.
    Parent(Pixel),
    /// No parent: the branch ends here.
    Root,
}

/// Child-to-parent links recorded while tracing.
///
/// A link, once assigned, is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentMap(HashMap<Pixel, Link>);

impl ParentMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `link` for `child` unless it already has one. Returns
    /// `true` if the link was recorded.
    pub fn assign(&mut self, child: Pixel, link: Link) -> bool {
        match self.0.entry(child) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(link);
                true
            }
        }
    }

    /// The link recorded for `pixel`, if it was traced.
    #[must_use]
    pub fn get(&self, pixel: Pixel) -> Option<Link> {
        self.0.get(&pixel).copied()
    }

    /// Number of pixels with a recorded link.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no link has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of pixels recorded as roots.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.0.values().filter(|&&l| l == Link::Root).count()
    }

    /// Follow parents from `tip` until a root, collecting pixels in order
    /// (root included).
    ///
    /// A pixel without a recorded link ends the walk as well; the walk is
    /// bounded by the number of recorded links.
    #[must_use]
    pub fn path_from(&self, tip: Pixel) -> Vec<Pixel> {
        let mut path = vec![tip];
        let mut current = tip;
        while path.len() <= self.0.len() {
            match self.get(current) {
                Some(Link::Parent(parent)) => {
                    path.push(parent);
                    current = parent;
                }
                Some(Link::Root) | None => break,
            }
        }
        path
    }
}

/// Output of tracing every end-point of a skeleton.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Links recorded during the walks.
    pub parents: ParentMap,
    /// One branch per traced end-point, in raster order of their tips.
    pub branches: Vec<Branch>,
    /// End-points that started no branch because an earlier walk had
    /// already claimed them.
    pub skipped_tips: Vec<Pixel>,
}

/// Trace a branch from every end-point.
#[must_use]
pub fn trace_branches(graph: &SkeletonGraph, end_points: &[Pixel]) -> Trace {
    let mut claimed = ClaimedPixels::new(graph.dimensions());
    let mut parents = ParentMap::new();
    let mut tips = Vec::with_capacity(end_points.len());
    let mut skipped_tips = Vec::new();

    for &tip in end_points {
        if claimed.is_claimed(tip) {
            skipped_tips.push(tip);
            continue;
        }
        walk(graph, tip, &mut claimed, &mut parents);
        tips.push(tip);
    }

    let branches = tips
        .into_iter()
        .map(|tip| reconstruct_branch(graph, &parents, tip))
        .collect();

    Trace {
        parents,
        branches,
        skipped_tips,
    }
}

/// Walk inward from `tip`, claiming pixels and recording links.
fn walk(graph: &SkeletonGraph, tip: Pixel, claimed: &mut ClaimedPixels, parents: &mut ParentMap) {
    let mut current = tip;
    loop {
        claimed.claim(current);

        let candidate = graph
            .neighbors(current)
            .into_iter()
            .find(|&n| !claimed.is_claimed(n));

        let Some(candidate) = candidate else {
            parents.assign(current, Link::Root);
            return;
        };

        parents.assign(current, Link::Parent(candidate));

        if graph.is_junction(candidate) {
            parents.assign(candidate, Link::Root);
            return;
        }

        current = candidate;
    }
}

/// Rebuild the branch starting at `tip` from the parent map.
#[must_use]
pub fn reconstruct_branch(graph: &SkeletonGraph, parents: &ParentMap, tip: Pixel) -> Branch {
    let pixels = parents.path_from(tip);
    let terminal = match pixels.last() {
        Some(&base) if pixels.len() > 1 && graph.is_junction(base) => Terminal::Junction,
        _ => Terminal::DeadEnd,
    };
    Branch::new(pixels, terminal)
}
