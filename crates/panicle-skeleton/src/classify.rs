//! Neighborhood classification: find branch tips and debris.
//!
//! Every foreground pixel of the working copy is classified by its number
//! of foreground neighbors. Only two sets leave this stage: end-points
//! (exactly one neighbor), which seed branch tracing, and debris (no
//! neighbors), which is swept unconditionally. Junction status is decided
//! later, during tracing.

use serde::{Deserialize, Serialize};

use crate::graph::{JUNCTION_NEIGHBOR_THRESHOLD, SkeletonGraph};
use crate::types::Pixel;

/// Role of a foreground pixel, by neighbor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelRole {
    /// No foreground neighbors.
    Debris,
    /// Exactly one foreground neighbor: a branch tip.
    EndPoint,
    /// Two or three neighbors: a curve continuation.
    Interior,
    /// More than [`JUNCTION_NEIGHBOR_THRESHOLD`] neighbors.
    Junction,
}

impl PixelRole {
    /// Classify a pixel from its neighbor count.
    #[must_use]
    pub const fn from_neighbor_count(count: usize) -> Self {
        match count {
            0 => Self::Debris,
            1 => Self::EndPoint,
            n if n > JUNCTION_NEIGHBOR_THRESHOLD => Self::Junction,
            _ => Self::Interior,
        }
    }
}

/// End-points and debris of a skeleton, each in raster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Pixels with exactly one foreground neighbor.
    pub end_points: Vec<Pixel>,
    /// Isolated pixels with no foreground neighbors.
    pub debris: Vec<Pixel>,
}

/// Classify every node of the graph.
#[must_use]
pub fn classify(graph: &SkeletonGraph) -> Classification {
    let mut classification = Classification::default();
    for pixel in graph.pixels() {
        match PixelRole::from_neighbor_count(graph.degree(pixel)) {
            PixelRole::EndPoint => classification.end_points.push(pixel),
            PixelRole::Debris => classification.debris.push(pixel),
            PixelRole::Interior | PixelRole::Junction => {}
        }
    }
    classification
}

/// Number of junction pixels in the graph.
#[must_use]
pub fn count_junctions(graph: &SkeletonGraph) -> usize {
    graph.pixels().filter(|&p| graph.is_junction(p)).count()
}
