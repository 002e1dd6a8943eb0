//! Sparse skeleton graph inferred from 8-connected raster adjacency.
//!
//! Nodes are foreground pixels of the working copy; an edge joins every
//! pair of pixels that touch (including diagonally). The graph is built
//! once with a single neighborhood scan, after which classification and
//! tracing are pure degree and adjacency queries.
//!
//! Nodes are inserted in raster order, so iterating node indices visits
//! pixels in raster order too.

use std::collections::HashMap;

use image::GrayImage;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::raster;
use crate::types::{Dimensions, Pixel};

/// A pixel is a junction when it has more than this many foreground
/// neighbors (center excluded). Equivalently, its 3×3 window sum exceeds
/// `(JUNCTION_NEIGHBOR_THRESHOLD + 1) * marker`.
pub const JUNCTION_NEIGHBOR_THRESHOLD: usize = 3;

/// Foreground pixels of a working copy and their 8-connected adjacency.
#[derive(Debug, Clone)]
pub struct SkeletonGraph {
    graph: UnGraph<Pixel, ()>,
    index: HashMap<Pixel, NodeIndex>,
    dimensions: Dimensions,
}

impl SkeletonGraph {
    /// Build the graph from a border-zeroed working copy.
    ///
    /// Each pixel links to the neighbors that come after it in raster
    /// order, so every adjacency is inserted exactly once.
    #[must_use]
    pub fn from_working_copy(working: &GrayImage) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = HashMap::new();

        let pixels: Vec<Pixel> = raster::foreground_pixels(working).collect();
        for &pixel in &pixels {
            index.insert(pixel, graph.add_node(pixel));
        }

        for &pixel in &pixels {
            let Some(&node) = index.get(&pixel) else {
                continue;
            };
            for neighbor in raster::foreground_neighbors(working, pixel) {
                if neighbor > pixel
                    && let Some(&other) = index.get(&neighbor)
                {
                    graph.add_edge(node, other, ());
                }
            }
        }

        Self {
            graph,
            index,
            dimensions: Dimensions::of(working),
        }
    }

    /// Dimensions of the raster the graph was built from.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of adjacent foreground pixel pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `pixel` is a node of the graph.
    #[must_use]
    pub fn contains(&self, pixel: Pixel) -> bool {
        self.index.contains_key(&pixel)
    }

    /// All foreground pixels in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.graph.node_indices().map(|n| self.graph[n])
    }

    /// Number of foreground neighbors of `pixel` (0 for non-nodes).
    #[must_use]
    pub fn degree(&self, pixel: Pixel) -> usize {
        self.index
            .get(&pixel)
            .map_or(0, |&n| self.graph.neighbors(n).count())
    }

    /// Foreground neighbors of `pixel` in raster order.
    ///
    /// `petgraph` yields neighbors in reverse insertion order; sorting by
    /// the row-major `Pixel` ordering restores the 3×3 window scan order.
    #[must_use]
    pub fn neighbors(&self, pixel: Pixel) -> Vec<Pixel> {
        let Some(&node) = self.index.get(&pixel) else {
            return Vec::new();
        };
        let mut neighbors: Vec<Pixel> = self.graph.neighbors(node).map(|n| self.graph[n]).collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Whether `pixel` has more than [`JUNCTION_NEIGHBOR_THRESHOLD`]
    /// neighbors.
    #[must_use]
    pub fn is_junction(&self, pixel: Pixel) -> bool {
        self.degree(pixel) > JUNCTION_NEIGHBOR_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn graph_of(width: u32, height: u32, pixels: &[(u32, u32)]) -> (GrayImage, SkeletonGraph) {
        let mut img = GrayImage::new(width, height);
        for &(row, col) in pixels {
            img.put_pixel(col, row, Luma([255]));
        }
        let working = raster::working_copy(&img);
        let graph = SkeletonGraph::from_working_copy(&working);
        (working, graph)
    }

    #[test]
    fn empty_image_has_no_nodes() {
        let (_, graph) = graph_of(8, 8, &[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.degree(Pixel::new(3, 3)), 0);
        assert!(graph.neighbors(Pixel::new(3, 3)).is_empty());
    }

    #[test]
    fn border_pixels_are_not_nodes() {
        let (_, graph) = graph_of(6, 6, &[(0, 2), (1, 2), (5, 5)]);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.contains(Pixel::new(1, 2)));
        assert!(!graph.contains(Pixel::new(0, 2)));
        assert_eq!(graph.degree(Pixel::new(1, 2)), 0);
    }

    #[test]
    fn segment_edges() {
        let (_, graph) = graph_of(7, 7, &[(3, 2), (3, 3), (3, 4)]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(Pixel::new(3, 2)), 1);
        assert_eq!(graph.degree(Pixel::new(3, 3)), 2);
        assert_eq!(graph.degree(Pixel::new(3, 4)), 1);
    }

    #[test]
    fn degree_matches_raster_neighbor_count() {
        let pixels = [
            (1, 3),
            (2, 3),
            (3, 3),
            (4, 3),
            (5, 3),
            (3, 4),
            (3, 5),
            (2, 5),
            (5, 1),
        ];
        let (working, graph) = graph_of(8, 8, &pixels);
        for pixel in graph.pixels() {
            assert_eq!(
                graph.degree(pixel),
                raster::neighbor_count(&working, pixel),
                "degree mismatch at {pixel:?}"
            );
        }
    }

    #[test]
    fn pixels_iterate_in_raster_order() {
        let (_, graph) = graph_of(8, 8, &[(4, 1), (2, 5), (2, 2), (6, 6)]);
        let pixels: Vec<Pixel> = graph.pixels().collect();
        let mut sorted = pixels.clone();
        sorted.sort_unstable();
        assert_eq!(pixels, sorted);
    }

    #[test]
    fn neighbors_follow_window_scan_order() {
        // Center (3,3) with all eight neighbors set.
        let mut pixels = vec![(3, 3)];
        for r in 2..=4 {
            for c in 2..=4 {
                if (r, c) != (3, 3) {
                    pixels.push((r, c));
                }
            }
        }
        let (_, graph) = graph_of(7, 7, &pixels);
        let expected: Vec<Pixel> = raster::NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dr, dc)| Pixel::new(3u32.wrapping_add_signed(dr), 3u32.wrapping_add_signed(dc)))
            .collect();
        assert_eq!(graph.neighbors(Pixel::new(3, 3)), expected);
    }

    #[test]
    fn junction_needs_more_than_three_neighbors() {
        // Plus sign: center has four 4-connected neighbors.
        let (_, graph) = graph_of(7, 7, &[(3, 3), (2, 3), (4, 3), (3, 2), (3, 4)]);
        assert!(graph.is_junction(Pixel::new(3, 3)));

        // A pixel with exactly three neighbors is not a junction.
        let (_, graph) = graph_of(7, 7, &[(3, 3), (2, 3), (4, 3), (3, 4)]);
        assert_eq!(graph.degree(Pixel::new(3, 3)), 3);
        assert!(!graph.is_junction(Pixel::new(3, 3)));
    }
}
