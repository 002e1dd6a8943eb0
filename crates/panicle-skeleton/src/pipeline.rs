//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::prune_staged`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use panicle_skeleton::{GrayImage, Pipeline, PruneConfig, PruneError};
//! # fn run(skeleton: GrayImage) -> Result<(), PruneError> {
//! let traced = Pipeline::new(skeleton, PruneConfig::with_min_branch_length(5))
//!     .prepare()?
//!     .classify()
//!     .trace();
//! println!("{} branches", traced.branches().len());
//!
//! let staged = traced.prune().into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next stage, carrying
//! all previously computed intermediates.

use image::GrayImage;

use crate::classify::{self, Classification};
use crate::diagnostics::{self, StageMetrics};
use crate::graph::SkeletonGraph;
use crate::prune::{self, PruneCounts};
use crate::raster;
use crate::trace::{self, Trace};
use crate::types::{Branch, Dimensions, PruneConfig, PruneError, StagedResult};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over `skeleton`. Nothing is validated until
    /// [`Pending::prepare`].
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(skeleton: GrayImage, config: PruneConfig) -> Pending {
        Pending { config, skeleton }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing.
#[must_use = "pipeline stages are consumed by advancing; call .prepare() to continue"]
pub struct Pending {
    config: PruneConfig,
    skeleton: GrayImage,
}

impl Pending {
    /// The caller's skeleton.
    pub const fn skeleton(&self) -> &GrayImage {
        &self.skeleton
    }

    /// Validate the config and raster, then build the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`PruneError::InvalidConfig`] for a zero foreground marker
    /// and [`PruneError::InvalidInput`] if any pixel is neither 0 nor the
    /// marker.
    pub fn prepare(self) -> Result<Prepared, PruneError> {
        self.config.validate()?;
        raster::validate_binary(&self.skeleton, self.config.foreground)?;

        log::info!(
            "pruning {}x{} skeleton, min branch length {}",
            self.skeleton.width(),
            self.skeleton.height(),
            self.config.min_branch_length,
        );

        let working = raster::working_copy(&self.skeleton);
        let foreground_pixels = raster::count_foreground(&self.skeleton);
        let border_pixels_cleared = foreground_pixels - raster::count_foreground(&working);
        if border_pixels_cleared > 0 {
            log::debug!("cleared {border_pixels_cleared} foreground pixels on the border");
        }

        Ok(Prepared {
            dimensions: Dimensions::of(&self.skeleton),
            config: self.config,
            original: self.skeleton,
            working,
            foreground_pixels,
            border_pixels_cleared,
        })
    }
}

// ───────────────────────── Stage 1: Prepared ─────────────────────────

/// Pipeline state after validation.
#[must_use = "pipeline stages are consumed by advancing; call .classify() to continue"]
pub struct Prepared {
    config: PruneConfig,
    original: GrayImage,
    working: GrayImage,
    foreground_pixels: u64,
    border_pixels_cleared: u64,
    dimensions: Dimensions,
}

impl Prepared {
    /// The border-zeroed working copy.
    pub const fn working(&self) -> &GrayImage {
        &self.working
    }

    /// Metrics for this stage.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Prepare {
            width: self.dimensions.width,
            height: self.dimensions.height,
            foreground_pixels: self.foreground_pixels,
            border_pixels_cleared: self.border_pixels_cleared,
        }
    }

    /// Build the skeleton graph and classify its pixels.
    pub fn classify(self) -> Classified {
        let graph = SkeletonGraph::from_working_copy(&self.working);
        let classification = classify::classify(&graph);
        log::debug!(
            "classified {} pixels: {} end-points, {} debris",
            graph.node_count(),
            classification.end_points.len(),
            classification.debris.len(),
        );
        Classified {
            config: self.config,
            original: self.original,
            working: self.working,
            graph,
            classification,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: Classified ───────────────────────

/// Pipeline state after neighborhood classification.
#[must_use = "pipeline stages are consumed by advancing; call .trace() to continue"]
pub struct Classified {
    config: PruneConfig,
    original: GrayImage,
    working: GrayImage,
    graph: SkeletonGraph,
    classification: Classification,
    dimensions: Dimensions,
}

impl Classified {
    /// End-points and debris.
    pub const fn classification(&self) -> &Classification {
        &self.classification
    }

    /// The skeleton graph.
    pub const fn graph(&self) -> &SkeletonGraph {
        &self.graph
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Classify {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            end_points: self.classification.end_points.len(),
            debris: self.classification.debris.len(),
            junctions: classify::count_junctions(&self.graph),
        }
    }

    /// Trace a branch from every end-point.
    pub fn trace(self) -> Traced {
        let trace = trace::trace_branches(&self.graph, &self.classification.end_points);
        log::debug!(
            "traced {} branches ({} tips already claimed)",
            trace.branches.len(),
            trace.skipped_tips.len(),
        );
        Traced {
            config: self.config,
            original: self.original,
            working: self.working,
            classification: self.classification,
            trace,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 3: Traced ───────────────────────────

/// Pipeline state after branch tracing.
#[must_use = "pipeline stages are consumed by advancing; call .prune() to continue"]
pub struct Traced {
    config: PruneConfig,
    original: GrayImage,
    working: GrayImage,
    classification: Classification,
    trace: Trace,
    dimensions: Dimensions,
}

impl Traced {
    /// The traced branches.
    pub fn branches(&self) -> &[Branch] {
        &self.trace.branches
    }

    /// The full trace, including the parent map.
    pub const fn trace_output(&self) -> &Trace {
        &self.trace
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        let stats = diagnostics::branch_stats(&self.trace.branches);
        StageMetrics::Trace {
            tips_skipped: self.trace.skipped_tips.len(),
            branch_count: self.trace.branches.len(),
            min_branch_length: stats.min,
            max_branch_length: stats.max,
            mean_branch_length: stats.mean,
        }
    }

    /// Clear short branches and debris in a copy of the original.
    pub fn prune(self) -> Pruned {
        let (pruned, counts) = prune::apply(
            &self.original,
            &self.trace.branches,
            &self.classification.debris,
            self.config.min_branch_length,
        );
        log::debug!(
            "removed {} branches ({} px) and {} debris pixels",
            counts.branches_removed,
            counts.branch_pixels_cleared,
            counts.debris_cleared,
        );
        Pruned {
            config: self.config,
            original: self.original,
            working: self.working,
            classification: self.classification,
            trace: self.trace,
            pruned,
            counts,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 4: Pruned ───────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the pruned skeleton"]
pub struct Pruned {
    config: PruneConfig,
    original: GrayImage,
    working: GrayImage,
    classification: Classification,
    trace: Trace,
    pruned: GrayImage,
    counts: PruneCounts,
    dimensions: Dimensions,
}

impl Pruned {
    /// The cleaned skeleton.
    pub const fn pruned(&self) -> &GrayImage {
        &self.pruned
    }

    /// What pruning changed.
    pub const fn counts(&self) -> PruneCounts {
        self.counts
    }

    /// Metrics for this stage.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Prune {
            threshold: self.config.min_branch_length,
            branches_removed: self.counts.branches_removed,
            branch_pixels_cleared: self.counts.branch_pixels_cleared,
            debris_cleared: self.counts.debris_cleared,
        }
    }

    /// Consume the pipeline and return every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            original: self.original,
            working: self.working,
            classification: self.classification,
            parents: self.trace.parents,
            branches: self.trace.branches,
            pruned: self.pruned,
            min_branch_length: self.config.min_branch_length,
            dimensions: self.dimensions,
        }
    }
}
