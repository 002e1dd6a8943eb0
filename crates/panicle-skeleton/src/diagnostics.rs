//! Pruning diagnostics: timing and counts for each stage.
//!
//! Every call to [`prune_with_diagnostics`] collects diagnostics alongside
//! the staged result. The library never reads a clock itself; callers
//! inject one through the [`Clock`] trait so the crate stays sans-IO.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{Branch, PruneConfig, PruneError, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pruning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneDiagnostics {
    /// Stage 1: validation and working copy.
    pub prepare: StageDiagnostics,
    /// Stage 2: graph construction and neighborhood classification.
    pub classify: StageDiagnostics,
    /// Stage 3: branch tracing.
    pub trace: StageDiagnostics,
    /// Stage 4: pruning and sweeping.
    pub prune: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PruneSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Validation and working copy.
    Prepare {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Foreground pixels in the input.
        foreground_pixels: u64,
        /// Foreground pixels cleared from the border of the working copy.
        border_pixels_cleared: u64,
    },
    /// Graph construction and classification.
    Classify {
        /// Foreground pixels in the working copy.
        node_count: usize,
        /// Adjacent foreground pixel pairs.
        edge_count: usize,
        /// Pixels with exactly one neighbor.
        end_points: usize,
        /// Isolated pixels.
        debris: usize,
        /// Pixels above the junction threshold.
        junctions: usize,
    },
    /// Branch tracing.
    Trace {
        /// End-points already claimed by an earlier walk.
        tips_skipped: usize,
        /// Branches traced, one per unclaimed end-point.
        branch_count: usize,
        /// Shortest branch, in pixels.
        min_branch_length: usize,
        /// Longest branch, in pixels.
        max_branch_length: usize,
        /// Mean branch length, in pixels.
        mean_branch_length: f64,
    },
    /// Pruning and sweeping.
    Prune {
        /// Minimum branch length applied.
        threshold: usize,
        /// Branches shorter than the threshold.
        branches_removed: usize,
        /// Pixels cleared by branch pruning.
        branch_pixels_cleared: u64,
        /// Pixels cleared by debris sweeping.
        debris_cleared: u64,
    },
}

/// High-level summary of a pruning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneSummary {
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Foreground pixels before pruning.
    pub foreground_before: u64,
    /// Foreground pixels after pruning.
    pub foreground_after: u64,
    /// 8-connected foreground components before pruning.
    pub components_before: u32,
    /// 8-connected foreground components after pruning.
    pub components_after: u32,
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// # Errors
///
/// Same as [`crate::prune_staged`].
pub fn prune_with_diagnostics<C: Clock>(
    skeleton: &GrayImage,
    config: &PruneConfig,
    clock: &C,
) -> Result<(StagedResult, PruneDiagnostics), PruneError> {
    let start = clock.now();

    let t = clock.now();
    let prepared = Pipeline::new(skeleton.clone(), config.clone()).prepare()?;
    let prepare = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: prepared.metrics(),
    };

    let t = clock.now();
    let classified = prepared.classify();
    let classify = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: classified.metrics(),
    };

    let t = clock.now();
    let traced = classified.trace();
    let trace = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: traced.metrics(),
    };

    let t = clock.now();
    let pruned = traced.prune();
    let prune = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: pruned.metrics(),
    };

    let staged = pruned.into_result();
    let total_duration = clock.elapsed(&start);

    let summary = PruneSummary {
        image_width: staged.dimensions.width,
        image_height: staged.dimensions.height,
        foreground_before: crate::raster::count_foreground(&staged.original),
        foreground_after: crate::raster::count_foreground(&staged.pruned),
        components_before: count_components(&staged.original),
        components_after: count_components(&staged.pruned),
    };

    Ok((
        staged,
        PruneDiagnostics {
            prepare,
            classify,
            trace,
            prune,
            total_duration,
            summary,
        },
    ))
}

impl PruneDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Prune Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}",
            self.summary.image_width, self.summary.image_height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Prepare", &self.prepare),
            ("Classify", &self.classify),
            ("Trace", &self.trace),
            ("Prune", &self.prune),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Foreground: {} -> {}  |  Components: {} -> {}",
            self.summary.foreground_before,
            self.summary.foreground_after,
            self.summary.components_before,
            self.summary.components_after,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Prepare {
            width,
            height,
            foreground_pixels,
            border_pixels_cleared,
        } => format!("{width}x{height} fg={foreground_pixels} border_cleared={border_pixels_cleared}"),
        StageMetrics::Classify {
            node_count,
            edge_count,
            end_points,
            debris,
            junctions,
        } => format!(
            "{node_count} nodes, {edge_count} links, ends={end_points} debris={debris} junctions={junctions}"
        ),
        StageMetrics::Trace {
            tips_skipped,
            branch_count,
            min_branch_length,
            max_branch_length,
            mean_branch_length,
        } => format!(
            "{branch_count} branches, {tips_skipped} tips already claimed, len min={min_branch_length} max={max_branch_length} mean={mean_branch_length:.1}"
        ),
        StageMetrics::Prune {
            threshold,
            branches_removed,
            branch_pixels_cleared,
            debris_cleared,
        } => format!(
            "min_len={threshold} removed {branches_removed} branches ({branch_pixels_cleared} px), debris={debris_cleared}"
        ),
    }
}

/// Branch length statistics.
pub(crate) struct BranchStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

/// Compute length statistics over a set of branches.
pub(crate) fn branch_stats(branches: &[Branch]) -> BranchStats {
    let total: usize = branches.iter().map(Branch::len).sum();
    let min = branches.iter().map(Branch::len).min().unwrap_or(0);
    let max = branches.iter().map(Branch::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if branches.is_empty() {
        0.0
    } else {
        total as f64 / branches.len() as f64
    };
    BranchStats { min, max, mean }
}

/// Number of 8-connected foreground components.
pub(crate) fn count_components(image: &GrayImage) -> u32 {
    connected_components(image, Connectivity::Eight, Luma([0]))
        .pixels()
        .map(|p| p.0[0])
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Pixel, Terminal};

    /// Deterministic clock: every reading advances one millisecond.
    struct StepClock(std::cell::Cell<u64>);

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get() + 1;
            self.0.set(t);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn t_shape() -> GrayImage {
        let mut img = GrayImage::new(7, 7);
        for (row, col) in [(1, 3), (2, 3), (3, 3), (4, 3), (5, 3), (3, 4), (3, 5)] {
            img.put_pixel(col, row, Luma([255]));
        }
        img
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn branch_stats_empty() {
        let stats = branch_stats(&[]);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert!(stats.mean.abs() < f64::EPSILON);
    }

    #[test]
    fn branch_stats_computes() {
        let branches = vec![
            Branch::new(vec![Pixel::new(1, 1), Pixel::new(1, 2)], Terminal::DeadEnd),
            Branch::new(
                vec![
                    Pixel::new(3, 1),
                    Pixel::new(3, 2),
                    Pixel::new(3, 3),
                    Pixel::new(3, 4),
                ],
                Terminal::DeadEnd,
            ),
        ];
        let stats = branch_stats(&branches);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 4);
        assert!((stats.mean - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn components_counted_with_eight_connectivity() {
        let mut img = GrayImage::new(8, 8);
        img.put_pixel(1, 1, Luma([255]));
        img.put_pixel(2, 2, Luma([255])); // diagonal, same component
        img.put_pixel(5, 5, Luma([255]));
        assert_eq!(count_components(&img), 2);
        assert_eq!(count_components(&GrayImage::new(4, 4)), 0);
    }

    #[test]
    fn diagnostics_for_t_shape() {
        let clock = StepClock(std::cell::Cell::new(0));
        let (staged, diag) =
            prune_with_diagnostics(&t_shape(), &PruneConfig::with_min_branch_length(3), &clock)
                .unwrap();

        assert_eq!(
            diag.classify.metrics,
            StageMetrics::Classify {
                node_count: 7,
                edge_count: 8,
                end_points: 3,
                debris: 0,
                junctions: 1,
            }
        );
        assert_eq!(
            diag.prune.metrics,
            StageMetrics::Prune {
                threshold: 3,
                branches_removed: 1,
                branch_pixels_cleared: 2,
                debris_cleared: 0,
            }
        );
        assert_eq!(diag.summary.foreground_before, 7);
        assert_eq!(diag.summary.foreground_after, 5);
        assert_eq!(diag.summary.components_before, 1);
        assert_eq!(diag.summary.components_after, 1);
        assert_eq!(crate::raster::count_foreground(&staged.pruned), 5);
        assert!(diag.total_duration >= diag.prune.duration);
    }

    #[test]
    fn report_produces_nonempty_string() {
        let clock = StepClock(std::cell::Cell::new(0));
        let (_, diag) =
            prune_with_diagnostics(&t_shape(), &PruneConfig::default(), &clock).unwrap();
        let report = diag.report();
        assert!(report.contains("Prune Diagnostics Report"));
        assert!(report.contains("Classify"));
        assert!(report.contains("min_len=10"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let clock = StepClock(std::cell::Cell::new(0));
        let (_, diag) =
            prune_with_diagnostics(&t_shape(), &PruneConfig::default(), &clock).unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: PruneDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, diag.summary);
        assert_eq!(back.trace.metrics, diag.trace.metrics);
        assert!((duration_ms(back.total_duration) - duration_ms(diag.total_duration)).abs() < 1e-3);
    }
}
