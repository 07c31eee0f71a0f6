//! High-level helper that runs one full clustering pass over a frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;

use crate::orientation::orient_clusters;
use crate::segmentation::{Segmentation, SegmentationState};
use crate::spatial::KdTree;
use crate::tracker::track;
use motionmap_core::clustering::{ClusteringConfig, ClusteringError, ClusteringStatistics};
use motionmap_core::{ClusterEvent, Point, TrackedCluster};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything a completed pass publishes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassReport {
    /// Live clusters after the pass.
    pub clusters: Vec<TrackedCluster>,
    /// Removals, then additions, then updates.
    pub events: Vec<ClusterEvent>,
    /// Per-pass counters.
    pub statistics: ClusteringStatistics,
}

/// Segments, tracks and orients one frame.
///
/// `index` must have been built over `points`. `prior` is the live cluster
/// set from the previous completed pass.
///
/// # Errors
///
/// Returns [`ClusteringError::Cancelled`] if `cancel` was set at any
/// checkpoint, or [`ClusteringError::IndexMismatch`] for a stale index.
pub fn process_frame(
    points: &[Point],
    index: &KdTree,
    prior: &[TrackedCluster],
    config: &ClusteringConfig,
    state: &mut SegmentationState,
    cancel: Option<&AtomicBool>,
) -> Result<PassReport, ClusteringError> {
    let start = Instant::now();
    let check_cancel = || {
        if cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
            Err(ClusteringError::Cancelled)
        } else {
            Ok(())
        }
    };

    let segmentation = Segmentation::from_config(config);
    let outcome = match cancel {
        Some(flag) => segmentation.segment_cancellable(points, index, state, flag)?,
        None => segmentation.segment(points, index, state)?,
    };
    let noise_points = outcome.noise_points;
    check_cancel()?;

    let mut result = track(outcome.clusters, prior);
    check_cancel()?;

    if config.compute_orientation {
        orient_clusters(
            &mut result.tracked,
            points,
            config.reference_position,
            config.sample_fraction,
        );
        check_cancel()?;
    }

    let events = result.events();
    let statistics = ClusteringStatistics {
        points_processed: points.len(),
        clusters_found: result.tracked.len(),
        noise_points,
        last_pass_ms: start.elapsed().as_secs_f64() * 1000.0,
        ..Default::default()
    };

    debug!(
        "clustered {} points into {} clusters (+{} -{}) in {:.2}ms",
        points.len(),
        result.tracked.len(),
        result.added.len(),
        result.removed.len(),
        statistics.last_pass_ms
    );

    Ok(PassReport {
        clusters: result.tracked,
        events,
        statistics,
    })
}
