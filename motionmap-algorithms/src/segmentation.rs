//! Flood-fill segmentation over the radius graph.
//!
//! Two points are connected when they lie within `cluster_max_dist` of each
//! other; each connected component is a candidate cluster. Components
//! smaller than `min_cluster_size` are reported as noise.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::spatial::KdTree;
use motionmap_core::clustering::{ClusteringConfig, ClusteringError};
use motionmap_core::{Point, RawCluster};

/// Queue entries processed between two cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Reusable buffers for segmentation, kept across frames.
#[derive(Debug, Default)]
pub struct SegmentationState {
    visited: Vec<bool>,
    queue: Vec<usize>,
    neighbors: Vec<usize>,
}

/// Output of one segmentation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationOutcome {
    /// Clusters at or above the minimum size, in discovery order.
    pub clusters: Vec<RawCluster>,
    /// Points belonging to components below the minimum size.
    pub noise_points: usize,
}

/// Region-growing segmentation driven by k-d tree radius queries.
#[derive(Debug, Clone)]
pub struct Segmentation {
    cluster_max_dist: f32,
    min_cluster_size: usize,
}

impl Segmentation {
    /// Creates a segmentation pass with the given thresholds.
    #[must_use]
    pub fn new(cluster_max_dist: f32, min_cluster_size: usize) -> Self {
        Self {
            cluster_max_dist,
            min_cluster_size,
        }
    }

    /// Creates a segmentation pass from a clustering configuration.
    #[must_use]
    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.cluster_max_dist, config.min_cluster_size)
    }

    /// Creates fresh reusable buffers.
    #[must_use]
    pub fn create_state(&self) -> SegmentationState {
        SegmentationState::default()
    }

    /// Splits `points` into connected components using `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusteringError::IndexMismatch`] if `index` was not built
    /// over `points`.
    pub fn segment(
        &self,
        points: &[Point],
        index: &KdTree,
        state: &mut SegmentationState,
    ) -> Result<SegmentationOutcome, ClusteringError> {
        self.run(points, index, state, None)
    }

    /// Like [`Segmentation::segment`], but gives up as soon as `cancel` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ClusteringError::Cancelled`] when `cancel` was observed, or
    /// [`ClusteringError::IndexMismatch`] as for `segment`.
    pub fn segment_cancellable(
        &self,
        points: &[Point],
        index: &KdTree,
        state: &mut SegmentationState,
        cancel: &AtomicBool,
    ) -> Result<SegmentationOutcome, ClusteringError> {
        self.run(points, index, state, Some(cancel))
    }

    fn run(
        &self,
        points: &[Point],
        index: &KdTree,
        state: &mut SegmentationState,
        cancel: Option<&AtomicBool>,
    ) -> Result<SegmentationOutcome, ClusteringError> {
        let n = points.len();
        if index.len() != n {
            return Err(ClusteringError::IndexMismatch {
                index: index.len(),
                points: n,
            });
        }

        let mut outcome = SegmentationOutcome::default();
        if n == 0 {
            return Ok(outcome);
        }

        state.visited.clear();
        state.visited.resize(n, false);

        let is_cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Acquire));

        // `next_seed` only moves forward: everything before it is visited.
        let mut next_seed = 0;
        loop {
            if is_cancelled() {
                return Err(ClusteringError::Cancelled);
            }

            while next_seed < n && state.visited[next_seed] {
                next_seed += 1;
            }
            if next_seed == n {
                break;
            }

            state.queue.clear();
            state.queue.push(next_seed);
            state.visited[next_seed] = true;

            let mut sum = [0.0f64; 3];
            let mut head = 0;
            // The queue grows while it is walked: late neighbours still
            // belong to this component.
            while head < state.queue.len() {
                if head % CANCEL_CHECK_INTERVAL == CANCEL_CHECK_INTERVAL - 1 && is_cancelled() {
                    return Err(ClusteringError::Cancelled);
                }

                let i = state.queue[head];
                head += 1;

                let p = points[i];
                sum[0] += f64::from(p.x);
                sum[1] += f64::from(p.y);
                sum[2] += f64::from(p.z);

                index.query_radius_into(p, self.cluster_max_dist, &mut state.neighbors);
                for &j in &state.neighbors {
                    if j < n && !state.visited[j] {
                        state.visited[j] = true;
                        state.queue.push(j);
                    }
                }
            }

            let count = state.queue.len();
            if count >= self.min_cluster_size {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                let centroid = Point::new(
                    (sum[0] / count as f64) as f32,
                    (sum[1] / count as f64) as f32,
                    (sum[2] / count as f64) as f32,
                );
                let indices = std::mem::take(&mut state.queue);
                outcome.clusters.push(RawCluster::new(indices, centroid));
            } else {
                outcome.noise_points += count;
            }
        }

        Ok(outcome)
    }
}

/// Segments `points` with a throwaway state.
///
/// Convenience wrapper around [`Segmentation::segment`].
///
/// # Errors
///
/// Returns [`ClusteringError::IndexMismatch`] if `index` was not built over
/// `points`.
pub fn segment(
    points: &[Point],
    index: &KdTree,
    cluster_max_dist: f32,
    min_cluster_size: usize,
) -> Result<Vec<RawCluster>, ClusteringError> {
    let segmentation = Segmentation::new(cluster_max_dist, min_cluster_size);
    let mut state = segmentation.create_state();
    segmentation
        .segment(points, index, &mut state)
        .map(|outcome| outcome.clusters)
}
