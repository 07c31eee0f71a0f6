//! Coarse pointing-direction estimate per cluster.
//!
//! The direction comes from pairwise differences over a deterministic prefix
//! of the cluster's points, then its sign is chosen so that it points away
//! from a known reference position. There is no temporal smoothing; clusters
//! close to the disambiguation boundary can flip from one frame to the next.

use rayon::prelude::*;

use motionmap_core::{Point, TrackedCluster};

/// Estimates the orientation of `cluster` from its member points.
///
/// Samples the first `floor(sample_fraction * point_count)` members.
/// Returns [`Point::ZERO`] when the cluster has at most one point or the
/// sample carries no usable direction; callers must check the magnitude
/// before dividing by it.
#[must_use]
pub fn estimate_orientation(
    cluster: &TrackedCluster,
    points: &[Point],
    reference: Point,
    sample_fraction: f32,
) -> Point {
    let count = cluster.point_count();
    if count <= 1 {
        return Point::ZERO;
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let sample_len = ((sample_fraction.clamp(0.0, 1.0) * count as f32) as usize).min(count);

    let sample: Vec<Point> = cluster.indices[..sample_len]
        .iter()
        .filter_map(|&i| points.get(i).copied())
        .collect();

    let mut main = Point::ZERO;
    let mut magnitude = Point::ZERO;
    for (i, &a) in sample.iter().enumerate() {
        if a == Point::ZERO {
            continue;
        }
        for &b in &sample[i + 1..] {
            if b == Point::ZERO || a == b {
                continue;
            }
            main += b - a;
            // Accumulates the running sum's magnitude, not the pair's.
            magnitude += main.abs();
        }
    }

    let mut direction = magnitude.normalize_or_zero();
    if direction == Point::ZERO {
        return Point::ZERO;
    }

    for axis in 0..3 {
        if main.axis(axis) >= 0.0 {
            let v = direction.axis_mut(axis);
            *v = -*v;
        }
    }

    let centroid = cluster.centroid;
    if (centroid + direction).distance(&reference) < centroid.distance(&reference) {
        direction = -direction;
    }

    direction
}

/// Fills in the orientation of every cluster, in parallel.
pub fn orient_clusters(
    clusters: &mut [TrackedCluster],
    points: &[Point],
    reference: Point,
    sample_fraction: f32,
) {
    clusters.par_iter_mut().for_each(|cluster| {
        cluster.orientation = estimate_orientation(cluster, points, reference, sample_fraction);
    });
}
