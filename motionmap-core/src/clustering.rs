//! Clustering configuration, statistics and errors.

use crate::point::{Bounds, Point};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised by clustering passes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusteringError {
    /// A configuration value is out of range.
    #[error("invalid clustering configuration: {0}")]
    InvalidConfig(String),

    /// The pass was cancelled before it finished.
    #[error("clustering pass cancelled")]
    Cancelled,

    /// The spatial index was built over a different point count.
    #[error("spatial index covers {index} points but the buffer holds {points}")]
    IndexMismatch { index: usize, points: usize },
}

/// Configuration for segmentation, tracking and orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringConfig {
    /// Radius-graph threshold: two points closer than this share a cluster.
    pub cluster_max_dist: f32,
    /// Minimum number of points for a region to count as a cluster.
    pub min_cluster_size: usize,
    /// Fraction of each cluster's points sampled for orientation.
    pub sample_fraction: f32,
    /// Anchor that orientations are made to point away from.
    pub reference_position: Point,
    /// Whether orientation is estimated at all.
    pub compute_orientation: bool,
    /// Optional interaction volume; points outside are dropped on load.
    pub bounds: Option<Bounds>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_max_dist: 0.01,
            min_cluster_size: 1,
            sample_fraction: 0.2,
            reference_position: Point::ZERO,
            compute_orientation: true,
            bounds: None,
        }
    }
}

impl ClusteringConfig {
    /// Creates a new clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the radius-graph distance threshold.
    #[must_use]
    pub fn with_cluster_max_dist(mut self, dist: f32) -> Self {
        self.cluster_max_dist = dist;
        self
    }

    /// Sets the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Sets the orientation sample fraction.
    #[must_use]
    pub fn with_sample_fraction(mut self, fraction: f32) -> Self {
        self.sample_fraction = fraction;
        self
    }

    /// Sets the orientation reference position.
    #[must_use]
    pub fn with_reference_position(mut self, position: Point) -> Self {
        self.reference_position = position;
        self
    }

    /// Enables or disables orientation estimation.
    #[must_use]
    pub fn with_orientation(mut self, enabled: bool) -> Self {
        self.compute_orientation = enabled;
        self
    }

    /// Sets the interaction volume.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ClusteringError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), ClusteringError> {
        if !self.cluster_max_dist.is_finite() || self.cluster_max_dist <= 0.0 {
            return Err(ClusteringError::InvalidConfig(format!(
                "cluster_max_dist must be positive and finite, got {}",
                self.cluster_max_dist
            )));
        }
        if !(0.0..=1.0).contains(&self.sample_fraction) {
            return Err(ClusteringError::InvalidConfig(format!(
                "sample_fraction must be within [0, 1], got {}",
                self.sample_fraction
            )));
        }
        if !self.reference_position.is_finite() {
            return Err(ClusteringError::InvalidConfig(
                "reference_position must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters describing clustering activity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Frames handed to a clustering pass.
    pub frames_submitted: usize,
    /// Frames skipped because a pass was still in flight.
    pub frames_skipped: usize,
    /// Passes whose results were published.
    pub passes_completed: usize,
    /// Passes discarded by cancellation.
    pub passes_cancelled: usize,
    /// Points seen by the most recent pass.
    pub points_processed: usize,
    /// Clusters found by the most recent pass.
    pub clusters_found: usize,
    /// Points treated as noise by the most recent pass.
    pub noise_points: usize,
    /// Duration of the most recent pass, in milliseconds.
    pub last_pass_ms: f64,
}

impl ClusteringStatistics {
    /// Folds the per-pass fields of `pass` into these cumulative counters.
    pub fn record_pass(&mut self, pass: &ClusteringStatistics) {
        self.passes_completed += 1;
        self.points_processed = pass.points_processed;
        self.clusters_found = pass.clusters_found;
        self.noise_points = pass.noise_points;
        self.last_pass_ms = pass.last_pass_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clustering_config() {
        let config = ClusteringConfig::new()
            .with_cluster_max_dist(0.1)
            .with_min_cluster_size(5)
            .with_sample_fraction(0.5)
            .with_reference_position(Point::new(0.0, 1.0, 0.0))
            .with_orientation(false);

        assert!((config.cluster_max_dist - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.min_cluster_size, 5);
        assert!((config.sample_fraction - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.reference_position, Point::new(0.0, 1.0, 0.0));
        assert!(!config.compute_orientation);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_dist = ClusteringConfig::new().with_cluster_max_dist(0.0);
        assert!(matches!(
            bad_dist.validate(),
            Err(ClusteringError::InvalidConfig(_))
        ));

        let bad_fraction = ClusteringConfig::new().with_sample_fraction(1.5);
        assert!(bad_fraction.validate().is_err());

        let bad_reference =
            ClusteringConfig::new().with_reference_position(Point::new(f32::NAN, 0.0, 0.0));
        assert!(bad_reference.validate().is_err());
    }

    #[test]
    fn test_record_pass() {
        let mut total = ClusteringStatistics {
            frames_submitted: 3,
            ..Default::default()
        };
        let pass = ClusteringStatistics {
            points_processed: 100,
            clusters_found: 2,
            noise_points: 4,
            last_pass_ms: 1.5,
            ..Default::default()
        };
        total.record_pass(&pass);
        total.record_pass(&pass);

        assert_eq!(total.passes_completed, 2);
        assert_eq!(total.frames_submitted, 3);
        assert_eq!(total.clusters_found, 2);
        assert_eq!(total.noise_points, 4);
    }
}
