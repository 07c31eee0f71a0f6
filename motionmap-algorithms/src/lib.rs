//! motionmap-algorithms: Clustering and tracking for depth-sensor point clouds.
//!
//! This crate provides the per-frame pipeline:
//! - **Spatial** - k-d tree rebuilt every frame, radius queries
//! - **Segmentation** - flood fill over the radius graph
//! - **Tracker** - greedy nearest-centroid identity carry-over
//! - **Orientation** - pairwise-difference pointing heuristic
//!
#![warn(missing_docs)]

mod orientation;
mod processing;
mod segmentation;
pub mod spatial;
mod tracker;

pub use orientation::{estimate_orientation, orient_clusters};
pub use processing::{process_frame, PassReport};
pub use segmentation::{segment, Segmentation, SegmentationOutcome, SegmentationState};
pub use spatial::KdTree;
pub use tracker::{track, ClusterTracker, TrackingResult};

// Re-export core clustering types
pub use motionmap_core::clustering::{ClusteringConfig, ClusteringError, ClusteringStatistics};
