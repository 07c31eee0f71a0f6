//! motionmap-core: Core types for point cloud clustering and tracking.
//!
//! This crate provides the foundational data model shared by the
//! segmentation, tracking and scheduling crates: world-space points,
//! the per-frame point buffer, raw and tracked clusters, and the
//! lifecycle events emitted after each clustering pass.
//!

pub mod buffer;
pub mod cluster;
pub mod clustering;
pub mod error;
pub mod point;

pub use buffer::PointBuffer;
pub use cluster::{ClusterEvent, ClusterId, RawCluster, TrackedCluster};
pub use clustering::{ClusteringConfig, ClusteringStatistics};
pub use error::{ClusteringError, Error, Result};
pub use point::{Bounds, Point};
