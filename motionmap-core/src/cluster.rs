//! Cluster data types and lifecycle events.

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable integer handle of a tracked cluster.
pub type ClusterId = u32;

/// A single-frame grouping of spatially connected points.
///
/// Produced by segmentation and consumed by the tracker in the same pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawCluster {
    /// Indices into the frame's point buffer.
    pub indices: Vec<usize>,
    /// Mean position of the member points.
    pub centroid: Point,
}

impl RawCluster {
    /// Creates a raw cluster from its members and centroid.
    #[must_use]
    pub fn new(indices: Vec<usize>, centroid: Point) -> Self {
        Self { indices, centroid }
    }

    /// Number of member points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the cluster has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A cluster with an identity that persists across frames.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackedCluster {
    /// Identifier, unique among live clusters.
    pub id: ClusterId,
    /// Mean position of the member points.
    pub centroid: Point,
    /// Coarse pointing direction (zero when not estimated or degenerate).
    pub orientation: Point,
    /// Indices into the point buffer of the pass that produced this state.
    pub indices: Vec<usize>,
}

impl TrackedCluster {
    /// Promotes a raw cluster to a tracked one with the given identifier.
    #[must_use]
    pub fn from_raw(id: ClusterId, raw: RawCluster) -> Self {
        Self {
            id,
            centroid: raw.centroid,
            orientation: Point::ZERO,
            indices: raw.indices,
        }
    }

    /// Number of member points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.indices.len()
    }
}

/// Lifecycle notification produced by a completed clustering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum ClusterEvent {
    /// A cluster appeared.
    Added {
        /// Newly assigned identifier.
        id: ClusterId,
        /// Centroid at appearance.
        centroid: Point,
        /// Orientation at appearance.
        orientation: Point,
    },
    /// A live cluster's state after the pass.
    Updated {
        /// Identifier.
        id: ClusterId,
        /// Current centroid.
        centroid: Point,
        /// Current orientation.
        orientation: Point,
    },
    /// A cluster disappeared; its identifier is free for reuse.
    Removed {
        /// Released identifier.
        id: ClusterId,
    },
}

impl ClusterEvent {
    /// Identifier the event refers to.
    #[must_use]
    pub fn id(&self) -> ClusterId {
        match *self {
            Self::Added { id, .. } | Self::Updated { id, .. } | Self::Removed { id } => id,
        }
    }

    /// Builds an `Added` event from a tracked cluster.
    #[must_use]
    pub fn added(cluster: &TrackedCluster) -> Self {
        Self::Added {
            id: cluster.id,
            centroid: cluster.centroid,
            orientation: cluster.orientation,
        }
    }

    /// Builds an `Updated` event from a tracked cluster.
    #[must_use]
    pub fn updated(cluster: &TrackedCluster) -> Self {
        Self::Updated {
            id: cluster.id,
            centroid: cluster.centroid,
            orientation: cluster.orientation,
        }
    }
}
