//! Frame-to-frame cluster correspondence.
//!
//! Matching is greedy: each raw cluster, in arrival order, takes the
//! nearest prior cluster that nothing has claimed yet. There is no distance
//! cutoff, so a cluster that jumps across the scene still inherits the
//! nearest free identifier.

use std::collections::HashSet;

use motionmap_core::{ClusterEvent, ClusterId, RawCluster, TrackedCluster};

/// Result of matching one frame's raw clusters against the prior frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingResult {
    /// Live clusters after this frame, in raw-cluster arrival order.
    pub tracked: Vec<TrackedCluster>,
    /// Identifiers assigned this frame.
    pub added: Vec<ClusterId>,
    /// Identifiers of prior clusters nothing matched.
    pub removed: Vec<ClusterId>,
}

impl TrackingResult {
    /// Lifecycle events for this frame.
    ///
    /// Removals come first, then additions, then one update for every live
    /// cluster. Call after orientation has been filled in so the events
    /// carry the final state.
    #[must_use]
    pub fn events(&self) -> Vec<ClusterEvent> {
        let mut events =
            Vec::with_capacity(self.removed.len() + self.added.len() + self.tracked.len());

        events.extend(self.removed.iter().map(|&id| ClusterEvent::Removed { id }));

        for &id in &self.added {
            if let Some(cluster) = self.tracked.iter().find(|c| c.id == id) {
                events.push(ClusterEvent::added(cluster));
            }
        }

        events.extend(self.tracked.iter().map(ClusterEvent::updated));
        events
    }
}

/// Stateful tracker holding the live cluster set between frames.
#[derive(Debug, Clone, Default)]
pub struct ClusterTracker {
    clusters: Vec<TrackedCluster>,
}

impl ClusterTracker {
    /// Creates a tracker with no live clusters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live clusters.
    #[must_use]
    pub fn clusters(&self) -> &[TrackedCluster] {
        &self.clusters
    }

    /// Matches `raw` against the live set without modifying it.
    #[must_use]
    pub fn track(&self, raw: Vec<RawCluster>) -> TrackingResult {
        track(raw, &self.clusters)
    }

    /// Replaces the live set with a completed frame's clusters.
    pub fn commit(&mut self, clusters: Vec<TrackedCluster>) {
        self.clusters = clusters;
    }

    /// Matches `raw`, commits the result and returns it.
    pub fn update(&mut self, raw: Vec<RawCluster>) -> TrackingResult {
        let result = self.track(raw);
        self.commit(result.tracked.clone());
        result
    }

    /// Drops every live cluster, returning their identifiers.
    pub fn reset(&mut self) -> Vec<ClusterId> {
        self.clusters.drain(..).map(|c| c.id).collect()
    }
}

/// Matches `raw` against `prior` by nearest centroid.
#[must_use]
pub fn track(raw: Vec<RawCluster>, prior: &[TrackedCluster]) -> TrackingResult {
    let mut claimed = vec![false; prior.len()];
    let mut matches: Vec<Option<ClusterId>> = Vec::with_capacity(raw.len());

    for cluster in &raw {
        let mut best: Option<(usize, f32)> = None;
        for (j, candidate) in prior.iter().enumerate() {
            if claimed[j] {
                continue;
            }
            let dist = candidate.centroid.distance_squared(&cluster.centroid);
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((j, dist));
            }
        }

        matches.push(best.map(|(j, _)| {
            claimed[j] = true;
            prior[j].id
        }));
    }

    let mut in_use: HashSet<ClusterId> = matches.iter().flatten().copied().collect();
    let mut added = Vec::new();
    let tracked = raw
        .into_iter()
        .zip(matches)
        .map(|(cluster, matched)| {
            let id = matched.unwrap_or_else(|| {
                let id = lowest_free_id(&in_use);
                in_use.insert(id);
                added.push(id);
                id
            });
            TrackedCluster::from_raw(id, cluster)
        })
        .collect();

    let removed = prior
        .iter()
        .zip(&claimed)
        .filter(|(_, was_claimed)| !**was_claimed)
        .map(|(cluster, _)| cluster.id)
        .collect();

    TrackingResult {
        tracked,
        added,
        removed,
    }
}

fn lowest_free_id(in_use: &HashSet<ClusterId>) -> ClusterId {
    let mut id = 0;
    while in_use.contains(&id) {
        id += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionmap_core::Point;

    fn raw_at(x: f32) -> RawCluster {
        RawCluster::new(vec![0, 1, 2], Point::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_first_frame_assigns_from_zero() {
        let result = track(vec![raw_at(0.0), raw_at(1.0), raw_at(2.0)], &[]);
        let ids: Vec<_> = result.tracked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(result.added, vec![0, 1, 2]);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_ids_follow_nearest_centroid() {
        let first = track(vec![raw_at(0.0), raw_at(1.0)], &[]);
        // Arrival order swapped, small drift
        let second = track(vec![raw_at(1.05), raw_at(0.02)], &first.tracked);

        assert_eq!(second.tracked[0].id, 1);
        assert_eq!(second.tracked[1].id, 0);
        assert!(second.added.is_empty());
        assert!(second.removed.is_empty());
    }

    #[test]
    fn test_prior_cluster_claimed_once() {
        let first = track(vec![raw_at(0.0)], &[]);
        let second = track(vec![raw_at(0.1), raw_at(0.2)], &first.tracked);

        assert_eq!(second.tracked[0].id, 0);
        assert_eq!(second.tracked[1].id, 1);
        assert_eq!(second.added, vec![1]);
    }

    #[test]
    fn test_no_distance_cutoff() {
        let first = track(vec![raw_at(0.0)], &[]);
        let second = track(vec![raw_at(100.0)], &first.tracked);
        assert_eq!(second.tracked[0].id, 0);
        assert!(second.added.is_empty());
    }

    #[test]
    fn test_lowest_free_id_is_reused() {
        let first = track(vec![raw_at(0.0), raw_at(1.0), raw_at(2.0)], &[]);
        // Cluster 0 disappears
        let second = track(vec![raw_at(1.0), raw_at(2.0)], &first.tracked);
        assert_eq!(second.removed, vec![0]);

        let third = track(
            vec![raw_at(1.0), raw_at(2.0), raw_at(5.0)],
            &second.tracked,
        );
        assert_eq!(third.added, vec![0]);
    }

    #[test]
    fn test_event_order() {
        let first = track(vec![raw_at(0.0), raw_at(10.0)], &[]);
        let mut prior = first.tracked.clone();
        prior.truncate(1);
        prior[0].id = 4;

        let second = track(vec![raw_at(0.0), raw_at(20.0)], &prior);
        let events = second.events();

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ClusterEvent::Added { id: 0, .. }));
        assert!(matches!(events[1], ClusterEvent::Updated { id: 4, .. }));
        assert!(matches!(events[2], ClusterEvent::Updated { id: 0, .. }));

        let third = track(Vec::new(), &second.tracked);
        let events = third.events();
        assert_eq!(
            events,
            vec![ClusterEvent::Removed { id: 4 }, ClusterEvent::Removed { id: 0 }]
        );
    }

    #[test]
    fn test_tracker_update_commits() {
        let mut tracker = ClusterTracker::new();
        tracker.update(vec![raw_at(0.0)]);
        assert_eq!(tracker.clusters().len(), 1);

        let result = tracker.update(Vec::new());
        assert_eq!(result.removed, vec![0]);
        assert!(tracker.clusters().is_empty());

        tracker.update(vec![raw_at(3.0)]);
        assert_eq!(tracker.reset(), vec![0]);
    }
}
