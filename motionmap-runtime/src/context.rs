//! Explicit per-installation clustering context.
//!
//! Owns the reusable point buffer, the scheduler (and through it the tracked
//! cluster set) and the configuration. Every frame-synchronous update goes
//! through [`MotionMapContext::tick`]; there is no process-wide instance.

use log::debug;

use crate::scheduler::{ClusteringScheduler, SubmitOutcome};
use motionmap_core::clustering::{ClusteringConfig, ClusteringStatistics};
use motionmap_core::{ClusterEvent, Point, PointBuffer, Result, TrackedCluster};

/// Clustering state for one sensor stream.
pub struct MotionMapContext {
    config: ClusteringConfig,
    buffer: PointBuffer,
    scheduler: ClusteringScheduler,
}

impl MotionMapContext {
    /// Creates a context whose buffer holds up to `capacity` points per frame.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: ClusteringConfig, capacity: usize) -> Result<Self> {
        config.validate()?;
        debug!(
            "motionmap context: capacity={} max_dist={} min_size={}",
            capacity, config.cluster_max_dist, config.min_cluster_size
        );
        Ok(Self {
            scheduler: ClusteringScheduler::new(config.clone()),
            buffer: PointBuffer::with_capacity(capacity),
            config,
        })
    }

    /// Frame-synchronous update.
    ///
    /// Publishes any pass that finished since the last tick (its events are
    /// returned), then loads `points` and starts a new pass on them if none
    /// is in flight. Non-finite points and points outside the configured
    /// bounds are dropped on load. Never blocks on clustering.
    pub fn tick<I>(&mut self, points: I) -> Vec<ClusterEvent>
    where
        I: IntoIterator<Item = Point>,
    {
        let events = self.drain_events();

        // A running pass works on its own snapshot, so the buffer always
        // holds this tick's frame.
        self.buffer.fill_filtered(points, self.config.bounds.as_ref());
        self.scheduler.submit(self.buffer.points());
        events
    }

    /// Loads a frame, clusters it and waits for the result.
    ///
    /// Used for offline replay where every frame must be clustered. Returns
    /// the events of any earlier pass first, followed by this frame's.
    pub fn process_blocking<I>(&mut self, points: I) -> Vec<ClusterEvent>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut events = self.wait_events();
        self.buffer.fill_filtered(points, self.config.bounds.as_ref());
        if self.scheduler.submit(self.buffer.points()) == SubmitOutcome::Dispatched {
            events.extend(self.wait_events());
        }
        events
    }

    /// Returns true when the next tick would start a new pass.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scheduler.is_ready()
    }

    /// The authoritative tracked clusters.
    #[must_use]
    pub fn clusters(&self) -> &[TrackedCluster] {
        self.scheduler.clusters()
    }

    /// Cumulative clustering counters.
    #[must_use]
    pub fn statistics(&self) -> &ClusteringStatistics {
        self.scheduler.statistics()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// The points loaded by the most recent tick.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        self.buffer.points()
    }

    /// Moves the orientation reference, effective from the next pass.
    pub fn set_reference_position(&mut self, position: Point) {
        self.config.reference_position = position;
        self.scheduler.set_config(self.config.clone());
    }

    /// Cancels any in-flight pass; the cluster set stops changing.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }

    fn drain_events(&mut self) -> Vec<ClusterEvent> {
        let mut events = Vec::new();
        while let Some(report) = self.scheduler.poll() {
            events.extend(report.events);
        }
        events
    }

    fn wait_events(&mut self) -> Vec<ClusterEvent> {
        let mut events = Vec::new();
        while let Some(report) = self.scheduler.wait() {
            events.extend(report.events);
        }
        events
    }
}
