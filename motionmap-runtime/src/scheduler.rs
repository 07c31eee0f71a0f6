//! Background clustering with single-pass backpressure.
//!
//! The frame-synchronous caller submits a frame; if no pass is in flight the
//! scheduler snapshots the points, builds the k-d tree on the calling thread
//! and hands segmentation, tracking and orientation to a worker thread.
//! While that pass runs, further submissions are skipped. Results come back
//! over a channel and are applied to the authoritative cluster set only on
//! the owning thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, trace, warn};

use motionmap_algorithms::{process_frame, ClusterTracker, KdTree, PassReport, SegmentationState};
use motionmap_core::clustering::{ClusteringConfig, ClusteringError, ClusteringStatistics};
use motionmap_core::{ClusterEvent, Point, PointBuffer, TrackedCluster};

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A clustering pass was started for this frame.
    Dispatched,
    /// A pass was already in flight (or the scheduler is shut down).
    Skipped,
}

/// Message sent from the worker thread back to the scheduler.
struct PassOutcome {
    result: Result<PassReport, ClusteringError>,
    /// Buffers handed back for reuse by the next pass.
    state: SegmentationState,
}

/// Runs at most one clustering pass at a time off the calling thread.
pub struct ClusteringScheduler {
    config: ClusteringConfig,
    tracker: ClusterTracker,
    statistics: ClusteringStatistics,

    ready: Arc<AtomicBool>,
    /// Cancellation token of the in-flight (or last) pass.
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,

    tx: Sender<PassOutcome>,
    rx: Receiver<PassOutcome>,

    state: Option<SegmentationState>,
    /// Latest applied pass not yet handed out by `poll`.
    pending: Option<PassReport>,
    shut_down: bool,
}

impl ClusteringScheduler {
    /// Creates an idle scheduler with no tracked clusters.
    #[must_use]
    pub fn new(config: ClusteringConfig) -> Self {
        let (tx, rx) = channel();
        Self {
            config,
            tracker: ClusterTracker::new(),
            statistics: ClusteringStatistics::default(),
            ready: Arc::new(AtomicBool::new(true)),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
            tx,
            rx,
            state: Some(SegmentationState::default()),
            pending: None,
            shut_down: false,
        }
    }

    /// Returns true when a new frame would be dispatched.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.shut_down && self.ready.load(Ordering::Acquire)
    }

    /// Configuration used for the next pass.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Replaces the configuration; an in-flight pass keeps its own copy.
    pub fn set_config(&mut self, config: ClusteringConfig) {
        self.config = config;
    }

    /// The authoritative cluster set from the last published pass.
    #[must_use]
    pub fn clusters(&self) -> &[TrackedCluster] {
        self.tracker.clusters()
    }

    /// Cumulative counters.
    #[must_use]
    pub fn statistics(&self) -> &ClusteringStatistics {
        &self.statistics
    }

    /// Offers a frame for clustering.
    ///
    /// Never blocks on a running pass: if one is in flight the frame is
    /// skipped and the current cluster set stays authoritative.
    pub fn submit(&mut self, points: &[Point]) -> SubmitOutcome {
        if !self.is_ready() {
            self.statistics.frames_skipped += 1;
            trace!("clustering pass in flight, skipping frame");
            return SubmitOutcome::Skipped;
        }

        // The previous pass published before flipping `ready`.
        self.collect();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let snapshot = PointBuffer::from_points(points);
        let index = KdTree::build(snapshot.points());
        let prior = self.tracker.clusters().to_vec();
        let config = self.config.clone();
        let mut state = self.state.take().unwrap_or_default();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Arc::clone(&cancel);
        let ready = Arc::clone(&self.ready);
        let tx = self.tx.clone();

        self.ready.store(false, Ordering::Release);
        self.statistics.frames_submitted += 1;

        self.worker = Some(thread::spawn(move || {
            let result = process_frame(
                snapshot.points(),
                &index,
                &prior,
                &config,
                &mut state,
                Some(&cancel),
            );
            let _ = tx.send(PassOutcome { result, state });
            ready.store(true, Ordering::Release);
        }));

        SubmitOutcome::Dispatched
    }

    /// Returns the latest completed pass not yet handed out, without
    /// blocking.
    ///
    /// The pass has already been applied to [`ClusteringScheduler::clusters`].
    /// Only one report is held. When a pass is applied before the previous
    /// report was polled, the older additions and removals are carried into
    /// the newer report ahead of its own events and the older updates are
    /// dropped.
    pub fn poll(&mut self) -> Option<PassReport> {
        self.collect();
        self.pending.take()
    }

    /// Blocks until the in-flight pass (if any) finishes, then polls.
    pub fn wait(&mut self) -> Option<PassReport> {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.poll()
    }

    /// Cancels any in-flight pass and discards its result.
    ///
    /// A pass that already finished is applied first and its report stays
    /// available to [`ClusteringScheduler::poll`]. The cluster set never
    /// changes afterwards and further submissions are skipped.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.collect();
        self.shut_down = true;
        self.cancel.store(true, Ordering::Release);

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        while let Ok(outcome) = self.rx.try_recv() {
            self.statistics.passes_cancelled += 1;
            self.state = Some(outcome.state);
        }
        debug!("clustering scheduler shut down");
    }

    fn collect(&mut self) {
        if self.shut_down {
            return;
        }
        while let Ok(outcome) = self.rx.try_recv() {
            self.state = Some(outcome.state);
            match outcome.result {
                Ok(mut report) => {
                    self.tracker.commit(report.clusters.clone());
                    self.statistics.record_pass(&report.statistics);
                    if let Some(unpolled) = self.pending.take() {
                        trace!("folding unpolled clustering report into the next one");
                        let mut events: Vec<ClusterEvent> = unpolled
                            .events
                            .into_iter()
                            .filter(|e| !matches!(e, ClusterEvent::Updated { .. }))
                            .collect();
                        events.append(&mut report.events);
                        report.events = events;
                    }
                    self.pending = Some(report);
                }
                Err(ClusteringError::Cancelled) => {
                    self.statistics.passes_cancelled += 1;
                    debug!("clustering pass cancelled, result discarded");
                }
                Err(e) => {
                    warn!("clustering pass failed: {e}");
                }
            }
        }
    }
}

impl Drop for ClusteringScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
