//! motionmap-runtime: Off-thread clustering for the frame loop.
//!
//! [`ClusteringScheduler`] runs one clustering pass at a time on a worker
//! thread and skips frames while it is busy. [`MotionMapContext`] bundles
//! the scheduler with the per-frame point buffer and configuration.
//!
#![warn(missing_docs)]

mod context;
mod scheduler;

pub use context::MotionMapContext;
pub use scheduler::{ClusteringScheduler, SubmitOutcome};

pub use motionmap_algorithms::PassReport;
