//! motionmap: replay and benchmark depth-sensor point clustering.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

mod frames;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;
use thiserror::Error;

use frames::{parse_bounds, parse_point, FrameReader};
use motionmap_algorithms::{process_frame, KdTree, Segmentation, SegmentationState};
use motionmap_core::clustering::ClusteringConfig;
use motionmap_core::{Bounds, Point};
use motionmap_runtime::MotionMapContext;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid frame on line {line}: {source}")]
    Frame {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Core error: {0}")]
    Core(#[from] motionmap_core::Error),

    #[error("Clustering error: {0}")]
    Clustering(#[from] motionmap_core::ClusteringError),
}

/// Real-time point cloud clustering and tracking.
#[derive(Parser)]
#[command(name = "motionmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded frames and print cluster events as JSON lines
    Track {
        /// Frame file, one JSON array of [x, y, z] triples per line
        input: PathBuf,

        /// Distance below which two points share a cluster
        #[arg(long, default_value = "0.01")]
        cluster_max_dist: f32,

        /// Minimum number of points per cluster
        #[arg(long, default_value = "1")]
        min_cluster_size: usize,

        /// Fraction of each cluster sampled for orientation
        #[arg(long, default_value = "0.2")]
        sample_fraction: f32,

        /// Orientation reference position as x,y,z
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        reference: Option<Point>,

        /// Interaction volume as min_x,min_y,min_z,max_x,max_y,max_z
        #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
        bounds: Option<[f32; 6]>,

        /// Skip orientation estimation
        #[arg(long)]
        no_orientation: bool,

        /// Maximum points loaded per frame
        #[arg(long, default_value = "500000")]
        capacity: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Benchmark clustering on synthetic point groups
    Benchmark {
        /// Number of separated groups
        #[arg(long, default_value = "8")]
        groups: usize,

        /// Points per group
        #[arg(long, default_value = "2000")]
        points_per_group: usize,

        /// Number of iterations
        #[arg(short, long, default_value = "10")]
        iterations: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Track {
            input,
            cluster_max_dist,
            min_cluster_size,
            sample_fraction,
            reference,
            bounds,
            no_orientation,
            capacity,
            verbose,
        } => {
            let mut config = ClusteringConfig::new()
                .with_cluster_max_dist(cluster_max_dist)
                .with_min_cluster_size(min_cluster_size)
                .with_sample_fraction(sample_fraction)
                .with_orientation(!no_orientation);
            if let Some(reference) = reference {
                config = config.with_reference_position(reference);
            }
            if let Some([x0, y0, z0, x1, y1, z1]) = bounds {
                config = config.with_bounds(Bounds::new(
                    Point::new(x0, y0, z0),
                    Point::new(x1, y1, z1),
                ));
            }

            if verbose {
                eprintln!("Reading: {}", input.display());
                eprintln!("Cluster max distance: {}", cluster_max_dist);
                eprintln!("Min cluster size: {}", min_cluster_size);
                eprintln!("Sample fraction: {}", sample_fraction);
                eprintln!("Orientation: {}", !no_orientation);
            }

            let mut context = MotionMapContext::new(config, capacity)?;
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());

            let start = Instant::now();
            let mut frame_count = 0usize;
            let mut event_count = 0usize;

            for frame in FrameReader::open(&input)? {
                let events = context.process_blocking(frame?);
                frame_count += 1;
                event_count += events.len();
                for event in &events {
                    serde_json::to_writer(&mut out, event)?;
                    out.write_all(b"\n")?;
                }
            }
            out.flush()?;
            context.shutdown();

            let elapsed = start.elapsed();
            info!(
                "replayed {} frames ({} events) in {:.2}s",
                frame_count,
                event_count,
                elapsed.as_secs_f64()
            );

            if verbose {
                let stats = context.statistics();
                eprintln!(
                    "Processed {} frames in {:.2}s",
                    frame_count,
                    elapsed.as_secs_f64()
                );
                eprintln!("Points: {}", stats.points_processed);
                eprintln!("Noise points: {}", stats.noise_points);
                eprintln!("Live clusters: {}", context.clusters().len());
                eprintln!("Events: {}", event_count);
            }
        }

        Commands::Benchmark {
            groups,
            points_per_group,
            iterations,
        } => {
            let points = synthetic_groups(groups, points_per_group);
            let config = ClusteringConfig::new()
                .with_cluster_max_dist(0.02)
                .with_min_cluster_size(10);

            println!(
                "Benchmarking with {} points in {} groups, {} iterations",
                points.len(),
                groups,
                iterations
            );
            println!(
                "{:<12} | {:<15} | {:<15} | {:<15}",
                "Stage", "Mean Time (ms)", "Min Time (ms)", "Max Time (ms)"
            );
            println!("{:-<65}", "");

            let segmentation = Segmentation::from_config(&config);
            let index = KdTree::build(&points);
            let mut state = segmentation.create_state();

            // Warmup
            process_frame(&points, &index, &[], &config, &mut state, None)?;

            let mut build_times = Vec::with_capacity(iterations);
            let mut segment_times = Vec::with_capacity(iterations);
            let mut pass_times = Vec::with_capacity(iterations);
            let mut clusters = 0usize;

            for _ in 0..iterations {
                let start = Instant::now();
                let index = KdTree::build(&points);
                build_times.push(start.elapsed().as_secs_f64() * 1000.0);

                let start = Instant::now();
                segmentation.segment(&points, &index, &mut state)?;
                segment_times.push(start.elapsed().as_secs_f64() * 1000.0);

                let mut pass_state = SegmentationState::default();
                let start = Instant::now();
                let report = process_frame(&points, &index, &[], &config, &mut pass_state, None)?;
                pass_times.push(start.elapsed().as_secs_f64() * 1000.0);
                clusters = report.clusters.len();
            }

            for (name, times) in [
                ("kd-tree", &build_times),
                ("segment", &segment_times),
                ("full pass", &pass_times),
            ] {
                if times.is_empty() {
                    continue;
                }
                let min_time = times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                let max_time = times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                let mean_time = times.iter().sum::<f64>() / times.len() as f64;

                println!(
                    "{:<12} | {:<15.2} | {:<15.2} | {:<15.2}",
                    name, mean_time, min_time, max_time
                );
            }
            println!("Clusters found: {}", clusters);
        }
    }

    Ok(())
}

/// Deterministic, well-separated blobs laid out along x.
fn synthetic_groups(groups: usize, points_per_group: usize) -> Vec<Point> {
    let mut points = Vec::with_capacity(groups * points_per_group);
    for g in 0..groups {
        let center = Point::new(g as f32 * 0.5, 1.0, 2.0);
        for i in 0..points_per_group {
            let t = i as f32;
            let offset = Point::new(
                (t * 0.618_034).fract(),
                (t * 0.414_214).fract(),
                (t * 0.732_051).fract(),
            );
            points.push(center + offset * 0.1);
        }
    }
    points
}
