#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::unreadable_literal
)]
use motionmap_algorithms::KdTree;
use motionmap_core::Point;
use std::time::Instant;

#[test]
fn test_kdtree_vs_linear_scan_performance() {
    // Frame-sized cloud: 50K points in a 2m x 2m x 1m volume
    let n = 50_000;
    let mut rng_seed: u64 = 12345;
    let mut rand = || {
        rng_seed = (rng_seed.wrapping_mul(1103515245).wrapping_add(12345)) & 0x7fffffff;
        rng_seed as f32 / 0x7fffffff as f32
    };

    let points: Vec<Point> = (0..n)
        .map(|_| Point::new(rand() * 2.0, rand() * 2.0, rand()))
        .collect();
    let centers: Vec<Point> = (0..500)
        .map(|_| Point::new(rand() * 2.0, rand() * 2.0, rand()))
        .collect();
    let radius = 0.02;

    let start_tree = Instant::now();
    let tree = KdTree::build(&points);
    let mut tree_hits = 0;
    let mut out = Vec::new();
    for &c in &centers {
        tree.query_radius_into(c, radius, &mut out);
        tree_hits += out.len();
    }
    let duration_tree = start_tree.elapsed();
    println!("k-d tree build + queries: {:?}", duration_tree);

    let start_scan = Instant::now();
    let mut scan_hits = 0;
    for &c in &centers {
        scan_hits += points
            .iter()
            .filter(|p| p.distance_squared(&c) <= radius * radius)
            .count();
    }
    let duration_scan = start_scan.elapsed();
    println!("Linear scan: {:?}", duration_scan);

    assert_eq!(tree_hits, scan_hits);

    // Build cost included; the index must still win comfortably
    let ratio = duration_tree.as_secs_f64() / duration_scan.as_secs_f64();
    println!("Ratio tree/scan: {:.2}x", ratio);
    assert!(ratio < 1.0, "k-d tree is too slow! Ratio: {:.2}x", ratio);
}
