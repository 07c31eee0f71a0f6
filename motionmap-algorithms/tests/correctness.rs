#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]
use motionmap_algorithms::{
    estimate_orientation, segment, ClusterTracker, KdTree, Segmentation, SegmentationState,
};
use motionmap_core::Point;

fn lcg(seed: u64) -> impl FnMut() -> f32 {
    let mut state = seed;
    move || {
        state = (state.wrapping_mul(1_103_515_245).wrapping_add(12_345)) & 0x7fff_ffff;
        state as f32 / 0x7fff_ffff as f32
    }
}

/// Points scattered inside a cube of side `size` around `center`.
fn group(center: Point, n: usize, size: f32, seed: u64) -> Vec<Point> {
    let mut rand = lcg(seed);
    (0..n)
        .map(|_| {
            center
                + Point::new(
                    (rand() - 0.5) * size,
                    (rand() - 0.5) * size,
                    (rand() - 0.5) * size,
                )
        })
        .collect()
}

#[test]
fn test_two_groups_two_clusters() {
    // 100 points: two tight groups 2 units apart
    let mut points = group(Point::new(0.0, 1.0, 2.0), 50, 0.05, 7);
    points.extend(group(Point::new(2.0, 1.0, 2.0), 50, 0.05, 11));

    let tree = KdTree::build(&points);
    let clusters = segment(&points, &tree, 0.1, 5).unwrap();

    assert_eq!(clusters.len(), 2, "found {} clusters", clusters.len());
    let mut first = clusters[0].indices.clone();
    let mut second = clusters[1].indices.clone();
    first.sort_unstable();
    second.sort_unstable();
    assert_eq!(first, (0..50).collect::<Vec<_>>());
    assert_eq!(second, (50..100).collect::<Vec<_>>());

    assert!(clusters[0].centroid.distance(&Point::new(0.0, 1.0, 2.0)) < 0.05);
    assert!(clusters[1].centroid.distance(&Point::new(2.0, 1.0, 2.0)) < 0.05);
}

#[test]
fn test_single_point_cluster_has_zero_orientation() {
    let points = vec![Point::new(0.3, 0.4, 0.5)];
    let tree = KdTree::build(&points);
    let clusters = segment(&points, &tree, 0.1, 1).unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 1);

    let mut tracker = ClusterTracker::new();
    let result = tracker.update(clusters);
    let orientation = estimate_orientation(&result.tracked[0], &points, Point::ZERO, 0.2);
    assert_eq!(orientation, Point::ZERO);
}

#[test]
fn test_clusters_and_noise_partition_all_points() {
    let mut rand = lcg(42);
    let points: Vec<Point> = (0..2_000)
        .map(|_| Point::new(rand(), rand(), rand() * 0.2))
        .collect();
    let tree = KdTree::build(&points);

    for (radius, min_size) in [(0.02, 1), (0.03, 4), (0.05, 10)] {
        let segmentation = Segmentation::new(radius, min_size);
        let mut state = SegmentationState::default();
        let outcome = segmentation.segment(&points, &tree, &mut state).unwrap();

        let mut seen = vec![false; points.len()];
        let mut clustered = 0;
        for cluster in &outcome.clusters {
            assert!(cluster.len() >= min_size);
            for &i in &cluster.indices {
                assert!(!seen[i], "point {} assigned twice", i);
                seen[i] = true;
            }
            clustered += cluster.len();
        }
        assert_eq!(clustered + outcome.noise_points, points.len());

        // Nothing inside a cluster has an unclustered neighbour
        for cluster in &outcome.clusters {
            for &i in &cluster.indices {
                for j in tree.query_radius(points[i], radius) {
                    assert!(seen[j], "neighbour {} of clustered point {} left out", j, i);
                }
            }
        }
    }
}

#[test]
fn test_segmentation_is_idempotent() {
    let mut points = group(Point::ZERO, 300, 0.3, 3);
    points.extend(group(Point::new(1.0, 0.0, 0.0), 300, 0.3, 5));
    let tree = KdTree::build(&points);

    let segmentation = Segmentation::new(0.05, 3);
    let mut state = SegmentationState::default();
    let first = segmentation.segment(&points, &tree, &mut state).unwrap();
    let second = segmentation.segment(&points, &tree, &mut state).unwrap();

    assert_eq!(first, second);
}
