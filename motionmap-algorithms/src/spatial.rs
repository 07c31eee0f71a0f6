//! Spatial indexing for efficient neighbor lookup.
//!
//! The index is a balanced 3D k-d tree rebuilt from scratch every frame.
//! Each node stores one point; the split axis is the widest extent of the
//! node's range and the split position is that range's median.

use motionmap_core::Point;

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct KdNode {
    /// Index of the point in the frame's buffer.
    index: usize,
    position: Point,
    axis: u8,
    left: u32,
    right: u32,
}

/// Static k-d tree over one frame of points, supporting radius queries.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: u32,
}

impl Default for KdTree {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: NONE,
        }
    }
}

impl KdTree {
    /// Builds a tree over `points`, in O(n log n).
    ///
    /// An empty slice yields an empty tree whose queries return nothing.
    #[must_use]
    pub fn build(points: &[Point]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: NONE,
        };
        if points.is_empty() {
            return tree;
        }

        let mut order: Vec<usize> = (0..points.len()).collect();
        tree.root = tree.build_range(points, &mut order);
        tree
    }

    fn build_range(&mut self, points: &[Point], order: &mut [usize]) -> u32 {
        if order.is_empty() {
            return NONE;
        }

        let axis = widest_axis(points, order);
        let split_axis = usize::from(axis);
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            points[a]
                .axis(split_axis)
                .total_cmp(&points[b].axis(split_axis))
        });

        let index = order[mid];
        #[allow(clippy::cast_possible_truncation)]
        let node_id = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            index,
            position: points[index],
            axis,
            left: NONE,
            right: NONE,
        });

        let (lower, rest) = order.split_at_mut(mid);
        let left = self.build_range(points, lower);
        let right = self.build_range(points, &mut rest[1..]);

        let node = &mut self.nodes[node_id as usize];
        node.left = left;
        node.right = right;
        node_id
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree indexes no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree (0 when empty).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.root == NONE {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            let node = &self.nodes[id as usize];
            for child in [node.left, node.right] {
                if child != NONE {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Returns the indices of all points within `radius` of `center`.
    #[must_use]
    pub fn query_radius(&self, center: Point, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_radius_into(center, radius, &mut out);
        out
    }

    /// Same as [`KdTree::query_radius`], writing into a reused buffer.
    ///
    /// `out` is cleared first.
    pub fn query_radius_into(&self, center: Point, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        if self.root == NONE || radius.is_nan() || radius < 0.0 {
            return;
        }

        let radius_sq = radius * radius;
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if node.position.distance_squared(&center) <= radius_sq {
                out.push(node.index);
            }

            let axis = usize::from(node.axis);
            let diff = center.axis(axis) - node.position.axis(axis);
            let (near, far) = if diff <= 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };

            if far != NONE && diff * diff <= radius_sq {
                stack.push(far);
            }
            if near != NONE {
                stack.push(near);
            }
        }
    }
}

fn widest_axis(points: &[Point], order: &[usize]) -> u8 {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for &i in order {
        let p = points[i];
        for axis in 0..3 {
            let v = p.axis(axis);
            min[axis] = min[axis].min(v);
            max[axis] = max[axis].max(v);
        }
    }

    let extent = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    if extent[0] >= extent[1] && extent[0] >= extent[2] {
        0
    } else if extent[1] >= extent[2] {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(n: usize, step: f32) -> Vec<Point> {
        let mut points = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    #[allow(clippy::cast_precision_loss)]
                    points.push(Point::new(x as f32 * step, y as f32 * step, z as f32 * step));
                }
            }
        }
        points
    }

    /// Walks the tree and checks the splitting-plane invariant for every node.
    fn assert_partitioned(tree: &KdTree, id: u32) -> Vec<Point> {
        if id == NONE {
            return Vec::new();
        }
        let node = tree.nodes[id as usize];
        let axis = usize::from(node.axis);
        let split = node.position.axis(axis);

        let left = assert_partitioned(tree, node.left);
        let right = assert_partitioned(tree, node.right);
        assert!(left.iter().all(|p| p.axis(axis) <= split));
        assert!(right.iter().all(|p| p.axis(axis) >= split));

        let mut all = left;
        all.extend(right);
        all.push(node.position);
        all
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.query_radius(Point::ZERO, 10.0).is_empty());
        assert!(KdTree::default().query_radius(Point::ZERO, 1.0).is_empty());
    }

    #[test]
    fn test_single_point() {
        let tree = KdTree::build(&[Point::new(1.0, 1.0, 1.0)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.query_radius(Point::new(1.0, 1.0, 1.0), 0.0), vec![0]);
        assert!(tree.query_radius(Point::ZERO, 1.0).is_empty());
    }

    #[test]
    fn test_tree_is_balanced_and_partitioned() {
        let points = lattice(8, 0.5);
        let tree = KdTree::build(&points);
        assert_eq!(tree.len(), points.len());

        // 512 points: a median split gives ceil(log2(513)) levels
        assert!(tree.depth() <= 10, "depth {}", tree.depth());

        let visited = assert_partitioned(&tree, tree.root);
        assert_eq!(visited.len(), points.len());
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let points = vec![Point::ZERO, Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0)];
        let tree = KdTree::build(&points);

        let mut found = tree.query_radius(Point::ZERO, 1.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_query_into_clears_buffer() {
        let points = lattice(3, 1.0);
        let tree = KdTree::build(&points);
        let mut out = vec![999, 998];
        tree.query_radius_into(Point::new(10.0, 10.0, 10.0), 0.5, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicate_points() {
        let points = vec![Point::new(0.5, 0.5, 0.5); 20];
        let tree = KdTree::build(&points);
        let found = tree.query_radius(Point::new(0.5, 0.5, 0.5), 0.001);
        assert_eq!(found.len(), 20);
    }
}
