//! Reusable per-frame point storage.
//!
//! A `PointBuffer` is sized once for the sensor frame and overwritten every
//! frame. Index `i` refers to whatever point was written at position `i`
//! during the most recent load; there are no append semantics across frames.

use crate::point::{Bounds, Point};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed-capacity buffer of world-space points for the current frame.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointBuffer {
    points: Vec<Point>,
    capacity: usize,
}

impl PointBuffer {
    /// Creates an empty buffer able to hold `capacity` points.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a buffer holding exactly the given points.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Self {
        Self {
            points: points.to_vec(),
            capacity: points.len(),
        }
    }

    /// Maximum number of points per frame.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of valid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the buffer holds no valid points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The valid points of the current frame.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the point at `index`, if valid.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Invalidates every point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Replaces the frame with already-filtered points.
    ///
    /// Points past the capacity are dropped. Returns the valid count.
    pub fn load(&mut self, points: &[Point]) -> usize {
        let n = points.len().min(self.capacity);
        self.points.clear();
        self.points.extend_from_slice(&points[..n]);
        self.points.len()
    }

    /// Replaces the frame with the finite points of `points` that fall
    /// inside `bounds` (when given).
    ///
    /// Stops once the capacity is reached. Returns the valid count.
    pub fn fill_filtered<I>(&mut self, points: I, bounds: Option<&Bounds>) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        self.points.clear();
        for p in points {
            if self.points.len() == self.capacity {
                break;
            }
            if !p.is_finite() {
                continue;
            }
            if bounds.is_some_and(|b| !b.contains(&p)) {
                continue;
            }
            self.points.push(p);
        }
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_buffer_operations() {
        let mut buffer = PointBuffer::with_capacity(3);
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);

        let n = buffer.load(&[Point::new(1.0, 0.0, 0.0), Point::new(2.0, 0.0, 0.0)]);
        assert_eq!(n, 2);
        assert_eq!(buffer.get(1), Some(&Point::new(2.0, 0.0, 0.0)));
        assert_eq!(buffer.get(2), None);

        // Overwrite, not append
        buffer.load(&[Point::new(9.0, 9.0, 9.0)]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.points()[0], Point::new(9.0, 9.0, 9.0));

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_load_truncates_to_capacity() {
        let mut buffer = PointBuffer::with_capacity(2);
        let points = vec![Point::ZERO; 5];
        assert_eq!(buffer.load(&points), 2);
    }

    #[test]
    fn test_fill_filtered_rejects_non_finite_and_out_of_bounds() {
        let mut buffer = PointBuffer::with_capacity(10);
        let bounds = Bounds::new(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let input = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(f32::NAN, 0.0, 0.0),
            Point::new(f32::INFINITY, 0.0, 0.0),
            Point::new(5.0, 0.0, 0.0),
            Point::new(0.5, 0.5, 0.5),
        ];

        let n = buffer.fill_filtered(input.iter().copied(), Some(&bounds));
        assert_eq!(n, 2);
        assert_eq!(buffer.points()[1], Point::new(0.5, 0.5, 0.5));

        let n = buffer.fill_filtered(input, None);
        assert_eq!(n, 3);
    }
}
