//! Line segments and segment-segment closest points.

use crate::{Point3, DEGENERATE_EPSILON};

/// A finite line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point.
    pub start: Point3,
    /// End point.
    pub end: Point3,
}

impl Segment {
    /// Create a segment between two points.
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Midpoint of the segment.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.start, &self.end)
    }

    /// Closest point on the segment to `p`.
    pub fn closest_point_to_point(&self, p: &Point3) -> Point3 {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();
        if len_sq <= DEGENERATE_EPSILON {
            return self.start;
        }
        let t = ((p - self.start).dot(&d) / len_sq).clamp(0.0, 1.0);
        self.start + d * t
    }

    /// Closest pair of points between two segments, `(on_self, on_other)`.
    ///
    /// Handles degenerate (point-like) and parallel segments; for parallel
    /// segments one of the equally close pairs is returned.
    pub fn closest_points_to_segment(&self, other: &Segment) -> (Point3, Point3) {
        let d1 = self.end - self.start;
        let d2 = other.end - other.start;
        let r = self.start - other.start;
        let a = d1.norm_squared();
        let e = d2.norm_squared();
        let f = d2.dot(&r);

        if a <= DEGENERATE_EPSILON && e <= DEGENERATE_EPSILON {
            return (self.start, other.start);
        }

        let (s, t);
        if a <= DEGENERATE_EPSILON {
            s = 0.0;
            t = (f / e).clamp(0.0, 1.0);
        } else {
            let c = d1.dot(&r);
            if e <= DEGENERATE_EPSILON {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else {
                let b = d1.dot(&d2);
                let denom = a * e - b * b;
                let mut s0 = if denom > DEGENERATE_EPSILON {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t0 = (b * s0 + f) / e;
                if t0 < 0.0 {
                    t0 = 0.0;
                    s0 = (-c / a).clamp(0.0, 1.0);
                } else if t0 > 1.0 {
                    t0 = 1.0;
                    s0 = ((b - c) / a).clamp(0.0, 1.0);
                }
                s = s0;
                t = t0;
            }
        }

        (self.start + d1 * s, other.start + d2 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_crossing_segments() {
        let a = Segment::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Segment::new(Point3::new(0.0, -1.0, 1.0), Point3::new(0.0, 1.0, 1.0));
        let (p, q) = a.closest_points_to_segment(&b);
        assert_relative_eq!((p - q).norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_parallel_segments() {
        let a = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Segment::new(Point3::new(0.5, 2.0, 0.0), Point3::new(3.0, 2.0, 0.0));
        let (p, q) = a.closest_points_to_segment(&b);
        assert_relative_eq!((p - q).norm(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Segment::new(Point3::new(0.5, 1.0, 0.0), Point3::new(0.5, 1.0, 0.0));
        let b = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let (p, q) = a.closest_points_to_segment(&b);
        assert_eq!(p, a.start);
        assert_relative_eq!(q.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_closest_point_clamps() {
        let s = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(s.closest_point_to_point(&Point3::new(5.0, 1.0, 0.0)), s.end);
    }
}
