//! Triangles: closest points, barycentric coordinates and the
//! triangle-triangle / triangle-segment tests used by the mesh queries.
//!
//! Every routine here accepts zero-area triangles. Degenerate input falls
//! back to segment or point behavior instead of producing NaN.

use crate::{Aabb3, Point3, Segment, Sphere, Transform, Vec3, DEGENERATE_EPSILON};

/// Relative tolerance used when deciding that two triangles touch.
const CONTACT_TOLERANCE: f32 = 1e-6;

/// A triangle given by three corner positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner.
    pub a: Point3,
    /// Second corner.
    pub b: Point3,
    /// Third corner.
    pub c: Point3,
}

impl Triangle {
    /// Create a triangle from its corners.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Corners as an array.
    pub fn points(&self) -> [Point3; 3] {
        [self.a, self.b, self.c]
    }

    /// The three edges `ab`, `bc`, `ca`.
    pub fn edges(&self) -> [Segment; 3] {
        [
            Segment::new(self.a, self.b),
            Segment::new(self.b, self.c),
            Segment::new(self.c, self.a),
        ]
    }

    /// Unnormalized normal `(b - a) x (c - a)`; its length is twice the area.
    pub fn scaled_normal(&self) -> Vec3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Unit normal following counter-clockwise winding, zero when degenerate.
    pub fn normal(&self) -> Vec3 {
        let n = self.scaled_normal();
        let len = n.norm();
        if len > 0.0 {
            n / len
        } else {
            Vec3::zeros()
        }
    }

    /// Triangle area.
    pub fn area(&self) -> f32 {
        self.scaled_normal().norm() * 0.5
    }

    /// True if the triangle has (numerically) zero area.
    pub fn is_degenerate(&self) -> bool {
        self.scaled_normal().norm_squared() <= DEGENERATE_EPSILON * DEGENERATE_EPSILON
    }

    /// Centroid of the three corners.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Bounding box of the corners.
    pub fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points(&self.points())
    }

    /// This triangle with every corner mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Triangle {
        Triangle::new(
            transform.apply_point(&self.a),
            transform.apply_point(&self.b),
            transform.apply_point(&self.c),
        )
    }

    /// Barycentric coordinates `(u, v, w)` of `p` projected onto the plane.
    ///
    /// Returns `None` for degenerate triangles.
    pub fn barycoord(&self, p: &Point3) -> Option<Vec3> {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = p - self.a;
        let dot00 = v0.dot(&v0);
        let dot01 = v0.dot(&v1);
        let dot02 = v0.dot(&v2);
        let dot11 = v1.dot(&v1);
        let dot12 = v1.dot(&v2);
        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() <= DEGENERATE_EPSILON {
            return None;
        }
        let inv = 1.0 / denom;
        let u = (dot11 * dot02 - dot01 * dot12) * inv;
        let v = (dot00 * dot12 - dot01 * dot02) * inv;
        Some(Vec3::new(1.0 - u - v, v, u))
    }

    /// Closest point on the triangle to `p`.
    ///
    /// Region-based projection with barycentric clamping. Zero-area
    /// triangles are handled by falling back to their edges.
    pub fn closest_point_to_point(&self, p: &Point3) -> Point3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let denom = d1 - d3;
            if denom > 0.0 {
                return a + ab * (d1 / denom);
            }
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let denom = d2 - d6;
            if denom > 0.0 {
                return a + ac * (d2 / denom);
            }
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let denom = (d4 - d3) + (d5 - d6);
            if denom > 0.0 {
                return b + (c - b) * ((d4 - d3) / denom);
            }
        }

        let sum = va + vb + vc;
        if sum.abs() <= DEGENERATE_EPSILON {
            return self.closest_point_on_edges(p);
        }
        let inv = 1.0 / sum;
        a + ab * (vb * inv) + ac * (vc * inv)
    }

    fn closest_point_on_edges(&self, p: &Point3) -> Point3 {
        let mut best = self.a;
        let mut best_dist = f32::INFINITY;
        for edge in self.edges() {
            let q = edge.closest_point_to_point(p);
            let d = (q - p).norm_squared();
            if d < best_dist {
                best_dist = d;
                best = q;
            }
        }
        best
    }

    /// Distance from `p` to the triangle.
    pub fn distance_to_point(&self, p: &Point3) -> f32 {
        (self.closest_point_to_point(p) - p).norm()
    }

    /// True if the triangle touches or enters the sphere.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point_to_point(&sphere.center);
        (closest - sphere.center).norm_squared() <= sphere.radius * sphere.radius
    }

    /// Double-sided segment intersection. Returns the crossing point.
    ///
    /// Segments lying in the triangle plane are reported as not crossing;
    /// callers that care about coplanar contact use [`distance_to_triangle`].
    ///
    /// [`distance_to_triangle`]: Triangle::distance_to_triangle
    pub fn intersect_segment(&self, segment: &Segment) -> Option<Point3> {
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let d = segment.end - segment.start;
        let h = d.cross(&e2);
        let det = e1.dot(&h);
        if det.abs() <= DEGENERATE_EPSILON {
            return None;
        }
        let f = 1.0 / det;
        let s = segment.start - self.a;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(&e1);
        let v = f * d.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * e2.dot(&q);
        if (0.0..=1.0).contains(&t) {
            Some(segment.start + d * t)
        } else {
            None
        }
    }

    /// A point where an edge of one triangle crosses the other, if any.
    pub fn intersection_point(&self, other: &Triangle) -> Option<Point3> {
        for edge in self.edges() {
            if let Some(p) = other.intersect_segment(&edge) {
                return Some(p);
            }
        }
        for edge in other.edges() {
            if let Some(p) = self.intersect_segment(&edge) {
                return Some(p);
            }
        }
        None
    }

    /// Closest distance between two triangles with the witness points
    /// `(distance, on_self, on_other)`.
    ///
    /// Crossing triangles report distance zero at a crossing point.
    /// Otherwise the minimum over corner-to-triangle and edge-to-edge
    /// distances is exact, since the closest features of two disjoint
    /// triangles are a vertex/face or an edge/edge pair.
    pub fn distance_to_triangle(&self, other: &Triangle) -> (f32, Point3, Point3) {
        if let Some(p) = self.intersection_point(other) {
            return (0.0, p, p);
        }

        let mut best = f32::INFINITY;
        let mut on_self = self.a;
        let mut on_other = other.a;

        for (this_vec, other_vec) in self.points().iter().zip(other.points().iter()) {
            let q = self.closest_point_to_point(other_vec);
            let d = (q - other_vec).norm_squared();
            if d < best {
                best = d;
                on_self = q;
                on_other = *other_vec;
            }

            let q = other.closest_point_to_point(this_vec);
            let d = (q - this_vec).norm_squared();
            if d < best {
                best = d;
                on_self = *this_vec;
                on_other = q;
            }
        }

        for e1 in self.edges() {
            for e2 in other.edges() {
                let (p, q) = e1.closest_points_to_segment(&e2);
                let d = (p - q).norm_squared();
                if d < best {
                    best = d;
                    on_self = p;
                    on_other = q;
                }
            }
        }

        (best.sqrt(), on_self, on_other)
    }

    /// True if the triangles cross or touch.
    pub fn intersects_triangle(&self, other: &Triangle) -> bool {
        if self.intersection_point(other).is_some() {
            return true;
        }
        let scale = self
            .points()
            .iter()
            .chain(other.points().iter())
            .fold(1.0f32, |acc, p| acc.max(p.coords.amax()));
        self.distance_to_triangle(other).0 <= CONTACT_TOLERANCE * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xy_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_closest_point_regions() {
        let t = xy_triangle();
        // Above the face.
        let p = t.closest_point_to_point(&Point3::new(0.25, 0.25, 2.0));
        assert_relative_eq!(p, Point3::new(0.25, 0.25, 0.0), epsilon = 1e-6);
        // Vertex region.
        assert_eq!(t.closest_point_to_point(&Point3::new(-1.0, -1.0, 0.0)), t.a);
        // Edge region of the hypotenuse.
        let p = t.closest_point_to_point(&Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_closest_point_degenerate_triangle() {
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let p = t.closest_point_to_point(&Point3::new(1.5, 1.0, 0.0));
        assert!(p.x.is_finite() && p.y.is_finite());
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(t.distance_to_point(&Point3::new(1.5, 1.0, 0.0)), 1.0, epsilon = 1e-6);

        let point_like = Triangle::new(Point3::origin(), Point3::origin(), Point3::origin());
        assert_eq!(point_like.closest_point_to_point(&Point3::new(1.0, 1.0, 1.0)), Point3::origin());
        assert_eq!(point_like.normal(), Vec3::zeros());
    }

    #[test]
    fn test_barycoord() {
        let t = xy_triangle();
        let bary = t.barycoord(&Point3::new(0.25, 0.5, 0.0)).unwrap();
        assert_relative_eq!(bary.x + bary.y + bary.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(bary.y, 0.25, epsilon = 1e-6);
        assert_relative_eq!(bary.z, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_segment_crossing() {
        let t = xy_triangle();
        let seg = Segment::new(Point3::new(0.2, 0.2, -1.0), Point3::new(0.2, 0.2, 1.0));
        let p = t.intersect_segment(&seg).unwrap();
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
        let short = Segment::new(Point3::new(0.2, 0.2, 0.5), Point3::new(0.2, 0.2, 1.0));
        assert!(t.intersect_segment(&short).is_none());
    }

    #[test]
    fn test_triangle_distance_and_intersection() {
        let t = xy_triangle();
        let above = Triangle::new(
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        );
        let (d, p, q) = t.distance_to_triangle(&above);
        assert_relative_eq!(d, 2.0, epsilon = 1e-6);
        assert_relative_eq!((p - q).norm(), 2.0, epsilon = 1e-6);
        assert!(!t.intersects_triangle(&above));

        let piercing = Triangle::new(
            Point3::new(0.2, 0.2, -1.0),
            Point3::new(0.3, 0.2, 1.0),
            Point3::new(0.2, 0.3, 1.0),
        );
        assert_eq!(t.distance_to_triangle(&piercing).0, 0.0);
        assert!(t.intersects_triangle(&piercing));
    }

    #[test]
    fn test_coplanar_overlap_intersects() {
        let t = xy_triangle();
        let shifted = Triangle::new(
            Point3::new(0.1, 0.1, 0.0),
            Point3::new(0.3, 0.1, 0.0),
            Point3::new(0.1, 0.3, 0.0),
        );
        assert!(t.intersects_triangle(&shifted));
    }

    #[test]
    fn test_sphere() {
        let t = xy_triangle();
        assert!(t.intersects_sphere(&Sphere::new(Point3::new(0.2, 0.2, 0.5), 0.6)));
        assert!(!t.intersects_sphere(&Sphere::new(Point3::new(0.2, 0.2, 0.5), 0.4)));
    }
}
