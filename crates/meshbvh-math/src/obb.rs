//! Oriented bounding boxes.
//!
//! An [`OrientedBox`] is an axis-aligned box carried into another frame by
//! an affine transform. Overlap tests use the separating axis theorem on the
//! transformed corners, so they are exact for any invertible transform,
//! sheared ones included. Distance queries are exact when the transformed
//! axes stay orthogonal and fall back to the enclosing axis-aligned box
//! otherwise, which can only under-estimate the distance.

use crate::{Aabb3, Point3, Segment, Transform, Triangle, Vec3};

const AXIS_EPSILON: f32 = 1e-12;

/// A box with arbitrary orientation.
#[derive(Debug, Clone, Copy)]
pub struct OrientedBox {
    /// Corners in the target frame, indexed like [`Aabb3::corners`].
    points: [Point3; 8],
    /// Transformed local x, y and z edge directions (not normalized).
    edges: [Vec3; 3],
    /// Center in the target frame.
    center: Point3,
    /// Unit axes, valid when `orthogonal` is set.
    axes: [Vec3; 3],
    /// Half extents along `axes`.
    half_extents: Vec3,
    orthogonal: bool,
    /// Axis-aligned box around `points`.
    bounds: Aabb3,
}

impl OrientedBox {
    /// The box `[min, max]` carried into the target frame by `transform`.
    pub fn new(min: Point3, max: Point3, transform: &Transform) -> Self {
        let local = Aabb3::new(min, max);
        let mut points = local.corners();
        for p in points.iter_mut() {
            *p = transform.apply_point(p);
        }

        let size = local.size();
        let edges = [
            transform.apply_vec(&Vec3::new(size.x, 0.0, 0.0)),
            transform.apply_vec(&Vec3::new(0.0, size.y, 0.0)),
            transform.apply_vec(&Vec3::new(0.0, 0.0, size.z)),
        ];

        let center = transform.apply_point(&local.center());
        let mut axes = [Vec3::x(), Vec3::y(), Vec3::z()];
        let mut half = Vec3::zeros();
        let mut orthogonal = true;
        for i in 0..3 {
            let len = edges[i].norm();
            half[i] = len * 0.5;
            if len > AXIS_EPSILON {
                axes[i] = edges[i] / len;
            } else {
                orthogonal = false;
            }
        }
        if orthogonal {
            let tol = 1e-5;
            orthogonal = axes[0].dot(&axes[1]).abs() < tol
                && axes[1].dot(&axes[2]).abs() < tol
                && axes[0].dot(&axes[2]).abs() < tol;
        }

        Self {
            points,
            edges,
            center,
            axes,
            half_extents: half,
            orthogonal,
            bounds: Aabb3::from_points(&points),
        }
    }

    /// Shorthand for an axis-aligned box moved by `transform`.
    pub fn from_aabb(aabb: &Aabb3, transform: &Transform) -> Self {
        Self::new(aabb.min, aabb.max, transform)
    }

    /// Corners in the target frame.
    pub fn points(&self) -> &[Point3; 8] {
        &self.points
    }

    /// Axis-aligned bounds of the corners.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Face normals of the (possibly sheared) box.
    fn face_normals(&self) -> [Vec3; 3] {
        let [ex, ey, ez] = self.edges;
        let mut normals = [ey.cross(&ez), ez.cross(&ex), ex.cross(&ey)];
        // Flat boxes lose a face normal; their remaining edge still separates.
        for (i, n) in normals.iter_mut().enumerate() {
            if n.norm_squared() <= AXIS_EPSILON {
                *n = self.edges[i];
            }
        }
        normals
    }

    /// True if the box overlaps the axis-aligned box (touching counts).
    pub fn intersects_box(&self, aabb: &Aabb3) -> bool {
        if !self.bounds.overlaps(aabb) {
            return false;
        }
        let other = aabb.corners();
        for n in self.face_normals() {
            if separated(&n, &self.points, &other) {
                return false;
            }
        }
        for e in self.edges {
            for axis in [Vec3::x(), Vec3::y(), Vec3::z()] {
                if separated(&e.cross(&axis), &self.points, &other) {
                    return false;
                }
            }
        }
        true
    }

    /// True if the box overlaps the triangle (touching counts).
    pub fn intersects_triangle(&self, triangle: &Triangle) -> bool {
        let tri = triangle.points();
        if !self.bounds.overlaps(&triangle.bounding_box()) {
            return false;
        }
        for n in self.face_normals() {
            if separated(&n, &self.points, &tri) {
                return false;
            }
        }
        if separated(&triangle.scaled_normal(), &self.points, &tri) {
            return false;
        }
        for e in self.edges {
            for edge in triangle.edges() {
                let axis = e.cross(&(edge.end - edge.start));
                if separated(&axis, &self.points, &tri) {
                    return false;
                }
            }
        }
        true
    }

    /// Closest point of the box to `p`.
    ///
    /// Exact for orthogonal boxes; otherwise the point of the enclosing
    /// axis-aligned box.
    pub fn closest_point_to_point(&self, p: &Point3) -> Point3 {
        if !self.orthogonal {
            return self.bounds.clamp_point(p);
        }
        let d = p - self.center;
        let mut q = self.center;
        for i in 0..3 {
            let t = d.dot(&self.axes[i]).clamp(-self.half_extents[i], self.half_extents[i]);
            q += self.axes[i] * t;
        }
        q
    }

    /// Distance from `p` to the box.
    pub fn distance_to_point(&self, p: &Point3) -> f32 {
        (self.closest_point_to_point(p) - p).norm()
    }

    /// Distance to an axis-aligned box, 0 when they overlap.
    ///
    /// Never over-estimates, so it is safe as a pruning bound.
    pub fn distance_to_box(&self, aabb: &Aabb3) -> f32 {
        if !self.orthogonal {
            return self.bounds.distance_to_box(aabb);
        }
        if self.intersects_box(aabb) {
            return 0.0;
        }

        let mut best = f32::INFINITY;
        let other = aabb.corners();
        for p in &other {
            best = best.min((self.closest_point_to_point(p) - p).norm_squared());
        }
        for p in &self.points {
            best = best.min(aabb.distance_squared_to_point(p));
        }
        for (a0, a1) in Aabb3::EDGES {
            let mine = Segment::new(self.points[a0], self.points[a1]);
            for (b0, b1) in Aabb3::EDGES {
                let theirs = Segment::new(other[b0], other[b1]);
                let (p, q) = mine.closest_points_to_segment(&theirs);
                best = best.min((p - q).norm_squared());
            }
        }
        best.sqrt()
    }
}

/// True if the projections of `a` and `b` onto `axis` are disjoint.
fn separated(axis: &Vec3, a: &[Point3], b: &[Point3]) -> bool {
    if axis.norm_squared() <= AXIS_EPSILON {
        return false;
    }
    let (a_min, a_max) = project(axis, a);
    let (b_min, b_max) = project(axis, b);
    a_max < b_min || b_max < a_min
}

fn project(axis: &Vec3, points: &[Point3]) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
        let d = p.coords.dot(axis);
        (lo.min(d), hi.max(d))
    })
}
