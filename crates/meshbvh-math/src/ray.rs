//! Ray representation and basic ray-geometry tests.

use crate::{Aabb3, Dir3, Point3, Transform, Vec3};

/// A ray in 3D space defined by origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// This ray with origin and direction mapped through `transform`.
    ///
    /// The direction is renormalized, so parameters along the result are
    /// distances in the target space.
    pub fn transformed(&self, transform: &Transform) -> Ray {
        Ray::new(
            transform.apply_point(&self.origin),
            transform.apply_vec(self.direction.as_ref()),
        )
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the ray intersects the box,
    /// where `t_min` and `t_max` are the entry and exit parameters.
    /// `t_min` is clamped to zero when the origin is inside the box.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f32, f32)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// True if the ray hits the box anywhere in front of its origin.
    #[inline]
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        self.intersect_aabb(aabb).is_some()
    }

    /// Intersect the triangle `(a, b, c)`.
    ///
    /// Returns the ray parameter of the hit. With `backface_culling` only
    /// triangles whose counter-clockwise winding faces the ray are reported.
    /// Rays parallel to the triangle plane never hit.
    pub fn intersect_triangle(
        &self,
        a: &Point3,
        b: &Point3,
        c: &Point3,
        backface_culling: bool,
    ) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let normal = edge1.cross(&edge2);
        let dir = self.direction.as_ref();

        let mut d_dot_n = dir.dot(&normal);
        let sign;
        if d_dot_n > 0.0 {
            if backface_culling {
                return None;
            }
            sign = 1.0;
        } else if d_dot_n < 0.0 {
            sign = -1.0;
            d_dot_n = -d_dot_n;
        } else {
            return None;
        }

        let diff = self.origin - a;
        let d_dot_q_x_e2 = sign * dir.dot(&diff.cross(&edge2));
        if d_dot_q_x_e2 < 0.0 {
            return None;
        }
        let d_dot_e1_x_q = sign * dir.dot(&edge1.cross(&diff));
        if d_dot_e1_x_q < 0.0 {
            return None;
        }
        if d_dot_q_x_e2 + d_dot_e1_x_q > d_dot_n {
            return None;
        }

        let q_dot_n = -sign * diff.dot(&normal);
        if q_dot_n < 0.0 {
            return None;
        }
        Some(q_dot_n / d_dot_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::origin(), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb(&unit_box()).unwrap();
        assert!((t_min - 5.0).abs() < 1e-5);
        assert!((t_max - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_aabb_miss_and_behind() {
        let miss = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(miss.intersect_aabb(&unit_box()).is_none());
        let behind = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert!(behind.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_inside_aabb() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb(&unit_box()).unwrap();
        assert_eq!(t_min, 0.0);
        assert!((t_max - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_front_and_back() {
        let a = Point3::new(-1.0, -1.0, 0.0);
        let b = Point3::new(1.0, -1.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        // Counter-clockwise seen from +z, so a ray travelling -z sees the front.
        let down = Ray::new(Point3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let t = down.intersect_triangle(&a, &b, &c, true).unwrap();
        assert!((t - 3.0).abs() < 1e-6);

        let up = Ray::new(Point3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(up.intersect_triangle(&a, &b, &c, true).is_none());
        assert!(up.intersect_triangle(&a, &b, &c, false).is_some());
    }

    #[test]
    fn test_triangle_parallel_and_degenerate() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray
            .intersect_triangle(&a, &b, &Point3::new(0.0, 1.0, 0.0), false)
            .is_none());
        // Zero-area triangle: normal vanishes, no hit and no NaN.
        let down = Ray::new(Point3::new(0.5, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(down
            .intersect_triangle(&a, &b, &Point3::new(2.0, 0.0, 0.0), false)
            .is_none());
    }

    #[test]
    fn test_transformed_ray() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let moved = ray.transformed(&Transform::translation(1.0, 0.0, 0.0));
        assert!((moved.origin.x - 1.0).abs() < 1e-6);
        assert!((moved.direction.z + 1.0).abs() < 1e-6);
    }
}
