//! Spheres.

use crate::{Aabb3, Point3};

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius, expected to be non-negative.
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere.
    pub fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// True if `p` is inside or on the sphere.
    pub fn contains_point(&self, p: &Point3) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }

    /// True if the sphere and the box share any point.
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        aabb.distance_squared_to_point(&self.center) <= self.radius * self.radius
    }

    /// True if every point of the box is inside the sphere.
    pub fn contains_aabb(&self, aabb: &Aabb3) -> bool {
        !aabb.is_empty() && aabb.corners().iter().all(|c| self.contains_point(c))
    }
}
