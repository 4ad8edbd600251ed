//! Axis-aligned bounding boxes.
//!
//! Boxes are stored as min/max corners. The flat `[min_x, min_y, min_z,
//! max_x, max_y, max_z]` array form is what packed BVH nodes carry.

use crate::{Point3, Transform, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point of the iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// Build from the packed `[min_x, min_y, min_z, max_x, max_y, max_z]` form.
    pub fn from_array(data: &[f32; 6]) -> Self {
        Self {
            min: Point3::new(data[0], data[1], data[2]),
            max: Point3::new(data[3], data[4], data[5]),
        }
    }

    /// Packed `[min_x, min_y, min_z, max_x, max_y, max_z]` form.
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    /// True if no point has been included yet (min > max on some axis).
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_box(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        out.include_box(other);
        out
    }

    /// Test if two AABBs overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// True if `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &Aabb3) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f32) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area. Zero for flat or empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Index of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.size();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// The point of the box closest to `p`.
    pub fn clamp_point(&self, p: &Point3) -> Point3 {
        Point3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Squared distance from `p` to the box (0 inside).
    pub fn distance_squared_to_point(&self, p: &Point3) -> f32 {
        (self.clamp_point(p) - p).norm_squared()
    }

    /// Distance between two boxes (0 when they overlap).
    pub fn distance_to_box(&self, other: &Aabb3) -> f32 {
        let gap = |a_min: f32, a_max: f32, b_min: f32, b_max: f32| {
            (a_min - b_max).max(b_min - a_max).max(0.0)
        };
        let dx = gap(self.min.x, self.max.x, other.min.x, other.max.x);
        let dy = gap(self.min.y, self.max.y, other.min.y, other.max.y);
        let dz = gap(self.min.z, self.max.z, other.min.z, other.max.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// The twelve edges as corner index pairs into [`Aabb3::corners`].
    pub const EDGES: [(usize, usize); 12] = [
        (0, 4),
        (0, 2),
        (0, 1),
        (1, 5),
        (1, 3),
        (2, 6),
        (2, 3),
        (3, 7),
        (4, 6),
        (4, 5),
        (5, 7),
        (6, 7),
    ];

    /// The eight corners, indexed by bit pattern `xyz` (bit set = max side).
    pub fn corners(&self) -> [Point3; 8] {
        let mut out = [Point3::origin(); 8];
        for (i, corner) in out.iter_mut().enumerate() {
            *corner = Point3::new(
                if i & 4 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 1 != 0 { self.max.z } else { self.min.z },
            );
        }
        out
    }

    /// Axis-aligned box enclosing this box after `transform`.
    pub fn transformed(&self, transform: &Transform) -> Aabb3 {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb3::empty();
        for corner in self.corners() {
            out.include_point(&transform.apply_point(&corner));
        }
        out
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}
