//! Per-triangle bounds used during construction.
//!
//! Each triangle is stored as `[cx, hx, cy, hy, cz, hz]`: center and half
//! extent per axis. Half extents are grown by a few units of `f32` rounding
//! so node boxes rebuilt from center/half pairs still contain every vertex.

use meshbvh_math::{Aabb3, Point3, FLOAT32_EPSILON};

use crate::geometry::MeshGeometry;

const STRIDE: usize = 6;

/// Rounding slack in units of [`FLOAT32_EPSILON`] times the coordinate
/// magnitude. Center, half extent and their sum each round once.
const BOUNDS_GROWTH: f64 = 4.0 * FLOAT32_EPSILON as f64;

/// Center/half-extent records for every triangle, kept in index order.
#[derive(Debug, Clone)]
pub(crate) struct TriangleBounds {
    data: Vec<f32>,
}

impl TriangleBounds {
    /// Compute bounds for every triangle of `geometry`.
    pub fn compute(geometry: &MeshGeometry) -> Self {
        let count = geometry.triangle_count();
        let mut data = vec![0.0f32; count * STRIDE];
        for (tri, record) in data.chunks_exact_mut(STRIDE).enumerate() {
            let t = geometry.triangle(tri as u32);
            for axis in 0..3 {
                let a = t.a[axis] as f64;
                let b = t.b[axis] as f64;
                let c = t.c[axis] as f64;
                let min = a.min(b).min(c);
                let max = a.max(b).max(c);
                let half = (max - min) / 2.0;
                let magnitude = min.abs().max(max.abs());
                record[axis * 2] = (min + half) as f32;
                record[axis * 2 + 1] = (half + magnitude * BOUNDS_GROWTH) as f32;
            }
        }
        Self { data }
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.data.len() / STRIDE
    }

    /// Center of triangle `tri` on `axis`.
    #[inline]
    pub fn center(&self, tri: usize, axis: usize) -> f32 {
        self.data[tri * STRIDE + axis * 2]
    }

    /// Box of triangle `tri`.
    #[inline]
    pub fn aabb(&self, tri: usize) -> Aabb3 {
        let r = &self.data[tri * STRIDE..tri * STRIDE + STRIDE];
        Aabb3::new(
            Point3::new(r[0] - r[1], r[2] - r[3], r[4] - r[5]),
            Point3::new(r[0] + r[1], r[2] + r[3], r[4] + r[5]),
        )
    }

    /// Center point of triangle `tri`.
    #[inline]
    pub fn centroid(&self, tri: usize) -> Point3 {
        let r = &self.data[tri * STRIDE..tri * STRIDE + STRIDE];
        Point3::new(r[0], r[2], r[4])
    }

    /// Swap the records of two triangles.
    pub fn swap(&mut self, a: usize, b: usize) {
        for k in 0..STRIDE {
            self.data.swap(a * STRIDE + k, b * STRIDE + k);
        }
    }

    /// Node bounds and centroid bounds of the range `[offset, offset + count)`.
    pub fn range_bounds(&self, offset: usize, count: usize) -> (Aabb3, Aabb3) {
        let mut bounds = Aabb3::empty();
        let mut centroids = Aabb3::empty();
        for tri in offset..offset + count {
            bounds.include_box(&self.aabb(tri));
            centroids.include_point(&self.centroid(tri));
        }
        (bounds, centroids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contain_vertices() {
        let geometry = MeshGeometry::from_triangles(
            &[
                Point3::new(1e6, -3.0, 0.1),
                Point3::new(1e6 + 0.3, 7.0, 0.2),
                Point3::new(-2.5, 0.125, 1e-7),
            ],
            &[[0, 1, 2]],
        );
        let bounds = TriangleBounds::compute(&geometry);
        assert_eq!(bounds.len(), 1);
        let aabb = bounds.aabb(0);
        for p in geometry.triangle(0).points() {
            assert!(aabb.contains_point(&p), "{p:?} outside {aabb:?}");
        }
    }

    #[test]
    fn test_swap_and_range() {
        let geometry = MeshGeometry::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(11.0, 0.0, 0.0),
                Point3::new(10.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [3, 4, 5]],
        );
        let mut bounds = TriangleBounds::compute(&geometry);
        assert!(bounds.center(0, 0) < bounds.center(1, 0));
        bounds.swap(0, 1);
        assert!(bounds.center(0, 0) > bounds.center(1, 0));

        let (node, centroids) = bounds.range_bounds(0, 2);
        assert!(node.min.x <= 0.0 && node.max.x >= 11.0);
        assert!(centroids.min.x > 0.0 && centroids.max.x < 11.0);
    }
}
