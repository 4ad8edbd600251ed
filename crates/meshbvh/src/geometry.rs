//! Indexed triangle geometry the BVH is built over.
//!
//! [`MeshGeometry`] is a plain attribute container: a flat position buffer,
//! an optional index buffer, optional UVs and normals, and material groups.
//! Building a [`MeshBvh`](crate::MeshBvh) takes ownership of it and reorders
//! the index buffer in place; positions are never moved.

use meshbvh_math::{Aabb3, Point2, Point3, Triangle};
use serde::{Deserialize, Serialize};

use crate::error::{BvhError, Result};

/// A contiguous run of index entries drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryGroup {
    /// First index entry of the group.
    pub start: u32,
    /// Number of index entries.
    pub count: u32,
    /// Material slot.
    pub material_index: u32,
}

impl GeometryGroup {
    /// Create a group over `count` index entries starting at `start`.
    pub fn new(start: u32, count: u32, material_index: u32) -> Self {
        Self {
            start,
            count,
            material_index,
        }
    }
}

/// Triangle mesh attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Index buffer, three entries per triangle.
    pub index: Option<Vec<u32>>,
    /// Flat vertex positions.
    pub positions: Vec<f32>,
    /// Components per position. Only 3 is accepted by the builder.
    pub position_item_size: usize,
    /// Material groups, in index-entry units.
    pub groups: Vec<GeometryGroup>,
    /// Optional per-vertex texture coordinates, two per vertex.
    pub uvs: Option<Vec<f32>>,
    /// Optional per-vertex normals, three per vertex.
    pub normals: Option<Vec<f32>>,
}

impl MeshGeometry {
    /// Indexed geometry from flat positions and an index buffer.
    pub fn new(positions: Vec<f32>, index: Vec<u32>) -> Self {
        Self {
            index: Some(index),
            positions,
            position_item_size: 3,
            ..Default::default()
        }
    }

    /// Non-indexed geometry: every three consecutive vertices form a triangle.
    pub fn non_indexed(positions: Vec<f32>) -> Self {
        Self {
            index: None,
            positions,
            position_item_size: 3,
            ..Default::default()
        }
    }

    /// Indexed geometry from points and triangles.
    pub fn from_triangles(vertices: &[Point3], triangles: &[[u32; 3]]) -> Self {
        let positions = vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let index = triangles.iter().flatten().copied().collect();
        Self::new(positions, index)
    }

    /// Attach material groups.
    pub fn with_groups(mut self, groups: Vec<GeometryGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Attach texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<f32>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attach vertex normals.
    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Number of vertices in the position buffer.
    pub fn vertex_count(&self) -> usize {
        if self.position_item_size == 0 {
            return 0;
        }
        self.positions.len() / self.position_item_size
    }

    /// Number of triangles described by the index (or by the positions when
    /// non-indexed).
    pub fn triangle_count(&self) -> usize {
        match &self.index {
            Some(index) => index.len() / 3,
            None => self.vertex_count() / 3,
        }
    }

    /// The index buffer, empty when absent.
    pub fn index_slice(&self) -> &[u32] {
        self.index.as_deref().unwrap_or(&[])
    }

    /// Generate a sequential index `0..vertex_count` if none exists.
    pub fn ensure_index(&mut self) {
        if self.index.is_none() {
            let count = (self.vertex_count() / 3 * 3) as u32;
            self.index = Some((0..count).collect());
        }
    }

    /// Position of vertex `i`.
    #[inline]
    pub fn vertex(&self, i: u32) -> Point3 {
        let o = i as usize * self.position_item_size;
        Point3::new(self.positions[o], self.positions[o + 1], self.positions[o + 2])
    }

    /// Overwrite the position of vertex `i`.
    pub fn set_vertex(&mut self, i: u32, p: &Point3) {
        let o = i as usize * self.position_item_size;
        self.positions[o] = p.x;
        self.positions[o + 1] = p.y;
        self.positions[o + 2] = p.z;
    }

    /// Vertex indices of triangle `tri`.
    #[inline]
    pub fn triangle_indices(&self, tri: u32) -> [u32; 3] {
        let o = tri as usize * 3;
        match &self.index {
            Some(index) => [index[o], index[o + 1], index[o + 2]],
            None => [o as u32, o as u32 + 1, o as u32 + 2],
        }
    }

    /// Triangle `tri` read live from the position buffer.
    #[inline]
    pub fn triangle(&self, tri: u32) -> Triangle {
        let [a, b, c] = self.triangle_indices(tri);
        Triangle::new(self.vertex(a), self.vertex(b), self.vertex(c))
    }

    /// Texture coordinate of vertex `i`, if UVs are present.
    pub fn uv(&self, i: u32) -> Option<Point2> {
        let uvs = self.uvs.as_ref()?;
        let o = i as usize * 2;
        Some(Point2::new(*uvs.get(o)?, *uvs.get(o + 1)?))
    }

    /// Material of the group containing triangle `tri`, 0 when ungrouped.
    pub fn material_index_of(&self, tri: u32) -> u32 {
        let first = u64::from(tri) * 3;
        self.groups
            .iter()
            .find(|g| {
                let start = u64::from(g.start);
                (start..start + u64::from(g.count)).contains(&first)
            })
            .map_or(0, |g| g.material_index)
    }

    /// Box around every vertex in the position buffer.
    pub fn bounding_box(&self) -> Aabb3 {
        let mut bounds = Aabb3::empty();
        for i in 0..self.vertex_count() {
            bounds.include_point(&self.vertex(i as u32));
        }
        bounds
    }

    /// Check that the geometry is something the builder can work with.
    pub fn validate(&self) -> Result<()> {
        if self.position_item_size != 3 {
            return Err(BvhError::InvalidItemSize(self.position_item_size));
        }
        if self.positions.len() % 3 != 0 {
            return Err(BvhError::MalformedPositions(self.positions.len()));
        }
        let index = self.index.as_ref().ok_or(BvhError::MissingIndex)?;
        if index.len() % 3 != 0 {
            return Err(BvhError::IndexNotTriangles(index.len()));
        }
        let vertex_count = self.vertex_count();
        if let Some(&bad) = index.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(BvhError::IndexOutOfRange {
                index: bad,
                vertex_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshGeometry {
        MeshGeometry::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_triangle_access() {
        let g = quad();
        assert_eq!(g.triangle_count(), 2);
        assert_eq!(g.triangle_indices(1), [0, 2, 3]);
        let t = g.triangle(0);
        assert_eq!(t.b, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ensure_index() {
        let mut g = MeshGeometry::non_indexed(vec![0.0; 3 * 7]);
        assert_eq!(g.validate(), Err(BvhError::MissingIndex));
        g.ensure_index();
        assert_eq!(g.index_slice(), &[0, 1, 2, 3, 4, 5]);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        let mut g = quad();
        g.index = Some(vec![0, 1]);
        assert_eq!(g.validate(), Err(BvhError::IndexNotTriangles(2)));

        let mut g = quad();
        g.index = Some(vec![0, 1, 9]);
        assert!(matches!(
            g.validate(),
            Err(BvhError::IndexOutOfRange { index: 9, .. })
        ));

        let mut g = quad();
        g.position_item_size = 4;
        assert_eq!(g.validate(), Err(BvhError::InvalidItemSize(4)));
    }

    #[test]
    fn test_material_lookup() {
        let g = quad().with_groups(vec![GeometryGroup::new(0, 3, 2), GeometryGroup::new(3, 3, 5)]);
        assert_eq!(g.material_index_of(0), 2);
        assert_eq!(g.material_index_of(1), 5);
        assert_eq!(quad().material_index_of(1), 0);
    }

    #[test]
    fn test_open_ended_group() {
        let g = quad().with_groups(vec![GeometryGroup::new(3, u32::MAX, 4)]);
        assert_eq!(g.material_index_of(0), 0);
        assert_eq!(g.material_index_of(1), 4);
    }

    #[test]
    fn test_uvs() {
        let g = quad().with_uvs(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(g.uv(2), Some(Point2::new(1.0, 1.0)));
        assert_eq!(quad().uv(0), None);
    }
}
