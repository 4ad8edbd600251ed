//! Shared meshes for unit tests.

use meshbvh_math::Point3;

use crate::geometry::MeshGeometry;

/// `n * n` unit quads in the z = 0 plane, two triangles each, wound to face +z.
pub fn grid(n: u32) -> MeshGeometry {
    let mut vertices = Vec::new();
    for y in 0..=n {
        for x in 0..=n {
            vertices.push(Point3::new(x as f32, y as f32, 0.0));
        }
    }
    let mut triangles = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let i = y * (n + 1) + x;
            triangles.push([i, i + 1, i + n + 2]);
            triangles.push([i, i + n + 2, i + n + 1]);
        }
    }
    MeshGeometry::from_triangles(&vertices, &triangles)
}

/// Axis-aligned cube `[-1, 1]^3`, twelve outward-facing triangles.
pub fn cube() -> MeshGeometry {
    let vertices: Vec<Point3> = (0..8)
        .map(|i| {
            Point3::new(
                if i & 4 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 1.0 } else { -1.0 },
                if i & 1 != 0 { 1.0 } else { -1.0 },
            )
        })
        .collect();
    let triangles = [
        [0, 1, 3], [0, 3, 2], // -x
        [4, 6, 7], [4, 7, 5], // +x
        [0, 4, 5], [0, 5, 1], // -y
        [2, 3, 7], [2, 7, 6], // +y
        [0, 2, 6], [0, 6, 4], // -z
        [1, 5, 7], [1, 7, 3], // +z
    ];
    MeshGeometry::from_triangles(&vertices, &triangles)
}
