//! Ray queries.

use meshbvh_math::{Aabb3, Point2, Point3, Ray, Transform, Triangle, Vec3};
use serde::{Deserialize, Serialize};

use crate::bvh::MeshBvh;
use crate::geometry::MeshGeometry;
use crate::shapecast::{BoundsIntersection, NodeRef, ShapecastVisitor};

/// Which triangle faces a ray may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Counter-clockwise winding facing the ray.
    #[default]
    Front,
    /// Clockwise winding facing the ray.
    Back,
    /// Either winding.
    Double,
}

/// The triangle a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Face {
    /// First vertex index.
    pub a: u32,
    /// Second vertex index.
    pub b: u32,
    /// Third vertex index.
    pub c: u32,
    /// Unit normal from the winding order, in mesh space (world space for
    /// [`MeshBvh::raycast_world`] hits).
    pub normal: Vec3,
    /// Material of the group holding the triangle.
    pub material_index: u32,
}

/// A ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f32,
    /// Hit point.
    pub point: Point3,
    /// Triangle that was hit.
    pub face: Face,
    /// Triangle number in BVH order.
    pub face_index: u32,
    /// Interpolated texture coordinate, if the geometry has UVs.
    pub uv: Option<Point2>,
}

/// Intersect one triangle of `geometry`, honoring `side`.
pub(crate) fn intersect_triangle(
    geometry: &MeshGeometry,
    triangle: &Triangle,
    tri: u32,
    ray: &Ray,
    side: Side,
) -> Option<RayHit> {
    let Triangle { a, b, c } = triangle;
    let t = match side {
        Side::Front => ray.intersect_triangle(a, b, c, true),
        Side::Back => ray.intersect_triangle(c, b, a, true),
        Side::Double => ray.intersect_triangle(a, b, c, false),
    }?;
    let point = ray.at(t);
    Some(triangle_hit_info(geometry, triangle, tri, point, t))
}

/// Hit record for `point` on triangle `tri`: face indices, normal, material
/// and interpolated UV.
pub fn triangle_hit_info(
    geometry: &MeshGeometry,
    triangle: &Triangle,
    tri: u32,
    point: Point3,
    distance: f32,
) -> RayHit {
    let [ia, ib, ic] = geometry.triangle_indices(tri);
    let uv = match (geometry.uv(ia), geometry.uv(ib), geometry.uv(ic), triangle.barycoord(&point)) {
        (Some(ua), Some(ub), Some(uc), Some(w)) => {
            Some(Point2::from(ua.coords * w.x + ub.coords * w.y + uc.coords * w.z))
        }
        _ => None,
    };
    RayHit {
        distance,
        point,
        face: Face {
            a: ia,
            b: ib,
            c: ic,
            normal: triangle.normal(),
            material_index: geometry.material_index_of(tri),
        },
        face_index: tri,
        uv,
    }
}

struct AllHits<'a> {
    ray: &'a Ray,
    side: Side,
    hits: Vec<RayHit>,
    geometry: &'a MeshGeometry,
}

impl ShapecastVisitor for AllHits<'_> {
    fn intersects_bounds(&mut self, bounds: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.ray.intersects_aabb(bounds).into()
    }

    fn intersects_triangle(&mut self, triangle: &Triangle, index: u32, _: bool, _: u32) -> bool {
        if let Some(hit) = intersect_triangle(self.geometry, triangle, index, self.ray, self.side) {
            self.hits.push(hit);
        }
        false
    }
}

struct FirstHit<'a> {
    ray: &'a Ray,
    side: Side,
    best: Option<RayHit>,
    geometry: &'a MeshGeometry,
}

impl ShapecastVisitor for FirstHit<'_> {
    fn bounds_traverse_order(&mut self, bounds: &Aabb3) -> Option<f32> {
        Some(self.ray.intersect_aabb(bounds).map_or(f32::INFINITY, |(t, _)| t))
    }

    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, score: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        let entry = score.unwrap_or(f32::INFINITY);
        let beyond_best = self.best.as_ref().is_some_and(|hit| entry > hit.distance);
        (entry.is_finite() && !beyond_best).into()
    }

    fn intersects_triangle(&mut self, triangle: &Triangle, index: u32, _: bool, _: u32) -> bool {
        if let Some(hit) = intersect_triangle(self.geometry, triangle, index, self.ray, self.side) {
            if self.best.as_ref().map_or(true, |best| hit.distance < best.distance) {
                self.best = Some(hit);
            }
        }
        false
    }
}

/// A raycast against a mesh placed in the world by `matrix_world`.
#[derive(Debug, Clone, Copy)]
pub struct WorldRaycast {
    /// Ray in world space.
    pub ray: Ray,
    /// Mesh-to-world transform.
    pub matrix_world: Transform,
    /// Faces that may be hit.
    pub side: Side,
    /// Hits closer than this world distance are dropped.
    pub near: f32,
    /// Hits farther than this world distance are dropped.
    pub far: f32,
    /// Report only the closest hit.
    pub first_hit_only: bool,
}

impl WorldRaycast {
    /// Unbounded double-sided query for every hit.
    pub fn new(ray: Ray, matrix_world: Transform) -> Self {
        Self {
            ray,
            matrix_world,
            side: Side::Double,
            near: 0.0,
            far: f32::INFINITY,
            first_hit_only: false,
        }
    }
}

impl MeshBvh {
    /// Every intersection of `ray` with the mesh, in traversal order.
    pub fn raycast(&self, ray: &Ray, side: Side) -> Vec<RayHit> {
        let mut visitor = AllHits {
            ray,
            side,
            hits: Vec::new(),
            geometry: &self.geometry,
        };
        self.shapecast(&mut visitor);
        visitor.hits
    }

    /// The closest intersection of `ray` with the mesh.
    ///
    /// Children are visited nearest entry first and boxes entered beyond the
    /// best hit so far are skipped.
    pub fn raycast_first(&self, ray: &Ray, side: Side) -> Option<RayHit> {
        let mut visitor = FirstHit {
            ray,
            side,
            best: None,
            geometry: &self.geometry,
        };
        self.shapecast(&mut visitor);
        visitor.best
    }

    /// Raycast in world space. Points and distances in the results are in
    /// world units, sorted by distance, with face normals in world space.
    pub fn raycast_world(&self, query: &WorldRaycast) -> Vec<RayHit> {
        let Some(inverse) = query.matrix_world.inverse() else {
            log::warn!("raycast_world: mesh transform is not invertible");
            return Vec::new();
        };
        let local_ray = query.ray.transformed(&inverse);
        let local_hits = if query.first_hit_only {
            self.raycast_first(&local_ray, query.side).into_iter().collect()
        } else {
            self.raycast(&local_ray, query.side)
        };

        let mut hits: Vec<RayHit> = local_hits
            .into_iter()
            .map(|mut hit| {
                hit.point = query.matrix_world.apply_point(&hit.point);
                let normal = query.matrix_world.apply_normal(&hit.face.normal);
                hit.face.normal = normal.try_normalize(f32::EPSILON).unwrap_or(normal);
                hit.distance = (hit.point - query.ray.origin).norm();
                hit
            })
            .filter(|hit| hit.distance >= query.near && hit.distance <= query.far)
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
