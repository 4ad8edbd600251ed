//! Boolean overlap queries.

use meshbvh_math::{Aabb3, OrientedBox, Point3, Sphere, Transform, Triangle};

use crate::bvh::MeshBvh;
use crate::geometry::MeshGeometry;
use crate::node::TriangleRange;
use crate::shapecast::{BoundsIntersection, NodeRef, ShapecastVisitor};

struct BoxQuery {
    obb: OrientedBox,
}

impl ShapecastVisitor for BoxQuery {
    fn intersects_bounds(&mut self, bounds: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.obb.intersects_box(bounds).into()
    }

    fn intersects_triangle(&mut self, triangle: &Triangle, _: u32, _: bool, _: u32) -> bool {
        self.obb.intersects_triangle(triangle)
    }
}

struct SphereQuery<'a> {
    sphere: &'a Sphere,
}

impl ShapecastVisitor for SphereQuery<'_> {
    fn intersects_bounds(&mut self, bounds: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        if self.sphere.contains_aabb(bounds) {
            BoundsIntersection::Contained
        } else {
            self.sphere.intersects_aabb(bounds).into()
        }
    }

    fn intersects_range(
        &mut self,
        geometry: &MeshGeometry,
        range: TriangleRange,
        contained: bool,
        _: u32,
        _: NodeRef,
        _: &Aabb3,
    ) -> bool {
        // Every triangle of a contained box touches the sphere.
        (contained && range.count > 0)
            || range
                .iter()
                .any(|tri| geometry.triangle(tri).intersects_sphere(self.sphere))
    }
}

struct GeometryQuery<'a> {
    other: &'a MeshGeometry,
    to_local: &'a Transform,
    obb: OrientedBox,
}

impl ShapecastVisitor for GeometryQuery<'_> {
    fn intersects_bounds(&mut self, bounds: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.obb.intersects_box(bounds).into()
    }

    fn intersects_range(
        &mut self,
        geometry: &MeshGeometry,
        range: TriangleRange,
        _: bool,
        _: u32,
        _: NodeRef,
        bounds: &Aabb3,
    ) -> bool {
        for j in 0..self.other.triangle_count() as u32 {
            let other = self.other.triangle(j).transformed(self.to_local);
            if !other.bounding_box().overlaps(bounds) {
                continue;
            }
            if range
                .iter()
                .any(|tri| geometry.triangle(tri).intersects_triangle(&other))
            {
                return true;
            }
        }
        false
    }
}

impl MeshBvh {
    /// True if any triangle overlaps the box `[min, max]` placed in mesh space
    /// by `box_to_mesh`.
    pub fn intersects_box(&self, min: Point3, max: Point3, box_to_mesh: &Transform) -> bool {
        let mut visitor = BoxQuery {
            obb: OrientedBox::new(min, max, box_to_mesh),
        };
        self.shapecast(&mut visitor)
    }

    /// True if any triangle touches the sphere.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.shapecast(&mut SphereQuery { sphere })
    }

    /// True if any triangle of `other`, placed in mesh space by
    /// `geometry_to_bvh`, crosses or touches a triangle of this mesh.
    pub fn intersects_geometry(&self, other: &MeshGeometry, geometry_to_bvh: &Transform) -> bool {
        let other_bounds = other.bounding_box();
        if other_bounds.is_empty() {
            return false;
        }
        let mut visitor = GeometryQuery {
            other,
            to_local: geometry_to_bvh,
            obb: OrientedBox::from_aabb(&other_bounds, geometry_to_bvh),
        };
        self.shapecast(&mut visitor)
    }
}
