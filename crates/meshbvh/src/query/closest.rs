//! Closest-point queries.

use meshbvh_math::{Aabb3, OrientedBox, Point3, Transform, Triangle};
use serde::Serialize;

use crate::bvh::MeshBvh;
use crate::geometry::MeshGeometry;
use crate::node::TriangleRange;
use crate::shapecast::{BoundsIntersection, NodeRef, ShapecastVisitor};

/// A point on a mesh surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosestPoint {
    /// The point.
    pub point: Point3,
    /// Distance to the query.
    pub distance: f32,
    /// Triangle number in BVH order (or in the other geometry's order).
    pub face_index: u32,
}

/// Distance window for closest-point queries.
///
/// Results farther than `max` are discarded. The search stops as soon as
/// something within `min` turns up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceLimits {
    /// Stop searching below this distance.
    pub min: f32,
    /// Ignore anything beyond this distance.
    pub max: f32,
}

impl Default for DistanceLimits {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f32::INFINITY,
        }
    }
}

impl DistanceLimits {
    /// Only accept results within `max`.
    pub fn within(max: f32) -> Self {
        Self {
            max,
            ..Self::default()
        }
    }
}

struct ClosestToPoint<'a> {
    point: &'a Point3,
    min_sq: f32,
    max_sq: f32,
    best_sq: f32,
    best: Option<ClosestPoint>,
}

impl ShapecastVisitor for ClosestToPoint<'_> {
    fn bounds_traverse_order(&mut self, bounds: &Aabb3) -> Option<f32> {
        Some(bounds.distance_squared_to_point(self.point))
    }

    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, score: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        let d = score.unwrap_or(0.0);
        (d < self.best_sq && d <= self.max_sq).into()
    }

    fn intersects_triangle(&mut self, triangle: &Triangle, index: u32, _: bool, _: u32) -> bool {
        let q = triangle.closest_point_to_point(self.point);
        let d = (q - self.point).norm_squared();
        if d < self.best_sq && d <= self.max_sq {
            self.best_sq = d;
            self.best = Some(ClosestPoint {
                point: q,
                distance: d.sqrt(),
                face_index: index,
            });
        }
        self.best_sq <= self.min_sq
    }
}

/// Best triangle pair found so far. Both points are kept in this BVH's
/// frame until the search ends.
struct PairSearch {
    limits: DistanceLimits,
    best: f32,
    found: Option<(ClosestPoint, ClosestPoint)>,
}

impl PairSearch {
    fn new(limits: DistanceLimits) -> Self {
        Self {
            limits,
            best: f32::INFINITY,
            found: None,
        }
    }

    /// Worth looking at something at least `lower_bound` away?
    fn worth(&self, lower_bound: f32) -> bool {
        lower_bound < self.best && lower_bound <= self.limits.max
    }

    /// Check every triangle of `range` against `other`. Returns `true` once a
    /// pair within the minimum distance is found.
    fn consider_range(
        &mut self,
        geometry: &MeshGeometry,
        range: TriangleRange,
        other: &Triangle,
        other_index: u32,
    ) -> bool {
        for tri in range.iter() {
            let (d, on_mine, on_other) = geometry.triangle(tri).distance_to_triangle(other);
            if d < self.best && d <= self.limits.max {
                self.best = d;
                self.found = Some((
                    ClosestPoint {
                        point: on_mine,
                        distance: d,
                        face_index: tri,
                    },
                    ClosestPoint {
                        point: on_other,
                        distance: d,
                        face_index: other_index,
                    },
                ));
            }
            if self.best <= self.limits.min {
                return true;
            }
        }
        false
    }

    fn finish(self, to_other: &Transform) -> Option<(ClosestPoint, ClosestPoint)> {
        self.found.map(|(mine, mut theirs)| {
            theirs.point = to_other.apply_point(&theirs.point);
            (mine, theirs)
        })
    }
}

struct ClosestToGeometry<'a> {
    other: &'a MeshGeometry,
    to_local: &'a Transform,
    obb: OrientedBox,
    search: PairSearch,
}

impl ShapecastVisitor for ClosestToGeometry<'_> {
    fn bounds_traverse_order(&mut self, bounds: &Aabb3) -> Option<f32> {
        Some(self.obb.distance_to_box(bounds))
    }

    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, score: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.search.worth(score.unwrap_or(0.0)).into()
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
            if !self.search.worth(other.bounding_box().distance_to_box(bounds)) {
                continue;
            }
            if self.search.consider_range(geometry, range, &other, j) {
                return true;
            }
        }
        false
    }
}

struct ClosestToBvh<'a> {
    other: &'a MeshBvh,
    to_local: &'a Transform,
    obb: OrientedBox,
    search: PairSearch,
}

impl ShapecastVisitor for ClosestToBvh<'_> {
    fn bounds_traverse_order(&mut self, bounds: &Aabb3) -> Option<f32> {
        Some(self.obb.distance_to_box(bounds))
    }

    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, score: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.search.worth(score.unwrap_or(0.0)).into()
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
        let mut inner = LeafAgainstBvh {
            geometry,
            range,
            leaf_bounds: bounds,
            to_local: self.to_local,
            search: &mut self.search,
        };
        self.other.shapecast(&mut inner)
    }
}

/// Walks the other BVH looking for triangles near one leaf of this one.
struct LeafAgainstBvh<'a> {
    geometry: &'a MeshGeometry,
    range: TriangleRange,
    leaf_bounds: &'a Aabb3,
    to_local: &'a Transform,
    search: &'a mut PairSearch,
}

impl ShapecastVisitor for LeafAgainstBvh<'_> {
    fn bounds_traverse_order(&mut self, bounds: &Aabb3) -> Option<f32> {
        Some(OrientedBox::from_aabb(bounds, self.to_local).distance_to_box(self.leaf_bounds))
    }

    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, score: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        self.search.worth(score.unwrap_or(0.0)).into()
    }

    fn intersects_triangle(&mut self, triangle: &Triangle, index: u32, _: bool, _: u32) -> bool {
        let other = triangle.transformed(self.to_local);
        if !self.search.worth(other.bounding_box().distance_to_box(self.leaf_bounds)) {
            return false;
        }
        self.search.consider_range(self.geometry, self.range, &other, index)
    }
}

impl MeshBvh {
    /// The surface point closest to `point`.
    ///
    /// Returns `None` when nothing lies within `limits.max`. Once a point
    /// within `limits.min` is found it is returned without looking further.
    pub fn closest_point_to_point(&self, point: &Point3, limits: DistanceLimits) -> Option<ClosestPoint> {
        let mut visitor = ClosestToPoint {
            point,
            min_sq: limits.min * limits.min,
            max_sq: limits.max * limits.max,
            best_sq: f32::INFINITY,
            best: None,
        };
        self.shapecast(&mut visitor);
        visitor.best
    }

    /// Closest pair of points between this mesh and `other`, placed in this
    /// mesh's frame by `geometry_to_bvh`.
    ///
    /// The first result is on this mesh in its own frame; the second is on
    /// `other` in `other`'s frame. Every triangle of `other` is visited for
    /// each candidate leaf; use [`closest_point_to_bvh`](Self::closest_point_to_bvh)
    /// when `other` has a BVH of its own.
    pub fn closest_point_to_geometry(
        &self,
        other: &MeshGeometry,
        geometry_to_bvh: &Transform,
        limits: DistanceLimits,
    ) -> Option<(ClosestPoint, ClosestPoint)> {
        let other_bounds = other.bounding_box();
        if other_bounds.is_empty() {
            return None;
        }
        let Some(to_other) = geometry_to_bvh.inverse() else {
            log::warn!("closest_point_to_geometry: transform is not invertible");
            return None;
        };
        let mut visitor = ClosestToGeometry {
            other,
            to_local: geometry_to_bvh,
            obb: OrientedBox::from_aabb(&other_bounds, geometry_to_bvh),
            search: PairSearch::new(limits),
        };
        self.shapecast(&mut visitor);
        visitor.search.finish(&to_other)
    }

    /// Like [`closest_point_to_geometry`](Self::closest_point_to_geometry),
    /// descending `other`'s BVH for each candidate leaf instead of scanning
    /// all of its triangles.
    pub fn closest_point_to_bvh(
        &self,
        other: &MeshBvh,
        other_to_bvh: &Transform,
        limits: DistanceLimits,
    ) -> Option<(ClosestPoint, ClosestPoint)> {
        let other_bounds = other.bounding_box();
        if other_bounds.is_empty() {
            return None;
        }
        let Some(to_other) = other_to_bvh.inverse() else {
            log::warn!("closest_point_to_bvh: transform is not invertible");
            return None;
        };
        let mut visitor = ClosestToBvh {
            other,
            to_local: other_to_bvh,
            obb: OrientedBox::from_aabb(&other_bounds, other_to_bvh),
            search: PairSearch::new(limits),
        };
        self.shapecast(&mut visitor);
        visitor.search.finish(&to_other)
    }
}
