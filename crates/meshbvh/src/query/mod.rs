//! Spatial queries built on [`MeshBvh::shapecast`](crate::MeshBvh::shapecast).

pub mod bvhcast;
pub mod closest;
pub mod intersects;
pub mod raycast;

pub use bvhcast::{visit_triangle_pairs, BvhcastContext, BvhcastVisitor, LeafRef};
pub use closest::{ClosestPoint, DistanceLimits};
pub use raycast::{triangle_hit_info, Face, RayHit, Side, WorldRaycast};
