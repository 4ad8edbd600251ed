#![warn(missing_docs)]

//! Bounding volume hierarchy for indexed triangle meshes.
//!
//! [`MeshBvh`] partitions the triangles of a [`MeshGeometry`] into a binary
//! tree of axis-aligned boxes, packed into flat 32-byte node records, and
//! answers spatial queries against it:
//!
//! - raycasts (all hits or the closest one, in mesh or world space)
//! - closest point to a point, to another mesh, or to another BVH
//! - overlap tests against boxes, spheres and other meshes
//! - simultaneous traversal of two BVHs ([`MeshBvh::bvhcast`])
//! - custom traversals through [`ShapecastVisitor`]
//!
//! After vertices move, [`MeshBvh::refit`] updates the boxes in place. A
//! built tree can be snapshotted with [`MeshBvh::serialize`] and restored
//! without rebuilding.
//!
//! ```
//! use meshbvh::{BuildOptions, MeshBvh, MeshGeometry, Side};
//! use meshbvh_math::{Point3, Ray, Vec3};
//!
//! let geometry = MeshGeometry::from_triangles(
//!     &[
//!         Point3::new(-1.0, -1.0, 0.0),
//!         Point3::new(1.0, -1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     &[[0, 1, 2]],
//! );
//! let bvh = MeshBvh::new(geometry, BuildOptions::default()).unwrap();
//! let ray = Ray::new(Point3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
//! let hit = bvh.raycast_first(&ray, Side::Front).unwrap();
//! assert!((hit.distance - 2.0).abs() < 1e-6);
//! ```

pub mod build;
pub mod bvh;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod node;
pub mod options;
pub mod query;
mod refit;
pub mod serialize;
pub mod shapecast;

#[cfg(test)]
mod fixtures;

pub use build::{MAX_LEAF_COUNT, TRAVERSAL_COST, TRIANGLE_INTERSECT_COST};
pub use bvh::{MeshBvh, NodeVisit};
pub use debug::{BoundsViolation, Extremes, RootStats};
pub use error::{BvhError, Result};
pub use geometry::{GeometryGroup, MeshGeometry};
pub use node::{NodeBuffer, PackedNode, TriangleRange, LEAF_FLAG, NODE_BYTES};
pub use options::{BuildOptions, SplitStrategy};
pub use query::{
    triangle_hit_info, visit_triangle_pairs, BvhcastContext, BvhcastVisitor, ClosestPoint, DistanceLimits, Face,
    LeafRef, RayHit, Side, WorldRaycast,
};
pub use serialize::{DeserializeOptions, SerializedBvh};
pub use shapecast::{visit_triangles, BoundsIntersection, NodeRef, ShapecastVisitor};
