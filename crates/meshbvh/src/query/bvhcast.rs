//! Simultaneous traversal of two BVHs.

use meshbvh_math::{Aabb3, Transform, Triangle};

use crate::bvh::MeshBvh;
use crate::geometry::MeshGeometry;
use crate::node::{PackedNode, TriangleRange};
use crate::shapecast::NodeRef;

/// A leaf reached by [`MeshBvh::bvhcast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRef {
    /// Triangles of the leaf.
    pub range: TriangleRange,
    /// Depth of the leaf in its tree.
    pub depth: u32,
    /// The leaf node.
    pub node: NodeRef,
}

/// Both meshes of a bvhcast.
#[derive(Debug, Clone, Copy)]
pub struct BvhcastContext<'a> {
    /// Geometry of the BVH the cast was started on.
    pub local: &'a MeshGeometry,
    /// Geometry of the other BVH.
    pub other: &'a MeshGeometry,
    /// Places the other mesh in the local frame.
    pub other_to_local: &'a Transform,
}

/// Callbacks for [`MeshBvh::bvhcast`].
pub trait BvhcastVisitor {
    /// Called for each pair of leaves whose boxes may overlap. The default
    /// tests every triangle pair with
    /// [`intersects_triangles`](Self::intersects_triangles).
    fn intersects_ranges(&mut self, ctx: &BvhcastContext<'_>, local: LeafRef, other: LeafRef) -> bool {
        visit_triangle_pairs(self, ctx, local, other)
    }

    /// Called per triangle pair by the default range handler. `other` has
    /// already been moved into the local frame.
    fn intersects_triangles(
        &mut self,
        _local: &Triangle,
        _other: &Triangle,
        _local_index: u32,
        _other_index: u32,
    ) -> bool {
        false
    }
}

/// Feed every triangle pair of two leaves to the visitor, the other
/// triangle transformed into the local frame. Stops at the first `true`.
pub fn visit_triangle_pairs<V: BvhcastVisitor + ?Sized>(
    visitor: &mut V,
    ctx: &BvhcastContext<'_>,
    local: LeafRef,
    other: LeafRef,
) -> bool {
    for j in other.range.iter() {
        let theirs = ctx.other.triangle(j).transformed(ctx.other_to_local);
        for i in local.range.iter() {
            if visitor.intersects_triangles(&ctx.local.triangle(i), &theirs, i, j) {
                return true;
            }
        }
    }
    false
}

#[derive(Clone, Copy)]
struct Cursor<'a> {
    nodes: &'a [PackedNode],
    root: usize,
    index: usize,
    depth: u32,
}

impl Cursor<'_> {
    fn node(&self) -> &PackedNode {
        &self.nodes[self.index]
    }

    fn children(&self) -> [Self; 2] {
        let right = self.node().right_child();
        [
            Self {
                index: self.index + 1,
                depth: self.depth + 1,
                ..*self
            },
            Self {
                index: right,
                depth: self.depth + 1,
                ..*self
            },
        ]
    }

    fn leaf(&self) -> LeafRef {
        LeafRef {
            range: self.node().range(),
            depth: self.depth,
            node: NodeRef {
                root: self.root,
                node: self.index,
            },
        }
    }
}

struct DualTraversal<'a, V: ?Sized> {
    ctx: BvhcastContext<'a>,
    local_to_other: Option<Transform>,
    visitor: &'a mut V,
}

impl<V: BvhcastVisitor + ?Sized> DualTraversal<'_, V> {
    fn overlaps(&self, local: &Aabb3, other: &Aabb3) -> bool {
        if !local.overlaps(&other.transformed(self.ctx.other_to_local)) {
            return false;
        }
        match &self.local_to_other {
            Some(inverse) => other.overlaps(&local.transformed(inverse)),
            None => true,
        }
    }

    fn visit(&mut self, local: Cursor<'_>, other: Cursor<'_>) -> bool {
        let local_box = local.node().aabb();
        let other_box = other.node().aabb();
        if !self.overlaps(&local_box, &other_box) {
            return false;
        }

        match (local.node().is_leaf(), other.node().is_leaf()) {
            (true, true) => {
                let ctx = self.ctx;
                self.visitor.intersects_ranges(&ctx, local.leaf(), other.leaf())
            }
            (false, true) => local.children().into_iter().any(|c| self.visit(c, other)),
            (true, false) => other.children().into_iter().any(|c| self.visit(local, c)),
            (false, false) => {
                // Split whichever box is larger in the local frame.
                let other_area = other_box.transformed(self.ctx.other_to_local).surface_area();
                if local_box.surface_area() >= other_area {
                    local.children().into_iter().any(|c| self.visit(c, other))
                } else {
                    other.children().into_iter().any(|c| self.visit(local, c))
                }
            }
        }
    }
}

impl MeshBvh {
    /// Walk this BVH and `other` together, reporting pairs of leaves (and,
    /// by default, triangle pairs) whose boxes overlap once `other` is placed
    /// in this mesh's frame by `other_to_local`. Returns `true` as soon as a
    /// visitor callback does.
    pub fn bvhcast<V: BvhcastVisitor + ?Sized>(
        &self,
        other: &MeshBvh,
        other_to_local: &Transform,
        visitor: &mut V,
    ) -> bool {
        let mut traversal = DualTraversal {
            ctx: BvhcastContext {
                local: &self.geometry,
                other: &other.geometry,
                other_to_local,
            },
            local_to_other: other_to_local.inverse(),
            visitor,
        };

        for (local_root, local_nodes) in self.roots.iter().enumerate() {
            for (other_root, other_nodes) in other.roots.iter().enumerate() {
                if local_nodes.is_empty() || other_nodes.is_empty() {
                    continue;
                }
                let local = Cursor {
                    nodes: local_nodes,
                    root: local_root,
                    index: 0,
                    depth: 0,
                };
                let theirs = Cursor {
                    nodes: other_nodes,
                    root: other_root,
                    index: 0,
                    depth: 0,
                };
                if traversal.visit(local, theirs) {
                    return true;
                }
            }
        }
        false
    }

    /// True if any triangle of `other`, placed by `other_to_local`, crosses
    /// or touches a triangle of this mesh.
    pub fn intersects_bvh(&self, other: &MeshBvh, other_to_local: &Transform) -> bool {
        struct AnyContact;
        impl BvhcastVisitor for AnyContact {
            fn intersects_triangles(&mut self, local: &Triangle, other: &Triangle, _: u32, _: u32) -> bool {
                local.intersects_triangle(other)
            }
        }
        self.bvhcast(other, other_to_local, &mut AnyContact)
    }
}
