//! Generic visitor-driven traversal.
//!
//! Every query in this crate is a [`ShapecastVisitor`]: the traversal asks
//! the visitor whether each child box is worth entering, optionally in a
//! visitor-chosen order, and hands it the triangle ranges of the leaves it
//! reaches. Returning `true` from any triangle or range callback stops the
//! whole traversal.

use meshbvh_math::{Aabb3, Triangle};

use crate::geometry::MeshGeometry;
use crate::node::{subtree_range, PackedNode, TriangleRange};

/// Answer of [`ShapecastVisitor::intersects_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsIntersection {
    /// Skip the subtree.
    NotIntersected,
    /// Descend into the subtree.
    Intersected,
    /// The query shape holds the whole box: hand over the subtree's entire
    /// triangle range at once.
    Contained,
}

impl From<bool> for BoundsIntersection {
    fn from(hit: bool) -> Self {
        if hit {
            BoundsIntersection::Intersected
        } else {
            BoundsIntersection::NotIntersected
        }
    }
}

/// Identifies a node: root number and position in that root's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    /// Root the node belongs to.
    pub root: usize,
    /// Index into the root's node buffer.
    pub node: usize,
}

/// Callbacks driving a shapecast.
pub trait ShapecastVisitor {
    /// Score used to order the two children of a node; lower is visited
    /// first. `None` keeps the stored order.
    fn bounds_traverse_order(&mut self, _bounds: &Aabb3) -> Option<f32> {
        None
    }

    /// Decide whether to enter a child box. `score` is the value returned by
    /// [`bounds_traverse_order`](Self::bounds_traverse_order) for this box.
    fn intersects_bounds(
        &mut self,
        bounds: &Aabb3,
        is_leaf: bool,
        score: Option<f32>,
        depth: u32,
        node: NodeRef,
    ) -> BoundsIntersection;

    /// Called for each reached leaf and for contained subtrees. The default
    /// visits every triangle with [`intersects_triangle`](Self::intersects_triangle).
    fn intersects_range(
        &mut self,
        geometry: &MeshGeometry,
        range: TriangleRange,
        contained: bool,
        depth: u32,
        _node: NodeRef,
        _bounds: &Aabb3,
    ) -> bool {
        visit_triangles(self, geometry, range, contained, depth)
    }

    /// Called per triangle by the default range handler.
    fn intersects_triangle(
        &mut self,
        _triangle: &Triangle,
        _triangle_index: u32,
        _contained: bool,
        _depth: u32,
    ) -> bool {
        false
    }
}

/// Feed each triangle of `range`, read live from the positions, to the
/// visitor. Stops at the first `true`.
pub fn visit_triangles<V: ShapecastVisitor + ?Sized>(
    visitor: &mut V,
    geometry: &MeshGeometry,
    range: TriangleRange,
    contained: bool,
    depth: u32,
) -> bool {
    for tri in range.iter() {
        let triangle = geometry.triangle(tri);
        if visitor.intersects_triangle(&triangle, tri, contained, depth) {
            return true;
        }
    }
    false
}

/// Run a shapecast over one packed root. The root's own box is not tested.
pub(crate) fn shapecast_root<V: ShapecastVisitor + ?Sized>(
    nodes: &[PackedNode],
    root: usize,
    geometry: &MeshGeometry,
    visitor: &mut V,
) -> bool {
    if nodes.is_empty() {
        return false;
    }
    Shapecast {
        nodes,
        root,
        geometry,
    }
    .visit(0, 0, visitor)
}

struct Shapecast<'a> {
    nodes: &'a [PackedNode],
    root: usize,
    geometry: &'a MeshGeometry,
}

impl Shapecast<'_> {
    fn node_ref(&self, node: usize) -> NodeRef {
        NodeRef {
            root: self.root,
            node,
        }
    }

    fn visit<V: ShapecastVisitor + ?Sized>(&self, node: usize, depth: u32, visitor: &mut V) -> bool {
        let packed = &self.nodes[node];
        if packed.is_leaf() {
            return visitor.intersects_range(
                self.geometry,
                packed.range(),
                false,
                depth,
                self.node_ref(node),
                &packed.aabb(),
            );
        }

        let mut first = (node + 1, self.nodes[node + 1].aabb());
        let mut second = (packed.right_child(), self.nodes[packed.right_child()].aabb());
        let mut first_score = visitor.bounds_traverse_order(&first.1);
        let mut second_score = visitor.bounds_traverse_order(&second.1);
        if let (Some(a), Some(b)) = (first_score, second_score) {
            if b < a {
                std::mem::swap(&mut first, &mut second);
                std::mem::swap(&mut first_score, &mut second_score);
            }
        }

        for ((child, bounds), score) in [(first, first_score), (second, second_score)] {
            let child_depth = depth + 1;
            let is_leaf = self.nodes[child].is_leaf();
            let stop = match visitor.intersects_bounds(&bounds, is_leaf, score, child_depth, self.node_ref(child)) {
                BoundsIntersection::NotIntersected => false,
                BoundsIntersection::Intersected => self.visit(child, child_depth, visitor),
                BoundsIntersection::Contained => visitor.intersects_range(
                    self.geometry,
                    subtree_range(self.nodes, child),
                    true,
                    child_depth,
                    self.node_ref(child),
                    &bounds,
                ),
            };
            if stop {
                return true;
            }
        }
        false
    }
}
