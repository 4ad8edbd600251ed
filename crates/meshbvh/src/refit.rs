//! Updating node bounds after vertices move.

use meshbvh_math::Aabb3;

use crate::bvh::MeshBvh;
use crate::geometry::MeshGeometry;
use crate::node::{subtree_range, PackedNode};

impl MeshBvh {
    /// Recompute node bounds from the current vertex positions without
    /// changing the tree's shape.
    ///
    /// With `changed_triangles`, only leaves holding one of the listed
    /// triangles (numbers in BVH order) are recomputed, along with their
    /// ancestors; every other leaf is assumed unchanged. Parents are only
    /// rewritten when a child's box actually changed.
    pub fn refit(&mut self, changed_triangles: Option<&[u32]>) {
        let sorted = changed_triangles.map(|ids| {
            let mut ids = ids.to_vec();
            ids.sort_unstable();
            ids.dedup();
            ids
        });

        let mut updated = 0;
        for root in &mut self.roots {
            let nodes = root.make_mut();
            if nodes.is_empty() {
                continue;
            }
            updated += usize::from(refit_node(nodes, 0, &self.geometry, sorted.as_deref()));
        }
        log::debug!(
            "refit {} of {} roots ({})",
            updated,
            self.roots.len(),
            if sorted.is_some() { "partial" } else { "full" }
        );
    }
}

/// Refit the subtree at `node`; returns whether its box changed.
fn refit_node(nodes: &mut [PackedNode], node: usize, geometry: &MeshGeometry, changed: Option<&[u32]>) -> bool {
    if nodes[node].is_leaf() {
        let mut bounds = Aabb3::empty();
        for tri in nodes[node].range().iter() {
            let [a, b, c] = geometry.triangle_indices(tri);
            bounds.include_point(&geometry.vertex(a));
            bounds.include_point(&geometry.vertex(b));
            bounds.include_point(&geometry.vertex(c));
        }
        return store_bounds(&mut nodes[node], &bounds);
    }

    let left = node + 1;
    let right = nodes[node].right_child();
    let mut child_changed = false;
    for child in [left, right] {
        let affected = match changed {
            Some(ids) => subtree_range(nodes, child).contains_any(ids),
            None => true,
        };
        if affected {
            child_changed |= refit_node(nodes, child, geometry, changed);
        }
    }
    if !child_changed {
        return false;
    }

    let bounds = nodes[left].aabb().union(&nodes[right].aabb());
    store_bounds(&mut nodes[node], &bounds)
}

fn store_bounds(node: &mut PackedNode, bounds: &Aabb3) -> bool {
    let packed = bounds.to_array();
    if node.bounds == packed {
        return false;
    }
    node.bounds = packed;
    true
}
