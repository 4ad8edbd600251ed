//! Tree statistics and consistency checks.

use serde::Serialize;

use crate::build::{TRAVERSAL_COST, TRIANGLE_INTERSECT_COST};
use crate::bvh::MeshBvh;
use crate::node::{PackedNode, NODE_BYTES};

/// Minimum and maximum of some per-node quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extremes {
    /// Smallest value seen.
    pub min: u32,
    /// Largest value seen.
    pub max: u32,
}

impl Extremes {
    fn new() -> Self {
        Self {
            min: u32::MAX,
            max: 0,
        }
    }

    fn add(&mut self, value: u32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

/// Shape statistics of one root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootStats {
    /// Total nodes.
    pub node_count: usize,
    /// Leaf nodes.
    pub leaf_count: usize,
    /// Leaf depths.
    pub depth: Extremes,
    /// Triangles per leaf.
    pub triangles: Extremes,
    /// Internal nodes split along x, y and z.
    pub split_axes: [usize; 3],
    /// Expected cost of a random ray against this tree relative to its root
    /// box, using the construction cost model.
    pub surface_area_score: f32,
}

/// A node whose box fails to enclose what it should.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsViolation {
    /// Root of the offending node.
    pub root: usize,
    /// Index of the offending node.
    pub node: usize,
    /// What is outside the box.
    pub reason: String,
}

impl MeshBvh {
    /// Per-root shape statistics.
    pub fn extremes(&self) -> Vec<RootStats> {
        self.roots.iter().map(|nodes| root_stats(nodes)).collect()
    }

    /// Approximate heap bytes held by node buffers and the index.
    pub fn estimate_memory_bytes(&self) -> usize {
        let nodes: usize = self.roots.iter().map(|r| r.len() * NODE_BYTES).sum();
        nodes + self.geometry.index_slice().len() * std::mem::size_of::<u32>()
    }

    /// Check that leaves enclose their triangles and parents enclose their
    /// children. An empty result means the tree is consistent.
    pub fn validate_bounds(&self) -> Vec<BoundsViolation> {
        let mut violations = Vec::new();
        self.traverse(|visit| {
            let bounds = visit.node.aabb();
            if visit.node.is_leaf() {
                for tri in visit.node.range().iter() {
                    let triangle = self.geometry.triangle(tri);
                    if triangle.points().iter().any(|p| !bounds.contains_point(p)) {
                        violations.push(BoundsViolation {
                            root: visit.root,
                            node: visit.index,
                            reason: format!("triangle {tri} outside leaf box"),
                        });
                    }
                }
            } else {
                let nodes = &self.roots[visit.root];
                for child in [visit.index + 1, visit.node.right_child()] {
                    if !bounds.contains_box(&nodes[child].aabb()) {
                        violations.push(BoundsViolation {
                            root: visit.root,
                            node: visit.index,
                            reason: format!("child {child} outside parent box"),
                        });
                    }
                }
            }
            false
        });
        if !violations.is_empty() {
            log::warn!("BVH bounds check found {} violations", violations.len());
        }
        violations
    }
}

fn root_stats(nodes: &[PackedNode]) -> RootStats {
    let mut stats = RootStats {
        node_count: nodes.len(),
        leaf_count: 0,
        depth: Extremes::new(),
        triangles: Extremes::new(),
        split_axes: [0; 3],
        surface_area_score: 0.0,
    };
    let Some(root) = nodes.first() else {
        return stats;
    };

    let mut score = 0.0f32;
    let mut stack = vec![(0usize, 0u32)];
    while let Some((i, depth)) = stack.pop() {
        let node = &nodes[i];
        let area = node.aabb().surface_area();
        if node.is_leaf() {
            stats.leaf_count += 1;
            stats.depth.add(depth);
            stats.triangles.add(node.triangle_count());
            score += area * TRIANGLE_INTERSECT_COST * node.triangle_count() as f32;
        } else {
            stats.split_axes[node.split_axis().min(2)] += 1;
            score += area * TRAVERSAL_COST;
            stack.push((node.right_child(), depth + 1));
            stack.push((i + 1, depth + 1));
        }
    }

    let root_area = root.aabb().surface_area();
    stats.surface_area_score = if root_area > 0.0 { score / root_area } else { 0.0 };
    stats
}
