//! BVH construction.
//!
//! Construction works on a pointer tree of [`BuildNode`]s which is then
//! packed into the flat node layout. The index buffer of the geometry is
//! reordered so every leaf covers a contiguous run of triangles.

mod partition;
pub(crate) mod split;
mod triangle_bounds;

use meshbvh_math::Aabb3;

use crate::geometry::MeshGeometry;
use crate::options::BuildOptions;
use partition::partition;
use split::choose_split;
use triangle_bounds::TriangleBounds;

pub use split::{TRAVERSAL_COST, TRIANGLE_INTERSECT_COST};

/// Largest triangle count a packed leaf can hold.
pub const MAX_LEAF_COUNT: usize = u16::MAX as usize;

/// A node of the construction tree.
#[derive(Debug, Clone)]
pub(crate) enum BuildNode {
    /// Leaf over a contiguous range of triangles.
    Leaf {
        bounds: Aabb3,
        offset: u32,
        count: u32,
    },
    /// Internal node with exactly two children.
    Internal {
        bounds: Aabb3,
        split_axis: u8,
        left: Box<BuildNode>,
        right: Box<BuildNode>,
    },
}

impl BuildNode {
    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        match self {
            BuildNode::Leaf { .. } => 1,
            BuildNode::Internal { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }
}

/// Triangle ranges that each get their own root.
///
/// Without groups the whole index is one range. With groups, the sorted,
/// de-duplicated group boundaries (in triangles, clamped to the triangle
/// count) split it into consecutive ranges; triangles outside every group
/// still land in some range.
pub(crate) fn root_ranges(geometry: &MeshGeometry) -> Vec<(usize, usize)> {
    let tri_count = geometry.triangle_count();
    if tri_count == 0 {
        return Vec::new();
    }
    if geometry.groups.is_empty() {
        return vec![(0, tri_count)];
    }

    let mut boundaries = vec![0, tri_count];
    for group in &geometry.groups {
        let start = (group.start as usize / 3).min(tri_count);
        let end = ((group.start as usize + group.count as usize) / 3).min(tri_count);
        boundaries.push(start);
        boundaries.push(end);
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    boundaries
        .windows(2)
        .map(|w| (w[0], w[1] - w[0]))
        .collect()
}

struct TreeBuilder<'a, P: FnMut(f32)> {
    index: &'a mut [u32],
    tris: TriangleBounds,
    options: &'a BuildOptions,
    reached_max_depth: bool,
    total: usize,
    placed: usize,
    progress: P,
}

impl<P: FnMut(f32)> TreeBuilder<'_, P> {
    fn build(&mut self, offset: usize, count: usize) -> BuildNode {
        let (bounds, centroids) = self.tris.range_bounds(offset, count);
        self.split_node(bounds, centroids, offset, count, 0)
    }

    fn leaf(&mut self, bounds: Aabb3, offset: usize, count: usize) -> BuildNode {
        self.placed += count;
        (self.progress)(self.placed as f32 / self.total as f32);
        BuildNode::Leaf {
            bounds,
            offset: offset as u32,
            count: count as u32,
        }
    }

    fn split_node(
        &mut self,
        bounds: Aabb3,
        centroids: Aabb3,
        offset: usize,
        count: usize,
        depth: u32,
    ) -> BuildNode {
        let at_max_depth = depth >= self.options.max_depth;
        if at_max_depth && !self.reached_max_depth {
            self.reached_max_depth = true;
            if self.options.verbose {
                log::warn!(
                    "BVH reached max depth {}; leaves may exceed {} triangles",
                    self.options.max_depth,
                    self.options.max_leaf_tris
                );
            }
        }

        let oversized = count > MAX_LEAF_COUNT;
        if !oversized && (count <= self.options.max_leaf_tris as usize || at_max_depth) {
            return self.leaf(bounds, offset, count);
        }

        let split = if at_max_depth {
            None
        } else {
            choose_split(self.options.strategy, &bounds, &centroids, &self.tris, offset, count)
        };
        let mut mid = match split {
            Some(split) => partition(self.index, &mut self.tris, offset, count, split),
            None => offset,
        };

        if mid == offset || mid == offset + count {
            if !oversized {
                return self.leaf(bounds, offset, count);
            }
            log::debug!("forcing median split of {count} triangles at depth {depth}");
            mid = offset + count / 2;
        }

        let axis = split.map_or_else(|| bounds.longest_axis(), |s| s.axis) as u8;
        let left_count = mid - offset;
        let right_count = count - left_count;
        let (left_bounds, left_centroids) = self.tris.range_bounds(offset, left_count);
        let left = self.split_node(left_bounds, left_centroids, offset, left_count, depth + 1);
        let (right_bounds, right_centroids) = self.tris.range_bounds(mid, right_count);
        let right = self.split_node(right_bounds, right_centroids, mid, right_count, depth + 1);

        BuildNode::Internal {
            bounds,
            split_axis: axis,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Build one tree per root range, reordering the geometry's index.
///
/// The geometry must already be validated. `progress` receives the fraction
/// of triangles placed in leaves, ending at 1.0.
pub(crate) fn build_trees(
    geometry: &mut MeshGeometry,
    options: &BuildOptions,
    progress: impl FnMut(f32),
) -> Vec<BuildNode> {
    let ranges = root_ranges(geometry);
    let tris = TriangleBounds::compute(geometry);
    let total = tris.len();
    let Some(index) = geometry.index.as_mut() else {
        return Vec::new();
    };

    let mut builder = TreeBuilder {
        index,
        tris,
        options,
        reached_max_depth: false,
        total,
        placed: 0,
        progress,
    };
    ranges
        .into_iter()
        .map(|(offset, count)| builder.build(offset, count))
        .collect()
}
