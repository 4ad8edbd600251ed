//! The BVH type and its construction.

use std::sync::Arc;

use meshbvh_math::{Aabb3, Point3};

use crate::build;
use crate::error::Result;
use crate::geometry::MeshGeometry;
use crate::node::{flatten, NodeBuffer, PackedNode};
use crate::options::BuildOptions;
use crate::shapecast::{shapecast_root, ShapecastVisitor};

/// A bounding volume hierarchy over the triangles of a [`MeshGeometry`].
///
/// The BVH owns its geometry. Construction reorders the index buffer so that
/// each leaf covers a contiguous run of triangles; triangle numbers reported
/// by queries refer to that reordered order. Vertex positions may be edited
/// through [`positions_mut`](Self::positions_mut) and brought back in sync
/// with [`refit`](Self::refit).
#[derive(Debug, Clone)]
pub struct MeshBvh {
    pub(crate) geometry: MeshGeometry,
    pub(crate) roots: Vec<NodeBuffer>,
    pub(crate) options: BuildOptions,
}

/// A node seen by [`MeshBvh::traverse`].
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    /// Root the node belongs to.
    pub root: usize,
    /// Index in the root's node buffer.
    pub index: usize,
    /// Depth below the root (the root is 0).
    pub depth: u32,
    /// The packed record.
    pub node: &'a PackedNode,
}

impl MeshBvh {
    /// Build a BVH over `geometry`.
    ///
    /// The geometry must be indexed (see [`MeshGeometry::ensure_index`]) with
    /// three position components per vertex.
    pub fn new(geometry: MeshGeometry, options: BuildOptions) -> Result<Self> {
        Self::build_with_progress(geometry, options, |_| {})
    }

    /// Build a BVH, reporting the fraction of triangles placed as it goes.
    pub fn build_with_progress(
        mut geometry: MeshGeometry,
        options: BuildOptions,
        progress: impl FnMut(f32),
    ) -> Result<Self> {
        geometry.validate()?;
        let options = options.validated();

        let trees = build::build_trees(&mut geometry, &options, progress);
        let roots: Vec<NodeBuffer> = trees
            .iter()
            .map(|tree| NodeBuffer::new(flatten(tree), options.shared_buffers))
            .collect();

        log::debug!(
            "built BVH: {} triangles, {} roots, {} nodes ({:?})",
            geometry.triangle_count(),
            roots.len(),
            roots.iter().map(|r| r.len()).sum::<usize>(),
            options.strategy,
        );

        Ok(Self {
            geometry,
            roots,
            options,
        })
    }

    /// The geometry, index in BVH order.
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// Mutable vertex positions. Call [`refit`](Self::refit) after moving
    /// vertices.
    pub fn positions_mut(&mut self) -> &mut [f32] {
        &mut self.geometry.positions
    }

    /// Move one vertex. Call [`refit`](Self::refit) afterwards.
    pub fn set_vertex(&mut self, i: u32, p: &Point3) {
        self.geometry.set_vertex(i, p);
    }

    /// Give the geometry back, index in BVH order.
    pub fn into_geometry(self) -> MeshGeometry {
        self.geometry
    }

    /// Options used to build this BVH.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Packed node buffers, one per root.
    pub fn roots(&self) -> &[NodeBuffer] {
        &self.roots
    }

    /// Reference-counted handles to every root, for readers on other
    /// threads. `None` unless built with `shared_buffers`.
    pub fn shared_roots(&self) -> Option<Vec<Arc<Vec<PackedNode>>>> {
        self.roots
            .iter()
            .map(|root| match root {
                NodeBuffer::Shared(nodes) => Some(Arc::clone(nodes)),
                NodeBuffer::Owned(_) => None,
            })
            .collect()
    }

    /// Number of triangles indexed.
    pub fn triangle_count(&self) -> usize {
        self.geometry.triangle_count()
    }

    /// Union of the root boxes.
    pub fn bounding_box(&self) -> Aabb3 {
        let mut bounds = Aabb3::empty();
        for root in &self.roots {
            if let Some(node) = root.first() {
                bounds.include_box(&node.aabb());
            }
        }
        bounds
    }

    /// Run `visitor` over every root in order. Returns `true` as soon as a
    /// visitor callback does.
    pub fn shapecast<V: ShapecastVisitor + ?Sized>(&self, visitor: &mut V) -> bool {
        self.roots
            .iter()
            .enumerate()
            .any(|(root, nodes)| shapecast_root(nodes, root, &self.geometry, visitor))
    }

    /// Depth-first walk over every node of every root. Returning `true` from
    /// `callback` skips the node's children.
    pub fn traverse(&self, mut callback: impl FnMut(NodeVisit<'_>) -> bool) {
        for (root, nodes) in self.roots.iter().enumerate() {
            if nodes.is_empty() {
                continue;
            }
            let mut stack = vec![(0usize, 0u32)];
            while let Some((index, depth)) = stack.pop() {
                let node = &nodes[index];
                let stop = callback(NodeVisit {
                    root,
                    index,
                    depth,
                    node,
                });
                if !stop && !node.is_leaf() {
                    stack.push((node.right_child(), depth + 1));
                    stack.push((index + 1, depth + 1));
                }
            }
        }
    }
}
