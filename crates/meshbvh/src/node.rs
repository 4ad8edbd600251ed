//! Packed node layout.
//!
//! A finished tree is a flat array of 32-byte [`PackedNode`] records in
//! depth-first order. The left child of an internal node is always the next
//! record; the right child's position is stored in the node. Leaves cover a
//! contiguous run `[offset, offset + count)` of triangles in the reordered
//! index buffer.
//!
//! ```text
//! bytes  0..24   bounds  [min_x, min_y, min_z, max_x, max_y, max_z]  f32
//! bytes 24..28   data    leaf: triangle offset | internal: right child node
//! bytes 28..30   count   leaf: triangle count  | internal: split axis
//! bytes 30..32   flags   0xFFFF for leaves, 0 otherwise
//! ```

use std::ops::Deref;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use meshbvh_math::Aabb3;

use crate::build::BuildNode;

/// Size in bytes of one packed node.
pub const NODE_BYTES: usize = 32;

/// `flags` value marking a leaf.
pub const LEAF_FLAG: u16 = 0xFFFF;

/// One node of a packed tree.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedNode {
    /// Bounds as `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub bounds: [f32; 6],
    /// Leaf: first triangle. Internal: index of the right child node.
    pub data: u32,
    /// Leaf: triangle count. Internal: split axis.
    pub count: u16,
    /// [`LEAF_FLAG`] for leaves.
    pub flags: u16,
}

const _: () = assert!(std::mem::size_of::<PackedNode>() == NODE_BYTES);

impl PackedNode {
    /// A leaf over `count` triangles starting at `offset`.
    pub fn leaf(bounds: &Aabb3, offset: u32, count: u16) -> Self {
        Self {
            bounds: bounds.to_array(),
            data: offset,
            count,
            flags: LEAF_FLAG,
        }
    }

    /// An internal node whose right child lives at `right`.
    pub fn internal(bounds: &Aabb3, right: u32, split_axis: u8) -> Self {
        Self {
            bounds: bounds.to_array(),
            data: right,
            count: split_axis as u16,
            flags: 0,
        }
    }

    /// True for leaves.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags == LEAF_FLAG
    }

    /// Bounds as a box.
    #[inline]
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_array(&self.bounds)
    }

    /// First triangle of a leaf.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.data
    }

    /// Triangle count of a leaf.
    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.count as u32
    }

    /// Triangle range of a leaf.
    #[inline]
    pub fn range(&self) -> TriangleRange {
        TriangleRange::new(self.data, self.count as u32)
    }

    /// Index of the right child of an internal node.
    #[inline]
    pub fn right_child(&self) -> usize {
        self.data as usize
    }

    /// Split axis of an internal node.
    #[inline]
    pub fn split_axis(&self) -> usize {
        self.count as usize
    }
}

/// A contiguous run of triangles in BVH order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriangleRange {
    /// First triangle.
    pub offset: u32,
    /// Number of triangles.
    pub count: u32,
}

impl TriangleRange {
    /// Create a range.
    pub fn new(offset: u32, count: u32) -> Self {
        Self { offset, count }
    }

    /// One past the last triangle.
    pub fn end(&self) -> u32 {
        self.offset + self.count
    }

    /// Triangle indices in the range.
    pub fn iter(&self) -> std::ops::Range<u32> {
        self.offset..self.end()
    }

    /// True if any id of the sorted slice falls inside the range.
    pub fn contains_any(&self, sorted_ids: &[u32]) -> bool {
        let first = sorted_ids.partition_point(|&id| id < self.offset);
        sorted_ids.get(first).is_some_and(|&id| id < self.end())
    }
}

/// Triangle range of the subtree rooted at `node`: from its leftmost leaf's
/// offset to its rightmost leaf's end.
pub(crate) fn subtree_range(nodes: &[PackedNode], node: usize) -> TriangleRange {
    let mut left = node;
    while !nodes[left].is_leaf() {
        left += 1;
    }
    let mut right = node;
    while !nodes[right].is_leaf() {
        right = nodes[right].right_child();
    }
    let offset = nodes[left].offset();
    TriangleRange::new(offset, nodes[right].range().end() - offset)
}

/// Pack a construction tree in depth-first order.
pub(crate) fn flatten(root: &BuildNode) -> Vec<PackedNode> {
    let mut nodes = Vec::with_capacity(root.node_count());
    flatten_node(root, &mut nodes);
    nodes
}

fn flatten_node(node: &BuildNode, nodes: &mut Vec<PackedNode>) {
    match node {
        BuildNode::Leaf {
            bounds,
            offset,
            count,
        } => {
            nodes.push(PackedNode::leaf(bounds, *offset, *count as u16));
        }
        BuildNode::Internal {
            bounds,
            split_axis,
            left,
            right,
        } => {
            let idx = nodes.len();
            nodes.push(PackedNode::internal(bounds, 0, *split_axis));
            flatten_node(left, nodes);
            nodes[idx].data = nodes.len() as u32;
            flatten_node(right, nodes);
        }
    }
}

/// Storage for one root's packed nodes.
///
/// `Shared` buffers are reference counted so clones of a BVH (and other
/// threads) read the same memory. Mutation copies a shared buffer first if
/// anyone else still holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBuffer {
    /// Exclusively owned nodes.
    Owned(Vec<PackedNode>),
    /// Reference-counted nodes.
    Shared(Arc<Vec<PackedNode>>),
}

impl NodeBuffer {
    /// Wrap nodes, shared or owned.
    pub fn new(nodes: Vec<PackedNode>, shared: bool) -> Self {
        if shared {
            NodeBuffer::Shared(Arc::new(nodes))
        } else {
            NodeBuffer::Owned(nodes)
        }
    }

    /// True for the reference-counted variant.
    pub fn is_shared(&self) -> bool {
        matches!(self, NodeBuffer::Shared(_))
    }

    /// Nodes for in-place updates, copying a shared buffer still in use
    /// elsewhere.
    pub fn make_mut(&mut self) -> &mut [PackedNode] {
        match self {
            NodeBuffer::Owned(nodes) => nodes,
            NodeBuffer::Shared(nodes) => {
                if Arc::strong_count(nodes) > 1 {
                    log::debug!("copying shared node buffer of {} nodes", nodes.len());
                }
                Arc::make_mut(nodes).as_mut_slice()
            }
        }
    }

    /// Raw bytes of the nodes in native byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<PackedNode, u8>(&self[..]).to_vec()
    }
}

impl Deref for NodeBuffer {
    type Target = [PackedNode];

    fn deref(&self) -> &[PackedNode] {
        match self {
            NodeBuffer::Owned(nodes) => nodes.as_slice(),
            NodeBuffer::Shared(nodes) => nodes.as_slice(),
        }
    }
}
