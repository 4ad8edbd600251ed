//! Snapshotting a BVH to plain buffers and restoring it.
//!
//! A [`SerializedBvh`] holds the raw packed node bytes of each root and a
//! copy of the reordered index buffer. Positions are not included; the
//! geometry is supplied again on restore.

use serde::{Deserialize, Serialize};

use crate::bvh::MeshBvh;
use crate::error::{BvhError, Result};
use crate::geometry::MeshGeometry;
use crate::node::{NodeBuffer, PackedNode, NODE_BYTES};
use crate::options::BuildOptions;

/// Node bytes per root plus the reordered index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedBvh {
    /// Packed node bytes, one entry per root.
    pub roots: Vec<Vec<u8>>,
    /// Index buffer in BVH order.
    pub index: Vec<u32>,
}

/// Restore options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Replace the geometry's index with the serialized one. When unset the
    /// geometry must already carry the BVH-ordered index.
    pub set_index: bool,
    /// Hold the restored node buffers behind `Arc`.
    pub shared_buffers: bool,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            set_index: true,
            shared_buffers: false,
        }
    }
}

impl MeshBvh {
    /// Copy node buffers and index out of the BVH.
    pub fn serialize(&self) -> SerializedBvh {
        SerializedBvh {
            roots: self.roots.iter().map(NodeBuffer::to_bytes).collect(),
            index: self.geometry.index_slice().to_vec(),
        }
    }

    /// Rebuild a BVH over `geometry` from a snapshot, without re-running
    /// construction.
    pub fn deserialize(data: &SerializedBvh, mut geometry: MeshGeometry, options: DeserializeOptions) -> Result<Self> {
        if options.set_index {
            if let Some(existing) = &geometry.index {
                if existing.len() != data.index.len() {
                    return Err(BvhError::IndexMismatch {
                        expected: existing.len(),
                        found: data.index.len(),
                    });
                }
            }
            geometry.index = Some(data.index.clone());
        }
        geometry.validate()?;

        let tri_count = geometry.triangle_count();
        let roots = data
            .roots
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let nodes = decode_root(bytes, tri_count)
                    .map_err(|msg| BvhError::Serialization(format!("root {i}: {msg}")))?;
                Ok(NodeBuffer::new(nodes, options.shared_buffers))
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!("restored BVH with {} roots over {} triangles", roots.len(), tri_count);
        Ok(Self {
            geometry,
            roots,
            options: BuildOptions {
                shared_buffers: options.shared_buffers,
                ..BuildOptions::default()
            },
        })
    }
}

fn decode_root(bytes: &[u8], tri_count: usize) -> std::result::Result<Vec<PackedNode>, String> {
    if bytes.is_empty() || bytes.len() % NODE_BYTES != 0 {
        return Err(format!("{} bytes is not a whole number of nodes", bytes.len()));
    }
    let nodes: Vec<PackedNode> = bytes
        .chunks_exact(NODE_BYTES)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    check_structure(&nodes, tri_count)?;
    Ok(nodes)
}

/// Every internal node must point forward to children inside the buffer and
/// every leaf must cover triangles that exist.
fn check_structure(nodes: &[PackedNode], tri_count: usize) -> std::result::Result<(), String> {
    let mut stack = vec![0usize];
    let mut visited = 0usize;
    while let Some(i) = stack.pop() {
        visited += 1;
        if visited > nodes.len() {
            return Err("node graph revisits nodes".to_string());
        }
        let node = &nodes[i];
        if node.is_leaf() {
            let range = node.range();
            let end = range.offset as usize + range.count as usize;
            if end > tri_count {
                return Err(format!("leaf {i} ends at triangle {end} of {tri_count}"));
            }
            continue;
        }
        let right = node.right_child();
        if i + 1 >= nodes.len() || right <= i + 1 || right >= nodes.len() {
            return Err(format!("node {i} has child index {right} out of range"));
        }
        stack.push(right);
        stack.push(i + 1);
    }
    Ok(())
}
