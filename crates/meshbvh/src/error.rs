//! Error types for BVH construction and deserialization.

use thiserror::Error;

/// Errors that can occur while building or restoring a BVH.
///
/// Queries never fail; only structural problems with the input geometry or
/// a serialized buffer are reported, always before any node is allocated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// Geometry has no index buffer.
    #[error("geometry is not indexed; call `MeshGeometry::ensure_index` before building")]
    MissingIndex,

    /// Position attribute does not hold three components per vertex.
    #[error("position attribute item size must be 3, got {0}")]
    InvalidItemSize(usize),

    /// Position buffer length is not a whole number of vertices.
    #[error("position buffer length {0} is not a multiple of the item size")]
    MalformedPositions(usize),

    /// Index buffer length is not a multiple of three.
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexNotTriangles(usize),

    /// An index refers past the end of the position buffer.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index value.
        index: u32,
        /// Number of vertices in the position buffer.
        vertex_count: usize,
    },

    /// Serialized index length does not match the geometry.
    #[error("serialized index has {found} entries, geometry expects {expected}")]
    IndexMismatch {
        /// Length of the geometry's index buffer.
        expected: usize,
        /// Length of the serialized index buffer.
        found: usize,
    },

    /// Serialized node buffers are malformed.
    #[error("invalid serialized BVH: {0}")]
    Serialization(String),
}

/// Result type for BVH operations.
pub type Result<T> = std::result::Result<T, BvhError>;
