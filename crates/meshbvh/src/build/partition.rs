//! In-place partition of a triangle range around a split plane.

use super::split::Split;
use super::triangle_bounds::TriangleBounds;

/// Reorder `[offset, offset + count)` so triangles whose center lies below
/// `split.position` come first. Index triples and bounds records move
/// together. Returns the first index of the right side; a result equal to
/// `offset` or `offset + count` means the split put everything on one side.
pub(crate) fn partition(
    index: &mut [u32],
    tris: &mut TriangleBounds,
    offset: usize,
    count: usize,
    split: Split,
) -> usize {
    let mut left = offset;
    let mut right = offset + count;
    loop {
        while left < right && tris.center(left, split.axis) < split.position {
            left += 1;
        }
        while left < right && tris.center(right - 1, split.axis) >= split.position {
            right -= 1;
        }
        if left >= right {
            return left;
        }
        // left belongs right and right - 1 belongs left.
        let (a, b) = (left, right - 1);
        for k in 0..3 {
            index.swap(a * 3 + k, b * 3 + k);
        }
        tris.swap(a, b);
        left += 1;
        right -= 1;
    }
}
