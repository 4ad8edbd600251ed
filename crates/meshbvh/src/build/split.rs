//! Split heuristics.
//!
//! Each strategy looks at a node's triangle range and proposes an axis and a
//! position. Triangles whose center lies below the position go left. `None`
//! means the range should stay a leaf.

use meshbvh_math::Aabb3;

use super::triangle_bounds::TriangleBounds;
use crate::options::SplitStrategy;

/// Relative cost of descending into a child node.
pub const TRAVERSAL_COST: f32 = 1.0;

/// Relative cost of testing one triangle.
pub const TRIANGLE_INTERSECT_COST: f32 = 1.25;

/// Bins per axis for the surface area heuristic.
pub(crate) const BIN_COUNT: usize = 32;

/// Ranges smaller than this evaluate one candidate per distinct center.
const SAH_EXACT_THRESHOLD: usize = 32;

/// A proposed split plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Split {
    pub axis: usize,
    pub position: f32,
}

#[derive(Debug, Clone, Copy)]
struct Bin {
    count: usize,
    bounds: Aabb3,
    /// Union of this bin and every bin to its right.
    right_bounds: Aabb3,
    right_count: usize,
}

impl Default for Bin {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Aabb3::empty(),
            right_bounds: Aabb3::empty(),
            right_count: 0,
        }
    }
}

/// Choose a split for `[offset, offset + count)`.
pub(crate) fn choose_split(
    strategy: SplitStrategy,
    node_bounds: &Aabb3,
    centroid_bounds: &Aabb3,
    tris: &TriangleBounds,
    offset: usize,
    count: usize,
) -> Option<Split> {
    match strategy {
        SplitStrategy::Center => {
            let axis = centroid_bounds.longest_axis();
            let (lo, hi) = (centroid_bounds.min[axis], centroid_bounds.max[axis]);
            (hi > lo).then(|| Split {
                axis,
                position: (lo + hi) / 2.0,
            })
        }
        SplitStrategy::Average => {
            let axis = node_bounds.longest_axis();
            let sum: f64 = (offset..offset + count)
                .map(|t| tris.center(t, axis) as f64)
                .sum();
            Some(Split {
                axis,
                position: (sum / count as f64) as f32,
            })
        }
        SplitStrategy::Sah => sah_split(node_bounds, centroid_bounds, tris, offset, count),
    }
}

fn split_cost(parent_area: f32, left: &Aabb3, left_count: usize, right: &Aabb3, right_count: usize) -> f32 {
    let left_prob = left.surface_area() / parent_area;
    let right_prob = right.surface_area() / parent_area;
    TRAVERSAL_COST
        + TRIANGLE_INTERSECT_COST * (left_prob * left_count as f32 + right_prob * right_count as f32)
}

fn sah_split(
    node_bounds: &Aabb3,
    centroid_bounds: &Aabb3,
    tris: &TriangleBounds,
    offset: usize,
    count: usize,
) -> Option<Split> {
    let parent_area = node_bounds.surface_area();
    if parent_area <= 0.0 {
        return None;
    }

    let mut best_cost = TRIANGLE_INTERSECT_COST * count as f32;
    let mut best: Option<Split> = None;

    for axis in 0..3 {
        let axis_left = centroid_bounds.min[axis];
        let axis_length = centroid_bounds.max[axis] - axis_left;
        if axis_length <= 0.0 {
            continue;
        }

        if count < SAH_EXACT_THRESHOLD {
            // One candidate per triangle center, swept in sorted order.
            let mut order: Vec<usize> = (offset..offset + count).collect();
            order.sort_by(|&a, &b| tris.center(a, axis).total_cmp(&tris.center(b, axis)));

            let mut suffix = vec![Aabb3::empty(); count + 1];
            for i in (0..count).rev() {
                suffix[i] = suffix[i + 1].union(&tris.aabb(order[i]));
            }

            let mut left = Aabb3::empty();
            let mut i = 0;
            while i < count {
                let candidate = tris.center(order[i], axis);
                if i > 0 {
                    let cost = split_cost(parent_area, &left, i, &suffix[i], count - i);
                    if cost < best_cost {
                        best_cost = cost;
                        best = Some(Split {
                            axis,
                            position: candidate,
                        });
                    }
                }
                // Triangles sharing this center all stay on the right side.
                while i < count && tris.center(order[i], axis) == candidate {
                    left.include_box(&tris.aabb(order[i]));
                    i += 1;
                }
            }
        } else {
            let mut bins = [Bin::default(); BIN_COUNT];
            let bin_width = axis_length / BIN_COUNT as f32;

            for tri in offset..offset + count {
                let relative = (tris.center(tri, axis) - axis_left) / bin_width;
                let b = (relative.floor().max(0.0) as usize).min(BIN_COUNT - 1);
                bins[b].count += 1;
                bins[b].bounds.include_box(&tris.aabb(tri));
            }

            let mut right_bounds = Aabb3::empty();
            let mut right_count = 0;
            for bin in bins.iter_mut().rev() {
                right_bounds.include_box(&bin.bounds);
                right_count += bin.count;
                bin.right_bounds = right_bounds;
                bin.right_count = right_count;
            }

            let mut left_bounds = Aabb3::empty();
            let mut left_count = 0;
            for i in 0..BIN_COUNT - 1 {
                left_bounds.include_box(&bins[i].bounds);
                left_count += bins[i].count;
                let right = &bins[i + 1];
                if left_count == 0 || right.right_count == 0 {
                    continue;
                }
                let cost = split_cost(
                    parent_area,
                    &left_bounds,
                    left_count,
                    &right.right_bounds,
                    right.right_count,
                );
                if cost < best_cost {
                    best_cost = cost;
                    best = Some(Split {
                        axis,
                        position: axis_left + bin_width * (i + 1) as f32,
                    });
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshGeometry;
    use meshbvh_math::Point3;

    /// Small triangles spaced along x, two clusters far apart.
    fn clusters(per_cluster: usize) -> TriangleBounds {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for cluster in 0..2 {
            for i in 0..per_cluster {
                let x = cluster as f32 * 100.0 + i as f32 * 0.5;
                let base = vertices.len() as u32;
                vertices.push(Point3::new(x, 0.0, 0.0));
                vertices.push(Point3::new(x + 0.1, 0.0, 0.0));
                vertices.push(Point3::new(x, 0.1, 0.0));
                triangles.push([base, base + 1, base + 2]);
            }
        }
        TriangleBounds::compute(&MeshGeometry::from_triangles(&vertices, &triangles))
    }

    fn split_for(strategy: SplitStrategy, tris: &TriangleBounds) -> Option<Split> {
        let (node, centroids) = tris.range_bounds(0, tris.len());
        choose_split(strategy, &node, &centroids, tris, 0, tris.len())
    }

    #[test]
    fn test_center_split_midpoint() {
        let tris = clusters(4);
        let split = split_for(SplitStrategy::Center, &tris).unwrap();
        assert_eq!(split.axis, 0);
        assert!(split.position > 2.0 && split.position < 100.0);
    }

    #[test]
    fn test_average_split_mean() {
        let tris = clusters(4);
        let split = split_for(SplitStrategy::Average, &tris).unwrap();
        assert_eq!(split.axis, 0);
        let mean: f32 = (0..tris.len()).map(|t| tris.center(t, 0)).sum::<f32>() / tris.len() as f32;
        assert!((split.position - mean).abs() < 1e-3);
    }

    #[test]
    fn test_sah_separates_clusters() {
        for per_cluster in [4, 40] {
            let tris = clusters(per_cluster);
            let split = split_for(SplitStrategy::Sah, &tris).unwrap();
            assert_eq!(split.axis, 0);
            assert!(split.position > 2.0 && split.position <= 100.1, "{split:?}");
        }
    }

    #[test]
    fn test_sah_flat_node_does_not_split() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let tris = TriangleBounds::compute(&MeshGeometry::from_triangles(&vertices, &[[0, 1, 2], [0, 1, 2]]));
        // Growth on a zero-size box stays zero, so the surface area is zero.
        assert_eq!(split_for(SplitStrategy::Sah, &tris), None);
        assert_eq!(split_for(SplitStrategy::Center, &tris), None);
    }
}
