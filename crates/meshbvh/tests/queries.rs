//! Query results checked against brute force over every triangle.

mod common;

use meshbvh::{
    BoundsIntersection, BuildOptions, DistanceLimits, MeshBvh, MeshGeometry, NodeRef, RayHit, ShapecastVisitor,
    Side, SplitStrategy, TriangleRange,
};
use meshbvh_math::{Aabb3, OrientedBox, Point3, Ray, Sphere, Transform, Triangle, Vec3};

fn brute_hits(geometry: &MeshGeometry, ray: &Ray) -> Vec<(u32, f32)> {
    (0..geometry.triangle_count() as u32)
        .filter_map(|tri| {
            let t = geometry.triangle(tri);
            ray.intersect_triangle(&t.a, &t.b, &t.c, false).map(|d| (tri, d))
        })
        .collect()
}

fn sorted_faces(hits: &[RayHit]) -> Vec<u32> {
    let mut faces: Vec<u32> = hits.iter().map(|h| h.face_index).collect();
    faces.sort_unstable();
    faces
}

#[test]
fn test_cube_raycast_first() {
    let bvh = MeshBvh::new(common::cube(), BuildOptions::default().with_max_leaf_tris(4)).unwrap();
    let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
    let hit = bvh.raycast_first(&ray, Side::Front).unwrap();
    assert!((hit.distance - 4.0).abs() < 1e-5);
    assert!((hit.point - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-5);

    // (0, 0) lies on the diagonal shared by both top triangles and edges are
    // inclusive, so the full cast may report the same point twice.
    let hits = bvh.raycast(&ray, Side::Front);
    assert!(!hits.is_empty() && hits.len() <= 2);
    assert!(hits.iter().all(|h| (h.distance - 4.0).abs() < 1e-5));
}

#[test]
fn test_raycast_matches_brute_force() {
    let mut rng = common::rng(10);
    for strategy in [SplitStrategy::Center, SplitStrategy::Average, SplitStrategy::Sah] {
        let options = BuildOptions::default().with_strategy(strategy).with_max_leaf_tris(6);
        let bvh = MeshBvh::new(common::random_soup(&mut rng, 400), options).unwrap();
        let mut total_hits = 0;
        for _ in 0..200 {
            let ray = common::random_ray(&mut rng);
            let expected = brute_hits(bvh.geometry(), &ray);
            let hits = bvh.raycast(&ray, Side::Double);

            let mut expected_faces: Vec<u32> = expected.iter().map(|h| h.0).collect();
            expected_faces.sort_unstable();
            assert_eq!(sorted_faces(&hits), expected_faces, "{strategy:?}");
            total_hits += hits.len();

            let first = bvh.raycast_first(&ray, Side::Double);
            let nearest = expected.iter().map(|h| h.1).fold(f32::INFINITY, f32::min);
            match first {
                Some(hit) => assert!((hit.distance - nearest).abs() < 1e-4),
                None => assert!(expected.is_empty()),
            }
        }
        assert!(total_hits > 0);
    }
}

#[test]
fn test_closest_point_matches_brute_force() {
    let mut rng = common::rng(11);
    let bvh = MeshBvh::new(common::random_soup(&mut rng, 300), BuildOptions::default()).unwrap();
    let geometry = bvh.geometry();
    for _ in 0..100 {
        let p = common::random_point(&mut rng, 14.0);
        let expected = (0..geometry.triangle_count() as u32)
            .map(|tri| geometry.triangle(tri).distance_to_point(&p))
            .fold(f32::INFINITY, f32::min);
        let found = bvh.closest_point_to_point(&p, DistanceLimits::default()).unwrap();
        assert!((found.distance - expected).abs() < 1e-4);
        assert!((found.distance - (found.point - p).norm()).abs() < 1e-4);
    }
}

#[test]
fn test_closest_point_between_meshes_matches_brute_force() {
    let mut rng = common::rng(12);
    let a = MeshBvh::new(common::random_soup(&mut rng, 120), BuildOptions::default()).unwrap();
    let b = MeshBvh::new(common::random_soup(&mut rng, 80), BuildOptions::default()).unwrap();
    let placement = Transform::translation(30.0, 4.0, -2.0).then(&Transform::rotation_y(0.7));

    let mut expected = f32::INFINITY;
    for i in 0..a.triangle_count() as u32 {
        let mine = a.geometry().triangle(i);
        for j in 0..b.triangle_count() as u32 {
            let theirs = b.geometry().triangle(j).transformed(&placement);
            expected = expected.min(mine.distance_to_triangle(&theirs).0);
        }
    }

    let (mine, theirs) = a
        .closest_point_to_geometry(b.geometry(), &placement, DistanceLimits::default())
        .unwrap();
    assert!((mine.distance - expected).abs() < 1e-3);
    // The second point comes back in b's own frame.
    let moved = placement.apply_point(&theirs.point);
    assert!(((moved - mine.point).norm() - expected).abs() < 1e-3);

    let (via_bvh, _) = a.closest_point_to_bvh(&b, &placement, DistanceLimits::default()).unwrap();
    assert!((via_bvh.distance - expected).abs() < 1e-3);
}

#[test]
fn test_sphere_and_box_match_brute_force() {
    let mut rng = common::rng(13);
    let bvh = MeshBvh::new(common::random_soup(&mut rng, 200), BuildOptions::default()).unwrap();
    let geometry = bvh.geometry();
    for _ in 0..100 {
        let center = common::random_point(&mut rng, 12.0);
        let sphere = Sphere::new(center, 1.5);
        let expected = (0..geometry.triangle_count() as u32).any(|t| geometry.triangle(t).intersects_sphere(&sphere));
        assert_eq!(bvh.intersects_sphere(&sphere), expected);

        let (lo, hi) = (Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let place = Transform::translation(center.x, center.y, center.z);
        let obb = OrientedBox::new(lo, hi, &place);
        let expected_box = (0..geometry.triangle_count() as u32).any(|t| obb.intersects_triangle(&geometry.triangle(t)));
        assert_eq!(bvh.intersects_box(lo, hi, &place), expected_box);
    }
}

/// Counts leaves and stops on the first triangle it sees.
struct StopAtFirst {
    leaves: usize,
    triangles: usize,
}

impl ShapecastVisitor for StopAtFirst {
    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        BoundsIntersection::Intersected
    }

    fn intersects_range(
        &mut self,
        geometry: &MeshGeometry,
        range: TriangleRange,
        contained: bool,
        depth: u32,
        _: NodeRef,
        _: &Aabb3,
    ) -> bool {
        self.leaves += 1;
        meshbvh::visit_triangles(self, geometry, range, contained, depth)
    }

    fn intersects_triangle(&mut self, _: &Triangle, _: u32, _: bool, _: u32) -> bool {
        self.triangles += 1;
        true
    }
}

#[test]
fn test_shapecast_stops_on_first_true() {
    let mut rng = common::rng(14);
    let bvh = MeshBvh::new(common::random_soup(&mut rng, 500), BuildOptions::default()).unwrap();
    let mut visitor = StopAtFirst {
        leaves: 0,
        triangles: 0,
    };
    assert!(bvh.shapecast(&mut visitor));
    assert_eq!(visitor.leaves, 1);
    assert_eq!(visitor.triangles, 1);
}

/// Marks every subtree as contained and records the ranges handed over.
struct ContainAll {
    ranges: Vec<(TriangleRange, bool)>,
}

impl ShapecastVisitor for ContainAll {
    fn intersects_bounds(&mut self, _: &Aabb3, _: bool, _: Option<f32>, _: u32, _: NodeRef) -> BoundsIntersection {
        BoundsIntersection::Contained
    }

    fn intersects_range(
        &mut self,
        _: &MeshGeometry,
        range: TriangleRange,
        contained: bool,
        _: u32,
        _: NodeRef,
        _: &Aabb3,
    ) -> bool {
        self.ranges.push((range, contained));
        false
    }
}

#[test]
fn test_contained_subtree_reports_whole_range() {
    let mut rng = common::rng(15);
    let bvh = MeshBvh::new(common::random_soup(&mut rng, 100), BuildOptions::default()).unwrap();
    let mut visitor = ContainAll { ranges: Vec::new() };
    assert!(!bvh.shapecast(&mut visitor));
    // The root's two children cover everything between them.
    assert_eq!(visitor.ranges.len(), 2);
    assert!(visitor.ranges.iter().all(|(_, contained)| *contained));
    assert_eq!(visitor.ranges[0].0.offset, 0);
    assert_eq!(visitor.ranges[0].0.end(), visitor.ranges[1].0.offset);
    assert_eq!(visitor.ranges[1].0.end(), 100);
}

#[test]
fn test_refit_then_query_matches_brute_force() {
    let mut rng = common::rng(16);
    let mut bvh = MeshBvh::new(common::random_soup(&mut rng, 200), BuildOptions::default()).unwrap();

    // Push every vertex of the first 40 triangles (in BVH order) upward.
    let mut changed = Vec::new();
    for tri in 0..40u32 {
        for v in bvh.geometry().triangle_indices(tri) {
            let mut p = bvh.geometry().vertex(v);
            p.y += 25.0;
            bvh.set_vertex(v, &p);
        }
        changed.push(tri);
    }
    bvh.refit(Some(changed.as_slice()));
    assert!(bvh.validate_bounds().is_empty());

    for _ in 0..100 {
        let ray = common::random_ray(&mut rng);
        let expected = brute_hits(bvh.geometry(), &ray);
        let mut expected_faces: Vec<u32> = expected.iter().map(|h| h.0).collect();
        expected_faces.sort_unstable();
        assert_eq!(sorted_faces(&bvh.raycast(&ray, Side::Double)), expected_faces);
    }

    // A fresh build over the moved vertices never needs a bigger root box.
    let rebuilt = MeshBvh::new(bvh.geometry().clone(), BuildOptions::default()).unwrap();
    let mut refit_box = bvh.bounding_box();
    refit_box.expand(1e-4);
    assert!(refit_box.contains_box(&rebuilt.bounding_box()));
}

#[test]
fn test_bvhcast_matches_brute_force() {
    use meshbvh::BvhcastVisitor;

    struct Contacts(Vec<(u32, u32)>);
    impl BvhcastVisitor for Contacts {
        fn intersects_triangles(&mut self, a: &Triangle, b: &Triangle, i: u32, j: u32) -> bool {
            if a.intersects_triangle(b) {
                self.0.push((i, j));
            }
            false
        }
    }

    let mut rng = common::rng(17);
    let a = MeshBvh::new(common::random_soup(&mut rng, 300), BuildOptions::default()).unwrap();
    let b = MeshBvh::new(common::random_soup(&mut rng, 300), BuildOptions::default()).unwrap();
    let placement = Transform::translation(1.0, -2.0, 0.5).then(&Transform::rotation_x(0.9));

    let mut contacts = Contacts(Vec::new());
    a.bvhcast(&b, &placement, &mut contacts);
    let mut found = contacts.0;
    found.sort_unstable();

    let mut expected = Vec::new();
    for i in 0..a.triangle_count() as u32 {
        let mine = a.geometry().triangle(i);
        for j in 0..b.triangle_count() as u32 {
            if mine.intersects_triangle(&b.geometry().triangle(j).transformed(&placement)) {
                expected.push((i, j));
            }
        }
    }
    assert!(!expected.is_empty());
    assert_eq!(found, expected);
    assert_eq!(a.intersects_bvh(&b, &placement), !expected.is_empty());
}

#[test]
fn test_serialized_json_restores_identical_queries() {
    use meshbvh::{DeserializeOptions, SerializedBvh};

    let mut rng = common::rng(18);
    let geometry = common::random_soup(&mut rng, 250);
    let bvh = MeshBvh::new(geometry.clone(), BuildOptions::default().with_strategy(SplitStrategy::Sah)).unwrap();

    let json = serde_json::to_string(&bvh.serialize()).unwrap();
    let data: SerializedBvh = serde_json::from_str(&json).unwrap();
    let restored = MeshBvh::deserialize(&data, geometry, DeserializeOptions::default()).unwrap();

    for _ in 0..50 {
        let ray = common::random_ray(&mut rng);
        assert_eq!(bvh.raycast(&ray, Side::Double), restored.raycast(&ray, Side::Double));
        assert_eq!(bvh.raycast_first(&ray, Side::Front), restored.raycast_first(&ray, Side::Front));

        let p = common::random_point(&mut rng, 12.0);
        assert_eq!(
            bvh.closest_point_to_point(&p, DistanceLimits::default()),
            restored.closest_point_to_point(&p, DistanceLimits::default())
        );
        let sphere = Sphere::new(p, 1.5);
        assert_eq!(bvh.intersects_sphere(&sphere), restored.intersects_sphere(&sphere));
    }
}
