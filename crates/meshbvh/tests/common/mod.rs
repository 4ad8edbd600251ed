#![allow(dead_code)]

use meshbvh::MeshGeometry;
use meshbvh_math::{Point3, Ray, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `count` small triangles scattered through `[-10, 10]^3`.
pub fn random_soup(rng: &mut StdRng, count: usize) -> MeshGeometry {
    let mut vertices = Vec::with_capacity(count * 3);
    let mut triangles = Vec::with_capacity(count);
    for i in 0..count as u32 {
        let center = Point3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-10.0..10.0),
        );
        for _ in 0..3 {
            vertices.push(
                center
                    + Vec3::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    ),
            );
        }
        triangles.push([i * 3, i * 3 + 1, i * 3 + 2]);
    }
    MeshGeometry::from_triangles(&vertices, &triangles)
}

/// Ray starting outside the soup aimed at a random point inside it.
pub fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = Point3::new(
        rng.gen_range(-15.0..15.0),
        rng.gen_range(-15.0..15.0),
        20.0,
    );
    let target = Point3::new(
        rng.gen_range(-8.0..8.0),
        rng.gen_range(-8.0..8.0),
        rng.gen_range(-8.0..8.0),
    );
    Ray::new(origin, target - origin)
}

pub fn random_point(rng: &mut StdRng, extent: f32) -> Point3 {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

/// Axis-aligned cube `[-1, 1]^3`, twelve outward-facing triangles.
pub fn cube() -> MeshGeometry {
    let vertices: Vec<Point3> = (0..8)
        .map(|i| {
            Point3::new(
                if i & 4 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 1.0 } else { -1.0 },
                if i & 1 != 0 { 1.0 } else { -1.0 },
            )
        })
        .collect();
    let triangles = [
        [0, 1, 3],
        [0, 3, 2],
        [4, 6, 7],
        [4, 7, 5],
        [0, 4, 5],
        [0, 5, 1],
        [2, 3, 7],
        [2, 7, 6],
        [0, 2, 6],
        [0, 6, 4],
        [1, 5, 7],
        [1, 7, 3],
    ];
    MeshGeometry::from_triangles(&vertices, &triangles)
}
