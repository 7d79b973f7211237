//! Small meshes shared by unit tests.

use super::{DataTriangle, TriangleId};
use crate::math::Point3;

fn build(positions: &[Point3], faces: &[[usize; 3]]) -> Vec<DataTriangle> {
    faces
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            DataTriangle::new(
                TriangleId(i),
                [positions[f[0]], positions[f[1]], positions[f[2]]],
                0,
            )
            .ok()
        })
        .collect()
}

fn p(x: f64, y: f64, z: f64) -> Point3 {
    Point3::new(x, y, z)
}

/// Closed tetrahedron with outward normals.
pub fn tetrahedron() -> Vec<DataTriangle> {
    let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)];
    build(&pts, &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]])
}

/// Closed axis-aligned box `[0, sx] x [0, sy] x [0, sz]`, two triangles per side.
pub fn cuboid(sx: f64, sy: f64, sz: f64) -> Vec<DataTriangle> {
    let pts = [
        p(0.0, 0.0, 0.0),
        p(sx, 0.0, 0.0),
        p(sx, sy, 0.0),
        p(0.0, sy, 0.0),
        p(0.0, 0.0, sz),
        p(sx, 0.0, sz),
        p(sx, sy, sz),
        p(0.0, sy, sz),
    ];
    build(
        &pts,
        &[
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ],
    )
}

/// Closed unit cube.
pub fn cube() -> Vec<DataTriangle> {
    cuboid(1.0, 1.0, 1.0)
}

/// Two triangles forming the unit square in the XY plane.
pub fn triangle_pair() -> Vec<DataTriangle> {
    let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
    build(&pts, &[[0, 1, 2], [0, 2, 3]])
}

/// Two triangles folded by 90 degrees along their shared edge.
pub fn folded_pair() -> Vec<DataTriangle> {
    let pts = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)];
    build(&pts, &[[0, 1, 2], [0, 3, 1]])
}

/// Open `n x n` grid of unit quads in the XY plane, two triangles per quad.
pub fn grid(n: usize) -> Vec<DataTriangle> {
    let mut pts = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            #[allow(clippy::cast_precision_loss)]
            pts.push(p(i as f64, j as f64, 0.0));
        }
    }
    let row = n + 1;
    let mut faces = Vec::with_capacity(n * n * 2);
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row + 1;
            let d = a + row;
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    build(&pts, &faces)
}
