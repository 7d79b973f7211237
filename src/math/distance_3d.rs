use std::f64::consts::TAU;

use super::{Point3, Vector3, TOLERANCE};

/// Polygon vertices used per unit of circle radius.
pub const CIRCLE_VERTICES_PER_UNIT: f64 = 100.0;

/// Minimal number of vertices of an approximated circle.
pub const MIN_CIRCLE_VERTICES: usize = 24;

/// Returns the point of the triangle `tri` closest to `p`.
#[must_use]
pub fn closest_point_on_triangle(p: &Point3, tri: &[Point3; 3]) -> Point3 {
    let [a, b, c] = tri;
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Distance from `p` to the triangle `tri`.
#[must_use]
pub fn point_triangle_distance(p: &Point3, tri: &[Point3; 3]) -> f64 {
    (closest_point_on_triangle(p, tri) - p).norm()
}

/// Checks whether all three corners of `tri` lie inside the sphere.
#[must_use]
pub fn is_triangle_inside_sphere(tri: &[Point3; 3], center: &Point3, radius: f64) -> bool {
    tri.iter().all(|v| (v - center).norm() <= radius)
}

/// Checks whether the sphere touches the triangle.
#[must_use]
pub fn triangle_intersects_sphere(tri: &[Point3; 3], center: &Point3, radius: f64) -> bool {
    point_triangle_distance(center, tri) <= radius
}

/// Number of polygon vertices used to approximate a circle of `radius`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn circle_vertex_count(radius: f64) -> usize {
    let count = (radius.abs() * CIRCLE_VERTICES_PER_UNIT).ceil();
    if count.is_finite() && count > MIN_CIRCLE_VERTICES as f64 {
        count as usize
    } else {
        MIN_CIRCLE_VERTICES
    }
}

/// Counter-clockwise (around `normal`) polygon approximating a circle.
///
/// Returns an empty list when `normal` has zero length.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle_polygon(center: &Point3, normal: &Vector3, radius: f64) -> Vec<Point3> {
    let Some(n) = normal.try_normalize(TOLERANCE) else {
        return Vec::new();
    };
    let (u, v) = orthonormal_basis(&n);
    let count = circle_vertex_count(radius);
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            center + u * (radius * angle.cos()) + v * (radius * angle.sin())
        })
        .collect()
}

/// Builds two unit vectors `(u, v)` such that `(u, v, n)` is right-handed.
#[must_use]
pub fn orthonormal_basis(n: &Vector3) -> (Vector3, Vector3) {
    let helper = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = n.cross(&helper).normalize();
    let v = n.cross(&u);
    (u, v)
}
