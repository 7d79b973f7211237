//! Splitting of convex polygons whose vertices are barycentric triples.
//!
//! Orientation tests run on the `(w1, w2)` projection with exact predicates.
//! New vertices are interpolated component-wise, so a zero barycentric
//! component shared by both endpoints of an edge stays exactly zero and cut
//! points on the base triangle's border stay on that border.

use crate::math::predicates::{orient2d, orient2d_value, Orientation};
use crate::math::{Point2, Vector3};

/// Projects a barycentric triple onto the `(w1, w2)` parameter plane.
#[must_use]
pub fn param(b: &Vector3) -> Point2 {
    Point2::new(b.y, b.z)
}

/// Point where the segment `p -> q` crosses the line `a -> b`.
///
/// Endpoints are put into a canonical order first so that two faces sharing
/// the edge compute a bit-identical cut point.
fn cut_point(p: &Vector3, q: &Vector3, a: &Point2, b: &Point2) -> Vector3 {
    let (lo, hi) = if (p.y, p.z) <= (q.y, q.z) { (p, q) } else { (q, p) };
    let v_lo = orient2d_value(a, b, &param(lo));
    let v_hi = orient2d_value(a, b, &param(hi));
    let denom = v_lo - v_hi;
    let t = if denom == 0.0 { 0.5 } else { (v_lo / denom).clamp(0.0, 1.0) };
    lo * (1.0 - t) + hi * t
}

/// Splits a convex polygon by the directed line `a -> b`.
///
/// Returns `(left, right)`: the part on the left of the line (counter-clockwise
/// side) and the part on the right. A part without any vertex strictly on its
/// side is returned empty.
#[must_use]
pub fn split_by_line(polygon: &[Vector3], a: &Point2, b: &Point2) -> (Vec<Vector3>, Vec<Vector3>) {
    let sides: Vec<Orientation> = polygon.iter().map(|v| orient2d(a, b, &param(v))).collect();
    let has_left = sides.contains(&Orientation::CounterClockwise);
    let has_right = sides.contains(&Orientation::Clockwise);
    if !has_right {
        return (polygon.to_vec(), Vec::new());
    }
    if !has_left {
        return (Vec::new(), polygon.to_vec());
    }

    let n = polygon.len();
    let mut left = Vec::with_capacity(n + 2);
    let mut right = Vec::with_capacity(n + 2);
    for i in 0..n {
        let j = (i + 1) % n;
        let current = &polygon[i];
        match sides[i] {
            Orientation::CounterClockwise => left.push(*current),
            Orientation::Clockwise => right.push(*current),
            Orientation::Collinear => {
                left.push(*current);
                right.push(*current);
            }
        }
        let crosses = matches!(
            (sides[i], sides[j]),
            (Orientation::CounterClockwise, Orientation::Clockwise)
                | (Orientation::Clockwise, Orientation::CounterClockwise)
        );
        if crosses {
            let cut = cut_point(current, &polygon[j], a, b);
            left.push(cut);
            right.push(cut);
        }
    }
    (left, right)
}

/// Fan-triangulates a convex counter-clockwise polygon, dropping triangles
/// that are not strictly counter-clockwise or whose computed area is not
/// positive.
#[must_use]
pub fn fan_triangulate(polygon: &[Vector3]) -> Vec<[Vector3; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let apex = polygon[0];
    polygon[1..]
        .windows(2)
        .map(|w| [apex, w[0], w[1]])
        .filter(|t| is_positive(t) && parametric_det(t) > 0.0)
        .collect()
}

/// Returns `true` if the triangle is strictly counter-clockwise in the parameter plane.
#[must_use]
pub fn is_positive(tri: &[Vector3; 3]) -> bool {
    orient2d(&param(&tri[0]), &param(&tri[1]), &param(&tri[2])) == Orientation::CounterClockwise
}

/// Twice the signed area of the triangle in the parameter plane.
#[must_use]
pub fn parametric_det(tri: &[Vector3; 3]) -> f64 {
    orient2d_value(&param(&tri[0]), &param(&tri[1]), &param(&tri[2]))
}
