use spade::{ConstrainedDelaunayTriangulation, Point2 as SpadePoint2, Triangulation};

use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::point_in_polygon;
use crate::math::predicates::{orient2d, Orientation};
use crate::math::Point2;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Triangulates a simple polygon with a constrained Delaunay triangulation.
///
/// Returned triangles are counter-clockwise.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the polygon has fewer than three
/// vertices, intersects itself, or cannot be inserted into the triangulation.
pub fn triangulate_polygon(polygon: &[Point2]) -> Result<Vec<[Point2; 3]>> {
    if polygon.len() < 3 {
        return Err(GeometryError::Degenerate("polygon needs at least 3 vertices".into()).into());
    }
    if !is_simple(polygon) {
        return Err(GeometryError::Degenerate("polygon intersects itself".into()).into());
    }

    let mut cdt = Cdt::new();
    cdt.add_constraint_edges(polygon.iter().map(|p| SpadePoint2::new(p.x, p.y)), true)
        .map_err(|e| GeometryError::Degenerate(format!("polygon cannot be triangulated: {e}")))?;

    // The boundary is a constraint, so every face lies wholly inside or
    // outside and its centroid decides which.
    let mut triangles = Vec::with_capacity(cdt.num_inner_faces());
    for face in cdt.inner_faces() {
        let [a, b, c] = face.vertices().map(|v| {
            let pos = v.position();
            Point2::new(pos.x, pos.y)
        });
        let centroid = Point2::from((a.coords + b.coords + c.coords) / 3.0);
        if !point_in_polygon(&centroid, polygon) {
            continue;
        }
        match orient2d(&a, &b, &c) {
            Orientation::CounterClockwise => triangles.push([a, b, c]),
            Orientation::Clockwise => triangles.push([a, c, b]),
            Orientation::Collinear => {}
        }
    }
    Ok(triangles)
}

/// Checks that no two non-adjacent polygon edges touch.
fn is_simple(polygon: &[Point2]) -> bool {
    let n = polygon.len();
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        for j in (i + 1)..n {
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (c, d) = (polygon[j], polygon[(j + 1) % n]);
            if segments_touch(&a, &b, &c, &d) {
                return false;
            }
        }
    }
    true
}

fn segments_touch(a: &Point2, b: &Point2, c: &Point2, d: &Point2) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);

    if o1.sign() * o2.sign() < 0 && o3.sign() * o4.sign() < 0 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(a, b, c))
        || (o2 == Orientation::Collinear && on_segment(a, b, d))
        || (o3 == Orientation::Collinear && on_segment(c, d, a))
        || (o4 == Orientation::Collinear && on_segment(c, d, b))
}

/// For a point `p` collinear with `a -> b`, checks whether it lies on the segment.
fn on_segment(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
