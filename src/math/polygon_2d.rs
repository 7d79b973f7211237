use super::predicates::{orient2d, Orientation};
use super::{Point2, TOLERANCE};

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the polygon in counter-clockwise order.
#[must_use]
pub fn to_counter_clockwise(points: &[Point2]) -> Vec<Point2> {
    let mut out = points.to_vec();
    if signed_area(&out) < 0.0 {
        out.reverse();
    }
    out
}

/// Drops consecutive duplicates (including the closing vertex) and vertices
/// lying exactly on the line through their neighbours.
#[must_use]
pub fn simplify_polygon(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_none_or(|last| (last - p).norm() > TOLERANCE) {
            out.push(p);
        }
    }
    while out.len() > 1
        && out
            .first()
            .zip(out.last())
            .is_some_and(|(a, b)| (a - b).norm() <= TOLERANCE)
    {
        out.pop();
    }

    let mut changed = true;
    while changed && out.len() >= 3 {
        changed = false;
        let n = out.len();
        for i in 0..n {
            let prev = out[(i + n - 1) % n];
            let next = out[(i + 1) % n];
            if orient2d(&prev, &out[i], &next) == Orientation::Collinear {
                out.remove(i);
                changed = true;
                break;
            }
        }
    }
    out
}

/// Checks whether a counter-clockwise polygon is convex.
///
/// Collinear vertex triples are tolerated; any clockwise turn makes the
/// polygon non-convex.
#[must_use]
pub fn is_convex(points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut has_turn = false;
    for i in 0..n {
        match orient2d(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]) {
            Orientation::Clockwise => return false,
            Orientation::CounterClockwise => has_turn = true,
            Orientation::Collinear => {}
        }
    }
    has_turn
}

/// Checks whether `p` lies inside or on the boundary of the counter-clockwise
/// triangle `tri`.
#[must_use]
pub fn point_in_triangle(p: &Point2, tri: &[Point2; 3]) -> bool {
    (0..3).all(|i| orient2d(&tri[i], &tri[(i + 1) % 3], p) != Orientation::Clockwise)
}

/// Even-odd test of `p` against a simple polygon. Points on the boundary
/// may land on either side.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Axis-aligned bounds `(min, max)` of a point set.
#[must_use]
pub fn bounds(points: &[Point2]) -> Option<(Point2, Point2)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some((min, max))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area(&square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square();
        pts.reverse();
        assert!((signed_area(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area(&[p(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn clockwise_input_is_reversed() {
        let mut pts = square();
        pts.reverse();
        assert!(signed_area(&to_counter_clockwise(&pts)) > 0.0);
    }

    #[test]
    fn simplify_drops_duplicates_and_collinear_vertices() {
        let pts = vec![
            p(0.0, 0.0),
            p(0.0, 0.0),
            p(0.5, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
            p(0.0, 0.0),
        ];
        let simplified = simplify_polygon(&pts);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn square_is_convex() {
        assert!(is_convex(&square()));
    }

    #[test]
    fn l_shape_is_not_convex() {
        let l = vec![
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        assert!(!is_convex(&l));
    }

    #[test]
    fn point_in_triangle_includes_boundary() {
        let tri = [p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)];
        assert!(point_in_triangle(&p(0.25, 0.25), &tri));
        assert!(point_in_triangle(&p(0.5, 0.0), &tri));
        assert!(!point_in_triangle(&p(1.0, 1.0), &tri));
    }

    #[test]
    fn point_in_l_shape_respects_the_notch() {
        let l = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        assert!(point_in_polygon(&p(0.5, 1.5), &l));
        assert!(point_in_polygon(&p(1.5, 0.5), &l));
        assert!(!point_in_polygon(&p(1.5, 1.5), &l));
        assert!(!point_in_polygon(&p(-0.5, 0.5), &l));
    }

    #[test]
    fn bounds_of_square() {
        let (min, max) = bounds(&square()).unwrap();
        assert_eq!(min, p(0.0, 0.0));
        assert_eq!(max, p(1.0, 1.0));
        assert!(bounds(&[]).is_none());
    }
}
