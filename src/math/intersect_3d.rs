use super::{Point3, Ray, Vector3, TOLERANCE};

/// Result of intersecting a ray with a single triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayTriangleIntersection {
    /// The ray crosses the triangle plane at a single point inside the triangle.
    Point {
        /// Ray parameter of the hit.
        t: f64,
        /// Hit point.
        point: Point3,
        /// Barycentric coordinates of the hit with respect to the triangle corners.
        barycentric: Vector3,
    },
    /// The ray lies in the triangle plane and overlaps the triangle along a segment.
    Segment {
        /// Ray parameter where the ray enters the triangle.
        t_enter: f64,
        /// Ray parameter where the ray leaves the triangle.
        t_exit: f64,
    },
    /// No intersection.
    None,
}

impl RayTriangleIntersection {
    /// Ray parameter of the first contact, if any.
    #[must_use]
    pub fn first_t(&self) -> Option<f64> {
        match self {
            Self::Point { t, .. } => Some(*t),
            Self::Segment { t_enter, .. } => Some(*t_enter),
            Self::None => None,
        }
    }
}

/// Intersects a ray with the triangle `tri`.
///
/// Non-coplanar rays use the Möller–Trumbore formulation; rays lying in the
/// triangle plane are clipped against the three edges and reported as a
/// [`Segment`](RayTriangleIntersection::Segment).
#[must_use]
pub fn ray_triangle_intersect(ray: &Ray, tri: &[Point3; 3]) -> RayTriangleIntersection {
    let [a, b, c] = tri;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(&e2);
    let det = e1.dot(&p);

    let scale = e1.norm() * e2.norm() * ray.direction.norm();
    if scale < TOLERANCE {
        return RayTriangleIntersection::None;
    }

    if det.abs() <= TOLERANCE * scale {
        return coplanar_ray_triangle(ray, tri);
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(-TOLERANCE..=1.0 + TOLERANCE).contains(&u) {
        return RayTriangleIntersection::None;
    }

    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < -TOLERANCE || u + v > 1.0 + TOLERANCE {
        return RayTriangleIntersection::None;
    }

    let t = e2.dot(&q) * inv_det;
    if t < 0.0 {
        return RayTriangleIntersection::None;
    }

    RayTriangleIntersection::Point {
        t,
        point: ray.point_at(t),
        barycentric: Vector3::new(1.0 - u - v, u, v),
    }
}

/// Clips a ray lying in the triangle plane against the triangle edges.
fn coplanar_ray_triangle(ray: &Ray, tri: &[Point3; 3]) -> RayTriangleIntersection {
    let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let normal_len = normal.norm();
    if normal_len < TOLERANCE {
        return RayTriangleIntersection::None;
    }
    let normal = normal / normal_len;

    let plane_dist = (ray.origin - tri[0]).dot(&normal);
    if plane_dist.abs() > TOLERANCE * (1.0 + (ray.origin - tri[0]).norm()) {
        return RayTriangleIntersection::None;
    }

    let mut t_enter = 0.0_f64;
    let mut t_exit = f64::INFINITY;
    for i in 0..3 {
        let p = tri[i];
        let q = tri[(i + 1) % 3];
        let inward = normal.cross(&(q - p));
        let start = inward.dot(&(ray.origin - p));
        let rate = inward.dot(&ray.direction);

        if rate.abs() < TOLERANCE {
            if start < -TOLERANCE {
                return RayTriangleIntersection::None;
            }
            continue;
        }

        let t = -start / rate;
        if rate > 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
    }

    if t_enter > t_exit + TOLERANCE || !t_exit.is_finite() {
        return RayTriangleIntersection::None;
    }

    RayTriangleIntersection::Segment { t_enter, t_exit }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with the plane
/// through `plane_origin` with unit normal `plane_normal`.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane_origin: &Point3,
    plane_normal: &Vector3,
) -> LinePlaneRelation {
    let denom = plane_normal.dot(dir);

    let diff = plane_origin - origin;
    let numer = plane_normal.dot(&diff);

    if denom.abs() < TOLERANCE {
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        let point = origin + dir * t;
        LinePlaneRelation::Point { point, t }
    }
}

/// Signed distance from a point to a plane.
/// Positive = on the normal side, negative = opposite.
#[must_use]
pub fn signed_distance_to_plane(
    point: &Point3,
    plane_origin: &Point3,
    plane_normal: &Vector3,
) -> f64 {
    plane_normal.dot(&(point - plane_origin))
}

/// A circle embedded in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle3 {
    /// Center of the circle.
    pub center: Point3,
    /// Radius of the circle.
    pub radius: f64,
    /// Unit normal of the circle plane.
    pub normal: Vector3,
}

/// Intersects a sphere with a plane.
///
/// Returns `None` when the sphere misses the plane or only touches it in a
/// single point.
#[must_use]
pub fn sphere_plane_intersect(
    center: &Point3,
    radius: f64,
    plane_origin: &Point3,
    plane_normal: &Vector3,
) -> Option<Circle3> {
    let dist = signed_distance_to_plane(center, plane_origin, plane_normal);
    let radius_sq = radius * radius - dist * dist;
    if radius_sq <= TOLERANCE * TOLERANCE {
        return None;
    }

    Some(Circle3 {
        center: center - plane_normal * dist,
        radius: radius_sq.sqrt(),
        normal: *plane_normal,
    })
}
