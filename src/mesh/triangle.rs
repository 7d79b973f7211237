use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Index into the palette of a [`ColorManager`](crate::color::ColorManager).
pub type ColorIndex = usize;

/// Stable identifier of a mesh triangle.
///
/// Identifiers are positions in the insertion-ordered triangle array and stay
/// valid across undo/redo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TriangleId(pub usize);

impl TriangleId {
    /// Returns the position of the triangle in the triangle array.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for TriangleId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Identifies either a whole triangle or one sub-triangle of its detail mesh.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct DetailedTriangleId {
    /// The base triangle.
    pub base: TriangleId,
    /// Sub-triangle index inside the base triangle's detail, if any.
    pub detail: Option<usize>,
}

impl DetailedTriangleId {
    /// Addresses a whole triangle.
    #[must_use]
    pub fn whole(base: TriangleId) -> Self {
        Self { base, detail: None }
    }

    /// Addresses one sub-triangle of a detailed triangle.
    #[must_use]
    pub fn sub(base: TriangleId, detail: usize) -> Self {
        Self {
            base,
            detail: Some(detail),
        }
    }
}

impl From<TriangleId> for DetailedTriangleId {
    fn from(base: TriangleId) -> Self {
        Self::whole(base)
    }
}

/// A mesh triangle with its face normal and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTriangle {
    /// Identifier of this triangle.
    pub id: TriangleId,
    /// Corner positions, counter-clockwise around `normal`.
    pub vertices: [Point3; 3],
    /// Unit face normal.
    pub normal: Vector3,
    /// Palette index of the triangle color.
    pub color: ColorIndex,
}

impl DataTriangle {
    /// Creates a triangle, computing its face normal from the corner order.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the triangle has (near) zero area.
    pub fn new(id: TriangleId, vertices: [Point3; 3], color: ColorIndex) -> Result<Self> {
        let normal = face_normal(&vertices).ok_or_else(|| {
            GeometryError::Degenerate(format!("triangle {id} has zero area"))
        })?;
        Ok(Self {
            id,
            vertices,
            normal,
            color,
        })
    }

    /// Area of the triangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        triangle_area(&self.vertices)
    }

    /// Centroid of the triangle.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Point with the given barycentric coordinates.
    #[must_use]
    pub fn point_at(&self, barycentric: &Vector3) -> Point3 {
        let [a, b, c] = &self.vertices;
        Point3::from(a.coords * barycentric.x + b.coords * barycentric.y + c.coords * barycentric.z)
    }

    /// Barycentric coordinates of the projection of `p` onto the triangle plane.
    #[must_use]
    pub fn barycentric(&self, p: &Point3) -> Vector3 {
        let [a, b, c] = &self.vertices;
        let e1 = b - a;
        let e2 = c - a;
        let d = p - a;
        let d00 = e1.dot(&e1);
        let d01 = e1.dot(&e2);
        let d11 = e2.dot(&e2);
        let d20 = d.dot(&e1);
        let d21 = d.dot(&e2);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < TOLERANCE * TOLERANCE {
            return Vector3::new(1.0, 0.0, 0.0);
        }
        let w1 = (d11 * d20 - d01 * d21) / denom;
        let w2 = (d00 * d21 - d01 * d20) / denom;
        Vector3::new(1.0 - w1 - w2, w1, w2)
    }
}

/// Area of the triangle spanned by three points.
#[must_use]
pub fn triangle_area(vertices: &[Point3; 3]) -> f64 {
    let [a, b, c] = vertices;
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Unit normal of a counter-clockwise triangle, `None` if degenerate.
#[must_use]
pub fn face_normal(vertices: &[Point3; 3]) -> Option<Vector3> {
    let [a, b, c] = vertices;
    let n = (b - a).cross(&(c - a));
    let scale = (b - a).norm().max((c - a).norm());
    if scale < TOLERANCE || n.norm() <= TOLERANCE * scale * scale {
        return None;
    }
    Some(n.normalize())
}
