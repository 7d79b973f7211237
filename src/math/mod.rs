pub mod distance_3d;
pub mod intersect_3d;
pub mod polygon_2d;
pub mod predicates;

use serde::{Deserialize, Serialize};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// A half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point of the ray.
    pub origin: Point3,
    /// Direction of the ray, not necessarily normalized.
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Returns the point at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Returns a copy of this ray with a unit-length direction.
    ///
    /// Zero-length directions are returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let len = self.direction.norm();
        if len < TOLERANCE {
            *self
        } else {
            Self::new(self.origin, self.direction / len)
        }
    }
}
