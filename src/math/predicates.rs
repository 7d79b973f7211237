//! Exact orientation predicates on `f64` coordinates.
//!
//! The orientation determinant is first evaluated in floating point and
//! checked against a forward error bound. Only when the sign cannot be
//! trusted is the determinant re-evaluated exactly with floating-point
//! expansions (error-free `two_sum` / `two_product` transformations), so the
//! returned sign is always the sign of the exact real determinant of the
//! given inputs.

use super::Point2;

/// Orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The triple turns left.
    CounterClockwise,
    /// The triple turns right.
    Clockwise,
    /// The three points lie on one line.
    Collinear,
}

impl Orientation {
    /// Returns `1`, `-1` or `0`.
    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            Self::CounterClockwise => 1,
            Self::Clockwise => -1,
            Self::Collinear => 0,
        }
    }
}

/// Relative error bound of the filtered orientation test, `(3 + 16ε)ε`.
const CCW_ERROR_BOUND: f64 = (3.0 + 16.0 * f64::EPSILON * 0.5) * f64::EPSILON * 0.5;

/// Exact orientation of `c` relative to the directed line `a -> b`.
#[must_use]
pub fn orient2d(a: &Point2, b: &Point2, c: &Point2) -> Orientation {
    let det_left = (a.x - c.x) * (b.y - c.y);
    let det_right = (a.y - c.y) * (b.x - c.x);
    let det = det_left - det_right;

    let det_sum = det_left.abs() + det_right.abs();
    if det.abs() > CCW_ERROR_BOUND * det_sum {
        return sign_to_orientation(det);
    }

    sign_to_orientation(orient2d_exact(a, b, c))
}

/// Floating-point value of the orientation determinant (twice the signed area).
#[must_use]
pub fn orient2d_value(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x)
}

fn sign_to_orientation(value: f64) -> Orientation {
    if value > 0.0 {
        Orientation::CounterClockwise
    } else if value < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Evaluates the determinant exactly and returns a value with the exact sign.
///
/// Expanding `(ax-cx)(by-cy) - (ay-cy)(bx-cx)` gives six products whose
/// exact sum is accumulated into a nonoverlapping expansion.
fn orient2d_exact(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let terms = [
        two_product(a.x, b.y),
        two_product(-a.x, c.y),
        two_product(-c.x, b.y),
        two_product(-a.y, b.x),
        two_product(a.y, c.x),
        two_product(c.y, b.x),
    ];

    let mut expansion: Vec<f64> = Vec::with_capacity(12);
    for (high, low) in terms {
        grow_expansion(&mut expansion, low);
        grow_expansion(&mut expansion, high);
    }

    // Components are ordered by increasing magnitude and do not overlap,
    // so the largest nonzero one carries the sign of the whole sum.
    expansion
        .iter()
        .rev()
        .copied()
        .find(|v| *v != 0.0)
        .unwrap_or(0.0)
}

/// Error-free sum: `a + b = x + y` exactly.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    let a_virtual = x - b_virtual;
    let b_round = b - b_virtual;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

/// Error-free product: `a * b = x + y` exactly (uses a fused multiply-add).
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    let y = a.mul_add(b, -x);
    (x, y)
}

/// Adds `b` to a nonoverlapping expansion in place.
fn grow_expansion(expansion: &mut Vec<f64>, b: f64) {
    let mut q = b;
    for component in expansion.iter_mut() {
        let (sum, err) = two_sum(q, *component);
        *component = err;
        q = sum;
    }
    expansion.push(q);
}
