#![warn(missing_docs)]

//! Math types for the lander contact simulator.
//!
//! Thin wrappers around nalgebra providing the 2D primitives the rigid-body
//! solver needs: vectors, 2x2 matrices, planar rotations, and a small
//! symmetric positive-definite solve.

use nalgebra::{Matrix2, Rotation2, Vector2};

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A 2x2 matrix.
pub type Mat2 = Matrix2<f64>;

/// A planar rotation.
pub type Rot2 = Rotation2<f64>;

/// Rotation by `angle` radians, counter-clockwise.
pub fn rotation(angle: f64) -> Rot2 {
    Rotation2::new(angle)
}

/// Rotate `v` by a quarter turn counter-clockwise: `(x, y) -> (-y, x)`.
///
/// For a point at offset `v` on a body spinning at unit angular velocity,
/// this is the velocity of that point.
pub fn perp(v: &Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
pub fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Solve `m * x = rhs` for a symmetric positive-definite `m`.
///
/// Returns `None` if `m` is not positive definite.
pub fn solve_spd(m: &Mat2, rhs: &Vec2) -> Option<Vec2> {
    m.cholesky().map(|llt| llt.solve(rhs))
}

/// Build a matrix from row-major nested arrays.
pub fn mat2_from_rows(rows: [[f64; 2]; 2]) -> Mat2 {
    Mat2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1])
}
