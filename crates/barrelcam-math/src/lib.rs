#![warn(missing_docs)]

//! Math types for barrel cam geometry.
//!
//! Thin wrappers around nalgebra: points and vectors for drum-surface
//! geometry, tolerance constants, resolution-grid quantization and the
//! small dense solves used to fit motion-law segments.

use nalgebra::{DMatrix, DVector, Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D space (unrolled drum coordinates).
pub type Point2 = nalgebra::Point2<f64>;

/// Slack added before flooring onto a resolution grid.
///
/// `2.3 * 10.0` evaluates to `22.999999999999996`; without the slack a value
/// that is already on the grid would drop one step.
pub const GRID_EPSILON: f64 = 1e-9;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Index of the grid cell containing `value` at `steps` cells per unit.
pub fn grid_index(value: f64, steps: u32) -> i64 {
    (value * f64::from(steps) + GRID_EPSILON).floor() as i64
}

/// Floor `value` onto a grid of `steps` cells per unit.
pub fn snap_down(value: f64, steps: u32) -> f64 {
    grid_index(value, steps) as f64 / f64::from(steps)
}

/// Solve the square system `a * x = b` given in row-major order.
///
/// Returns `None` when the matrix is singular.
pub fn solve<const N: usize>(rows: [[f64; N]; N], b: [f64; N]) -> Option<[f64; N]> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let a = DMatrix::from_row_slice(N, N, &flat);
    let x = a.lu().solve(&DVector::from_column_slice(&b))?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut out = [0.0; N];
    out.copy_from_slice(x.as_slice());
    Some(out)
}

/// Point on a drum of radius `radius` at `angle` degrees and height `z`.
pub fn drum_point(radius: f64, angle: f64, z: f64) -> Point3 {
    let (s, c) = angle.to_radians().sin_cos();
    Point3::new(radius * c, radius * s, z)
}
