//! Closed-form motion functions between two control points.
//!
//! Angles are in degrees. Derivatives are taken with respect to the cam
//! rotation in radians, so a first derivative is mm/rad and a second
//! derivative mm/rad².

use std::f64::consts::PI;

use barrelcam_math::{solve, Point2};

use crate::error::{CamError, Result};
use crate::law::MotionLaw;

const DEG: f64 = PI / 180.0;

/// Which quantity a curve carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// Displacement (mm).
    Displacement,
    /// First derivative (mm/rad).
    FirstDerivative,
    /// Second derivative (mm/rad²).
    SecondDerivative,
}

/// `a·x² + b·x + c` with `x` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    /// Quadratic coefficient.
    pub a: f64,
    /// Linear coefficient.
    pub b: f64,
    /// Constant term.
    pub c: f64,
}

impl Quadratic {
    /// Value at `x`.
    pub fn value(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }

    /// Slope per degree at `x`.
    pub fn slope(&self, x: f64) -> f64 {
        2.0 * self.a * x + self.b
    }
}

/// Solved closed form of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentFn {
    /// Constant displacement.
    Dwell {
        /// Held displacement.
        displacement: f64,
    },
    /// `c·sin((a·x + b)°) + d`.
    Sine {
        /// Phase rate (degrees of phase per degree of rotation).
        a: f64,
        /// Phase offset in degrees.
        b: f64,
        /// Amplitude.
        c: f64,
        /// Offset.
        d: f64,
    },
    /// Two quadratics joined at `mid`.
    Parabolic {
        /// Split angle.
        mid: f64,
        /// Piece before `mid`.
        first: Quadratic,
        /// Piece from `mid` on.
        second: Quadratic,
    },
}

impl SegmentFn {
    /// Fit the closed form for `law` between `start` and `end`.
    ///
    /// Points carry the angle in `x` and the displacement in `y`.
    pub fn solve(law: MotionLaw, start: Point2, end: Point2) -> Result<Self> {
        let singular = || CamError::SingularSegment {
            start: start.x,
            end: end.x,
        };
        match law {
            MotionLaw::Linear => Ok(Self::Dwell {
                displacement: end.y,
            }),
            MotionLaw::Sinusoidal => {
                let [a, b, c, d] = solve(
                    [
                        [start.x, 1.0, 0.0, 0.0],
                        [end.x, 1.0, 0.0, 0.0],
                        [0.0, 0.0, -1.0, 1.0],
                        [0.0, 0.0, 1.0, 1.0],
                    ],
                    [-90.0, 90.0, start.y, end.y],
                )
                .ok_or_else(singular)?;
                Ok(Self::Sine { a, b, c, d })
            }
            MotionLaw::Parabolic => {
                let (x0, x1) = (start.x, end.x);
                let mid = (x0 + x1) / 2.0;
                let dm = (start.y + end.y) / 2.0;
                let [a1, b1, c1, a2, b2, c2] = solve(
                    [
                        [x0 * x0, x0, 1.0, 0.0, 0.0, 0.0],
                        [2.0 * x0, 1.0, 0.0, 0.0, 0.0, 0.0],
                        [mid * mid, mid, 1.0, 0.0, 0.0, 0.0],
                        [0.0, 0.0, 0.0, mid * mid, mid, 1.0],
                        [0.0, 0.0, 0.0, x1 * x1, x1, 1.0],
                        [0.0, 0.0, 0.0, 2.0 * x1, 1.0, 0.0],
                    ],
                    [start.y, 0.0, dm, dm, end.y, 0.0],
                )
                .ok_or_else(singular)?;
                Ok(Self::Parabolic {
                    mid,
                    first: Quadratic {
                        a: a1,
                        b: b1,
                        c: c1,
                    },
                    second: Quadratic {
                        a: a2,
                        b: b2,
                        c: c2,
                    },
                })
            }
        }
    }

    /// Angle at which a parabolic segment switches pieces.
    pub fn split(&self) -> Option<f64> {
        match self {
            Self::Parabolic { mid, .. } => Some(*mid),
            _ => None,
        }
    }

    /// Evaluate `kind` at `x`, choosing the parabolic piece by `x < mid`.
    pub fn evaluate(&self, kind: CurveKind, x: f64) -> f64 {
        let upper = self.split().is_some_and(|mid| x >= mid);
        self.evaluate_piece(kind, x, upper)
    }

    /// Evaluate `kind` at `x`; `upper` selects the second parabolic piece.
    pub fn evaluate_piece(&self, kind: CurveKind, x: f64, upper: bool) -> f64 {
        match *self {
            Self::Dwell { displacement } => match kind {
                CurveKind::Displacement => displacement,
                CurveKind::FirstDerivative | CurveKind::SecondDerivative => 0.0,
            },
            Self::Sine { a, b, c, d } => {
                let phase = (a * x + b) * DEG;
                match kind {
                    CurveKind::Displacement => c * phase.sin() + d,
                    CurveKind::FirstDerivative => c * a * phase.cos(),
                    CurveKind::SecondDerivative => -c * a * a * phase.sin(),
                }
            }
            Self::Parabolic { first, second, .. } => {
                let q = if upper { second } else { first };
                match kind {
                    CurveKind::Displacement => q.value(x),
                    CurveKind::FirstDerivative => q.slope(x) / DEG,
                    CurveKind::SecondDerivative => 2.0 * q.a / (DEG * DEG),
                }
            }
        }
    }

    /// Displacement at `x`.
    pub fn value(&self, x: f64) -> f64 {
        self.evaluate(CurveKind::Displacement, x)
    }

    /// First derivative at `x` (mm/rad).
    pub fn first_derivative(&self, x: f64) -> f64 {
        self.evaluate(CurveKind::FirstDerivative, x)
    }

    /// Second derivative at `x` (mm/rad²).
    pub fn second_derivative(&self, x: f64) -> f64 {
        self.evaluate(CurveKind::SecondDerivative, x)
    }
}

/// One solved segment of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start (angle, displacement).
    pub start: Point2,
    /// End (angle, displacement).
    pub end: Point2,
    /// Law of the end point.
    pub law: MotionLaw,
    /// Closed form.
    pub function: SegmentFn,
}

impl Segment {
    /// Solve the segment ending at `end` with `law`.
    pub fn solve(law: MotionLaw, start: Point2, end: Point2) -> Result<Self> {
        Ok(Self {
            start,
            end,
            law,
            function: SegmentFn::solve(law, start, end)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rise() -> (Point2, Point2) {
        (Point2::new(90.0, 0.0), Point2::new(180.0, 10.0))
    }

    #[test]
    fn test_sine_boundaries() {
        let (s, e) = rise();
        let f = SegmentFn::solve(MotionLaw::Sinusoidal, s, e).unwrap();
        assert_abs_diff_eq!(f.value(90.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.value(180.0), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.first_derivative(90.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.first_derivative(180.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.value(135.0), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sine_second_derivative_sign() {
        let (s, e) = rise();
        let f = SegmentFn::solve(MotionLaw::Sinusoidal, s, e).unwrap();
        // accelerating at the start of a rise, braking at the end
        assert!(f.second_derivative(91.0) > 0.0);
        assert!(f.second_derivative(179.0) < 0.0);
        // numeric check of the first derivative against displacement
        let h = 1e-4;
        let numeric = (f.value(120.0 + h) - f.value(120.0 - h)) / (2.0 * h) / DEG;
        assert_abs_diff_eq!(f.first_derivative(120.0), numeric, epsilon = 1e-5);
    }

    #[test]
    fn test_parabolic_midpoint() {
        let (s, e) = rise();
        let f = SegmentFn::solve(MotionLaw::Parabolic, s, e).unwrap();
        let SegmentFn::Parabolic { mid, first, second } = f else {
            panic!("expected parabolic");
        };
        assert_abs_diff_eq!(mid, 135.0);
        assert_abs_diff_eq!(first.value(mid), 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(second.value(mid), 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.slope(mid), second.slope(mid), epsilon = 1e-6);
        assert_abs_diff_eq!(first.value(90.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(second.value(180.0), 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.first_derivative(90.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(f.first_derivative(180.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_parabolic_second_derivative_switches_sign() {
        let (s, e) = rise();
        let f = SegmentFn::solve(MotionLaw::Parabolic, s, e).unwrap();
        let before = f.second_derivative(100.0);
        let after = f.second_derivative(170.0);
        assert!(before > 0.0);
        assert_abs_diff_eq!(before, -after, epsilon = 1e-6);
    }

    #[test]
    fn test_dwell_is_flat() {
        let f = SegmentFn::solve(
            MotionLaw::Linear,
            Point2::new(0.0, 4.0),
            Point2::new(30.0, 4.0),
        )
        .unwrap();
        assert_eq!(f.value(12.3), 4.0);
        assert_eq!(f.first_derivative(12.3), 0.0);
        assert_eq!(f.second_derivative(12.3), 0.0);
    }

    #[test]
    fn test_degenerate_segment() {
        let p = Point2::new(45.0, 1.0);
        let q = Point2::new(45.0, 2.0);
        assert!(matches!(
            SegmentFn::solve(MotionLaw::Sinusoidal, p, q),
            Err(CamError::SingularSegment { .. })
        ));
    }
}
