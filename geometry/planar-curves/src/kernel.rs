//! Scalar geometry helpers shared by every primitive.

use std::f64::consts::{PI, TAU};

use nalgebra::{Point2, Vector2};

use crate::{CurveError, Result};

/// Relative slack accepted at the ends of a parameter range.
///
/// A query at `s` with `-slack <= s < 0` or `length < s <= length + slack`
/// (where `slack = PARAM_SLACK * max(1, length)`) is clamped instead of
/// rejected, so that accumulated arc lengths can be fed back in.
pub const PARAM_SLACK: f64 = 1e-10;

/// Position and heading tolerance for joining segments into a list.
pub const JOIN_TOLERANCE: f64 = 1e-8;

/// Normalizes an angle to `(-π, π]`.
///
/// # Example
///
/// ```
/// use planar_curves::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert_eq!(normalize_angle(PI), PI);
/// assert_eq!(normalize_angle(-PI), PI);
/// assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-15);
/// ```
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI { a - TAU } else { a }
}

/// Signed difference `a - b` wrapped to `(-π, π]`.
#[must_use]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    normalize_angle(a - b)
}

/// `sin(x) / x`, equal to 1 at the origin.
#[must_use]
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-4 {
        let x2 = x * x;
        1.0 - x2 / 6.0 * (1.0 - x2 / 20.0)
    } else {
        x.sin() / x
    }
}

/// `(1 - cos(x)) / x`, equal to 0 at the origin.
#[must_use]
pub fn cosc(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        let h = (0.5 * x).sin();
        2.0 * h * h / x
    }
}

/// Unit vector with the given heading.
#[must_use]
pub fn direction(theta: f64) -> Vector2<f64> {
    let (s, c) = theta.sin_cos();
    Vector2::new(c, s)
}

/// 2D cross product `a.x * b.y - a.y * b.x`.
#[must_use]
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Position of a constant-curvature path after arc length `s`.
///
/// Covers straight lines (`kappa == 0`) without special casing.
#[must_use]
pub fn arc_point(x0: f64, y0: f64, theta0: f64, kappa: f64, s: f64) -> Point2<f64> {
    let (st, ct) = theta0.sin_cos();
    let a = sinc(kappa * s);
    let b = cosc(kappa * s);
    Point2::new(x0 + s * (ct * a - st * b), y0 + s * (st * a + ct * b))
}

/// Validates a parameter against `[0, length]` and clamps it into range.
///
/// # Errors
///
/// Returns [`CurveError::OutOfRange`] if `s` is NaN or farther outside the
/// range than [`PARAM_SLACK`] allows.
pub fn check_param(s: f64, length: f64) -> Result<f64> {
    let slack = PARAM_SLACK * length.max(1.0);
    if s.is_nan() || s < -slack || s > length + slack {
        return Err(CurveError::out_of_range(s, 0.0, length));
    }
    Ok(s.clamp(0.0, length))
}

/// Orders and clamps a sub-range of `[0, length]`.
#[must_use]
pub fn clamp_range(s0: f64, s1: f64, length: f64) -> (f64, f64) {
    let (a, b) = if s0 <= s1 { (s0, s1) } else { (s1, s0) };
    (a.clamp(0.0, length), b.clamp(0.0, length))
}
