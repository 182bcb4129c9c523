//! Clothoid (Euler spiral) segments.
//!
//! A clothoid has curvature linear in arc length, `κ(s) = κ0 + dk·s`, so its
//! heading is quadratic and its position is given by the generalized Fresnel
//! integrals:
//!
//! ```text
//! x(s) = x0 + s·X_0(dk s², κ0 s, θ0)
//! y(s) = y0 + s·Y_0(dk s², κ0 s, θ0)
//! ```

use std::f64::consts::{FRAC_PI_4, PI};

use nalgebra::{Isometry2, Point2, Vector2};
use planar_spatial::BBox;

use crate::fresnel::generalized_fresnel;
use crate::g1::fit_clothoid;
use crate::kernel::{clamp_range, cross, direction, normalize_angle};
use crate::line::{check_factor, check_trim};
use crate::{CircleArc, CurveError, FitConfig, FitResult, LineSegment, PlanarCurve, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest turning of a piece bounded by a single triangle.
const BOX_TURNING: f64 = FRAC_PI_4;

/// Nesting cap for the bounding-box subdivision.
const BOX_MAX_DEPTH: usize = 32;

/// A clothoid segment.
///
/// # Example
///
/// ```
/// use planar_curves::{ClothoidCurve, PlanarCurve};
/// use std::f64::consts::PI;
///
/// let c = ClothoidCurve::new(1.0, 2.0, PI, 0.1, 0.01, 3.0).unwrap();
/// assert_eq!(c.eval(0.0).unwrap().x, 1.0);
/// assert!((c.curvature_at(3.0).unwrap() - 0.13).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClothoidCurve {
    x0: f64,
    y0: f64,
    theta0: f64,
    kappa0: f64,
    dk: f64,
    length: f64,
}

impl ClothoidCurve {
    /// Creates a clothoid from its start state, curvature rate and length.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if any value is not finite or the
    /// length is negative.
    pub fn new(x0: f64, y0: f64, theta0: f64, kappa0: f64, dk: f64, length: f64) -> Result<Self> {
        if ![x0, y0, theta0, kappa0, dk, length].iter().all(|v| v.is_finite()) {
            return Err(CurveError::degenerate("clothoid parameters must be finite"));
        }
        if length < 0.0 {
            return Err(CurveError::degenerate(format!(
                "negative clothoid length {length}"
            )));
        }
        Ok(Self {
            x0,
            y0,
            theta0: normalize_angle(theta0),
            kappa0,
            dk,
            length,
        })
    }

    /// G1 Hermite fit from `(x0, y0, θ0)` to `(x1, y1, θ1)`.
    ///
    /// # Errors
    ///
    /// See [`build_g1_with_result`](Self::build_g1_with_result).
    pub fn build_g1(x0: f64, y0: f64, theta0: f64, x1: f64, y1: f64, theta1: f64) -> Result<Self> {
        Self::build_g1_with_result(x0, y0, theta0, x1, y1, theta1, &FitConfig::default())
            .map(|(curve, _)| curve)
    }

    /// G1 Hermite fit with explicit settings, also returning the solver
    /// statistics.
    ///
    /// The curve starts exactly at `(x0, y0)` with heading `theta0`; its end
    /// matches `(x1, y1, theta1)` to the accuracy of the Fresnel integrals.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidInput`] for non-finite input.
    /// - [`CurveError::Degenerate`] when the two points coincide.
    /// - [`CurveError::FitConvergence`] when the Newton iteration fails.
    #[allow(clippy::too_many_arguments)]
    pub fn build_g1_with_result(
        x0: f64,
        y0: f64,
        theta0: f64,
        x1: f64,
        y1: f64,
        theta1: f64,
        config: &FitConfig,
    ) -> Result<(Self, FitResult)> {
        let fit = fit_clothoid(x0, y0, theta0, x1, y1, theta1, config)?;
        let curve = Self::new(x0, y0, theta0, fit.kappa0, fit.dk, fit.length)?;
        Ok((curve, fit.result))
    }

    /// Start x coordinate.
    #[must_use]
    pub const fn x0(&self) -> f64 {
        self.x0
    }

    /// Start y coordinate.
    #[must_use]
    pub const fn y0(&self) -> f64 {
        self.y0
    }

    /// Start heading.
    #[must_use]
    pub const fn theta0(&self) -> f64 {
        self.theta0
    }

    /// Start curvature.
    #[must_use]
    pub const fn kappa0(&self) -> f64 {
        self.kappa0
    }

    /// Curvature rate `dκ/ds`.
    #[must_use]
    pub const fn dk(&self) -> f64 {
        self.dk
    }

    /// Arc length where the curvature vanishes, if inside the curve.
    #[must_use]
    pub fn inflection(&self) -> Option<f64> {
        if self.dk == 0.0 {
            return None;
        }
        let s = -self.kappa0 / self.dk;
        (s > 0.0 && s < self.length).then_some(s)
    }

    /// Clothoid scaled by `factor` about its start point.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidInput`] unless `factor` is positive and finite.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        check_factor(factor)?;
        Ok(Self {
            kappa0: self.kappa0 / factor,
            dk: self.dk / (factor * factor),
            length: self.length * factor,
            ..*self
        })
    }

    /// The piece of the clothoid between `s0` and `s1`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`] if either end is outside the
    /// curve, or [`CurveError::InvalidInput`] if `s1 < s0`.
    pub fn trimmed(&self, s0: f64, s1: f64) -> Result<Self> {
        let (s0, s1) = check_trim(s0, s1, self.length)?;
        let p = self.point(s0);
        Ok(Self {
            x0: p.x,
            y0: p.y,
            theta0: normalize_angle(self.theta(s0)),
            kappa0: self.kappa(s0),
            dk: self.dk,
            length: s1 - s0,
        })
    }

    /// Bounds a piece on which the curvature keeps its sign.
    fn bbox_convex(&self, a: f64, b: f64, depth: usize) -> BBox {
        let turning = (self.theta(b) - self.theta(a)).abs();
        if turning > BOX_TURNING && depth < BOX_MAX_DEPTH {
            let mid = 0.5 * (a + b);
            return self
                .bbox_convex(a, mid, depth + 1)
                .join(&self.bbox_convex(mid, b, depth + 1));
        }

        let (pa, pb) = (self.point(a), self.point(b));
        let span = b - a;
        let fallback = || {
            let c = self.point(0.5 * (a + b));
            let h = Vector2::new(0.5 * span, 0.5 * span);
            BBox::new(c - h, c + h, 0, 0)
        };
        if depth >= BOX_MAX_DEPTH && turning > BOX_TURNING {
            return fallback();
        }
        if turning < 1e-8 {
            // Nearly straight: the curve leaves the chord by at most span·turning.
            return BBox::new(pa, pb, 0, 0).inflated(span * turning + f64::EPSILON * span);
        }

        // A convex piece lies inside the triangle of its end points and the
        // intersection of its end tangents.
        let (ta, tb) = (direction(self.theta(a)), direction(self.theta(b)));
        let t = cross(&(pb - pa), &tb) / cross(&ta, &tb);
        if !t.is_finite() || t < 0.0 || t > span {
            return fallback();
        }
        let mut bbox = BBox::new(pa, pb, 0, 0);
        bbox.extend(&(pa + ta * t));
        bbox
    }
}

impl From<LineSegment> for ClothoidCurve {
    fn from(line: LineSegment) -> Self {
        Self {
            x0: line.x0(),
            y0: line.y0(),
            theta0: line.theta0(),
            kappa0: 0.0,
            dk: 0.0,
            length: line.length(),
        }
    }
}

impl From<CircleArc> for ClothoidCurve {
    fn from(arc: CircleArc) -> Self {
        Self {
            x0: arc.x0(),
            y0: arc.y0(),
            theta0: arc.theta0(),
            kappa0: arc.curvature(),
            dk: 0.0,
            length: arc.length(),
        }
    }
}

impl PlanarCurve for ClothoidCurve {
    fn length(&self) -> f64 {
        self.length
    }

    fn point(&self, s: f64) -> Point2<f64> {
        let (x, y) = generalized_fresnel(self.dk * s * s, self.kappa0 * s, self.theta0);
        Point2::new(self.x0 + s * x, self.y0 + s * y)
    }

    fn theta(&self, s: f64) -> f64 {
        self.theta0 + s * (self.kappa0 + 0.5 * self.dk * s)
    }

    fn kappa(&self, s: f64) -> f64 {
        self.kappa0 + self.dk * s
    }

    fn bbox_range(&self, s0: f64, s1: f64) -> BBox {
        let (s0, s1) = clamp_range(s0, s1, self.length);
        match self.inflection().filter(|&s| s > s0 && s < s1) {
            Some(s) => self.bbox_convex(s0, s, 0).join(&self.bbox_convex(s, s1, 0)),
            None => self.bbox_convex(s0, s1, 0),
        }
    }

    fn reversed(&self) -> Self {
        let end = self.end();
        Self {
            x0: end.x,
            y0: end.y,
            theta0: normalize_angle(self.theta_end() + PI),
            kappa0: -self.kappa_end(),
            dk: self.dk,
            length: self.length,
        }
    }

    fn transformed(&self, iso: &Isometry2<f64>) -> Self {
        let p = iso * Point2::new(self.x0, self.y0);
        Self {
            x0: p.x,
            y0: p.y,
            theta0: normalize_angle(self.theta0 + iso.rotation.angle()),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> ClothoidCurve {
        ClothoidCurve::new(1.0, 2.0, PI, 0.1, 0.01, 3.0).unwrap()
    }

    /// Reference position by midpoint-rule integration of the heading.
    fn integrate(c: &ClothoidCurve, s: f64) -> Point2<f64> {
        let n = 20_000;
        let h = s / f64::from(n);
        let mut p = c.start();
        for i in 0..n {
            let t = c.theta((f64::from(i) + 0.5) * h);
            p += direction(t) * h;
        }
        p
    }

    #[test]
    fn test_reference_clothoid() {
        let c = sample();
        assert_eq!(c.eval(0.0).unwrap(), Point2::new(1.0, 2.0));
        assert_eq!(c.heading_at(0.0).unwrap(), PI);
        assert_eq!(c.curvature_at(0.0).unwrap(), 0.1);
        assert_relative_eq!(c.curvature_at(3.0).unwrap(), 0.13, epsilon = 1e-15);
        assert_relative_eq!(c.theta_end(), PI + 0.3 + 0.045, epsilon = 1e-15);
        assert_relative_eq!(c.end(), integrate(&c, 3.0), epsilon = 1e-8);
        assert!(c.eval(3.5).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_matches_arc_and_line() {
        let arc = CircleArc::new(0.0, 0.0, 0.2, 0.5, 4.0).unwrap();
        let c = ClothoidCurve::from(arc);
        for s in [0.0, 1.0, 2.5, 4.0] {
            assert_relative_eq!(c.point(s), arc.point(s), epsilon = 1e-10);
        }
        let line = LineSegment::new(1.0, 1.0, -0.4, 2.0).unwrap();
        let c = ClothoidCurve::from(line);
        assert_relative_eq!(c.end(), line.end(), epsilon = 1e-14);
    }

    #[test]
    fn test_build_g1_general() {
        let (c, result) = ClothoidCurve::build_g1_with_result(
            0.0,
            0.0,
            0.3,
            4.0,
            1.0,
            -0.6,
            &FitConfig::default(),
        )
        .unwrap();
        assert!(result.ok());
        assert!(result.residual <= 1e-10);
        assert_eq!(c.start(), Point2::new(0.0, 0.0));
        assert_relative_eq!(c.end(), Point2::new(4.0, 1.0), epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(c.theta_end() + 0.6), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_build_g1_large_turn() {
        let c = ClothoidCurve::build_g1(0.0, 0.0, FRAC_PI_2, 1.0, 0.0, FRAC_PI_2).unwrap();
        assert_relative_eq!(c.end(), Point2::new(1.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(c.theta_end() - FRAC_PI_2), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bbox_contains_samples() {
        for c in [
            sample(),
            ClothoidCurve::new(0.0, 0.0, 0.0, -2.0, 1.5, 4.0).unwrap(),
            ClothoidCurve::new(0.0, 0.0, 1.0, 0.0, 0.0, 2.0).unwrap(),
            ClothoidCurve::new(0.0, 0.0, 0.0, 0.0, 3.0, 6.0).unwrap(),
        ] {
            let b = c.bounding_box().inflated(1e-12);
            for i in 0..=200 {
                let s = c.length() * f64::from(i) / 200.0;
                assert!(b.contains(&c.point(s)), "s = {s}");
            }
            let sub = c.bbox_range(0.25 * c.length(), 0.5 * c.length()).inflated(1e-12);
            assert!(sub.contains(&c.point(0.375 * c.length())));
        }
    }

    #[test]
    fn test_reversed() {
        let c = ClothoidCurve::new(0.0, 0.0, 0.0, -0.5, 0.4, 3.0).unwrap();
        let r = c.reversed();
        assert_relative_eq!(r.start(), c.end(), epsilon = 1e-14);
        assert_relative_eq!(r.end(), c.start(), epsilon = 1e-10);
        assert_relative_eq!(r.kappa_end(), -c.kappa_begin(), epsilon = 1e-14);
    }

    #[test]
    fn test_trimmed_and_scaled() {
        let c = sample();
        let t = c.trimmed(1.0, 2.5).unwrap();
        assert_relative_eq!(t.start(), c.point(1.0), epsilon = 1e-14);
        assert_relative_eq!(t.end(), c.point(2.5), epsilon = 1e-10);
        assert_relative_eq!(t.kappa_begin(), c.kappa(1.0), epsilon = 1e-15);

        let s = c.scaled(2.0).unwrap();
        let expected = Point2::new(1.0, 2.0) + (c.end() - c.start()) * 2.0;
        assert_relative_eq!(s.end(), expected, epsilon = 1e-10);
    }
}
