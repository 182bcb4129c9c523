//! Core curve trait.
//!
//! Every primitive is parameterized by arc length `s ∈ [0, length]`, with
//! `s = 0` at the start of the curve.

use nalgebra::{Isometry2, Point2, Vector2};
use planar_spatial::BBox;

use crate::kernel::{check_param, direction};
use crate::line::LineSegment;
use crate::solver::newton_bracketed;
use crate::{Result, SolverConfig};

/// The point of a curve closest to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    /// Arc length of the closest point.
    pub s: f64,
    /// The closest point.
    pub point: Point2<f64>,
    /// Distance from the query point.
    pub distance: f64,
}

/// An arc-length parameterized planar curve.
///
/// # Implementors
///
/// - [`LineSegment`] - Straight segment
/// - [`CircleArc`](crate::CircleArc) - Constant curvature
/// - [`Biarc`](crate::Biarc) - Two tangent arcs
/// - [`ClothoidCurve`](crate::ClothoidCurve) - Curvature linear in arc length
/// - [`Curve`](crate::Curve) - Any of the above
///
/// The required methods evaluate without range checks and extend the curve
/// naturally outside `[0, length]`. The provided `*_at` methods check the
/// range and fail with [`CurveError::OutOfRange`](crate::CurveError) outside
/// it.
pub trait PlanarCurve {
    /// Total arc length.
    fn length(&self) -> f64;

    /// Position at arc length `s`, without range checking.
    fn point(&self, s: f64) -> Point2<f64>;

    /// Heading at arc length `s`, without range checking.
    ///
    /// The heading is continuous in `s` and not wrapped to `(-π, π]`.
    fn theta(&self, s: f64) -> f64;

    /// Signed curvature at arc length `s`, without range checking.
    fn kappa(&self, s: f64) -> f64;

    /// Conservative bounding box of the sub-range `[s0, s1]`, tagged `(0, 0)`.
    fn bbox_range(&self, s0: f64, s1: f64) -> BBox;

    /// Returns the curve traversed in the opposite direction.
    fn reversed(&self) -> Self
    where
        Self: Sized;

    /// Returns the curve moved by a rigid transform.
    fn transformed(&self, iso: &Isometry2<f64>) -> Self
    where
        Self: Sized;

    /// Returns the curve translated by `(tx, ty)`.
    fn translated(&self, tx: f64, ty: f64) -> Self
    where
        Self: Sized,
    {
        self.transformed(&Isometry2::translation(tx, ty))
    }

    /// Returns the curve rotated by `angle` around `(cx, cy)`.
    fn rotated(&self, angle: f64, cx: f64, cy: f64) -> Self
    where
        Self: Sized,
    {
        let center = Vector2::new(cx, cy);
        let rotation = nalgebra::Rotation2::new(angle);
        self.transformed(&Isometry2::new(center - rotation * center, angle))
    }

    /// Returns the segment if this curve is a straight line.
    ///
    /// The intersection engine uses this to switch to closed-form
    /// segment intersection.
    fn as_line(&self) -> Option<&LineSegment> {
        None
    }

    /// Position at arc length `s`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`](crate::CurveError) outside `[0, length]`.
    fn eval(&self, s: f64) -> Result<Point2<f64>> {
        let s = check_param(s, self.length())?;
        Ok(self.point(s))
    }

    /// Heading at arc length `s`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`](crate::CurveError) outside `[0, length]`.
    fn heading_at(&self, s: f64) -> Result<f64> {
        let s = check_param(s, self.length())?;
        Ok(self.theta(s))
    }

    /// Curvature at arc length `s`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`](crate::CurveError) outside `[0, length]`.
    fn curvature_at(&self, s: f64) -> Result<f64> {
        let s = check_param(s, self.length())?;
        Ok(self.kappa(s))
    }

    /// Unit tangent at arc length `s`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`](crate::CurveError) outside `[0, length]`.
    fn tangent_at(&self, s: f64) -> Result<Vector2<f64>> {
        let s = check_param(s, self.length())?;
        Ok(direction(self.theta(s)))
    }

    /// Start point.
    fn start(&self) -> Point2<f64> {
        self.point(0.0)
    }

    /// End point.
    fn end(&self) -> Point2<f64> {
        self.point(self.length())
    }

    /// x coordinate of the start point.
    fn x_begin(&self) -> f64 {
        self.start().x
    }

    /// y coordinate of the start point.
    fn y_begin(&self) -> f64 {
        self.start().y
    }

    /// x coordinate of the end point.
    fn x_end(&self) -> f64 {
        self.end().x
    }

    /// y coordinate of the end point.
    fn y_end(&self) -> f64 {
        self.end().y
    }

    /// Heading at the start.
    fn theta_begin(&self) -> f64 {
        self.theta(0.0)
    }

    /// Heading at the end.
    fn theta_end(&self) -> f64 {
        self.theta(self.length())
    }

    /// Curvature at the start.
    fn kappa_begin(&self) -> f64 {
        self.kappa(0.0)
    }

    /// Curvature at the end.
    fn kappa_end(&self) -> f64 {
        self.kappa(self.length())
    }

    /// Largest absolute curvature along the curve.
    ///
    /// Exact for every curve whose curvature is linear or piecewise constant.
    fn max_abs_curvature(&self) -> f64 {
        self.kappa_begin().abs().max(self.kappa_end().abs())
    }

    /// Bounding box of the whole curve.
    fn bounding_box(&self) -> BBox {
        self.bbox_range(0.0, self.length())
    }

    /// Closest point of the curve to `p`.
    ///
    /// The curve is sampled finely enough that each sample interval turns by
    /// at most π/8, then the best interval is refined by a bracketed Newton
    /// solve on `(P(s) - p) · T(s) = 0`.
    fn closest_point(&self, p: &Point2<f64>) -> ClosestPoint {
        let length = self.length();
        let turning = length * self.max_abs_curvature();
        let samples = ((turning / (std::f64::consts::PI / 8.0)).ceil() as usize + 8).min(1 << 16);

        let at = |s: f64| {
            let q = self.point(s);
            ClosestPoint {
                s,
                point: q,
                distance: (q - *p).norm(),
            }
        };
        let h = length / samples as f64;
        let mut best = at(0.0);
        let mut best_i = 0;
        for i in 1..=samples {
            let c = at(h * i as f64);
            if c.distance < best.distance {
                best = c;
                best_i = i;
            }
        }
        if length == 0.0 {
            return best;
        }

        // First-order condition on the neighbouring sample intervals.
        let g = |s: f64| {
            let d = self.point(s) - *p;
            let t = direction(self.theta(s));
            let n = Vector2::new(-t.y, t.x);
            (d.dot(&t), 1.0 + self.kappa(s) * d.dot(&n))
        };
        let lo = h * best_i.saturating_sub(1) as f64;
        let hi = (h * (best_i + 1) as f64).min(length);
        for (a, b) in [(lo, best.s), (best.s, hi)] {
            if b <= a {
                continue;
            }
            if let Ok(root) = newton_bracketed(g, a, b, &SolverConfig::default()) {
                let c = at(root.value);
                if c.distance < best.distance {
                    best = c;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CircleArc, ClothoidCurve};
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_provided_accessors_on_line() {
        let line = LineSegment::new(1.0, 2.0, 0.0, 3.0).unwrap();
        assert_eq!(line.x_begin(), 1.0);
        assert_eq!(line.y_begin(), 2.0);
        assert_relative_eq!(line.x_end(), 4.0, epsilon = 1e-15);
        assert_eq!(line.theta_end(), 0.0);
        assert_eq!(line.kappa_begin(), 0.0);
        assert!(line.as_line().is_some());
        assert!(line.eval(3.5).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_rotated_about_center() {
        let line = LineSegment::new(1.0, 0.0, 0.0, 1.0).unwrap();
        let r = line.rotated(FRAC_PI_2, 1.0, 0.0);
        assert_relative_eq!(r.start(), Point2::new(1.0, 0.0), epsilon = 1e-15);
        assert_relative_eq!(r.end(), Point2::new(1.0, 1.0), epsilon = 1e-15);
        assert_relative_eq!(r.theta_begin(), FRAC_PI_2, epsilon = 1e-15);
    }

    #[test]
    fn test_closest_point_on_arc() {
        // Half circle of radius 2 centered at (0, 2).
        let arc = CircleArc::new(0.0, 0.0, 0.0, 0.5, 2.0 * PI).unwrap();
        let c = arc.closest_point(&Point2::new(5.0, 2.0));
        assert_relative_eq!(c.s, PI, epsilon = 1e-9);
        assert_relative_eq!(c.point, Point2::new(2.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(c.distance, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_closest_point_at_endpoint() {
        let clothoid = ClothoidCurve::new(0.0, 0.0, 0.0, 0.1, 0.05, 4.0).unwrap();
        let c = clothoid.closest_point(&Point2::new(-3.0, -1.0));
        assert_eq!(c.s, 0.0);
        assert_relative_eq!(c.distance, 10f64.sqrt(), epsilon = 1e-12);
    }
}
