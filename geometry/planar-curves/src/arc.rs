//! Circular arcs.
//!
//! Arcs use the same start/heading/length parameterization as the other
//! primitives, with a signed constant curvature (positive turns left). A
//! zero curvature is a straight arc and evaluates exactly like a
//! [`LineSegment`].

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Isometry2, Point2, Vector2};
use planar_spatial::BBox;

use crate::kernel::{arc_point, clamp_range, cross, normalize_angle, sinc};
use crate::line::{check_factor, check_trim};
use crate::{CurveError, LineSegment, PlanarCurve, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A circular arc given by its start, heading, curvature and length.
///
/// # Example
///
/// ```
/// use planar_curves::{CircleArc, PlanarCurve};
/// use std::f64::consts::PI;
///
/// let arc = CircleArc::new(1.0, 2.0, PI, 0.1, 3.0).unwrap();
/// assert_eq!(arc.eval(0.0).unwrap().x, 1.0);
/// assert!((arc.heading_at(3.0).unwrap() - (PI + 0.3)).abs() < 1e-12);
/// assert!((arc.radius().unwrap() - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CircleArc {
    x0: f64,
    y0: f64,
    theta0: f64,
    kappa: f64,
    length: f64,
}

impl CircleArc {
    /// Creates an arc from its start point, heading, curvature and length.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if any value is not finite or the
    /// length is negative.
    pub fn new(x0: f64, y0: f64, theta0: f64, kappa: f64, length: f64) -> Result<Self> {
        if ![x0, y0, theta0, kappa, length].iter().all(|v| v.is_finite()) {
            return Err(CurveError::degenerate("arc parameters must be finite"));
        }
        if length < 0.0 {
            return Err(CurveError::degenerate(format!("negative arc length {length}")));
        }
        Ok(Self {
            x0,
            y0,
            theta0: normalize_angle(theta0),
            kappa,
            length,
        })
    }

    /// Arc leaving `(x0, y0)` with heading `theta0` and passing through `(x1, y1)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if the points coincide or the end
    /// point lies straight behind the start (the arc would be a full circle).
    pub fn build_2p(x0: f64, y0: f64, theta0: f64, x1: f64, y1: f64) -> Result<Self> {
        let (dx, dy) = (x1 - x0, y1 - y0);
        let d = dx.hypot(dy);
        if d == 0.0 {
            return Err(CurveError::degenerate("arc end points coincide"));
        }
        let half_turn = normalize_angle(dy.atan2(dx) - theta0);
        let sc = sinc(half_turn);
        if sc < 1e-12 {
            return Err(CurveError::degenerate("arc end point lies behind the start"));
        }
        Self::new(x0, y0, theta0, 2.0 * half_turn.sin() / d, d / sc)
    }

    /// Arc from `p0` through `p1` to `p2`.
    ///
    /// Collinear points in forward order give a straight arc.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if two points coincide or the points
    /// are collinear but not in forward order.
    pub fn build_3p(p0: &Point2<f64>, p1: &Point2<f64>, p2: &Point2<f64>) -> Result<Self> {
        let a = p1 - p0;
        let b = p2 - p0;
        let (na, nb) = (a.norm_squared(), b.norm_squared());
        if na == 0.0 || nb == 0.0 || (p2 - p1).norm_squared() == 0.0 {
            return Err(CurveError::degenerate("arc points coincide"));
        }
        let cr = cross(&a, &b);
        if cr.abs() <= 1e-12 * (na * nb).sqrt() {
            if a.dot(&(p2 - p1)) > 0.0 {
                let theta0 = b.y.atan2(b.x);
                return Self::new(p0.x, p0.y, theta0, 0.0, nb.sqrt());
            }
            return Err(CurveError::degenerate("collinear arc points are not in order"));
        }

        let den = 2.0 * cr;
        let offset = Vector2::new((b.y * na - a.y * nb) / den, (a.x * nb - b.x * na) / den);
        let center = p0 + offset;
        let radius = offset.norm();
        let turn = cr.signum();
        let r0 = p0 - center;
        let r2 = p2 - center;
        let tangent = Vector2::new(-r0.y, r0.x) * turn;
        let sweep = (turn * (r2.y.atan2(r2.x) - r0.y.atan2(r0.x))).rem_euclid(TAU);
        Self::new(
            p0.x,
            p0.y,
            tangent.y.atan2(tangent.x),
            turn / radius,
            radius * sweep,
        )
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

    /// Signed curvature.
    #[must_use]
    pub const fn curvature(&self) -> f64 {
        self.kappa
    }

    /// Center of the circle, or `None` for a straight arc.
    #[must_use]
    pub fn center(&self) -> Option<Point2<f64>> {
        if self.kappa == 0.0 {
            return None;
        }
        let (s, c) = self.theta0.sin_cos();
        Some(Point2::new(self.x0 - s / self.kappa, self.y0 + c / self.kappa))
    }

    /// Radius of the circle, or `None` for a straight arc.
    #[must_use]
    pub fn radius(&self) -> Option<f64> {
        (self.kappa != 0.0).then(|| 1.0 / self.kappa.abs())
    }

    /// Total signed turning angle.
    #[must_use]
    pub fn turning(&self) -> f64 {
        self.kappa * self.length
    }

    /// Arc scaled by `factor` about its start point.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidInput`] unless `factor` is positive and finite.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        check_factor(factor)?;
        Ok(Self {
            kappa: self.kappa / factor,
            length: self.length * factor,
            ..*self
        })
    }

    /// The piece of the arc between `s0` and `s1`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`] if either end is outside the arc,
    /// or [`CurveError::InvalidInput`] if `s1 < s0`.
    pub fn trimmed(&self, s0: f64, s1: f64) -> Result<Self> {
        let (s0, s1) = check_trim(s0, s1, self.length)?;
        let p = self.point(s0);
        Ok(Self {
            x0: p.x,
            y0: p.y,
            theta0: normalize_angle(self.theta(s0)),
            kappa: self.kappa,
            length: s1 - s0,
        })
    }
}

impl From<LineSegment> for CircleArc {
    fn from(line: LineSegment) -> Self {
        Self {
            x0: line.x0(),
            y0: line.y0(),
            theta0: line.theta0(),
            kappa: 0.0,
            length: line.length(),
        }
    }
}

impl PlanarCurve for CircleArc {
    fn length(&self) -> f64 {
        self.length
    }

    fn point(&self, s: f64) -> Point2<f64> {
        arc_point(self.x0, self.y0, self.theta0, self.kappa, s)
    }

    fn theta(&self, s: f64) -> f64 {
        self.theta0 + self.kappa * s
    }

    fn kappa(&self, _s: f64) -> f64 {
        self.kappa
    }

    fn bbox_range(&self, s0: f64, s1: f64) -> BBox {
        let (s0, s1) = clamp_range(s0, s1, self.length);
        let mut bbox = BBox::new(self.point(s0), self.point(s1), 0, 0);
        if self.kappa == 0.0 {
            return bbox;
        }
        if self.kappa.abs() * (s1 - s0) >= TAU {
            if let Some(c) = self.center() {
                let r = 1.0 / self.kappa.abs();
                return BBox::new(c - Vector2::new(r, r), c + Vector2::new(r, r), 0, 0);
            }
        }

        // Axis extremes sit where the heading is a multiple of π/2.
        let ta = self.theta(s0);
        let tb = self.theta(s1);
        let first = (ta.min(tb) / FRAC_PI_2).ceil() as i64;
        let last = (ta.max(tb) / FRAC_PI_2).floor() as i64;
        for k in first..=last {
            let s = s0 + (k as f64 * FRAC_PI_2 - ta) / self.kappa;
            bbox.extend(&self.point(s));
        }
        bbox
    }

    fn reversed(&self) -> Self {
        let end = self.end();
        Self {
            x0: end.x,
            y0: end.y,
            theta0: normalize_angle(self.theta_end() + PI),
            kappa: -self.kappa,
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
