//! Straight line segments.

use nalgebra::{Isometry2, Point2, Vector2};
use planar_spatial::BBox;

use crate::kernel::{check_param, clamp_range, cross, direction, normalize_angle};
use crate::{CurveError, PlanarCurve, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A straight segment given by its start, heading and length.
///
/// # Example
///
/// ```
/// use planar_curves::{LineSegment, PlanarCurve};
/// use std::f64::consts::FRAC_PI_4;
///
/// let line = LineSegment::new(1.0, 2.0, FRAC_PI_4, 20.0).unwrap();
/// let end = line.eval(20.0).unwrap();
/// assert!((end.x - (1.0 + 20.0 / 2f64.sqrt())).abs() < 1e-12);
/// assert_eq!(line.curvature_at(7.0).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSegment {
    x0: f64,
    y0: f64,
    theta0: f64,
    length: f64,
}

impl LineSegment {
    /// Creates a segment from its start point, heading and length.
    ///
    /// The heading is normalized to `(-π, π]`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if any value is not finite or the
    /// length is negative.
    pub fn new(x0: f64, y0: f64, theta0: f64, length: f64) -> Result<Self> {
        if !(x0.is_finite() && y0.is_finite() && theta0.is_finite() && length.is_finite()) {
            return Err(CurveError::degenerate("line parameters must be finite"));
        }
        if length < 0.0 {
            return Err(CurveError::degenerate(format!("negative line length {length}")));
        }
        Ok(Self {
            x0,
            y0,
            theta0: normalize_angle(theta0),
            length,
        })
    }

    /// Segment from `(x0, y0)` to `(x1, y1)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] if the two points coincide.
    pub fn build_2p(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        let (dx, dy) = (x1 - x0, y1 - y0);
        let length = dx.hypot(dy);
        if length == 0.0 {
            return Err(CurveError::degenerate("segment end points coincide"));
        }
        Self::new(x0, y0, dy.atan2(dx), length)
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

    /// Heading.
    #[must_use]
    pub const fn theta0(&self) -> f64 {
        self.theta0
    }

    /// Unit direction.
    #[must_use]
    pub fn tangent(&self) -> Vector2<f64> {
        direction(self.theta0)
    }

    /// Segment scaled by `factor` about its start point.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidInput`] unless `factor` is positive and finite.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        check_factor(factor)?;
        Ok(Self {
            length: self.length * factor,
            ..*self
        })
    }

    /// The piece of the segment between `s0` and `s1`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`] if either end is outside the
    /// segment, or [`CurveError::InvalidInput`] if `s1 < s0`.
    pub fn trimmed(&self, s0: f64, s1: f64) -> Result<Self> {
        let (s0, s1) = check_trim(s0, s1, self.length)?;
        let p = self.point(s0);
        Ok(Self {
            x0: p.x,
            y0: p.y,
            length: s1 - s0,
            ..*self
        })
    }

    /// Closed-form intersection with another segment.
    ///
    /// Returns parameter pairs `(s_self, s_other)`. Crossing segments give a
    /// single pair. Collinear overlapping segments give the two ends of the
    /// overlap (one pair if the overlap is a single point).
    #[must_use]
    pub fn intersect_segment(&self, other: &Self, tolerance: f64) -> Vec<(f64, f64)> {
        let u = self.tangent();
        let v = other.tangent();
        let d = Point2::new(other.x0, other.y0) - Point2::new(self.x0, self.y0);
        let den = cross(&u, &v);

        if den.abs() > 1e-12 {
            let t = cross(&d, &v) / den;
            let w = cross(&d, &u) / den;
            let inside = |x: f64, len: f64| x >= -tolerance && x <= len + tolerance;
            if inside(t, self.length) && inside(w, other.length) {
                return vec![(t.clamp(0.0, self.length), w.clamp(0.0, other.length))];
            }
            return Vec::new();
        }

        // Parallel: only collinear overlaps intersect.
        if cross(&d, &u).abs() > tolerance {
            return Vec::new();
        }
        let uv = u.dot(&v).signum();
        let a0 = d.dot(&u);
        let a1 = a0 + other.length * uv;
        let lo = a0.min(a1).max(0.0);
        let hi = a0.max(a1).min(self.length);
        if lo > hi + tolerance {
            return Vec::new();
        }
        let hi = hi.max(lo);
        let pair = |t: f64| (t, ((t - a0) * uv).clamp(0.0, other.length));
        if hi - lo <= tolerance {
            vec![pair(lo)]
        } else {
            vec![pair(lo), pair(hi)]
        }
    }
}

pub(crate) fn check_factor(factor: f64) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(CurveError::invalid_input(format!(
            "scale factor must be positive, got {factor}"
        )))
    }
}

pub(crate) fn check_trim(s0: f64, s1: f64, length: f64) -> Result<(f64, f64)> {
    let s0 = check_param(s0, length)?;
    let s1 = check_param(s1, length)?;
    if s1 < s0 {
        return Err(CurveError::invalid_input(format!(
            "trim range [{s0}, {s1}] is reversed"
        )));
    }
    Ok((s0, s1))
}

impl PlanarCurve for LineSegment {
    fn length(&self) -> f64 {
        self.length
    }

    fn point(&self, s: f64) -> Point2<f64> {
        Point2::new(self.x0, self.y0) + self.tangent() * s
    }

    fn theta(&self, _s: f64) -> f64 {
        self.theta0
    }

    fn kappa(&self, _s: f64) -> f64 {
        0.0
    }

    fn bbox_range(&self, s0: f64, s1: f64) -> BBox {
        let (s0, s1) = clamp_range(s0, s1, self.length);
        BBox::new(self.point(s0), self.point(s1), 0, 0)
    }

    fn reversed(&self) -> Self {
        let end = self.end();
        Self {
            x0: end.x,
            y0: end.y,
            theta0: normalize_angle(self.theta0 + std::f64::consts::PI),
            length: self.length,
        }
    }

    fn transformed(&self, iso: &Isometry2<f64>) -> Self {
        let p = iso * Point2::new(self.x0, self.y0);
        Self {
            x0: p.x,
            y0: p.y,
            theta0: normalize_angle(self.theta0 + iso.rotation.angle()),
            length: self.length,
        }
    }

    fn as_line(&self) -> Option<&LineSegment> {
        Some(self)
    }
}
