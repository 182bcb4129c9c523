//! Biarcs: two tangent-continuous circular arcs.

use nalgebra::{Isometry2, Point2};
use planar_spatial::BBox;

use crate::kernel::{JOIN_TOLERANCE, angle_diff, clamp_range, normalize_angle, sinc};
use crate::{CircleArc, ClothoidCurve, CurveError, PlanarCurve, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two circular arcs joined with a common tangent.
///
/// The junction is exposed through [`x_middle`](Self::x_middle),
/// [`y_middle`](Self::y_middle) and [`theta_middle`](Self::theta_middle).
///
/// # Example
///
/// ```
/// use planar_curves::{Biarc, PlanarCurve};
/// use std::f64::consts::FRAC_PI_2;
///
/// // S-curve: leave upward, arrive upward 10 units to the right.
/// let b = Biarc::build_g1(0.0, 0.0, FRAC_PI_2, 10.0, 0.0, FRAC_PI_2).unwrap();
/// assert!((b.x_end() - 10.0).abs() < 1e-12);
/// assert!((b.kappa0() + 0.4).abs() < 1e-12);
/// assert!((b.kappa1() - 0.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Biarc {
    arc0: CircleArc,
    arc1: CircleArc,
}

impl Biarc {
    /// G1 biarc from `(x0, y0, θ0)` to `(x1, y1, θ1)`.
    ///
    /// In the frame of the chord, with end headings `α` and `β`, the junction
    /// heading is `-(α + β) / 2` and both arcs have chords of equal length.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Degenerate`] when the points coincide or an arc
    /// would need a full turn, and [`CurveError::InvalidInput`] for
    /// non-finite input.
    pub fn build_g1(x0: f64, y0: f64, theta0: f64, x1: f64, y1: f64, theta1: f64) -> Result<Self> {
        if ![x0, y0, theta0, x1, y1, theta1].iter().all(|v| v.is_finite()) {
            return Err(CurveError::invalid_input("biarc end conditions must be finite"));
        }
        let (dx, dy) = (x1 - x0, y1 - y0);
        let d = dx.hypot(dy);
        if d == 0.0 {
            return Err(CurveError::degenerate("biarc end points coincide"));
        }
        let omega = dy.atan2(dx);
        let alpha = normalize_angle(theta0 - omega);
        let beta = normalize_angle(theta1 - omega);
        let gamma = -0.5 * (alpha + beta);

        let c = (0.25 * (beta - alpha)).cos();
        if c < 1e-8 {
            return Err(CurveError::degenerate("biarc headings are opposite"));
        }
        let chord = 0.5 * d / c;

        let turn0 = gamma - alpha;
        let turn1 = beta - gamma;
        let (sc0, sc1) = (sinc(0.5 * turn0), sinc(0.5 * turn1));
        if sc0 < 1e-8 || sc1 < 1e-8 {
            return Err(CurveError::degenerate("biarc would need a full turn"));
        }
        let (len0, len1) = (chord / sc0, chord / sc1);

        let arc0 = CircleArc::new(x0, y0, theta0, turn0 / len0, len0)?;
        let mid = arc0.end();
        let arc1 = CircleArc::new(mid.x, mid.y, theta0 + turn0, turn1 / len1, len1)?;
        Ok(Self { arc0, arc1 })
    }

    /// Joins two arcs that meet with a common tangent.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CannotJoin`] if `arc1` does not start where
    /// `arc0` ends with the same heading.
    pub fn from_arcs(arc0: CircleArc, arc1: CircleArc) -> Result<Self> {
        let end = arc0.end();
        let gap = (arc1.start() - end).norm();
        if gap > JOIN_TOLERANCE * (1.0 + end.coords.norm()) {
            return Err(CurveError::CannotJoin { gap });
        }
        let turn = angle_diff(arc1.theta_begin(), arc0.theta_end()).abs();
        if turn > JOIN_TOLERANCE {
            return Err(CurveError::CannotJoin { gap: turn });
        }
        Ok(Self { arc0, arc1 })
    }

    /// First arc.
    #[must_use]
    pub const fn arc0(&self) -> &CircleArc {
        &self.arc0
    }

    /// Second arc.
    #[must_use]
    pub const fn arc1(&self) -> &CircleArc {
        &self.arc1
    }

    /// Junction x coordinate.
    #[must_use]
    pub fn x_middle(&self) -> f64 {
        self.arc1.x0()
    }

    /// Junction y coordinate.
    #[must_use]
    pub fn y_middle(&self) -> f64 {
        self.arc1.y0()
    }

    /// Heading at the junction.
    #[must_use]
    pub fn theta_middle(&self) -> f64 {
        self.arc1.theta0()
    }

    /// Curvature of the first arc.
    #[must_use]
    pub fn kappa0(&self) -> f64 {
        self.arc0.curvature()
    }

    /// Curvature of the second arc.
    #[must_use]
    pub fn kappa1(&self) -> f64 {
        self.arc1.curvature()
    }

    /// Length of the first arc.
    #[must_use]
    pub fn length0(&self) -> f64 {
        self.arc0.length()
    }

    /// Length of the second arc.
    #[must_use]
    pub fn length1(&self) -> f64 {
        self.arc1.length()
    }

    /// The two arcs as clothoids with zero curvature rate.
    #[must_use]
    pub fn to_clothoids(&self) -> [ClothoidCurve; 2] {
        [self.arc0.into(), self.arc1.into()]
    }
}

impl PlanarCurve for Biarc {
    fn length(&self) -> f64 {
        self.arc0.length() + self.arc1.length()
    }

    fn point(&self, s: f64) -> Point2<f64> {
        let l0 = self.arc0.length();
        if s < l0 {
            self.arc0.point(s)
        } else {
            self.arc1.point(s - l0)
        }
    }

    fn theta(&self, s: f64) -> f64 {
        let l0 = self.arc0.length();
        if s < l0 {
            self.arc0.theta(s)
        } else {
            // Continue from the first arc so the heading stays unwrapped.
            self.arc0.theta(l0) + self.arc1.curvature() * (s - l0)
        }
    }

    fn kappa(&self, s: f64) -> f64 {
        if s < self.arc0.length() {
            self.arc0.curvature()
        } else {
            self.arc1.curvature()
        }
    }

    fn bbox_range(&self, s0: f64, s1: f64) -> BBox {
        let (s0, s1) = clamp_range(s0, s1, self.length());
        let l0 = self.arc0.length();
        let first = (s0 < l0).then(|| self.arc0.bbox_range(s0, s1.min(l0)));
        let second = (s1 > l0).then(|| self.arc1.bbox_range((s0 - l0).max(0.0), s1 - l0));
        match (first, second) {
            (Some(a), Some(b)) => a.join(&b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => BBox::from_point(self.point(s0), 0, 0),
        }
    }

    fn reversed(&self) -> Self {
        Self {
            arc0: self.arc1.reversed(),
            arc1: self.arc0.reversed(),
        }
    }

    fn transformed(&self, iso: &Isometry2<f64>) -> Self {
        Self {
            arc0: self.arc0.transformed(iso),
            arc1: self.arc1.transformed(iso),
        }
    }
}
