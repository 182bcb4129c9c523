//! Sum type over the primitives for mixed-type code.

use nalgebra::{Isometry2, Point2};
use planar_spatial::BBox;

use crate::intersect::{collides, intersect_curves};
use crate::{Biarc, CircleArc, ClothoidCurve, IntersectConfig, LineSegment, PlanarCurve};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Any planar primitive.
///
/// Useful where curves of different kinds meet, for example when
/// intersecting a line with a clothoid or storing heterogeneous curves.
///
/// # Example
///
/// ```
/// use planar_curves::{CircleArc, Curve, IntersectConfig, LineSegment, PlanarCurve};
///
/// let line: Curve = LineSegment::build_2p(-2.0, 1.0, 2.0, 1.0).unwrap().into();
/// let arc: Curve = CircleArc::new(0.0, 0.0, 0.0, 0.5, 6.0).unwrap().into();
/// let hits = line.intersect(&arc, &IntersectConfig::default());
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Curve {
    /// Straight segment.
    Line(LineSegment),
    /// Circular arc.
    Arc(CircleArc),
    /// Pair of tangent arcs.
    Biarc(Biarc),
    /// Clothoid segment.
    Clothoid(ClothoidCurve),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            Curve::Line($c) => $body,
            Curve::Arc($c) => $body,
            Curve::Biarc($c) => $body,
            Curve::Clothoid($c) => $body,
        }
    };
}

impl Curve {
    /// Intersections with another curve as `(s_self, s_other)` pairs.
    #[must_use]
    pub fn intersect<C: PlanarCurve + ?Sized>(
        &self,
        other: &C,
        config: &IntersectConfig,
    ) -> Vec<(f64, f64)> {
        intersect_curves(self, other, config)
    }

    /// Whether the two curves touch or cross.
    #[must_use]
    pub fn collides<C: PlanarCurve + ?Sized>(&self, other: &C, config: &IntersectConfig) -> bool {
        collides(self, other, config)
    }

    /// Short name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Arc(_) => "arc",
            Self::Biarc(_) => "biarc",
            Self::Clothoid(_) => "clothoid",
        }
    }
}

impl PlanarCurve for Curve {
    fn length(&self) -> f64 {
        dispatch!(self, c => c.length())
    }

    fn point(&self, s: f64) -> Point2<f64> {
        dispatch!(self, c => c.point(s))
    }

    fn theta(&self, s: f64) -> f64 {
        dispatch!(self, c => c.theta(s))
    }

    fn kappa(&self, s: f64) -> f64 {
        dispatch!(self, c => c.kappa(s))
    }

    fn bbox_range(&self, s0: f64, s1: f64) -> BBox {
        dispatch!(self, c => c.bbox_range(s0, s1))
    }

    fn reversed(&self) -> Self {
        dispatch!(self, c => c.reversed().into())
    }

    fn transformed(&self, iso: &Isometry2<f64>) -> Self {
        dispatch!(self, c => c.transformed(iso).into())
    }

    fn as_line(&self) -> Option<&LineSegment> {
        match self {
            Self::Line(line) => Some(line),
            _ => None,
        }
    }

    fn max_abs_curvature(&self) -> f64 {
        dispatch!(self, c => c.max_abs_curvature())
    }
}

impl From<LineSegment> for Curve {
    fn from(c: LineSegment) -> Self {
        Self::Line(c)
    }
}

impl From<CircleArc> for Curve {
    fn from(c: CircleArc) -> Self {
        Self::Arc(c)
    }
}

impl From<Biarc> for Curve {
    fn from(c: Biarc) -> Self {
        Self::Biarc(c)
    }
}

impl From<ClothoidCurve> for Curve {
    fn from(c: ClothoidCurve) -> Self {
        Self::Clothoid(c)
    }
}
