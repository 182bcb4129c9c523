//! Composite curves built from primitives of one kind.
//!
//! A [`CurveList`] keeps its segments together with the cumulative arc
//! length at the start of every segment, so evaluation at a global `s` is a
//! binary search followed by a local evaluation. The list is its own
//! builder: every append checks continuity against the current end and
//! leaves the list untouched when it fails.
//!
//! # Example
//!
//! ```
//! use planar_curves::{BiarcList, PlanarCurve};
//! use std::f64::consts::FRAC_PI_2;
//!
//! let mut list = BiarcList::new();
//! list.push_back_g1_from(0.0, 0.0, FRAC_PI_2, 1.0, 1.0, FRAC_PI_2).unwrap();
//! list.push_back_g1(2.0, 2.0, FRAC_PI_2).unwrap();
//! assert_eq!(list.len(), 2);
//! assert!((list.x_end().unwrap() - 2.0).abs() < 1e-12);
//! ```

use nalgebra::{Isometry2, Point2};
use planar_spatial::{AabbTree, BBox};
use tracing::debug;

use crate::intersect::{collides, dedup, intersect_curves};
use crate::kernel::{JOIN_TOLERANCE, angle_diff, check_param};
use crate::traits::ClosestPoint;
use crate::{
    Biarc, ClothoidCurve, CurveError, FitConfig, IntersectConfig, LineSegment, PlanarCurve, Result,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Continuity level between consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Continuity {
    /// G0: positions match.
    G0,
    /// G1: positions and headings match.
    G1,
    /// G2: positions, headings and curvatures match.
    G2,
}

/// A primitive that can be stored in a [`CurveList`].
pub trait ListSegment: PlanarCurve + Clone {
    /// Continuity enforced between consecutive segments.
    const CONTINUITY: Continuity;

    /// Prepares the segment to follow a list that ends at `end` with heading
    /// `theta`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CannotJoin`] if the segment does not continue
    /// the list with the required continuity.
    fn attach(self, end: &Point2<f64>, theta: f64) -> Result<Self> {
        check_join(&self, end, theta, Self::CONTINUITY)?;
        Ok(self)
    }
}

/// A primitive with a two-point G1 Hermite fit.
pub trait FitG1: Sized {
    /// Fits a segment from `(x0, y0, θ0)` to `(x1, y1, θ1)`.
    ///
    /// # Errors
    ///
    /// Propagates the fit's failure.
    #[allow(clippy::too_many_arguments)]
    fn fit_g1(
        x0: f64,
        y0: f64,
        theta0: f64,
        x1: f64,
        y1: f64,
        theta1: f64,
        config: &FitConfig,
    ) -> Result<Self>;
}

impl ListSegment for LineSegment {
    const CONTINUITY: Continuity = Continuity::G0;
}

impl ListSegment for Biarc {
    const CONTINUITY: Continuity = Continuity::G1;
}

impl ListSegment for ClothoidCurve {
    const CONTINUITY: Continuity = Continuity::G1;
}

impl FitG1 for Biarc {
    fn fit_g1(
        x0: f64,
        y0: f64,
        theta0: f64,
        x1: f64,
        y1: f64,
        theta1: f64,
        _config: &FitConfig,
    ) -> Result<Self> {
        Self::build_g1(x0, y0, theta0, x1, y1, theta1)
    }
}

impl FitG1 for ClothoidCurve {
    fn fit_g1(
        x0: f64,
        y0: f64,
        theta0: f64,
        x1: f64,
        y1: f64,
        theta1: f64,
        config: &FitConfig,
    ) -> Result<Self> {
        Self::build_g1_with_result(x0, y0, theta0, x1, y1, theta1, config).map(|(c, _)| c)
    }
}

fn check_join<C: PlanarCurve>(
    segment: &C,
    end: &Point2<f64>,
    theta: f64,
    continuity: Continuity,
) -> Result<()> {
    let gap = (segment.start() - end).norm();
    if gap > JOIN_TOLERANCE * (1.0 + end.coords.norm()) {
        return Err(CurveError::CannotJoin { gap });
    }
    if continuity >= Continuity::G1 {
        let turn = angle_diff(segment.theta_begin(), theta).abs();
        if turn > JOIN_TOLERANCE {
            return Err(CurveError::CannotJoin { gap: turn });
        }
    }
    Ok(())
}

/// An ordered sequence of primitives with a cumulative arc-length index.
///
/// Serialized as the plain segment sequence; deserialization rebuilds the
/// index and re-checks continuity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "Vec<C>",
        into = "Vec<C>",
        bound(
            serialize = "C: Serialize + Clone",
            deserialize = "C: Deserialize<'de> + ListSegment"
        )
    )
)]
pub struct CurveList<C> {
    segments: Vec<C>,
    /// Arc length at the start of each segment, plus the total.
    s0: Vec<f64>,
}

/// Piecewise linear curve.
pub type PolyLine = CurveList<LineSegment>;

/// G1 sequence of biarcs.
pub type BiarcList = CurveList<Biarc>;

/// G1 sequence of clothoids.
pub type ClothoidList = CurveList<ClothoidCurve>;

impl<C: ListSegment> Default for CurveList<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ListSegment> TryFrom<Vec<C>> for CurveList<C> {
    type Error = CurveError;

    fn try_from(segments: Vec<C>) -> Result<Self> {
        let mut s0 = Vec::with_capacity(segments.len() + 1);
        s0.push(0.0);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                let prev = &segments[i - 1];
                check_join(segment, &prev.end(), prev.theta_end(), C::CONTINUITY)?;
            }
            s0.push(s0[i] + segment.length());
        }
        Ok(Self { segments, s0 })
    }
}

impl<C> From<CurveList<C>> for Vec<C> {
    fn from(list: CurveList<C>) -> Self {
        list.segments
    }
}

impl<C: ListSegment> CurveList<C> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            s0: vec![0.0],
        }
    }

    /// Creates a list holding a single segment.
    #[must_use]
    pub fn from_segment(segment: C) -> Self {
        let length = segment.length();
        Self {
            segments: vec![segment],
            s0: vec![0.0, length],
        }
    }

    /// Continuity enforced between segments.
    #[must_use]
    pub const fn continuity(&self) -> Continuity {
        C::CONTINUITY
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the list has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment `i`, if present.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&C> {
        self.segments.get(i)
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[C] {
        &self.segments
    }

    /// Total arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.s0.last().copied().unwrap_or(0.0)
    }

    /// Arc length where segment `i` starts.
    #[must_use]
    pub fn segment_start(&self, i: usize) -> Option<f64> {
        (i < self.segments.len()).then(|| self.s0[i])
    }

    fn first(&self) -> Result<&C> {
        self.segments
            .first()
            .ok_or_else(|| CurveError::invalid_list_state("list is empty"))
    }

    fn last(&self) -> Result<&C> {
        self.segments
            .last()
            .ok_or_else(|| CurveError::invalid_list_state("list is empty"))
    }

    fn push_unchecked(&mut self, segment: C) {
        let s = self.length() + segment.length();
        self.segments.push(segment);
        self.s0.push(s);
    }

    /// Appends a segment after checking continuity with the current end.
    ///
    /// The first segment of an empty list is accepted as is.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::CannotJoin`] and leaves the list unchanged.
    /// Segments are stored as given; use [`PolyLine::push_point`] to append
    /// a polyline vertex.
    pub fn push_back(&mut self, segment: C) -> Result<()> {
        let segment = match self.segments.last() {
            Some(last) => segment.attach(&last.end(), last.theta_end())?,
            None => segment,
        };
        self.push_unchecked(segment);
        Ok(())
    }

    /// Locates the segment containing global arc length `s`.
    ///
    /// Returns the segment index and the local arc length inside it.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list and
    /// [`CurveError::OutOfRange`] outside `[0, length]`.
    pub fn find_segment(&self, s: f64) -> Result<(usize, f64)> {
        if self.segments.is_empty() {
            return Err(CurveError::invalid_list_state("cannot evaluate an empty list"));
        }
        let s = check_param(s, self.length())?;
        let i = (self.s0.partition_point(|&x| x <= s).saturating_sub(1)).min(self.segments.len() - 1);
        let local = (s - self.s0[i]).clamp(0.0, self.segments[i].length());
        Ok((i, local))
    }

    /// Position at global arc length `s`.
    ///
    /// # Errors
    ///
    /// As [`find_segment`](Self::find_segment).
    pub fn eval(&self, s: f64) -> Result<Point2<f64>> {
        let (i, local) = self.find_segment(s)?;
        Ok(self.segments[i].point(local))
    }

    /// Heading at global arc length `s`.
    ///
    /// # Errors
    ///
    /// As [`find_segment`](Self::find_segment).
    pub fn heading_at(&self, s: f64) -> Result<f64> {
        let (i, local) = self.find_segment(s)?;
        Ok(self.segments[i].theta(local))
    }

    /// Curvature at global arc length `s`.
    ///
    /// # Errors
    ///
    /// As [`find_segment`](Self::find_segment).
    pub fn curvature_at(&self, s: f64) -> Result<f64> {
        let (i, local) = self.find_segment(s)?;
        Ok(self.segments[i].kappa(local))
    }

    /// Start point.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list. The same
    /// holds for every begin/end accessor below.
    pub fn start(&self) -> Result<Point2<f64>> {
        Ok(self.first()?.start())
    }

    /// End point.
    #[allow(clippy::missing_errors_doc)]
    pub fn end(&self) -> Result<Point2<f64>> {
        Ok(self.last()?.end())
    }

    /// Start x coordinate.
    #[allow(clippy::missing_errors_doc)]
    pub fn x_begin(&self) -> Result<f64> {
        Ok(self.first()?.x_begin())
    }

    /// Start y coordinate.
    #[allow(clippy::missing_errors_doc)]
    pub fn y_begin(&self) -> Result<f64> {
        Ok(self.first()?.y_begin())
    }

    /// End x coordinate.
    #[allow(clippy::missing_errors_doc)]
    pub fn x_end(&self) -> Result<f64> {
        Ok(self.last()?.x_end())
    }

    /// End y coordinate.
    #[allow(clippy::missing_errors_doc)]
    pub fn y_end(&self) -> Result<f64> {
        Ok(self.last()?.y_end())
    }

    /// Start heading.
    #[allow(clippy::missing_errors_doc)]
    pub fn theta_begin(&self) -> Result<f64> {
        Ok(self.first()?.theta_begin())
    }

    /// End heading.
    #[allow(clippy::missing_errors_doc)]
    pub fn theta_end(&self) -> Result<f64> {
        Ok(self.last()?.theta_end())
    }

    /// Start curvature.
    #[allow(clippy::missing_errors_doc)]
    pub fn kappa_begin(&self) -> Result<f64> {
        Ok(self.first()?.kappa_begin())
    }

    /// End curvature.
    #[allow(clippy::missing_errors_doc)]
    pub fn kappa_end(&self) -> Result<f64> {
        Ok(self.last()?.kappa_end())
    }

    /// Segment bounding boxes tagged with `id` and the segment index.
    #[must_use]
    pub fn segment_boxes(&self, id: usize) -> Vec<BBox> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, c)| c.bounding_box().with_tag(id, i))
            .collect()
    }

    /// Bounding box of the whole list.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list.
    pub fn bounding_box(&self) -> Result<BBox> {
        BBox::join_all(self.segment_boxes(0).iter())
            .ok_or_else(|| CurveError::invalid_list_state("empty list has no bounding box"))
    }

    /// The list traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut out = Self::new();
        for c in self.segments.iter().rev() {
            out.push_unchecked(c.reversed());
        }
        out
    }

    /// The list moved by a rigid transform.
    #[must_use]
    pub fn transformed(&self, iso: &Isometry2<f64>) -> Self {
        Self {
            segments: self.segments.iter().map(|c| c.transformed(iso)).collect(),
            s0: self.s0.clone(),
        }
    }

    /// Intersections with another list as `(s_self, s_other)` pairs in global
    /// arc length, sorted by `s_self`.
    ///
    /// Candidate segment pairs come from AABB trees over the segment boxes.
    #[must_use]
    pub fn intersect<D: ListSegment>(
        &self,
        other: &CurveList<D>,
        config: &IntersectConfig,
    ) -> Vec<(f64, f64)> {
        let ta = AabbTree::build(self.segment_boxes(0));
        let tb = AabbTree::build(other.segment_boxes(1));
        let pairs = ta.intersect(&tb);
        debug!(pairs = pairs.len(), "list intersection candidate pairs");
        let mut hits = Vec::new();
        for (ba, bb) in pairs {
            let (i, j) = (ba.ipos(), bb.ipos());
            let (oa, ob) = (self.s0[i], other.s0[j]);
            hits.extend(
                intersect_curves(&self.segments[i], &other.segments[j], config)
                    .into_iter()
                    .map(|(sa, sb)| (oa + sa, ob + sb)),
            );
        }
        dedup(hits, config.dedup_tolerance)
    }

    /// Intersections with a single curve as `(s_self, s_curve)` pairs.
    #[must_use]
    pub fn intersect_curve<T: PlanarCurve + ?Sized>(
        &self,
        curve: &T,
        config: &IntersectConfig,
    ) -> Vec<(f64, f64)> {
        let target = curve.bounding_box().inflated(config.tolerance);
        let mut hits = Vec::new();
        for (i, c) in self.segments.iter().enumerate() {
            if !c.bounding_box().overlaps(&target) {
                continue;
            }
            let offset = self.s0[i];
            hits.extend(
                intersect_curves(c, curve, config)
                    .into_iter()
                    .map(|(sa, sb)| (offset + sa, sb)),
            );
        }
        dedup(hits, config.dedup_tolerance)
    }

    /// Whether the two lists touch or cross.
    #[must_use]
    pub fn collides<D: ListSegment>(&self, other: &CurveList<D>, config: &IntersectConfig) -> bool {
        let ta = AabbTree::build(self.segment_boxes(0));
        let tb = AabbTree::build(other.segment_boxes(1));
        ta.intersect(&tb).into_iter().any(|(ba, bb)| {
            collides(
                &self.segments[ba.ipos()],
                &other.segments[bb.ipos()],
                config,
            )
        })
    }

    /// Closest point of the list to `p`, with `s` in global arc length.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list.
    pub fn closest_point(&self, p: &Point2<f64>) -> Result<ClosestPoint> {
        if self.segments.is_empty() {
            return Err(CurveError::invalid_list_state("empty list has no closest point"));
        }
        let tree = AabbTree::build(self.segment_boxes(0));
        let mut best: Option<ClosestPoint> = None;
        for bbox in tree.min_distance_candidates(p)? {
            let i = bbox.ipos();
            let mut c = self.segments[i].closest_point(p);
            c.s += self.s0[i];
            if best.is_none_or(|b| c.distance < b.distance) {
                best = Some(c);
            }
        }
        best.ok_or_else(|| CurveError::invalid_list_state("no candidate segment"))
    }
}

impl<C: ListSegment + FitG1> CurveList<C> {
    /// Appends a G1 fit from the current end to `(x, y, θ)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list, or the
    /// fit's error. The list is unchanged on failure.
    pub fn push_back_g1(&mut self, x: f64, y: f64, theta: f64) -> Result<()> {
        self.push_back_g1_with(x, y, theta, &FitConfig::default())
    }

    /// [`push_back_g1`](Self::push_back_g1) with explicit fit settings.
    ///
    /// # Errors
    ///
    /// As [`push_back_g1`](Self::push_back_g1).
    pub fn push_back_g1_with(&mut self, x: f64, y: f64, theta: f64, config: &FitConfig) -> Result<()> {
        let last = self.segments.last().ok_or_else(|| {
            CurveError::invalid_list_state("push_back_g1 needs a current end; list is empty")
        })?;
        let end = last.end();
        let segment = C::fit_g1(end.x, end.y, last.theta_end(), x, y, theta, config)?;
        self.push_unchecked(segment);
        Ok(())
    }

    /// Appends a G1 fit between two explicit states.
    ///
    /// On a non-empty list the start state must match the current end.
    ///
    /// # Errors
    ///
    /// Returns the fit's error or [`CurveError::CannotJoin`]; the list is
    /// unchanged on failure.
    pub fn push_back_g1_from(
        &mut self,
        x0: f64,
        y0: f64,
        theta0: f64,
        x1: f64,
        y1: f64,
        theta1: f64,
    ) -> Result<()> {
        let segment = C::fit_g1(x0, y0, theta0, x1, y1, theta1, &FitConfig::default())?;
        self.push_back(segment)
    }
}

impl PolyLine {
    /// Polyline through the points `(xs[i], ys[i])`.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidInput`] if the slices differ in length.
    /// - [`CurveError::InsufficientPoints`] for fewer than two points.
    /// - [`CurveError::Degenerate`] if two consecutive points coincide.
    pub fn from_points(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(CurveError::invalid_input(format!(
                "{} x values but {} y values",
                xs.len(),
                ys.len()
            )));
        }
        let vertices: Vec<_> = xs.iter().zip(ys).map(|(&x, &y)| Point2::new(x, y)).collect();
        Self::from_vertices(&vertices)
    }

    /// Polyline through `vertices`.
    ///
    /// # Errors
    ///
    /// As [`from_points`](Self::from_points).
    pub fn from_vertices(vertices: &[Point2<f64>]) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(CurveError::insufficient_points(2, vertices.len()));
        }
        let mut list = Self::new();
        for w in vertices.windows(2) {
            list.push_unchecked(LineSegment::build_2p(w[0].x, w[0].y, w[1].x, w[1].y)?);
        }
        Ok(list)
    }

    /// Appends a segment from the current end to `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list and
    /// [`CurveError::Degenerate`] if `(x, y)` is the current end.
    pub fn push_point(&mut self, x: f64, y: f64) -> Result<()> {
        let end = self.end()?;
        let segment = LineSegment::build_2p(end.x, end.y, x, y)?;
        self.push_unchecked(segment);
        Ok(())
    }

    /// The polyline's vertices, first to last.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point2<f64>> {
        let mut out: Vec<_> = self.segments.iter().map(PlanarCurve::start).collect();
        out.extend(self.segments.last().map(PlanarCurve::end));
        out
    }

    /// Polyline approximating `curve` within a chord deviation of `tolerance`.
    ///
    /// The sampling step keeps the sagitta of every chord below
    /// `tolerance` at the curve's largest curvature.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidInput`] for a non-positive tolerance and
    /// [`CurveError::Degenerate`] for a zero-length curve.
    pub fn approximate<T: PlanarCurve + ?Sized>(curve: &T, tolerance: f64) -> Result<Self> {
        Self::from_vertices(&sample_vertices(curve, tolerance)?)
    }

    /// Polyline approximating every segment of `list` within `tolerance`.
    ///
    /// Zero-length segments contribute no vertices.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidListState`] for an empty list and
    /// [`CurveError::InvalidInput`] for a non-positive tolerance.
    pub fn approximate_list<C: ListSegment>(list: &CurveList<C>, tolerance: f64) -> Result<Self> {
        let first = list.first()?;
        let mut vertices = vec![first.start()];
        for segment in list.segments.iter().filter(|c| c.length() > 0.0) {
            vertices.extend(sample_vertices(segment, tolerance)?.into_iter().skip(1));
        }
        let out = Self::from_vertices(&vertices)?;
        debug!(segments = list.len(), vertices = vertices.len(), "approximated curve list");
        Ok(out)
    }

    /// Appends a sampled approximation of `curve`, which must start at the
    /// current end. An empty list takes the approximation as is.
    ///
    /// # Errors
    ///
    /// As [`approximate`](Self::approximate), plus
    /// [`CurveError::CannotJoin`] if `curve` does not start at the current
    /// end. The list is unchanged on failure.
    pub fn push_back_approx<T: PlanarCurve + ?Sized>(&mut self, curve: &T, tolerance: f64) -> Result<()> {
        let approx = Self::approximate(curve, tolerance)?;
        self.append_polyline(approx)
    }

    /// Appends a sampled approximation of every segment of `list`.
    ///
    /// # Errors
    ///
    /// As [`approximate_list`](Self::approximate_list) and
    /// [`push_back_approx`](Self::push_back_approx).
    pub fn push_back_approx_list<C: ListSegment>(
        &mut self,
        list: &CurveList<C>,
        tolerance: f64,
    ) -> Result<()> {
        let approx = Self::approximate_list(list, tolerance)?;
        self.append_polyline(approx)
    }

    fn append_polyline(&mut self, other: Self) -> Result<()> {
        if self.segments.is_empty() {
            *self = other;
            return Ok(());
        }
        let end = self.end()?;
        check_join(other.first()?, &end, self.theta_end()?, Continuity::G0)?;

        // Snap the first vertex onto the current end so the join is exact.
        let mut vertices = other.vertices();
        vertices[0] = end;
        let mut segments = Vec::with_capacity(other.len());
        for w in vertices.windows(2) {
            segments.push(LineSegment::build_2p(w[0].x, w[0].y, w[1].x, w[1].y)?);
        }
        for segment in segments {
            self.push_unchecked(segment);
        }
        Ok(())
    }
}

/// Samples `curve` so that every chord stays within `tolerance` of it.
///
/// The step keeps the sagitta of each chord below `tolerance` at the
/// curve's largest curvature.
fn sample_vertices<T: PlanarCurve + ?Sized>(curve: &T, tolerance: f64) -> Result<Vec<Point2<f64>>> {
    if !(tolerance > 0.0 && tolerance.is_finite()) {
        return Err(CurveError::invalid_input(format!(
            "approximation tolerance must be positive, got {tolerance}"
        )));
    }
    let length = curve.length();
    if length == 0.0 {
        return Err(CurveError::degenerate("cannot approximate a zero-length curve"));
    }
    let kappa = curve.max_abs_curvature();
    let steps = if kappa * tolerance >= 1.0 || kappa == 0.0 {
        1
    } else {
        let turn = 2.0 * (1.0 - kappa * tolerance).acos();
        let n = (length * kappa / turn).ceil();
        (n as usize).clamp(1, 1 << 20)
    };
    let h = length / steps as f64;
    Ok((0..=steps).map(|i| curve.point(h * i as f64)).collect())
}

impl BiarcList {
    /// The same geometry as a clothoid list (two arcs per biarc).
    #[must_use]
    pub fn to_clothoid_list(&self) -> ClothoidList {
        let mut out = ClothoidList::new();
        for b in &self.segments {
            for c in b.to_clothoids() {
                out.push_unchecked(c);
            }
        }
        out
    }
}

impl ClothoidList {
    /// Appends a line or arc converted to a clothoid.
    ///
    /// # Errors
    ///
    /// As [`push_back`](CurveList::push_back).
    pub fn push_back_converted<T: Into<ClothoidCurve>>(&mut self, segment: T) -> Result<()> {
        self.push_back(segment.into())
    }

    /// Appends both arcs of a biarc, or neither.
    ///
    /// # Errors
    ///
    /// As [`push_back`](CurveList::push_back).
    pub fn push_back_biarc(&mut self, biarc: &Biarc) -> Result<()> {
        let [c0, c1] = biarc.to_clothoids();
        let c0 = match self.segments.last() {
            Some(last) => c0.attach(&last.end(), last.theta_end())?,
            None => c0,
        };
        let c1 = c1.attach(&c0.end(), c0.theta_end())?;
        self.push_unchecked(c0);
        self.push_unchecked(c1);
        Ok(())
    }

    /// Curvature jump at each junction.
    #[must_use]
    pub fn curvature_jumps(&self) -> Vec<f64> {
        self.segments
            .windows(2)
            .map(|w| (w[0].kappa_end() - w[1].kappa_begin()).abs())
            .collect()
    }

    /// Whether every curvature jump is within `tolerance`.
    #[must_use]
    pub fn is_g2(&self, tolerance: f64) -> bool {
        self.curvature_jumps().iter().all(|&j| j <= tolerance)
    }

    /// Highest continuity level met at every junction.
    #[must_use]
    pub fn measured_continuity(&self, tolerance: f64) -> Continuity {
        if self.is_g2(tolerance) {
            Continuity::G2
        } else {
            Continuity::G1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CircleArc;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn line_0_to_6() -> PolyLine {
        PolyLine::from_points(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[0.0; 7]).unwrap()
    }

    #[test]
    fn test_polyline_eval_integers() {
        let poly = line_0_to_6();
        assert_eq!(poly.len(), 6);
        assert_eq!(poly.length(), 6.0);
        for i in 0..=6 {
            let s = f64::from(i);
            assert_eq!(poly.eval(s).unwrap(), Point2::new(s, 0.0));
        }
        assert!(poly.eval(6.5).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_find_segment() {
        let poly = line_0_to_6();
        assert_eq!(poly.find_segment(0.0).unwrap(), (0, 0.0));
        assert_eq!(poly.find_segment(2.5).unwrap(), (2, 0.5));
        assert_eq!(poly.find_segment(3.0).unwrap(), (3, 0.0));
        assert_eq!(poly.find_segment(6.0).unwrap(), (5, 1.0));
        assert_eq!(poly.segment_start(4), Some(4.0));
        assert_eq!(poly.segment_start(6), None);
    }

    #[test]
    fn test_empty_list_errors() {
        let mut list = BiarcList::new();
        assert!(list.is_empty());
        assert_eq!(list.length(), 0.0);
        assert!(list.eval(0.0).unwrap_err().is_invalid_list_state());
        assert!(list.x_end().unwrap_err().is_invalid_list_state());
        assert!(list.push_back_g1(1.0, 1.0, 0.0).unwrap_err().is_invalid_list_state());
        assert!(list.bounding_box().is_err());
        assert!(list.closest_point(&Point2::origin()).is_err());
        assert!(list.is_empty());

        let mut poly = PolyLine::new();
        assert!(poly.push_point(1.0, 1.0).unwrap_err().is_invalid_list_state());
    }

    #[test]
    fn test_polyline_input_errors() {
        assert!(PolyLine::from_points(&[0.0, 1.0], &[0.0]).unwrap_err().is_invalid_input());
        assert!(PolyLine::from_points(&[0.0], &[0.0]).unwrap_err().is_invalid_input());
        assert!(PolyLine::from_points(&[0.0, 0.0], &[1.0, 1.0]).unwrap_err().is_degenerate());
    }

    #[test]
    fn test_polyline_push_and_vertices() {
        let mut poly = PolyLine::from_points(&[0.0, 1.0], &[0.0, 0.0]).unwrap();
        poly.push_point(1.0, 1.0).unwrap();
        let segment = LineSegment::build_2p(1.0, 1.0, 0.0, 1.0).unwrap();
        poly.push_back(segment).unwrap();
        assert_eq!(poly.get(2), Some(&segment));
        let v = poly.vertices();
        assert_eq!(v.len(), 4);
        assert_relative_eq!(v[3], Point2::new(0.0, 1.0), epsilon = 1e-15);
        assert_relative_eq!(poly.length(), 3.0, epsilon = 1e-15);
        assert!(poly.push_point(0.0, 1.0).is_err());
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn test_polyline_push_back_keeps_segment_or_rejects() {
        let mut poly = PolyLine::from_points(&[0.0, 1.0], &[0.0, 0.0]).unwrap();
        let detached = LineSegment::build_2p(10.0, 10.0, 12.0, 10.0).unwrap();
        assert!(poly.push_back(detached).unwrap_err().is_cannot_join());
        assert_eq!(poly.len(), 1);
        assert_relative_eq!(poly.length(), 1.0);

        // Appends and deserialization agree on what is a valid join.
        let a = *poly.get(0).unwrap();
        assert!(PolyLine::try_from(vec![a, detached]).unwrap_err().is_cannot_join());

        // Only G0 is required: a corner is fine and the segment is kept as is.
        let corner = LineSegment::new(1.0, 0.0, 2.0, 2.0).unwrap();
        poly.push_back(corner).unwrap();
        assert_eq!(poly.get(1), Some(&corner));
        assert_relative_eq!(poly.length(), 3.0);
        assert_relative_eq!(poly.theta_end().unwrap(), 2.0);
    }

    #[test]
    fn test_biarc_list_push_back_g1() {
        let mut list = BiarcList::new();
        list.push_back_g1_from(0.0, 0.0, FRAC_PI_2, 1.0, 1.0, FRAC_PI_2).unwrap();
        list.push_back_g1_from(1.0, 1.0, FRAC_PI_2, 2.0, 2.0, FRAC_PI_2).unwrap();
        list.push_back_g1(3.0, 3.0, FRAC_PI_2).unwrap();
        assert_eq!(list.len(), 3);
        assert_relative_eq!(list.x_end().unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(list.y_end().unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(
            angle_diff(list.theta_end().unwrap(), FRAC_PI_2),
            0.0,
            epsilon = 1e-12
        );
        let total: f64 = list.segments().iter().map(PlanarCurve::length).sum();
        assert_relative_eq!(list.length(), total, epsilon = 1e-12);

        // Start does not match the current end.
        let err = list.push_back_g1_from(5.0, 5.0, 0.0, 6.0, 6.0, 0.0).unwrap_err();
        assert!(err.is_cannot_join());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_push_back_rejects_heading_jump() {
        let mut list = ClothoidList::new();
        list.push_back_converted(LineSegment::new(0.0, 0.0, 0.0, 1.0).unwrap()).unwrap();
        let kinked = ClothoidCurve::new(1.0, 0.0, 0.5, 0.0, 0.0, 1.0).unwrap();
        assert!(list.push_back(kinked).unwrap_err().is_cannot_join());
        list.push_back_converted(CircleArc::new(1.0, 0.0, 0.0, 1.0, FRAC_PI_2).unwrap())
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.curvature_jumps(), vec![1.0]);
        assert!(!list.is_g2(1e-9));
        assert_eq!(list.measured_continuity(1e-9), Continuity::G1);
    }

    #[test]
    fn test_push_back_biarc_is_atomic() {
        let mut list = ClothoidList::new();
        let b = Biarc::build_g1(0.0, 0.0, 0.0, 4.0, 2.0, 0.0).unwrap();
        list.push_back_biarc(&b).unwrap();
        assert_eq!(list.len(), 2);
        let far = Biarc::build_g1(10.0, 10.0, 0.0, 12.0, 10.0, 0.0).unwrap();
        assert!(list.push_back_biarc(&far).is_err());
        assert_eq!(list.len(), 2);
        assert_relative_eq!(list.end().unwrap(), Point2::new(4.0, 2.0), epsilon = 1e-10);
    }

    #[test]
    fn test_reversed_and_transformed() {
        let mut list = BiarcList::new();
        list.push_back_g1_from(0.0, 0.0, 0.0, 2.0, 1.0, 0.5).unwrap();
        list.push_back_g1(4.0, 0.0, -0.5).unwrap();
        let r = list.reversed();
        assert_relative_eq!(r.start().unwrap(), list.end().unwrap(), epsilon = 1e-12);
        assert_relative_eq!(r.end().unwrap(), list.start().unwrap(), epsilon = 1e-12);
        assert_relative_eq!(r.length(), list.length(), epsilon = 1e-12);
        assert!(CurveList::try_from(Vec::from(r)).is_ok());

        let iso = Isometry2::rotation(PI);
        let t = list.transformed(&iso);
        assert_relative_eq!(t.end().unwrap(), Point2::new(-4.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_try_from_checks_continuity() {
        let a = LineSegment::new(0.0, 0.0, 0.0, 1.0).unwrap();
        let b = LineSegment::new(1.0, 0.0, FRAC_PI_2, 1.0).unwrap();
        let c = LineSegment::new(3.0, 0.0, 0.0, 1.0).unwrap();
        assert!(PolyLine::try_from(vec![a, b]).is_ok());
        assert!(PolyLine::try_from(vec![a, c]).unwrap_err().is_cannot_join());
    }

    #[test]
    fn test_bounding_box_and_closest_point() {
        let poly = PolyLine::from_points(&[0.0, 2.0, 2.0], &[0.0, 0.0, 3.0]).unwrap();
        let b = poly.bounding_box().unwrap();
        assert_relative_eq!(b.x_min(), 0.0);
        assert_relative_eq!(b.y_min(), 0.0);
        assert_relative_eq!(b.x_max(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(b.y_max(), 3.0, epsilon = 1e-12);

        let c = poly.closest_point(&Point2::new(3.0, 1.0)).unwrap();
        assert_relative_eq!(c.s, 3.0, epsilon = 1e-9);
        assert_relative_eq!(c.distance, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_list_intersections() {
        let zig = PolyLine::from_points(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0, -1.0, 1.0, -1.0, 1.0]).unwrap();
        let axis = PolyLine::from_points(&[-1.0, 5.0], &[0.0, 0.0]).unwrap();
        let hits = zig.intersect(&axis, &IntersectConfig::default());
        assert_eq!(hits.len(), 4);
        for (sa, sb) in &hits {
            assert_relative_eq!(zig.eval(*sa).unwrap(), axis.eval(*sb).unwrap(), epsilon = 1e-9);
        }
        assert!(zig.collides(&axis, &IntersectConfig::default()));

        // A crossing exactly at a shared vertex is reported once.
        let vertical = LineSegment::build_2p(1.0, -2.0, 1.0, 0.0).unwrap();
        let hits = zig.intersect_curve(&vertical, &IntersectConfig::default());
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].0, 5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_approximate_arc() {
        let arc = CircleArc::new(0.0, 0.0, 0.0, 1.0, PI).unwrap();
        let poly = PolyLine::approximate(&arc, 1e-3).unwrap();
        assert!(poly.len() > 10);
        for v in poly.vertices() {
            assert_relative_eq!((v - Point2::new(0.0, 1.0)).norm(), 1.0, epsilon = 1e-12);
        }
        // Chord midpoints stay within the tolerance of the circle.
        for seg in poly.segments() {
            let m = seg.point(0.5 * seg.length());
            assert!(1.0 - (m - Point2::new(0.0, 1.0)).norm() <= 1e-3 + 1e-12);
        }
        let line = LineSegment::new(0.0, 0.0, 0.0, 2.0).unwrap();
        assert_eq!(PolyLine::approximate(&line, 1e-3).unwrap().len(), 1);
        assert!(PolyLine::approximate(&arc, 0.0).is_err());
    }

    #[test]
    fn test_push_back_approx_continues_polyline() {
        let mut poly = PolyLine::from_points(&[-1.0, 0.0], &[0.0, 0.0]).unwrap();
        let arc = CircleArc::new(0.0, 0.0, 0.0, 1.0, PI).unwrap();
        poly.push_back_approx(&arc, 1e-3).unwrap();
        assert!(poly.len() > 10);
        assert_relative_eq!(poly.end().unwrap(), Point2::new(0.0, 2.0), epsilon = 1e-12);
        let center = Point2::new(0.0, 1.0);
        for v in poly.vertices().iter().skip(1) {
            assert_relative_eq!((v - center).norm(), 1.0, epsilon = 1e-12);
        }
        assert!(poly.length() < 1.0 + PI);

        // A curve starting elsewhere is rejected without touching the list.
        let n = poly.len();
        let far = CircleArc::new(5.0, 5.0, 0.0, 1.0, 1.0).unwrap();
        assert!(poly.push_back_approx(&far, 1e-3).unwrap_err().is_cannot_join());
        assert_eq!(poly.len(), n);

        let mut empty = PolyLine::new();
        empty.push_back_approx(&arc, 1e-3).unwrap();
        assert_eq!(empty, PolyLine::approximate(&arc, 1e-3).unwrap());
    }

    #[test]
    fn test_approximate_clothoid_list() {
        let mut list = ClothoidList::new();
        list.push_back_biarc(&Biarc::build_g1(0.0, 0.0, 0.0, 4.0, 2.0, 0.0).unwrap())
            .unwrap();
        let tolerance = 1e-4;
        let poly = PolyLine::approximate_list(&list, tolerance).unwrap();
        assert_eq!(poly.start().unwrap(), list.start().unwrap());
        assert_relative_eq!(poly.end().unwrap(), list.end().unwrap(), epsilon = 1e-12);
        assert!(poly.len() > 2);
        for seg in poly.segments() {
            let m = seg.point(0.5 * seg.length());
            let c = list.closest_point(&m).unwrap();
            assert!(c.distance <= tolerance + 1e-9, "chord deviation {}", c.distance);
        }

        let mut lead = PolyLine::from_points(&[-2.0, 0.0], &[0.0, 0.0]).unwrap();
        lead.push_back_approx_list(&list, tolerance).unwrap();
        assert_eq!(lead.len(), poly.len() + 1);
        assert_relative_eq!(lead.length(), 2.0 + poly.length(), epsilon = 1e-12);

        assert!(
            PolyLine::approximate_list(&ClothoidList::new(), tolerance)
                .unwrap_err()
                .is_invalid_list_state()
        );
    }
}
