//! Multi-point G2 interpolation with clothoid splines.
//!
//! Every pair of consecutive points is joined by a G1 clothoid fit, so the
//! only free parameters are the headings at the nodes. Those headings start
//! at the bisector of the adjacent chord directions and are refined by a
//! damped Newton iteration that drives the curvature jump at every junction
//! to zero. The Jacobian is tridiagonal in structure (cyclic for closed
//! splines) and is assembled from central differences of the per-segment
//! fits.

use nalgebra::{DMatrix, DVector, Point2};
use tracing::{debug, info, warn};

use crate::g1::fit_clothoid;
use crate::kernel::angle_diff;
use crate::{
    ClothoidCurve, ClothoidList, CurveError, FitConfig, FitResult, FitStatus,
    InterpolationConfig, Result,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Halvings tried before a Newton step is rejected.
const LINE_SEARCH_STEPS: usize = 8;

/// Smallest accepted ratio of squared shortest to squared longest chord.
const MIN_CHORD_RATIO: f64 = 1e-10;

/// How the headings at the two ends are fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndCondition {
    /// Closed spline: first and last heading agree and the curvature is
    /// continuous across the wrap.
    Cyclic,
    /// Headings prescribed at both ends.
    Clamped {
        /// Heading at the first point.
        theta_begin: f64,
        /// Heading at the last point.
        theta_end: f64,
    },
}

/// Interpolating spline together with the refinement outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineFit {
    /// How the curvature matching ended. The residual is the largest
    /// curvature jump.
    pub result: FitResult,
    /// G1 spline through the points. G2 only when `result.ok()`.
    pub list: ClothoidList,
}

impl SplineFit {
    /// Whether curvature matching converged.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.result.ok()
    }

    /// The spline, if curvature matching converged.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::FitConvergence`] carrying the iteration
    /// statistics otherwise.
    pub fn into_list(self) -> Result<ClothoidList> {
        if self.result.ok() {
            return Ok(self.list);
        }
        let reason = self
            .result
            .message
            .unwrap_or_else(|| format!("{:?}", self.result.status));
        Err(CurveError::fit_convergence(
            self.result.iterations,
            self.result.residual,
            reason,
        ))
    }
}

/// Builds G2 clothoid splines through point sequences.
///
/// # Example
///
/// ```
/// use planar_curves::{ClothoidSplineBuilder, InterpolationConfig};
///
/// let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
/// let ys = [1.0, -1.0, 1.0, -1.0, 1.0];
/// let fit = ClothoidSplineBuilder::new(InterpolationConfig::default())
///     .build_p2(&xs, &ys)
///     .unwrap();
/// assert!(fit.ok());
/// assert_eq!(fit.list.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClothoidSplineBuilder {
    config: InterpolationConfig,
}

impl ClothoidSplineBuilder {
    /// Builder with the given settings.
    #[must_use]
    pub const fn new(config: InterpolationConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Closed spline: the heading and curvature at the last point match the
    /// first.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_p2(&self, xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        self.build(xs, ys, EndCondition::Cyclic)
    }

    /// Spline with prescribed end headings.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_p1(
        &self,
        xs: &[f64],
        ys: &[f64],
        theta_begin: f64,
        theta_end: f64,
    ) -> Result<SplineFit> {
        self.build(xs, ys, EndCondition::Clamped { theta_begin, theta_end })
    }

    /// Interpolates `(xs[i], ys[i])` under the given end condition.
    ///
    /// A refinement that stops early is reported through
    /// [`SplineFit::result`]; the returned list is still G1.
    ///
    /// # Errors
    ///
    /// - [`CurveError::InvalidInput`] for mismatched lengths, non-finite
    ///   values, repeated points or badly scaled chords.
    /// - [`CurveError::InsufficientPoints`] for fewer than two points.
    /// - Any segment fit error from the initial guess or the final assembly.
    pub fn build(&self, xs: &[f64], ys: &[f64], end: EndCondition) -> Result<SplineFit> {
        let points = check_input(xs, ys, end)?;
        let layout = Layout::new(points.len(), end);
        info!(
            points = points.len(),
            cyclic = layout.cyclic,
            unknowns = layout.unknowns,
            "Starting clothoid interpolation"
        );

        let mut thetas = initial_headings(&points, end);
        let mut segments = fit_segments(&points, &thetas, &self.config.fit)?;
        let mut residual = residuals(&segments, &layout);
        let mut iterations = 0;

        let result = loop {
            let norm = max_abs(&residual);
            if norm <= self.config.tolerance {
                break FitResult::success(iterations, norm);
            }
            if iterations >= self.config.max_iterations {
                break FitResult::failure(
                    FitStatus::NoConvergence,
                    iterations,
                    norm,
                    "iteration cap reached",
                );
            }
            iterations += 1;

            let jacobian = match self.jacobian(&points, &thetas, &layout) {
                Ok(jacobian) => jacobian,
                Err(e) => {
                    break FitResult::failure(
                        FitStatus::NumericalIssue,
                        iterations,
                        norm,
                        format!("Jacobian fit failed: {e}"),
                    );
                }
            };
            let Some(step) = jacobian.lu().solve(&(-&residual)) else {
                break FitResult::failure(
                    FitStatus::NumericalIssue,
                    iterations,
                    norm,
                    "singular Jacobian",
                );
            };

            let mut lambda = 1.0;
            let mut accepted = None;
            for _ in 0..LINE_SEARCH_STEPS {
                let trial = layout.apply(&thetas, &step, lambda);
                if let Ok(trial_segments) = fit_segments(&points, &trial, &self.config.fit) {
                    let trial_residual = residuals(&trial_segments, &layout);
                    if max_abs(&trial_residual) < norm {
                        accepted = Some((trial, trial_segments, trial_residual));
                        break;
                    }
                }
                lambda *= 0.5;
            }
            let Some((trial, trial_segments, trial_residual)) = accepted else {
                break FitResult::failure(
                    FitStatus::NoConvergence,
                    iterations,
                    norm,
                    "line search stalled",
                );
            };
            debug!(
                iteration = iterations,
                lambda,
                residual = max_abs(&trial_residual),
                "Interpolation step accepted"
            );
            thetas = trial;
            segments = trial_segments;
            residual = trial_residual;
        };

        if result.ok() {
            info!(iterations = result.iterations, residual = result.residual, "Interpolation converged");
        } else {
            warn!(%result, "Interpolation stopped before matching curvature");
        }

        let mut list = ClothoidList::new();
        for (segment, (p, t)) in segments.iter().zip(points.windows(2).zip(thetas.windows(2))) {
            let curve = ClothoidCurve::new(
                p[0].x,
                p[0].y,
                t[0],
                segment.kappa0,
                segment.dk,
                segment.length,
            )?;
            list.push_back(curve)?;
        }
        Ok(SplineFit { result, list })
    }

    /// Jacobian of the curvature jumps with respect to the free headings.
    fn jacobian(
        &self,
        points: &[Point2<f64>],
        thetas: &[f64],
        layout: &Layout,
    ) -> Result<DMatrix<f64>> {
        let h = self.config.jacobian_step;
        let mut jac = DMatrix::zeros(layout.unknowns, layout.unknowns);
        for j in 0..points.len() - 1 {
            let (p0, p1) = (&points[j], &points[j + 1]);
            let (t0, t1) = (thetas[j], thetas[j + 1]);
            let fit = |a: f64, b: f64| -> Result<(f64, f64)> {
                let seg = Segment::fit(p0, p1, a, b, &self.config.fit)?;
                Ok((seg.kappa0, seg.kappa_end()))
            };
            let (plus_a, minus_a) = (fit(t0 + h, t1)?, fit(t0 - h, t1)?);
            let (plus_b, minus_b) = (fit(t0, t1 + h)?, fit(t0, t1 - h)?);
            let scale = 0.5 / h;
            let dkb = [(plus_a.0 - minus_a.0) * scale, (plus_b.0 - minus_b.0) * scale];
            let dke = [(plus_a.1 - minus_a.1) * scale, (plus_b.1 - minus_b.1) * scale];

            let cols = [layout.index(j), layout.index(j + 1)];
            // Segment j enters the jump at its end node with +κ_end and the
            // jump at its start node with -κ_begin.
            if let Some(row) = layout.index(j + 1) {
                for (col, d) in cols.iter().zip(dke) {
                    if let Some(col) = col {
                        jac[(row, *col)] += d;
                    }
                }
            }
            if let Some(row) = layout.index(j) {
                for (col, d) in cols.iter().zip(dkb) {
                    if let Some(col) = col {
                        jac[(row, *col)] -= d;
                    }
                }
            }
        }
        Ok(jac)
    }
}

impl ClothoidList {
    /// Closed G2 spline through the points with default settings.
    ///
    /// # Errors
    ///
    /// See [`ClothoidSplineBuilder::build`].
    pub fn build_p2(xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        ClothoidSplineBuilder::default().build_p2(xs, ys)
    }

    /// G2 spline through the points with prescribed end headings.
    ///
    /// # Errors
    ///
    /// See [`ClothoidSplineBuilder::build`].
    pub fn build_p1(xs: &[f64], ys: &[f64], theta_begin: f64, theta_end: f64) -> Result<SplineFit> {
        ClothoidSplineBuilder::default().build_p1(xs, ys, theta_begin, theta_end)
    }
}

/// Maps node indices to unknown and equation indices.
///
/// Rows and columns share the mapping: the jump at a node is balanced by
/// the heading at that node.
#[derive(Debug, Clone, Copy)]
struct Layout {
    nodes: usize,
    cyclic: bool,
    unknowns: usize,
}

impl Layout {
    fn new(nodes: usize, end: EndCondition) -> Self {
        let cyclic = matches!(end, EndCondition::Cyclic);
        let unknowns = if cyclic { nodes - 1 } else { nodes - 2 };
        Self { nodes, cyclic, unknowns }
    }

    /// Unknown index of node `k`, `None` for a prescribed heading.
    fn index(&self, k: usize) -> Option<usize> {
        let last = self.nodes - 1;
        if self.cyclic {
            Some(k % last)
        } else if k == 0 || k == last {
            None
        } else {
            Some(k - 1)
        }
    }

    fn apply(&self, thetas: &[f64], step: &DVector<f64>, lambda: f64) -> Vec<f64> {
        thetas
            .iter()
            .enumerate()
            .map(|(k, &t)| match self.index(k) {
                Some(i) => t + lambda * step[i],
                None => t,
            })
            .collect()
    }
}

/// Curvature parameters of one fitted span.
#[derive(Debug, Clone, Copy)]
struct Segment {
    kappa0: f64,
    dk: f64,
    length: f64,
}

impl Segment {
    fn fit(p0: &Point2<f64>, p1: &Point2<f64>, t0: f64, t1: f64, config: &FitConfig) -> Result<Self> {
        let fit = fit_clothoid(p0.x, p0.y, t0, p1.x, p1.y, t1, config)?;
        Ok(Self {
            kappa0: fit.kappa0,
            dk: fit.dk,
            length: fit.length,
        })
    }

    fn kappa_end(&self) -> f64 {
        self.kappa0 + self.dk * self.length
    }
}

pub(crate) fn check_input(xs: &[f64], ys: &[f64], end: EndCondition) -> Result<Vec<Point2<f64>>> {
    if xs.len() != ys.len() {
        return Err(CurveError::invalid_input(format!(
            "coordinate lengths differ: {} x values, {} y values",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(CurveError::insufficient_points(2, xs.len()));
    }
    if !xs.iter().chain(ys).all(|v| v.is_finite()) {
        return Err(CurveError::invalid_input("coordinates must be finite"));
    }
    if let EndCondition::Clamped { theta_begin, theta_end } = end {
        if !theta_begin.is_finite() || !theta_end.is_finite() {
            return Err(CurveError::invalid_input("end headings must be finite"));
        }
    }

    let points: Vec<Point2<f64>> = xs.iter().zip(ys).map(|(&x, &y)| Point2::new(x, y)).collect();
    let chords: Vec<f64> = points.windows(2).map(|w| (w[1] - w[0]).norm_squared()).collect();
    let (min, max) = chords
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &c| (lo.min(c), hi.max(c)));
    if min == 0.0 {
        return Err(CurveError::invalid_input("consecutive points coincide"));
    }
    if min < MIN_CHORD_RATIO * max {
        return Err(CurveError::invalid_input(format!(
            "chord lengths are badly scaled: shortest² {min:e}, longest² {max:e}"
        )));
    }
    Ok(points)
}

/// Bisector of the adjacent chord directions at every node.
fn initial_headings(points: &[Point2<f64>], end: EndCondition) -> Vec<f64> {
    let omega: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            d.y.atan2(d.x)
        })
        .collect();
    let bisector = |a: f64, b: f64| a + 0.5 * angle_diff(b, a);

    let m = omega.len();
    let mut thetas = Vec::with_capacity(m + 1);
    let (first, last) = match end {
        EndCondition::Clamped { theta_begin, theta_end } => (theta_begin, theta_end),
        EndCondition::Cyclic => {
            let wrap = bisector(omega[m - 1], omega[0]);
            (wrap, wrap)
        }
    };
    thetas.push(first);
    thetas.extend(omega.windows(2).map(|w| bisector(w[0], w[1])));
    thetas.push(last);
    thetas
}

fn fit_segments(points: &[Point2<f64>], thetas: &[f64], config: &FitConfig) -> Result<Vec<Segment>> {
    points
        .windows(2)
        .zip(thetas.windows(2))
        .map(|(p, t)| Segment::fit(&p[0], &p[1], t[0], t[1], config))
        .collect()
}

fn max_abs(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |m: f64, x| m.max(x.abs()))
}

/// Curvature jump `κ_end(j-1) - κ_begin(j)` at every junction node.
fn residuals(segments: &[Segment], layout: &Layout) -> DVector<f64> {
    let mut r = DVector::zeros(layout.unknowns);
    for (j, seg) in segments.iter().enumerate() {
        if let Some(row) = layout.index(j + 1) {
            r[row] += seg.kappa_end();
        }
        if let Some(row) = layout.index(j) {
            r[row] -= seg.kappa0;
        }
    }
    r
}
