//! Interpolation with free end headings chosen by an objective.
//!
//! Interior headings are still fixed by curvature matching, so every
//! candidate is a G2 spline through the points. Only the headings at the two
//! ends are free. They are searched with a BFGS iteration on
//! central-difference gradients, where each objective evaluation is a
//! clamped spline build. Steps are accepted under an Armijo condition, so the
//! objective never increases.

use nalgebra::{Matrix2, Vector2};
use tracing::{debug, info, warn};

use crate::spline::{EndCondition, SplineFit, check_input};
use crate::{
    ClothoidList, ClothoidSplineBuilder, FitResult, FitStatus, OptimizeConfig, PlanarCurve,
    Result,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sufficient decrease factor of the Armijo test.
const ARMIJO: f64 = 1e-4;

/// Halvings tried before a step is rejected.
const LINE_SEARCH_STEPS: usize = 20;

/// Quantity minimized over the end headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SplineObjective {
    /// Total arc length.
    Length,
    /// Bending energy, the integral of κ² over the arc length.
    CurvatureEnergy,
}

impl SplineObjective {
    /// Value of the objective for `list`.
    #[must_use]
    pub fn evaluate(self, list: &ClothoidList) -> f64 {
        match self {
            Self::Length => list.length(),
            Self::CurvatureEnergy => list
                .segments()
                .iter()
                .map(|c| {
                    // κ(s) = κ0 + dk·s integrated in closed form.
                    let (k, dk, l) = (c.kappa_begin(), c.dk(), c.length());
                    k * k * l + k * dk * l * l + dk * dk * l * l * l / 3.0
                })
                .sum(),
        }
    }
}

impl ClothoidSplineBuilder {
    /// Shortest G2 spline through the points.
    ///
    /// # Errors
    ///
    /// See [`optimize`](Self::optimize).
    pub fn build_min_length(&self, xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        self.optimize(xs, ys, SplineObjective::Length, &OptimizeConfig::default())
    }

    /// G2 spline through the points with the least bending energy.
    ///
    /// # Errors
    ///
    /// See [`optimize`](Self::optimize).
    pub fn build_min_curvature(&self, xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        self.optimize(
            xs,
            ys,
            SplineObjective::CurvatureEnergy,
            &OptimizeConfig::default(),
        )
    }

    /// G2 spline through the points whose end headings minimize `objective`.
    ///
    /// The search starts from the directions of the first and last chords.
    /// [`SplineFit::result`] describes the search: its residual is the final
    /// gradient norm. The returned list is the best G2 spline found, even
    /// when the search stops early. An invalid `config` is reported as
    /// [`FitStatus::InvalidInput`] together with the starting spline.
    ///
    /// # Errors
    ///
    /// Input errors as in [`build`](Self::build), plus any segment fit error
    /// of the starting spline.
    pub fn optimize(
        &self,
        xs: &[f64],
        ys: &[f64],
        objective: SplineObjective,
        config: &OptimizeConfig,
    ) -> Result<SplineFit> {
        let points = check_input(xs, ys, EndCondition::Cyclic)?;
        let chord = |i: usize| {
            let d = points[i + 1] - points[i];
            d.y.atan2(d.x)
        };
        let mut x = Vector2::new(chord(0), chord(points.len() - 2));
        info!(
            points = points.len(),
            ?objective,
            "Starting objective-driven interpolation"
        );

        let eval = |x: &Vector2<f64>| -> Option<(f64, SplineFit)> {
            let fit = self.build_p1(xs, ys, x.x, x.y).ok()?;
            fit.ok().then(|| (objective.evaluate(&fit.list), fit))
        };
        let gradient = |x: &Vector2<f64>| -> Option<Vector2<f64>> {
            let h = config.gradient_step;
            let mut g = Vector2::zeros();
            for i in 0..2 {
                let mut e = Vector2::zeros();
                e[i] = h;
                let (plus, _) = eval(&(x + e))?;
                let (minus, _) = eval(&(x - e))?;
                g[i] = (plus - minus) / (2.0 * h);
            }
            Some(g)
        };

        let Some((mut f, mut fit)) = eval(&x) else {
            // The starting spline itself did not match curvature.
            return self.build_p1(xs, ys, x.x, x.y);
        };
        if !config.is_valid() {
            warn!(?config, "Rejected optimization settings");
            return Ok(SplineFit {
                result: FitResult::failure(
                    FitStatus::InvalidInput,
                    0,
                    f64::NAN,
                    "tolerances and steps must be positive and finite",
                ),
                list: fit.list,
            });
        }
        let Some(mut g) = gradient(&x) else {
            return Ok(SplineFit {
                result: FitResult::failure(
                    FitStatus::NumericalIssue,
                    0,
                    f64::NAN,
                    "gradient evaluation failed",
                ),
                list: fit.list,
            });
        };

        let mut inverse = Matrix2::identity();
        let mut iterations = 0;
        let result = loop {
            let norm = g.norm();
            if norm <= config.gradient_tolerance * (1.0 + f.abs()) {
                break FitResult::success(iterations, norm);
            }
            if iterations >= config.max_iterations {
                break FitResult::failure(
                    FitStatus::NoConvergence,
                    iterations,
                    norm,
                    "iteration cap reached",
                );
            }
            iterations += 1;

            let mut direction = -(inverse * g);
            if direction.dot(&g) >= 0.0 {
                inverse = Matrix2::identity();
                direction = -g;
            }
            let length = direction.norm();
            if length > config.max_step {
                direction *= config.max_step / length;
            }
            let slope = direction.dot(&g);

            let mut lambda = 1.0;
            let mut accepted = None;
            for _ in 0..LINE_SEARCH_STEPS {
                let trial = x + direction * lambda;
                if let Some((value, trial_fit)) = eval(&trial) {
                    if value <= f + ARMIJO * lambda * slope {
                        accepted = Some((trial, value, trial_fit));
                        break;
                    }
                }
                lambda *= 0.5;
            }
            let Some((trial, value, trial_fit)) = accepted else {
                break FitResult::failure(
                    FitStatus::NoConvergence,
                    iterations,
                    norm,
                    "line search stalled",
                );
            };
            let Some(trial_gradient) = gradient(&trial) else {
                break FitResult::failure(
                    FitStatus::NumericalIssue,
                    iterations,
                    norm,
                    "gradient evaluation failed",
                );
            };

            // BFGS update of the inverse Hessian, skipped without curvature.
            let s = trial - x;
            let y = trial_gradient - g;
            let sy = s.dot(&y);
            if sy > f64::EPSILON * s.norm() * y.norm() {
                let rho = 1.0 / sy;
                let left = Matrix2::identity() - s * y.transpose() * rho;
                let right = Matrix2::identity() - y * s.transpose() * rho;
                inverse = left * inverse * right + s * s.transpose() * rho;
            }
            debug!(
                iteration = iterations,
                lambda,
                objective = value,
                "Objective step accepted"
            );
            x = trial;
            f = value;
            fit = trial_fit;
            g = trial_gradient;
        };

        if result.ok() {
            info!(iterations = result.iterations, objective = f, "Objective minimized");
        } else {
            warn!(%result, objective = f, "Objective search stopped early");
        }
        Ok(SplineFit {
            result,
            list: fit.list,
        })
    }
}

impl ClothoidList {
    /// Shortest G2 spline through the points with default settings.
    ///
    /// # Errors
    ///
    /// See [`ClothoidSplineBuilder::optimize`].
    pub fn build_min_length(xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        ClothoidSplineBuilder::default().build_min_length(xs, ys)
    }

    /// G2 spline through the points with the least bending energy, with
    /// default settings.
    ///
    /// # Errors
    ///
    /// See [`ClothoidSplineBuilder::optimize`].
    pub fn build_min_curvature(xs: &[f64], ys: &[f64]) -> Result<SplineFit> {
        ClothoidSplineBuilder::default().build_min_curvature(xs, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CircleArc, ClothoidCurve, angle_diff};
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    const XS: [f64; 3] = [0.0, 2.0, 4.0];
    const YS: [f64; 3] = [0.0, 1.0, 0.0];

    fn chord_start(xs: &[f64], ys: &[f64]) -> SplineFit {
        let n = xs.len();
        let t0 = (ys[1] - ys[0]).atan2(xs[1] - xs[0]);
        let t1 = (ys[n - 1] - ys[n - 2]).atan2(xs[n - 1] - xs[n - 2]);
        ClothoidList::build_p1(xs, ys, t0, t1).unwrap()
    }

    fn assert_interpolates(list: &ClothoidList, xs: &[f64], ys: &[f64]) {
        for (i, seg) in list.segments().iter().enumerate() {
            assert_relative_eq!(seg.start(), Point2::new(xs[i], ys[i]), epsilon = 1e-12);
        }
        let n = xs.len() - 1;
        assert_relative_eq!(list.end().unwrap(), Point2::new(xs[n], ys[n]), epsilon = 1e-9);
    }

    #[test]
    fn test_curvature_energy_of_an_arc() {
        let arc = CircleArc::new(0.0, 0.0, 0.0, 0.5, 3.0).unwrap();
        let list = ClothoidList::from_segment(arc.into());
        assert_relative_eq!(
            SplineObjective::CurvatureEnergy.evaluate(&list),
            0.75,
            epsilon = 1e-15
        );
        assert_relative_eq!(SplineObjective::Length.evaluate(&list), 3.0);

        let ramp = ClothoidCurve::new(0.0, 0.0, 0.0, 0.0, 1.0, 3.0).unwrap();
        let list = ClothoidList::from_segment(ramp);
        assert_relative_eq!(
            SplineObjective::CurvatureEnergy.evaluate(&list),
            9.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_two_points_min_length_is_the_chord() {
        let fit = ClothoidList::build_min_length(&[0.0, 3.0], &[0.0, 4.0]).unwrap();
        assert!(fit.ok(), "{}", fit.result);
        assert_relative_eq!(fit.list.length(), 5.0, epsilon = 1e-9);
        let heading = 4f64.atan2(3.0);
        assert_relative_eq!(angle_diff(fit.list.theta_begin().unwrap(), heading), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_collinear_min_curvature_is_straight() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys = [0.0; 4];
        let fit = ClothoidList::build_min_curvature(&xs, &ys).unwrap();
        assert!(fit.ok(), "{}", fit.result);
        assert_eq!(fit.result.iterations, 0);
        assert_relative_eq!(fit.list.length(), 4.0, epsilon = 1e-9);
        assert!(SplineObjective::CurvatureEnergy.evaluate(&fit.list) <= 1e-12);
    }

    #[test]
    fn test_min_length_never_worse_than_start() {
        let start = chord_start(&XS, &YS);
        let fit = ClothoidList::build_min_length(&XS, &YS).unwrap();
        assert!(fit.list.length() <= start.list.length() + 1e-12);
        assert!(fit.list.is_g2(1e-8));
        assert_interpolates(&fit.list, &XS, &YS);
    }

    #[test]
    fn test_min_curvature_never_worse_than_start() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 1.0, 0.0];
        let objective = SplineObjective::CurvatureEnergy;
        let start = chord_start(&xs, &ys);
        let fit = ClothoidList::build_min_curvature(&xs, &ys).unwrap();
        assert!(objective.evaluate(&fit.list) <= objective.evaluate(&start.list) + 1e-12);
        assert!(fit.list.is_g2(1e-8));
        assert_interpolates(&fit.list, &xs, &ys);
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let config = OptimizeConfig::default().with_gradient_step(0.0);
        let fit = ClothoidSplineBuilder::default()
            .optimize(&XS, &YS, SplineObjective::Length, &config)
            .unwrap();
        assert_eq!(fit.result.status, FitStatus::InvalidInput);
        assert_eq!(fit.list, chord_start(&XS, &YS).list);
        assert!(fit.into_list().unwrap_err().is_fit_convergence());
    }

    #[test]
    fn test_input_errors_propagate() {
        let builder = ClothoidSplineBuilder::default();
        assert!(builder.build_min_length(&[0.0], &[0.0]).is_err());
        assert!(
            builder
                .build_min_curvature(&[0.0, 1.0], &[0.0])
                .unwrap_err()
                .is_invalid_input()
        );
    }
}
