//! Tolerances and iteration caps for solvers and queries.
//!
//! # Example
//!
//! ```
//! use planar_curves::{IntersectConfig, InterpolationConfig};
//!
//! let intersect = IntersectConfig::default()
//!     .with_leaf_length(1e-4)
//!     .with_max_depth(40);
//! assert_eq!(intersect.max_depth, 40);
//!
//! let spline = InterpolationConfig::precise();
//! assert!(spline.tolerance < InterpolationConfig::default().tolerance);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the scalar Newton and bisection solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverConfig {
    /// Absolute residual tolerance.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

impl SolverConfig {
    /// Sets the residual tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Configuration for two-point G1 fits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitConfig {
    /// Tolerance on the normalized end-point residual (at most `1e-10`).
    pub tolerance: f64,
    /// Maximum number of Newton iterations.
    pub max_iterations: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

impl FitConfig {
    /// Sets the residual tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Scalar solver settings derived from this fit configuration.
    #[must_use]
    pub const fn solver(&self) -> SolverConfig {
        SolverConfig {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

/// Configuration for the subdivision intersection engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntersectConfig {
    /// Maximum point distance for a polished candidate to count as a hit.
    pub tolerance: f64,
    /// Parameter ranges shorter than this are not subdivided further.
    pub leaf_length: f64,
    /// Hard cap on the number of nested subdivisions.
    pub max_depth: usize,
    /// Candidates closer than this in both parameters are merged.
    pub dedup_tolerance: f64,
}

impl Default for IntersectConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            leaf_length: 1e-3,
            max_depth: 32,
            dedup_tolerance: 1e-7,
        }
    }
}

impl IntersectConfig {
    /// Sets the hit tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the leaf range length.
    #[must_use]
    pub const fn with_leaf_length(mut self, leaf_length: f64) -> Self {
        self.leaf_length = leaf_length;
        self
    }

    /// Sets the subdivision depth cap.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the dedup distance.
    #[must_use]
    pub const fn with_dedup_tolerance(mut self, dedup_tolerance: f64) -> Self {
        self.dedup_tolerance = dedup_tolerance;
        self
    }
}

/// Configuration for multi-point clothoid interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InterpolationConfig {
    /// Target for the largest curvature jump at a junction.
    pub tolerance: f64,
    /// Maximum number of heading refinement sweeps.
    pub max_iterations: usize,
    /// Step for the finite-difference Jacobian, in radians.
    pub jacobian_step: f64,
    /// Settings for the per-segment G1 fits.
    pub fit: FitConfig,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 50,
            jacobian_step: 1e-6,
            fit: FitConfig::default(),
        }
    }
}

impl InterpolationConfig {
    /// Tighter curvature matching with a larger iteration budget.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            tolerance: 1e-11,
            max_iterations: 100,
            ..Self::default()
        }
    }

    /// Sets the curvature jump tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the refinement cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the per-segment fit configuration.
    #[must_use]
    pub const fn with_fit(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }
}

/// Configuration for objective-driven interpolation over the end headings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizeConfig {
    /// Stop when the gradient norm is below this, relative to
    /// `1 + |objective|`.
    pub gradient_tolerance: f64,
    /// Maximum number of quasi-Newton steps.
    pub max_iterations: usize,
    /// Step for the central-difference gradient, in radians.
    pub gradient_step: f64,
    /// Largest heading change tried in one step, in radians.
    pub max_step: f64,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            gradient_tolerance: 1e-6,
            max_iterations: 40,
            gradient_step: 1e-4,
            max_step: 0.5,
        }
    }
}

impl OptimizeConfig {
    /// Whether every tolerance and step is positive and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.gradient_tolerance, self.gradient_step, self.max_step]
            .iter()
            .all(|v| *v > 0.0 && v.is_finite())
    }

    /// Sets the gradient tolerance.
    #[must_use]
    pub const fn with_gradient_tolerance(mut self, gradient_tolerance: f64) -> Self {
        self.gradient_tolerance = gradient_tolerance;
        self
    }

    /// Sets the step cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the finite-difference step.
    #[must_use]
    pub const fn with_gradient_step(mut self, gradient_step: f64) -> Self {
        self.gradient_step = gradient_step;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let fit = FitConfig::default();
        assert!(fit.tolerance <= 1e-10);
        assert_eq!(fit.max_iterations, 100);
        assert_eq!(fit.solver(), SolverConfig::default());

        let ic = IntersectConfig::default();
        assert_eq!(ic.max_depth, 32);
        assert!(ic.dedup_tolerance > ic.tolerance);
    }

    #[test]
    fn test_builders() {
        let cfg = InterpolationConfig::default()
            .with_tolerance(1e-6)
            .with_max_iterations(3)
            .with_fit(FitConfig::default().with_max_iterations(20));
        assert_eq!(cfg.tolerance, 1e-6);
        assert_eq!(cfg.max_iterations, 3);
        assert_eq!(cfg.fit.max_iterations, 20);

        let solver = SolverConfig::default().with_tolerance(1e-8).with_max_iterations(7);
        assert_eq!(solver.max_iterations, 7);
    }

    #[test]
    fn test_optimize_config_validation() {
        assert!(OptimizeConfig::default().is_valid());
        assert!(!OptimizeConfig::default().with_gradient_step(0.0).is_valid());
        assert!(!OptimizeConfig::default().with_gradient_tolerance(f64::NAN).is_valid());
        assert_eq!(OptimizeConfig::default().with_max_iterations(3).max_iterations, 3);
    }
}
