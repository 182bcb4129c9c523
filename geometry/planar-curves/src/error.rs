//! Error types for curve operations.

use planar_spatial::SpatialError;
use thiserror::Error;

/// Errors that can occur during curve operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    /// Parameter is outside the valid range.
    #[error("parameter {value} is outside valid range [{min}, {max}]")]
    OutOfRange {
        /// The rejected parameter.
        value: f64,
        /// Lower end of the valid range.
        min: f64,
        /// Upper end of the valid range.
        max: f64,
    },

    /// Degenerate construction input (e.g., zero-length chord).
    #[error("degenerate geometry: {reason}")]
    Degenerate {
        /// Description of the degeneracy.
        reason: String,
    },

    /// A nonlinear solve stopped without meeting its tolerance.
    #[error("fit did not converge after {iterations} iterations (residual {residual:e}): {reason}")]
    FitConvergence {
        /// Iterations performed.
        iterations: usize,
        /// Residual at the last iterate.
        residual: f64,
        /// Description of the failure.
        reason: String,
    },

    /// Operation is not valid for the current state of a curve list.
    #[error("invalid list state: {reason}")]
    InvalidListState {
        /// Description of the problem.
        reason: String,
    },

    /// Insufficient points to define the curve.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// Input data is malformed.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Curves cannot be joined (endpoints or headings don't match).
    #[error("curves cannot be joined: gap of {gap}")]
    CannotJoin {
        /// Position gap, or heading gap in radians when positions match.
        gap: f64,
    },

    /// Error from the spatial layer.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl CurveError {
    /// Create an out-of-range error.
    #[must_use]
    pub fn out_of_range(value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange { value, min, max }
    }

    /// Create a degenerate geometry error.
    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }

    /// Create a convergence error.
    #[must_use]
    pub fn fit_convergence(iterations: usize, residual: f64, reason: impl Into<String>) -> Self {
        Self::FitConvergence {
            iterations,
            residual,
            reason: reason.into(),
        }
    }

    /// Create an invalid list state error.
    #[must_use]
    pub fn invalid_list_state(reason: impl Into<String>) -> Self {
        Self::InvalidListState {
            reason: reason.into(),
        }
    }

    /// Create an insufficient points error.
    #[must_use]
    pub fn insufficient_points(required: usize, actual: usize) -> Self {
        Self::InsufficientPoints { required, actual }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Check if this is an out-of-range error.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    /// Check if this is a degenerate geometry error.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }

    /// Check if this is a convergence error.
    #[must_use]
    pub fn is_fit_convergence(&self) -> bool {
        matches!(self, Self::FitConvergence { .. })
    }

    /// Check if this is an invalid list state error.
    #[must_use]
    pub fn is_invalid_list_state(&self) -> bool {
        matches!(self, Self::InvalidListState { .. })
    }

    /// Check if this error reports bad input data.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::InsufficientPoints { .. }
        )
    }

    /// Check if this is a join error.
    #[must_use]
    pub fn is_cannot_join(&self) -> bool {
        matches!(self, Self::CannotJoin { .. })
    }
}
