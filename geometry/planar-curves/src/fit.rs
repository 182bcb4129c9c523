//! Outcome reporting for fitting operations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a fit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitStatus {
    /// Converged within tolerance.
    Success,
    /// A linear system became singular or a value stopped being finite.
    NumericalIssue,
    /// The iteration cap was reached.
    NoConvergence,
    /// The problem setup was rejected before iterating.
    InvalidInput,
}

/// Result of a fit: status plus iteration statistics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitResult {
    /// How the fit ended.
    pub status: FitStatus,

    /// Iterations performed.
    pub iterations: usize,

    /// Final residual, in the units of the fit's convergence test.
    pub residual: f64,

    /// Optional detail for failed fits.
    pub message: Option<String>,
}

impl FitResult {
    /// A converged fit.
    #[must_use]
    pub const fn success(iterations: usize, residual: f64) -> Self {
        Self {
            status: FitStatus::Success,
            iterations,
            residual,
            message: None,
        }
    }

    /// A failed fit with a reason.
    #[must_use]
    pub fn failure(
        status: FitStatus,
        iterations: usize,
        residual: f64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            iterations,
            residual,
            message: Some(message.into()),
        }
    }

    /// True only for [`FitStatus::Success`].
    #[must_use]
    pub fn ok(&self) -> bool {
        self.status == FitStatus::Success
    }
}

impl std::fmt::Display for FitResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} after {} iterations (residual {:.3e})",
            self.status, self.iterations, self.residual
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_only_on_success() {
        assert!(FitResult::success(3, 1e-13).ok());
        for status in [
            FitStatus::NumericalIssue,
            FitStatus::NoConvergence,
            FitStatus::InvalidInput,
        ] {
            assert!(!FitResult::failure(status, 0, 1.0, "x").ok());
        }
    }

    #[test]
    fn test_display() {
        let text = FitResult::failure(FitStatus::NoConvergence, 50, 0.25, "stalled").to_string();
        assert!(text.starts_with("NoConvergence after 50 iterations"));
        assert!(text.ends_with(": stalled"));
    }
}
