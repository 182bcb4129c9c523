//! Stateless scalar root finders shared by the fitting routines.
//!
//! Each solver takes the residual function, a starting point or bracket and a
//! [`SolverConfig`], and returns either a converged [`Root`] or a
//! [`SolveFailure`] describing where it stopped. Nothing is retained between
//! calls.
//!
//! # Example
//!
//! ```
//! use planar_curves::{SolverConfig, newton};
//!
//! let root = newton(|x| (x * x - 2.0, 2.0 * x), 1.0, &SolverConfig::default()).unwrap();
//! assert!((root.value - 2f64.sqrt()).abs() < 1e-12);
//! ```

use std::fmt;

use crate::CurveError;
use crate::config::SolverConfig;

/// A converged root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    /// Location of the root.
    pub value: f64,
    /// `|f(value)|`.
    pub residual: f64,
    /// Iterations performed.
    pub iterations: usize,
}

/// Why a solver stopped without converging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The iteration cap was reached.
    MaxIterations,
    /// The derivative vanished.
    ZeroDerivative,
    /// The residual or derivative became NaN or infinite.
    NonFinite,
    /// The bracket ends have the same sign.
    NoBracket,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MaxIterations => "iteration cap reached",
            Self::ZeroDerivative => "zero derivative",
            Self::NonFinite => "non-finite residual",
            Self::NoBracket => "no sign change in bracket",
        };
        f.write_str(text)
    }
}

/// Diagnostic returned by a solver that did not converge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveFailure {
    /// Reason for stopping.
    pub kind: FailureKind,
    /// Last iterate.
    pub last: f64,
    /// `|f(last)|`.
    pub residual: f64,
    /// Iterations performed.
    pub iterations: usize,
}

impl From<SolveFailure> for CurveError {
    fn from(f: SolveFailure) -> Self {
        Self::fit_convergence(f.iterations, f.residual, f.kind.to_string())
    }
}

/// Newton's method on a function returning `(f(x), f'(x))`.
///
/// # Errors
///
/// Returns a [`SolveFailure`] if the cap is reached, the derivative vanishes,
/// or the residual stops being finite.
pub fn newton<F>(mut f: F, x0: f64, config: &SolverConfig) -> Result<Root, SolveFailure>
where
    F: FnMut(f64) -> (f64, f64),
{
    let mut x = x0;
    let mut residual = f64::INFINITY;
    for iteration in 0..=config.max_iterations {
        let (fx, dfx) = f(x);
        residual = fx.abs();
        let fail = |kind| SolveFailure {
            kind,
            last: x,
            residual,
            iterations: iteration,
        };
        if !fx.is_finite() {
            return Err(fail(FailureKind::NonFinite));
        }
        if residual <= config.tolerance {
            return Ok(Root {
                value: x,
                residual,
                iterations: iteration,
            });
        }
        if iteration == config.max_iterations {
            break;
        }
        if !dfx.is_finite() {
            return Err(fail(FailureKind::NonFinite));
        }
        if dfx == 0.0 {
            return Err(fail(FailureKind::ZeroDerivative));
        }
        x -= fx / dfx;
    }
    Err(SolveFailure {
        kind: FailureKind::MaxIterations,
        last: x,
        residual,
        iterations: config.max_iterations,
    })
}

/// Bisection on a sign-changing bracket `[lo, hi]`.
///
/// Stops when the residual is within tolerance or the bracket can no longer
/// be split in floating point.
///
/// # Errors
///
/// Returns [`FailureKind::NoBracket`] if `f(lo)` and `f(hi)` have the same
/// sign, or [`FailureKind::MaxIterations`] at the cap.
pub fn bisection<F>(mut f: F, lo: f64, hi: f64, config: &SolverConfig) -> Result<Root, SolveFailure>
where
    F: FnMut(f64) -> f64,
{
    let (mut lo, mut hi) = (lo.min(hi), lo.max(hi));
    let mut flo = f(lo);
    let fhi = f(hi);
    for (x, fx) in [(lo, flo), (hi, fhi)] {
        if fx.abs() <= config.tolerance {
            return Ok(Root {
                value: x,
                residual: fx.abs(),
                iterations: 0,
            });
        }
    }
    if flo.signum() == fhi.signum() {
        return Err(SolveFailure {
            kind: FailureKind::NoBracket,
            last: lo,
            residual: flo.abs().min(fhi.abs()),
            iterations: 0,
        });
    }

    let mut mid = 0.5 * (lo + hi);
    let mut fmid = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        mid = 0.5 * (lo + hi);
        fmid = f(mid);
        if fmid.abs() <= config.tolerance || mid <= lo || mid >= hi {
            return Ok(Root {
                value: mid,
                residual: fmid.abs(),
                iterations: iteration,
            });
        }
        if fmid.signum() == flo.signum() {
            lo = mid;
            flo = fmid;
        } else {
            hi = mid;
        }
    }
    Err(SolveFailure {
        kind: FailureKind::MaxIterations,
        last: mid,
        residual: fmid.abs(),
        iterations: config.max_iterations,
    })
}

/// Newton's method safeguarded by a sign-changing bracket.
///
/// A Newton step that leaves the bracket, or fails to halve the residual, is
/// replaced by a bisection step. The bracket shrinks every iteration.
///
/// # Errors
///
/// As [`bisection`].
pub fn newton_bracketed<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    config: &SolverConfig,
) -> Result<Root, SolveFailure>
where
    F: FnMut(f64) -> (f64, f64),
{
    let (mut lo, mut hi) = (lo.min(hi), lo.max(hi));
    let (flo, _) = f(lo);
    let (fhi, _) = f(hi);
    if flo.signum() == fhi.signum() && flo.abs() > config.tolerance && fhi.abs() > config.tolerance
    {
        return Err(SolveFailure {
            kind: FailureKind::NoBracket,
            last: lo,
            residual: flo.abs().min(fhi.abs()),
            iterations: 0,
        });
    }
    let lo_sign = flo.signum();

    let mut x = 0.5 * (lo + hi);
    let mut prev_residual = f64::INFINITY;
    let mut residual = f64::INFINITY;
    for iteration in 0..=config.max_iterations {
        let (fx, dfx) = f(x);
        residual = fx.abs();
        if !fx.is_finite() {
            return Err(SolveFailure {
                kind: FailureKind::NonFinite,
                last: x,
                residual,
                iterations: iteration,
            });
        }
        if residual <= config.tolerance || hi - lo <= f64::EPSILON * x.abs().max(1.0) {
            return Ok(Root {
                value: x,
                residual,
                iterations: iteration,
            });
        }
        if iteration == config.max_iterations {
            break;
        }
        if fx.signum() == lo_sign {
            lo = x;
        } else {
            hi = x;
        }
        let step = if dfx.is_finite() && dfx != 0.0 {
            x - fx / dfx
        } else {
            f64::NAN
        };
        let newton_ok = step > lo && step < hi && residual <= 0.5 * prev_residual;
        prev_residual = residual;
        x = if newton_ok { step } else { 0.5 * (lo + hi) };
    }
    Err(SolveFailure {
        kind: FailureKind::MaxIterations,
        last: x,
        residual,
        iterations: config.max_iterations,
    })
}
