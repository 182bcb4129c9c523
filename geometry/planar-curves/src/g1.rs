//! Two-point G1 Hermite fit for a single clothoid.
//!
//! Working in the frame of the chord, with `φ0`, `φ1` the end headings
//! relative to it and `δ = φ1 - φ0`, the clothoid through both points
//! satisfies `Y_0(2A, δ - A, φ0) = 0` for the unknown `A = dk L² / 2`. The
//! remaining parameters follow directly:
//!
//! ```text
//! L  = r / X_0(2A, δ - A, φ0)
//! κ0 = (δ - A) / L
//! dk = 2A / L²
//! ```

use std::f64::consts::{FRAC_PI_8, PI};

use tracing::{debug, warn};

use crate::fresnel::fresnel_moments;
use crate::kernel::normalize_angle;
use crate::solver::{Root, newton, newton_bracketed};
use crate::{CurveError, FitConfig, FitResult, Result};

/// Coefficients of the rational initial guess for `A`.
const GUESS: [f64; 6] = [
    2.989_696_028_701_907,
    0.716_228_953_608_281,
    -0.458_969_738_821_509,
    -0.502_821_153_340_377,
    0.261_062_141_752_652,
    -0.045_854_475_238_709,
];

/// Bracket scan steps on each side of the guess when Newton fails.
const SCAN_STEPS: usize = 64;

/// Curvature parameters of a fitted clothoid.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct G1Fit {
    pub kappa0: f64,
    pub dk: f64,
    pub length: f64,
    pub result: FitResult,
}

fn initial_guess(phi0: f64, phi1: f64) -> f64 {
    let x = phi0 / PI;
    let y = phi1 / PI;
    let xy = x * y;
    let (x2, y2) = (x * x, y * y);
    (phi0 + phi1)
        * (GUESS[0]
            + xy * (GUESS[1] + xy * GUESS[2])
            + (GUESS[3] + xy * GUESS[4]) * (x2 + y2)
            + GUESS[5] * (x2 * x2 + y2 * y2))
}

/// Fits the clothoid from `(x0, y0, θ0)` to `(x1, y1, θ1)`.
///
/// # Errors
///
/// - [`CurveError::InvalidInput`] for non-finite input.
/// - [`CurveError::Degenerate`] when the two points coincide.
/// - [`CurveError::FitConvergence`] when no admissible root is found.
pub(crate) fn fit_clothoid(
    x0: f64,
    y0: f64,
    theta0: f64,
    x1: f64,
    y1: f64,
    theta1: f64,
    config: &FitConfig,
) -> Result<G1Fit> {
    if ![x0, y0, theta0, x1, y1, theta1].iter().all(|v| v.is_finite()) {
        return Err(CurveError::invalid_input("G1 end conditions must be finite"));
    }
    let (dx, dy) = (x1 - x0, y1 - y0);
    let r = dx.hypot(dy);
    if r == 0.0 {
        return Err(CurveError::degenerate("G1 end points coincide"));
    }
    let phi = dy.atan2(dx);
    let phi0 = normalize_angle(theta0 - phi);
    let phi1 = normalize_angle(theta1 - phi);
    let delta = phi1 - phi0;

    let g = |a: f64| {
        let m = fresnel_moments(2.0 * a, delta - a, phi0);
        (m.y[0], m.x[2] - m.x[1])
    };
    let chord_x = |a: f64| fresnel_moments(2.0 * a, delta - a, phi0).x[0];
    let solver = config.solver();
    let guess = initial_guess(phi0, phi1);

    let root = match newton(g, guess, &solver) {
        Ok(root) if chord_x(root.value) > 0.0 => root,
        first => {
            let newton_iterations = first.map_or_else(|f| f.iterations, |r| r.iterations);
            debug!(guess, newton_iterations, "clothoid G1 Newton failed, scanning for a bracket");
            scan_for_root(&g, &chord_x, guess, &solver).ok_or_else(|| {
                warn!(phi0, phi1, "clothoid G1 fit did not converge");
                CurveError::fit_convergence(
                    config.max_iterations,
                    g(guess).0.abs(),
                    "no admissible root for the clothoid G1 system",
                )
            })?
        }
    };

    let a = root.value;
    let length = r / chord_x(a);
    let fit = G1Fit {
        kappa0: (delta - a) / length,
        dk: 2.0 * a / (length * length),
        length,
        result: FitResult::success(root.iterations, root.residual),
    };
    debug!(
        iterations = root.iterations,
        residual = root.residual,
        length,
        "clothoid G1 fit"
    );
    Ok(fit)
}

fn scan_for_root<G, X>(g: &G, chord_x: &X, guess: f64, solver: &crate::SolverConfig) -> Option<Root>
where
    G: Fn(f64) -> (f64, f64),
    X: Fn(f64) -> f64,
{
    let mut iterations = 0;
    for k in 0..SCAN_STEPS {
        let near = k as f64 * FRAC_PI_8;
        let far = near + FRAC_PI_8;
        for (lo, hi) in [(guess + near, guess + far), (guess - far, guess - near)] {
            if g(lo).0.signum() == g(hi).0.signum() {
                continue;
            }
            match newton_bracketed(g, lo, hi, solver) {
                Ok(root) if chord_x(root.value) > 0.0 => {
                    return Some(Root {
                        iterations: iterations + root.iterations,
                        ..root
                    });
                }
                Ok(root) => iterations += root.iterations,
                Err(failure) => iterations += failure.iterations,
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_guess_vanishes_for_symmetric_headings() {
        assert_eq!(initial_guess(0.3, -0.3), 0.0);
        assert!(initial_guess(0.2, 0.4) > 0.0);
    }

    #[test]
    fn test_straight_fit() {
        let fit = fit_clothoid(0.0, 0.0, 0.0, 5.0, 0.0, 0.0, &FitConfig::default()).unwrap();
        assert_relative_eq!(fit.length, 5.0, epsilon = 1e-12);
        assert_eq!(fit.kappa0, 0.0);
        assert_eq!(fit.dk, 0.0);
        assert_eq!(fit.result.iterations, 0);
    }

    #[test]
    fn test_circular_fit() {
        let fit = fit_clothoid(0.0, 0.0, 0.0, 1.0, 1.0, FRAC_PI_2, &FitConfig::default()).unwrap();
        assert_relative_eq!(fit.length, FRAC_PI_2, epsilon = 1e-10);
        assert_relative_eq!(fit.kappa0, 1.0, epsilon = 1e-10);
        assert!(fit.dk.abs() < 1e-10);

        let fit = fit_clothoid(0.0, 0.0, FRAC_PI_2, 1.0, 0.0, -FRAC_PI_2, &FitConfig::default())
            .unwrap();
        assert_relative_eq!(fit.kappa0, -2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_bad_input() {
        let cfg = FitConfig::default();
        assert!(fit_clothoid(1.0, 1.0, 0.0, 1.0, 1.0, 0.5, &cfg).unwrap_err().is_degenerate());
        assert!(
            fit_clothoid(0.0, 0.0, f64::NAN, 1.0, 1.0, 0.5, &cfg)
                .unwrap_err()
                .is_invalid_input()
        );
    }
}
