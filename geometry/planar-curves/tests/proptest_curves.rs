//! Property-based tests for planar curves.
//!
//! Run with: cargo test -p planar-curves -- proptest

use approx::relative_eq;
use planar_curves::{
    Biarc, CircleArc, ClothoidCurve, Curve, IntersectConfig, LineSegment, PlanarCurve, PolyLine,
    angle_diff, generalized_fresnel, intersect_curves, normalize_angle,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_coord() -> impl Strategy<Value = f64> {
    -20.0..20.0f64
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -3.1..3.1f64
}

fn arb_line() -> impl Strategy<Value = LineSegment> {
    (arb_coord(), arb_coord(), arb_angle(), 0.1..10.0f64)
        .prop_map(|(x, y, t, l)| LineSegment::new(x, y, t, l).unwrap())
}

fn arb_arc() -> impl Strategy<Value = CircleArc> {
    (arb_coord(), arb_coord(), arb_angle(), -2.0..2.0f64, 0.1..10.0f64)
        .prop_map(|(x, y, t, k, l)| CircleArc::new(x, y, t, k, l).unwrap())
}

fn arb_clothoid() -> impl Strategy<Value = ClothoidCurve> {
    (
        arb_coord(),
        arb_coord(),
        arb_angle(),
        -1.0..1.0f64,
        -0.5..0.5f64,
        0.1..8.0f64,
    )
        .prop_map(|(x, y, t, k, dk, l)| ClothoidCurve::new(x, y, t, k, dk, l).unwrap())
}

fn arb_curve() -> impl Strategy<Value = Curve> {
    prop_oneof![
        arb_line().prop_map(Curve::from),
        arb_arc().prop_map(Curve::from),
        arb_clothoid().prop_map(Curve::from),
    ]
}

/// Hermite data with well separated end points.
fn arb_hermite() -> impl Strategy<Value = (f64, f64, f64, f64, f64, f64)> {
    (arb_coord(), arb_coord(), arb_angle(), 1.0..10.0f64, arb_angle(), arb_angle())
        .prop_map(|(x0, y0, t0, r, dir, t1)| {
            (x0, y0, t0, x0 + r * dir.cos(), y0 + r * dir.sin(), t1)
        })
}

// =============================================================================
// Property Tests: Evaluation
// =============================================================================

proptest! {
    /// Evaluation starts exactly at the start and reaches the end.
    #[test]
    fn eval_end_points(c in arb_curve()) {
        prop_assert_eq!(c.eval(0.0).unwrap(), c.start());
        let end = c.eval(c.length()).unwrap();
        prop_assert!((end - c.end()).norm() <= 1e-9);
    }

    /// The numerical derivative of the position is the unit heading.
    #[test]
    fn heading_matches_derivative(c in arb_curve(), t in 0.05..0.95f64) {
        let h = 1e-4;
        let s = t * c.length();
        let d = (c.point(s + h) - c.point(s - h)) / (2.0 * h);
        let theta = c.theta(s);
        prop_assert!((d.x - theta.cos()).abs() <= 1e-6, "dx {} vs {}", d.x, theta.cos());
        prop_assert!((d.y - theta.sin()).abs() <= 1e-6, "dy {} vs {}", d.y, theta.sin());
    }

    /// The bounding box encloses samples of the curve.
    #[test]
    fn bbox_encloses_samples(c in arb_curve()) {
        let bbox = c.bounding_box().inflated(1e-9);
        for i in 0..=32 {
            let p = c.point(c.length() * f64::from(i) / 32.0);
            prop_assert!(bbox.contains(&p), "{:?} outside {:?}", p, bbox);
        }
    }

    /// Reversal swaps the ends and flips the heading.
    #[test]
    fn reversal_swaps_ends(c in arb_curve()) {
        let r = c.reversed();
        prop_assert!((r.start() - c.end()).norm() <= 1e-9);
        prop_assert!((r.end() - c.start()).norm() <= 1e-9);
        let turn = angle_diff(r.theta_begin(), c.theta_end() + std::f64::consts::PI);
        prop_assert!(turn.abs() <= 1e-9);
    }

    /// Normalized angles are in (-π, π] and equivalent to the input.
    #[test]
    fn normalize_angle_range(a in -100.0..100.0f64) {
        let n = normalize_angle(a);
        prop_assert!(n > -std::f64::consts::PI && n <= std::f64::consts::PI);
        prop_assert!((n - a).sin().abs() <= 1e-9);
    }

    /// Fresnel integrals agree on both sides of the series switch.
    #[test]
    fn fresnel_continuous_at_switch(b in -5.0..5.0f64, c in -3.0..3.0f64) {
        let (x0, y0) = generalized_fresnel(0.01 - 1e-12, b, c);
        let (x1, y1) = generalized_fresnel(0.01 + 1e-12, b, c);
        prop_assert!((x0 - x1).abs() <= 1e-9);
        prop_assert!((y0 - y1).abs() <= 1e-9);
    }
}

// =============================================================================
// Property Tests: Fitting
// =============================================================================

proptest! {
    /// Biarc fits reach the target state.
    #[test]
    fn biarc_fit_reaches_target((x0, y0, t0, x1, y1, t1) in arb_hermite()) {
        if let Ok(b) = Biarc::build_g1(x0, y0, t0, x1, y1, t1) {
            prop_assert!((b.x_end() - x1).abs() <= 1e-9);
            prop_assert!((b.y_end() - y1).abs() <= 1e-9);
            prop_assert!(angle_diff(b.theta_end(), t1).abs() <= 1e-9);
        }
    }

    /// Clothoid fits reach the target state.
    #[test]
    fn clothoid_fit_reaches_target((x0, y0, t0, x1, y1, t1) in arb_hermite()) {
        let c = ClothoidCurve::build_g1(x0, y0, t0, x1, y1, t1).unwrap();
        prop_assert!(relative_eq!(c.x_end(), x1, epsilon = 1e-8));
        prop_assert!(relative_eq!(c.y_end(), y1, epsilon = 1e-8));
        prop_assert!(angle_diff(c.theta_end(), t1).abs() <= 1e-8);
    }
}

// =============================================================================
// Property Tests: Intersection and Lists
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Intersection terminates and every reported hit is a real contact.
    #[test]
    fn intersections_are_contacts(a in arb_curve(), b in arb_curve()) {
        let config = IntersectConfig::default();
        for (sa, sb) in intersect_curves(&a, &b, &config) {
            prop_assert!((a.point(sa) - b.point(sb)).norm() <= 1e-8);
        }
    }

    /// Polyline evaluation at the vertex arc lengths returns the vertices.
    #[test]
    fn polyline_hits_vertices(
        pts in prop::collection::vec((arb_coord(), arb_coord()), 2..12),
    ) {
        let (xs, ys): (Vec<f64>, Vec<f64>) = pts.into_iter().unzip();
        if let Ok(list) = PolyLine::from_points(&xs, &ys) {
            for (i, v) in list.vertices().iter().enumerate() {
                let s = list.segment_start(i).unwrap_or(list.length());
                prop_assert!((list.eval(s).unwrap() - *v).norm() <= 1e-9);
            }
        }
    }
}
