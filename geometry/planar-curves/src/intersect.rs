//! Curve/curve intersection by bounding-box subdivision.
//!
//! Both parameter ranges start as the whole curve. A pair of ranges whose
//! boxes overlap is split (the range with the larger box goes first) until
//! both ranges are shorter than [`IntersectConfig::leaf_length`] or the depth
//! cap is hit. Each surviving pair is polished with a 2×2 Newton iteration
//! on `P_a(s_a) - P_b(s_b) = 0`. Pairs of straight segments use the closed
//! form instead.
//!
//! Work is kept on an explicit stack, so deep subdivisions never recurse.

use std::ops::ControlFlow;

use nalgebra::Matrix2;
use tracing::trace;

use crate::kernel::direction;
use crate::{IntersectConfig, PlanarCurve};

/// Newton steps when polishing a candidate.
const POLISH_ITERATIONS: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Work {
    a: (f64, f64),
    b: (f64, f64),
    depth: usize,
}

/// Intersections of two curves as `(s_a, s_b)` pairs, sorted by `s_a`.
///
/// Candidates closer than [`IntersectConfig::dedup_tolerance`] in both
/// parameters are reported once.
///
/// # Example
///
/// ```
/// use planar_curves::{CircleArc, IntersectConfig, intersect_curves};
///
/// // Two unit half circles crossing at (0.5, ±0.866...).
/// let a = CircleArc::new(1.0, 0.0, std::f64::consts::FRAC_PI_2, 1.0, 6.0).unwrap();
/// let b = CircleArc::new(0.0, 0.0, -std::f64::consts::FRAC_PI_2, 1.0, 6.0).unwrap();
/// let hits = intersect_curves(&a, &b, &IntersectConfig::default());
/// assert_eq!(hits.len(), 2);
/// ```
#[must_use]
pub fn intersect_curves<A, B>(a: &A, b: &B, config: &IntersectConfig) -> Vec<(f64, f64)>
where
    A: PlanarCurve + ?Sized,
    B: PlanarCurve + ?Sized,
{
    if let (Some(la), Some(lb)) = (a.as_line(), b.as_line()) {
        return la.intersect_segment(lb, config.tolerance);
    }
    let mut hits = Vec::new();
    let _ = search(a, b, config, |hit| {
        hits.push(hit);
        ControlFlow::Continue(())
    });
    trace!(candidates = hits.len(), "intersection candidates");
    dedup(hits, config.dedup_tolerance)
}

/// Whether two curves touch or cross. Stops at the first hit.
#[must_use]
pub fn collides<A, B>(a: &A, b: &B, config: &IntersectConfig) -> bool
where
    A: PlanarCurve + ?Sized,
    B: PlanarCurve + ?Sized,
{
    if let (Some(la), Some(lb)) = (a.as_line(), b.as_line()) {
        return !la.intersect_segment(lb, config.tolerance).is_empty();
    }
    search(a, b, config, |_| ControlFlow::Break(())).is_break()
}

fn search<A, B, F>(a: &A, b: &B, config: &IntersectConfig, mut visit: F) -> ControlFlow<()>
where
    A: PlanarCurve + ?Sized,
    B: PlanarCurve + ?Sized,
    F: FnMut((f64, f64)) -> ControlFlow<()>,
{
    let mut stack = vec![Work {
        a: (0.0, a.length()),
        b: (0.0, b.length()),
        depth: 0,
    }];
    while let Some(work) = stack.pop() {
        let box_a = a.bbox_range(work.a.0, work.a.1).inflated(config.tolerance);
        let box_b = b.bbox_range(work.b.0, work.b.1).inflated(config.tolerance);
        if !box_a.overlaps(&box_b) {
            continue;
        }

        let leaf_a = work.a.1 - work.a.0 <= config.leaf_length;
        let leaf_b = work.b.1 - work.b.0 <= config.leaf_length;
        if (leaf_a && leaf_b) || work.depth >= config.max_depth {
            if let Some(hit) = polish(a, b, work.a, work.b, config.tolerance) {
                visit(hit)?;
            }
            continue;
        }

        let depth = work.depth + 1;
        if !leaf_a && (leaf_b || box_a.area() >= box_b.area()) {
            let mid = 0.5 * (work.a.0 + work.a.1);
            stack.push(Work { a: (mid, work.a.1), depth, ..work });
            stack.push(Work { a: (work.a.0, mid), depth, ..work });
        } else {
            let mid = 0.5 * (work.b.0 + work.b.1);
            stack.push(Work { b: (mid, work.b.1), depth, ..work });
            stack.push(Work { b: (work.b.0, mid), depth, ..work });
        }
    }
    ControlFlow::Continue(())
}

/// Refines a candidate pair of ranges to an intersection.
///
/// Newton starts at the range midpoints and may leave the ranges, but every
/// iterate is clamped to `[0, length]` of its curve.
fn polish<A, B>(a: &A, b: &B, ra: (f64, f64), rb: (f64, f64), tolerance: f64) -> Option<(f64, f64)>
where
    A: PlanarCurve + ?Sized,
    B: PlanarCurve + ?Sized,
{
    let (len_a, len_b) = (a.length(), b.length());
    let mid_a = 0.5 * (ra.0 + ra.1);
    let mid_b = 0.5 * (rb.0 + rb.1);
    let (mut sa, mut sb) = (mid_a, mid_b);

    for _ in 0..POLISH_ITERATIONS {
        let f = a.point(sa) - b.point(sb);
        if f.norm() <= tolerance {
            return Some((sa, sb));
        }
        let ta = direction(a.theta(sa));
        let tb = direction(b.theta(sb));
        let jacobian = Matrix2::new(ta.x, -tb.x, ta.y, -tb.y);
        let Some(inverse) = jacobian.try_inverse() else {
            break;
        };
        let step = inverse * f;
        let (na, nb) = ((sa - step.x).clamp(0.0, len_a), (sb - step.y).clamp(0.0, len_b));
        if na == sa && nb == sb {
            break;
        }
        (sa, sb) = (na, nb);
    }
    if (a.point(sa) - b.point(sb)).norm() <= tolerance {
        return Some((sa, sb));
    }

    // Tangential contacts can stall Newton; accept the leaf if it touches.
    ((a.point(mid_a) - b.point(mid_b)).norm() <= tolerance).then_some((mid_a, mid_b))
}

pub(crate) fn dedup(mut hits: Vec<(f64, f64)>, tolerance: f64) -> Vec<(f64, f64)> {
    hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));
    let mut kept: Vec<(f64, f64)> = Vec::with_capacity(hits.len());
    for hit in hits {
        let duplicate = kept
            .iter()
            .rev()
            .take_while(|k| hit.0 - k.0 <= tolerance)
            .any(|k| (hit.1 - k.1).abs() <= tolerance);
        if !duplicate {
            kept.push(hit);
        }
    }
    kept
}
