//! Planar curves parameterized by arc length.
//!
//! This crate provides the curve primitives used for path planning and
//! road or track geometry in the plane:
//!
//! - [`LineSegment`] - Straight segment
//! - [`CircleArc`] - Arc of constant curvature
//! - [`Biarc`] - Two tangent arcs, fitted in closed form
//! - [`ClothoidCurve`] - Curvature varying linearly with arc length
//! - [`Curve`] - Sum type over the four for mixed-type code
//!
//! and the composite lists built from them: [`PolyLine`], [`BiarcList`] and
//! [`ClothoidList`], all instances of the generic [`CurveList`].
//!
//! # Core Traits
//!
//! All primitives implement [`PlanarCurve`], which provides:
//!
//! - **Evaluation**: position, heading and curvature at arc length `s`
//! - **Bounds**: bounding boxes of the whole curve or of a sub-range
//! - **Transforms**: reversal and rigid motions
//! - **Queries**: closest point and intersection with any other curve
//!
//! # Fitting
//!
//! - [`Biarc::build_g1`] and [`ClothoidCurve::build_g1`] join two points
//!   with prescribed headings (G1 Hermite data).
//! - [`ClothoidSplineBuilder`] interpolates a point sequence with a
//!   curvature-continuous (G2) clothoid spline, either with prescribed
//!   ends or with free end headings chosen by a [`SplineObjective`].
//!
//! Fitting reports iteration statistics through [`FitResult`].
//!
//! # Example
//!
//! ```
//! use planar_curves::{ClothoidCurve, ClothoidList, PlanarCurve};
//! use std::f64::consts::PI;
//!
//! let c = ClothoidCurve::new(1.0, 2.0, PI, 0.1, 0.01, 3.0).unwrap();
//! assert_eq!(c.kappa_begin(), 0.1);
//! assert!((c.kappa_end() - 0.13).abs() < 1e-15);
//!
//! let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let ys = [1.0, -1.0, 1.0, -1.0, 1.0];
//! let spline = ClothoidList::build_p2(&xs, &ys).unwrap();
//! assert!(spline.ok());
//! ```
//!
//! # Layer 0 Crate
//!
//! Pure math with no engine dependencies. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Embedded systems
//!
//! # Feature Flags
//!
//! - `serde` (default): Enable serialization/deserialization for all value
//!   types. Lists serialize their segments and validate continuity when
//!   read back.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

mod arc;
mod biarc;
mod clothoid;
mod config;
mod curve;
mod error;
mod fit;
mod fresnel;
mod g1;
mod intersect;
mod kernel;
mod line;
mod list;
mod objective;
mod solver;
mod spline;
mod traits;

// Re-export core types
pub use arc::CircleArc;
pub use biarc::Biarc;
pub use clothoid::ClothoidCurve;
pub use config::{FitConfig, IntersectConfig, InterpolationConfig, OptimizeConfig, SolverConfig};
pub use curve::Curve;
pub use error::CurveError;
pub use fit::{FitResult, FitStatus};
pub use fresnel::{FresnelMoments, fresnel_cs, fresnel_moments, generalized_fresnel};
pub use intersect::{collides, intersect_curves};
pub use kernel::{JOIN_TOLERANCE, PARAM_SLACK, angle_diff, cosc, normalize_angle, sinc};
pub use line::LineSegment;
pub use list::{BiarcList, ClothoidList, Continuity, CurveList, FitG1, ListSegment, PolyLine};
pub use objective::SplineObjective;
pub use solver::{FailureKind, Root, SolveFailure, bisection, newton, newton_bracketed};
pub use spline::{ClothoidSplineBuilder, EndCondition, SplineFit};
pub use traits::{ClosestPoint, PlanarCurve};

pub use planar_spatial::{AabbTree, BBox, SpatialError};

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry2, Point2, Vector2};

/// Result type for curve operations.
pub type Result<T> = std::result::Result<T, CurveError>;
