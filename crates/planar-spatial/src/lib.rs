//! Spatial search structures for planar curve geometry.
//!
//! This crate provides the bounding-volume layer used by the curve engine:
//!
//! - [`BBox`] - Axis-aligned rectangle tagged with an owner id and a
//!   sub-position index
//! - [`AabbTree`] - Binary hierarchy over tagged boxes for pair and
//!   nearest-candidate queries
//!
//! The tags are opaque. A curve list usually tags each box with its own id
//! and the index of the segment the box encloses, so that the leaf pairs
//! returned by [`AabbTree::intersect`] map straight back to segment pairs.
//!
//! # Example
//!
//! ```
//! use planar_spatial::{AabbTree, BBox};
//! use nalgebra::Point2;
//!
//! let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 1, 2);
//! assert_eq!(bbox.x_min(), 0.0);
//! assert_eq!(bbox.y_min(), 0.0);
//! assert_eq!(bbox.x_max(), 1.0);
//! assert_eq!(bbox.y_max(), 1.0);
//! assert_eq!(bbox.id(), 1);
//! assert_eq!(bbox.ipos(), 2);
//!
//! let tree = AabbTree::build(vec![bbox]);
//! let near = tree.min_distance_candidates(&Point2::new(3.0, 0.5)).unwrap();
//! assert_eq!(near.len(), 1);
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
//! - `serde`: Enable serialization/deserialization for [`BBox`]

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bbox;
mod error;
mod tree;

pub use bbox::BBox;
pub use error::SpatialError;
pub use tree::AabbTree;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};
