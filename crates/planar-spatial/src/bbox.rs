//! Tagged axis-aligned bounding boxes.
//!
//! A [`BBox`] is the unit of every spatial search in the curve engine. Besides
//! its bounds it carries two opaque tags: `id`, naming the owning curve, and
//! `ipos`, the index of the piece of that curve the box encloses.
//!
//! # Example
//!
//! ```
//! use planar_spatial::BBox;
//! use nalgebra::Point2;
//!
//! let a = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 1, 2);
//! let b = BBox::new(Point2::new(0.5, 0.5), Point2::new(2.0, 2.0), 3, 0);
//!
//! assert!(a.overlaps(&b));
//! assert_eq!(a.id(), 1);
//! assert_eq!(a.ipos(), 2);
//! ```

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SpatialError;

/// An axis-aligned bounding rectangle tagged with an owner id and a
/// sub-position index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    id: usize,
    ipos: usize,
}

impl BBox {
    /// Creates a box from two corners.
    ///
    /// The corners are reordered if necessary.
    ///
    /// # Example
    ///
    /// ```
    /// use planar_spatial::BBox;
    /// use nalgebra::Point2;
    ///
    /// let bbox = BBox::new(Point2::new(1.0, 1.0), Point2::new(0.0, 0.0), 1, 2);
    /// assert_eq!(bbox.x_min(), 0.0);
    /// assert_eq!(bbox.y_max(), 1.0);
    /// ```
    #[must_use]
    pub fn new(a: Point2<f64>, b: Point2<f64>, id: usize, ipos: usize) -> Self {
        Self {
            xmin: a.x.min(b.x),
            ymin: a.y.min(b.y),
            xmax: a.x.max(b.x),
            ymax: a.y.max(b.y),
            id,
            ipos,
        }
    }

    /// Creates a box from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBounds`] if a bound is not finite or a
    /// lower bound exceeds its upper bound.
    pub fn from_bounds(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        id: usize,
        ipos: usize,
    ) -> Result<Self, SpatialError> {
        let finite = xmin.is_finite() && ymin.is_finite() && xmax.is_finite() && ymax.is_finite();
        if !finite || xmin > xmax || ymin > ymax {
            return Err(SpatialError::InvalidBounds {
                xmin,
                ymin,
                xmax,
                ymax,
            });
        }
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
            id,
            ipos,
        })
    }

    /// Creates a degenerate box holding a single point.
    #[must_use]
    pub fn from_point(p: Point2<f64>, id: usize, ipos: usize) -> Self {
        Self::new(p, p, id, ipos)
    }

    /// Smallest box enclosing all points, or `None` if there are none.
    #[must_use]
    pub fn enclosing<I>(points: I, id: usize, ipos: usize) -> Option<Self>
    where
        I: IntoIterator<Item = Point2<f64>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(first, id, ipos);
        for p in iter {
            bbox.extend(&p);
        }
        Some(bbox)
    }

    /// Smallest box enclosing all boxes, tagged like the first one.
    #[must_use]
    pub fn join_all<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut iter = boxes.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, b| acc.join(b)))
    }

    /// Lower x bound.
    #[must_use]
    pub const fn x_min(&self) -> f64 {
        self.xmin
    }

    /// Lower y bound.
    #[must_use]
    pub const fn y_min(&self) -> f64 {
        self.ymin
    }

    /// Upper x bound.
    #[must_use]
    pub const fn x_max(&self) -> f64 {
        self.xmax
    }

    /// Upper y bound.
    #[must_use]
    pub const fn y_max(&self) -> f64 {
        self.ymax
    }

    /// Owner tag.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Sub-position tag.
    #[must_use]
    pub const fn ipos(&self) -> usize {
        self.ipos
    }

    /// Returns a copy with different tags.
    #[must_use]
    pub const fn with_tag(mut self, id: usize, ipos: usize) -> Self {
        self.id = id;
        self.ipos = ipos;
        self
    }

    /// Lower-left corner.
    #[must_use]
    pub fn min(&self) -> Point2<f64> {
        Point2::new(self.xmin, self.ymin)
    }

    /// Upper-right corner.
    #[must_use]
    pub fn max(&self) -> Point2<f64> {
        Point2::new(self.xmax, self.ymax)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.xmin + self.xmax) * 0.5,
            (self.ymin + self.ymax) * 0.5,
        )
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vector2<f64> {
        Vector2::new(self.xmax - self.xmin, self.ymax - self.ymin)
    }

    /// Area of the box.
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.xmax - self.xmin) * (self.ymax - self.ymin)
    }

    /// Length of the diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    /// Grows the box to include a point.
    pub fn extend(&mut self, p: &Point2<f64>) {
        self.xmin = self.xmin.min(p.x);
        self.ymin = self.ymin.min(p.y);
        self.xmax = self.xmax.max(p.x);
        self.ymax = self.ymax.max(p.y);
    }

    /// Union of two boxes. The result keeps the tags of `self`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
            id: self.id,
            ipos: self.ipos,
        }
    }

    /// Returns the box grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            xmin: self.xmin - margin,
            ymin: self.ymin - margin,
            xmax: self.xmax + margin,
            ymax: self.ymax + margin,
            ..*self
        }
    }

    /// Checks whether two boxes overlap. Touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    /// Checks if a point is inside the box. The boundary is inside.
    #[must_use]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Distance from a point to the box, zero for points inside.
    ///
    /// # Example
    ///
    /// ```
    /// use planar_spatial::BBox;
    /// use nalgebra::Point2;
    ///
    /// let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 0, 0);
    /// assert_eq!(bbox.distance(&Point2::new(0.5, 0.5)), 0.0);
    /// assert_eq!(bbox.distance(&Point2::new(4.0, 5.0)), 5.0);
    /// ```
    #[must_use]
    pub fn distance(&self, p: &Point2<f64>) -> f64 {
        let dx = (self.xmin - p.x).max(0.0).max(p.x - self.xmax);
        let dy = (self.ymin - p.y).max(0.0).max(p.y - self.ymax);
        dx.hypot(dy)
    }

    /// Distance from a point to the farthest corner of the box.
    ///
    /// Any point of anything enclosed by the box is at most this far away.
    #[must_use]
    pub fn max_distance(&self, p: &Point2<f64>) -> f64 {
        let dx = (p.x - self.xmin).abs().max((p.x - self.xmax).abs());
        let dy = (p.y - self.ymin).abs().max((p.y - self.ymax).abs());
        dx.hypot(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_accessors() {
        let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 1, 2);
        assert_eq!(bbox.x_min(), 0.0);
        assert_eq!(bbox.y_min(), 0.0);
        assert_eq!(bbox.x_max(), 1.0);
        assert_eq!(bbox.y_max(), 1.0);
        assert_eq!(bbox.id(), 1);
        assert_eq!(bbox.ipos(), 2);
    }

    #[test]
    fn test_bbox_new_reorders() {
        let bbox = BBox::new(Point2::new(3.0, -1.0), Point2::new(-2.0, 4.0), 0, 0);
        assert_eq!(bbox.min(), Point2::new(-2.0, -1.0));
        assert_eq!(bbox.max(), Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_from_bounds_validation() {
        assert!(BBox::from_bounds(0.0, 0.0, 1.0, 1.0, 0, 0).is_ok());
        let err = BBox::from_bounds(1.0, 0.0, 0.0, 1.0, 0, 0).unwrap_err();
        assert!(err.is_invalid_bounds());
        assert!(BBox::from_bounds(f64::NAN, 0.0, 1.0, 1.0, 0, 0).is_err());
    }

    #[test]
    fn test_enclosing() {
        let pts = [
            Point2::new(1.0, 2.0),
            Point2::new(-1.0, 0.5),
            Point2::new(0.0, 3.0),
        ];
        let bbox = BBox::enclosing(pts, 7, 0).unwrap();
        assert_eq!(bbox.min(), Point2::new(-1.0, 0.5));
        assert_eq!(bbox.max(), Point2::new(1.0, 3.0));
        assert_eq!(bbox.id(), 7);
        assert!(BBox::enclosing(std::iter::empty(), 0, 0).is_none());
    }

    #[test]
    fn test_join_keeps_tags() {
        let a = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 1, 2);
        let b = BBox::new(Point2::new(2.0, -1.0), Point2::new(3.0, 0.5), 5, 6);
        let j = a.join(&b);
        assert_eq!(j.min(), Point2::new(0.0, -1.0));
        assert_eq!(j.max(), Point2::new(3.0, 1.0));
        assert_eq!((j.id(), j.ipos()), (1, 2));

        let all = BBox::join_all([&b, &a]).unwrap();
        assert_eq!(all.id(), 5);
        assert_eq!(all.area(), 6.0);
    }

    #[test]
    fn test_overlaps() {
        let a = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 0, 0);
        let touching = BBox::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0), 0, 0);
        let apart = BBox::new(Point2::new(1.5, 0.0), Point2::new(2.0, 1.0), 0, 0);
        assert!(a.overlaps(&touching));
        assert!(touching.overlaps(&a));
        assert!(!a.overlaps(&apart));
    }

    #[test]
    fn test_distances() {
        let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(2.0, 1.0), 0, 0);
        assert_eq!(bbox.distance(&Point2::new(1.0, 0.5)), 0.0);
        assert_eq!(bbox.distance(&Point2::new(-3.0, 0.5)), 3.0);
        assert_eq!(bbox.distance(&Point2::new(1.0, 4.0)), 3.0);
        assert_eq!(bbox.distance(&Point2::new(5.0, 5.0)), 5.0);
        assert_relative_eq!(bbox.max_distance(&Point2::new(-1.0, 0.0)), 10f64.sqrt());
        assert_relative_eq!(bbox.diagonal(), 5f64.sqrt());
    }

    #[test]
    fn test_inflated_and_center() {
        let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0), 3, 4).inflated(0.5);
        assert_eq!(bbox.min(), Point2::new(-0.5, -0.5));
        assert_eq!(bbox.center(), Point2::new(1.0, 1.0));
        assert_eq!(bbox.ipos(), 4);
        assert!(bbox.contains(&Point2::new(2.5, 2.5)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let bbox = BBox::new(Point2::new(0.1, -0.3), Point2::new(1.0 / 3.0, 2.5), 4, 9);
        let json = serde_json::to_string(&bbox).unwrap();
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
        assert_eq!((back.id(), back.ipos()), (4, 9));
        assert_relative_eq!(back.area(), bbox.area(), epsilon = 1e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_field_names() {
        let bbox = BBox::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), 1, 2);
        let value = serde_json::to_value(bbox).unwrap();
        assert_eq!(value["xmax"], 1.0);
        assert_eq!(value["ipos"], 2);
    }
}
