//! Bounding-box hierarchy over tagged boxes.
//!
//! The tree is built top-down: each branch splits its boxes on the longer
//! axis of their union at the midpoint, and falls back to halving the sorted
//! list when the midpoint split would leave one side empty. Leaves hold the
//! original boxes with their tags intact, so query results can be mapped back
//! to the owning curve pieces.
//!
//! # Example
//!
//! ```
//! use planar_spatial::{AabbTree, BBox};
//! use nalgebra::Point2;
//!
//! let row = |y: f64, id: usize| -> Vec<BBox> {
//!     (0..4)
//!         .map(|i| {
//!             let x = f64::from(i);
//!             BBox::new(Point2::new(x, y), Point2::new(x + 1.0, y + 0.1), id, i as usize)
//!         })
//!         .collect()
//! };
//!
//! let a = AabbTree::build(row(0.0, 0));
//! let b = AabbTree::build(row(0.05, 1));
//! let pairs = a.intersect(&b);
//! assert!(!pairs.is_empty());
//! ```

use nalgebra::Point2;
use tracing::trace;

use crate::bbox::BBox;
use crate::error::SpatialError;

#[derive(Debug, Clone)]
enum Node {
    Leaf(BBox),
    Branch {
        bbox: BBox,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn bbox(&self) -> &BBox {
        match self {
            Self::Leaf(b) | Self::Branch { bbox: b, .. } => b,
        }
    }

    fn build(mut boxes: Vec<BBox>) -> Option<Self> {
        if boxes.len() <= 1 {
            return boxes.pop().map(Self::Leaf);
        }

        let bbox = BBox::join_all(&boxes)?;
        let size = bbox.size();
        let split_x = size.x >= size.y;
        let key = move |b: &BBox| {
            let c = b.center();
            if split_x { c.x } else { c.y }
        };
        let mid = if split_x {
            bbox.center().x
        } else {
            bbox.center().y
        };

        let (mut left, mut right): (Vec<BBox>, Vec<BBox>) =
            boxes.into_iter().partition(|b| key(b) < mid);

        if left.is_empty() || right.is_empty() {
            let mut all = if left.is_empty() { right } else { left };
            all.sort_by(|a, b| key(a).total_cmp(&key(b)));
            right = all.split_off(all.len() / 2);
            left = all;
        }

        let left = Self::build(left)?;
        let right = Self::build(right)?;
        Some(Self::Branch {
            bbox,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a BBox>) {
        match self {
            Self::Leaf(b) => out.push(b),
            Self::Branch { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }
}

/// A binary bounding-box hierarchy.
#[derive(Debug, Clone, Default)]
pub struct AabbTree {
    root: Option<Node>,
    len: usize,
}

impl AabbTree {
    /// Builds a tree over the given boxes.
    #[must_use]
    pub fn build(boxes: Vec<BBox>) -> Self {
        let len = boxes.len();
        let root = Node::build(boxes);
        trace!(leaves = len, "built bbox tree");
        Self { root, len }
    }

    /// Number of leaf boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no boxes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Box enclosing every leaf.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyTree`] if the tree has no boxes.
    pub fn bbox(&self) -> Result<BBox, SpatialError> {
        self.root
            .as_ref()
            .map(|n| *n.bbox())
            .ok_or(SpatialError::EmptyTree)
    }

    /// All leaf boxes in tree order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&BBox> {
        let mut out = Vec::with_capacity(self.len);
        if let Some(root) = &self.root {
            root.collect_leaves(&mut out);
        }
        out
    }

    /// Pairs of overlapping leaf boxes, `(self leaf, other leaf)`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Vec<(BBox, BBox)> {
        let mut pairs = Vec::new();
        let (Some(a), Some(b)) = (&self.root, &other.root) else {
            return pairs;
        };

        let mut stack = vec![(a, b)];
        while let Some((na, nb)) = stack.pop() {
            if !na.bbox().overlaps(nb.bbox()) {
                continue;
            }
            match (na, nb) {
                (Node::Leaf(la), Node::Leaf(lb)) => pairs.push((*la, *lb)),
                (Node::Leaf(_), Node::Branch { left, right, .. }) => {
                    stack.push((na, &**left));
                    stack.push((na, &**right));
                }
                (Node::Branch { left, right, .. }, Node::Leaf(_)) => {
                    stack.push((&**left, nb));
                    stack.push((&**right, nb));
                }
                (
                    Node::Branch {
                        bbox: ba,
                        left: la,
                        right: ra,
                    },
                    Node::Branch {
                        bbox: bb,
                        left: lb,
                        right: rb,
                    },
                ) => {
                    if ba.area() >= bb.area() {
                        stack.push((&**la, nb));
                        stack.push((&**ra, nb));
                    } else {
                        stack.push((na, &**lb));
                        stack.push((na, &**rb));
                    }
                }
            }
        }
        trace!(pairs = pairs.len(), "bbox tree intersection");
        pairs
    }

    /// Leaf boxes that may enclose the point closest to `p`.
    ///
    /// Every leaf encloses part of some geometry, so the smallest
    /// [`BBox::max_distance`] over the leaves bounds the distance to the
    /// closest point. Leaves farther away than that bound are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyTree`] if the tree has no boxes.
    pub fn min_distance_candidates(&self, p: &Point2<f64>) -> Result<Vec<BBox>, SpatialError> {
        let root = self.root.as_ref().ok_or(SpatialError::EmptyTree)?;

        let mut bound = f64::INFINITY;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.bbox().distance(p) > bound {
                continue;
            }
            match node {
                Node::Leaf(b) => bound = bound.min(b.max_distance(p)),
                Node::Branch { left, right, .. } => {
                    stack.push(&**left);
                    stack.push(&**right);
                }
            }
        }

        let mut candidates = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.bbox().distance(p) > bound {
                continue;
            }
            match node {
                Node::Leaf(b) => candidates.push(*b),
                Node::Branch { left, right, .. } => {
                    stack.push(&**left);
                    stack.push(&**right);
                }
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f64, y: f64, id: usize, ipos: usize) -> BBox {
        BBox::new(Point2::new(x, y), Point2::new(x + 1.0, y + 1.0), id, ipos)
    }

    #[test]
    fn test_empty_tree() {
        let tree = AabbTree::build(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.bbox().unwrap_err().is_empty_tree());
        assert!(tree.intersect(&tree).is_empty());
        assert!(tree.min_distance_candidates(&Point2::origin()).is_err());
    }

    #[test]
    fn test_build_keeps_all_leaves() {
        let boxes: Vec<_> = (0..17)
            .map(|i| unit_box(f64::from(i) * 0.7, f64::from(i % 3), 0, i as usize))
            .collect();
        let tree = AabbTree::build(boxes);
        assert_eq!(tree.len(), 17);
        let mut ipos: Vec<_> = tree.leaves().iter().map(|b| b.ipos()).collect();
        ipos.sort_unstable();
        assert_eq!(ipos, (0..17).collect::<Vec<_>>());

        let bbox = tree.bbox().unwrap();
        assert_eq!(bbox.x_min(), 0.0);
        assert_eq!(bbox.y_max(), 3.0);
    }

    #[test]
    fn test_build_identical_boxes() {
        let boxes = vec![unit_box(0.0, 0.0, 0, 0); 9];
        let tree = AabbTree::build(boxes);
        assert_eq!(tree.leaves().len(), 9);
    }

    #[test]
    fn test_intersect_matches_brute_force() {
        let a: Vec<_> = (0..10)
            .map(|i| unit_box(f64::from(i), 0.0, 1, i as usize))
            .collect();
        let b: Vec<_> = (0..10)
            .map(|i| unit_box(f64::from(i) * 0.5 + 0.25, 0.5 * f64::from(i % 2), 2, i as usize))
            .collect();

        let mut expected: Vec<_> = a
            .iter()
            .flat_map(|x| b.iter().filter(|y| x.overlaps(y)).map(|y| (x.ipos(), y.ipos())))
            .collect();
        expected.sort_unstable();

        let ta = AabbTree::build(a);
        let tb = AabbTree::build(b);
        let mut got: Vec<_> = ta
            .intersect(&tb)
            .into_iter()
            .map(|(x, y)| {
                assert_eq!((x.id(), y.id()), (1, 2));
                (x.ipos(), y.ipos())
            })
            .collect();
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_disjoint_trees() {
        let ta = AabbTree::build(vec![unit_box(0.0, 0.0, 0, 0), unit_box(2.0, 0.0, 0, 1)]);
        let tb = AabbTree::build(vec![unit_box(0.0, 5.0, 1, 0)]);
        assert!(ta.intersect(&tb).is_empty());
    }

    #[test]
    fn test_min_distance_candidates() {
        let boxes: Vec<_> = (0..8)
            .map(|i| unit_box(f64::from(i) * 3.0, 0.0, 0, i as usize))
            .collect();
        let tree = AabbTree::build(boxes);
        let candidates = tree
            .min_distance_candidates(&Point2::new(6.5, 0.5))
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ipos(), 2);

        let between = tree
            .min_distance_candidates(&Point2::new(8.0, 0.5))
            .unwrap();
        let mut ipos: Vec<_> = between.iter().map(|b| b.ipos()).collect();
        ipos.sort_unstable();
        assert_eq!(ipos, vec![2, 3]);
    }
}
