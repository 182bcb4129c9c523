//! Error types for spatial operations.

/// Errors that can occur during spatial operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// Box bounds are not finite or are inverted.
    #[error("invalid bounds: [{xmin}, {xmax}] x [{ymin}, {ymax}]")]
    InvalidBounds {
        /// Lower x bound.
        xmin: f64,
        /// Lower y bound.
        ymin: f64,
        /// Upper x bound.
        xmax: f64,
        /// Upper y bound.
        ymax: f64,
    },

    /// The tree holds no boxes.
    #[error("query on an empty tree")]
    EmptyTree,
}

impl SpatialError {
    /// Returns true if this is an invalid-bounds error.
    #[must_use]
    pub fn is_invalid_bounds(&self) -> bool {
        matches!(self, Self::InvalidBounds { .. })
    }

    /// Returns true if this is an empty-tree error.
    #[must_use]
    pub fn is_empty_tree(&self) -> bool {
        matches!(self, Self::EmptyTree)
    }
}
