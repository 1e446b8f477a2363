//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index over laid-out node
//! rectangles, used for pointer hit testing and viewport culling.

mod rtree;

pub use rtree::{NodeRect, SpatialIndex};
