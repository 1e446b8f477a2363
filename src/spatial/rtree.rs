//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries over laid-out node rectangles:
//! - Point hit testing
//! - Rectangle intersection (viewport culling)
//! - Nearest node

use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

/// A node's screen rectangle with its layout slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRect {
    /// Index into the layout output.
    pub slot: usize,
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl NodeRect {
    pub fn new(slot: usize, min: [f32; 2], max: [f32; 2]) -> Self {
        Self { slot, min, max }
    }
}

impl RTreeObject for NodeRect {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl PointDistance for NodeRect {
    /// Zero inside the rectangle, squared distance to the nearest edge outside.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        self.envelope().distance_2(point)
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.envelope().contains_point(point)
    }
}

/// Spatial index for laid-out nodes.
///
/// Uses an R*-tree, bulk loaded after every layout pass.
pub struct SpatialIndex {
    tree: RTree<NodeRect>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
        }
    }

    /// Every node whose rectangle contains the point, in slot order.
    pub fn at_point(&self, x: f32, y: f32) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_all_at_point(&[x, y])
            .map(|rect| rect.slot)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Find the nearest node within a maximum distance of its rectangle.
    ///
    /// A point inside a rectangle is at distance zero.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<usize> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|rect| rect.distance_2(&[x, y]) <= max_distance_sq)
            .map(|rect| rect.slot)
    }

    /// Find all nodes intersecting a rectangle.
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|rect| rect.slot)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Replace the index contents.
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild(&mut self, rects: Vec<NodeRect>) {
        self.tree = RTree::bulk_load(rects);
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
