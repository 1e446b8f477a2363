//! Orientation strategy tables.
//!
//! Layout runs in a frame where the cross axis spreads siblings and the main
//! axis points away from the root. Each orientation supplies one static table
//! of pure functions that map that frame and node boxes onto screen axes.
//! Every table has the same shape, so layout and path code never branch on the
//! orientation directly.
//!
//! Screen anchors per orientation (the `x, y` stored on a [`NodeBox`]):
//! - top: horizontal center, top edge
//! - bottom: horizontal center, bottom edge
//! - left: left edge, vertical center
//! - right: right edge, vertical center

use serde::{Deserialize, Serialize};

use crate::path::{self, LinkOffsets, PathDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Root at the top, tree grows downward.
    #[default]
    Top,
    Bottom,
    /// Root on the left, tree grows rightward.
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// The strategy table for this orientation.
    pub fn bindings(self) -> &'static OrientationBindings {
        match self {
            Self::Top => &TOP,
            Self::Bottom => &BOTTOM,
            Self::Left => &LEFT,
            Self::Right => &RIGHT,
        }
    }

    /// Whether the main axis runs vertically on screen.
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A laid-out node in screen space: orientation anchor plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeBox {
    #[inline]
    pub fn new(x: f32, y: f32, size: Size) -> Self {
        Self {
            x,
            y,
            width: size.width,
            height: size.height,
        }
    }
}

pub type PathFn = fn(Point, Point, Option<Point>, LinkOffsets) -> PathDescription;

/// Axis-mapping functions for one orientation.
///
/// Edge functions (`node_*`) are offsets from the anchor; link functions
/// return absolute screen coordinates.
pub struct OrientationBindings {
    pub node_left_x: fn(&NodeBox) -> f32,
    pub node_right_x: fn(&NodeBox) -> f32,
    pub node_top_y: fn(&NodeBox) -> f32,
    pub node_bottom_y: fn(&NodeBox) -> f32,
    /// Where links leave a child, toward its parent.
    pub link_x: fn(&NodeBox) -> f32,
    pub link_y: fn(&NodeBox) -> f32,
    /// The side of a node facing its children.
    pub link_join_x: fn(&NodeBox) -> f32,
    pub link_join_y: fn(&NodeBox) -> f32,
    /// Where a child's link lands on its parent.
    pub link_parent_x: fn(&NodeBox) -> f32,
    pub link_parent_y: fn(&NodeBox) -> f32,
    /// Inner side of a compact member, facing the block's spine. The flag is
    /// true for column 0.
    pub link_compact_x_start: fn(&NodeBox, bool) -> f32,
    pub link_compact_y_start: fn(&NodeBox, bool) -> f32,
    /// Top of the compact block's spine, given the first member, the block's
    /// cross extent and the pair margin.
    pub compact_link_mid: fn(&NodeBox, f32, f32) -> Point,
    pub cross_size: fn(Size) -> f32,
    pub main_size: fn(Size) -> f32,
    /// Frame `(cross, main)` to screen `(x, y)`.
    pub remap_axes: fn(Point) -> Point,
    pub diagonal: PathFn,
    /// Top-left corner of the node's rectangle.
    pub top_left: fn(&NodeBox) -> Point,
}

impl OrientationBindings {
    /// Screen-space rectangle `(min, max)` covered by `node`.
    pub fn rect(&self, node: &NodeBox) -> (Point, Point) {
        let min = Point::new(
            node.x + (self.node_left_x)(node),
            node.y + (self.node_top_y)(node),
        );
        let max = Point::new(
            node.x + (self.node_right_x)(node),
            node.y + (self.node_bottom_y)(node),
        );
        (min, max)
    }
}

fn width(s: Size) -> f32 {
    s.width
}

fn height(s: Size) -> f32 {
    s.height
}

fn half_side(even: bool, extent: f32) -> f32 {
    if even { extent / 2.0 } else { -extent / 2.0 }
}

static TOP: OrientationBindings = OrientationBindings {
    node_left_x: |n| -n.width / 2.0,
    node_right_x: |n| n.width / 2.0,
    node_top_y: |_| 0.0,
    node_bottom_y: |n| n.height,
    link_x: |n| n.x,
    link_y: |n| n.y,
    link_join_x: |n| n.x,
    link_join_y: |n| n.y + n.height,
    link_parent_x: |p| p.x,
    link_parent_y: |p| p.y + p.height,
    link_compact_x_start: |n, even| n.x + half_side(even, n.width),
    link_compact_y_start: |n, _| n.y + n.height / 2.0,
    compact_link_mid: |first, block, pair| {
        Point::new(first.x + block / 4.0 + pair / 4.0, first.y)
    },
    cross_size: width,
    main_size: height,
    remap_axes: |p| Point::new(p.x, p.y),
    diagonal: path::diagonal,
    top_left: |n| Point::new(n.x - n.width / 2.0, n.y),
};

static BOTTOM: OrientationBindings = OrientationBindings {
    node_left_x: |n| -n.width / 2.0,
    node_right_x: |n| n.width / 2.0,
    node_top_y: |n| -n.height,
    node_bottom_y: |_| 0.0,
    link_x: |n| n.x,
    link_y: |n| n.y,
    link_join_x: |n| n.x,
    link_join_y: |n| n.y - n.height,
    link_parent_x: |p| p.x,
    link_parent_y: |p| p.y - p.height,
    link_compact_x_start: |n, even| n.x + half_side(even, n.width),
    link_compact_y_start: |n, _| n.y - n.height / 2.0,
    compact_link_mid: |first, block, pair| {
        Point::new(first.x + block / 4.0 + pair / 4.0, first.y)
    },
    cross_size: width,
    main_size: height,
    remap_axes: |p| Point::new(p.x, -p.y),
    diagonal: path::diagonal,
    top_left: |n| Point::new(n.x - n.width / 2.0, n.y - n.height),
};

static LEFT: OrientationBindings = OrientationBindings {
    node_left_x: |_| 0.0,
    node_right_x: |n| n.width,
    node_top_y: |n| -n.height / 2.0,
    node_bottom_y: |n| n.height / 2.0,
    link_x: |n| n.x,
    link_y: |n| n.y,
    link_join_x: |n| n.x + n.width,
    link_join_y: |n| n.y,
    link_parent_x: |p| p.x + p.width,
    link_parent_y: |p| p.y,
    link_compact_x_start: |n, _| n.x + n.width / 2.0,
    link_compact_y_start: |n, even| n.y + half_side(even, n.height),
    compact_link_mid: |first, block, pair| {
        Point::new(first.x, first.y + block / 4.0 + pair / 4.0)
    },
    cross_size: height,
    main_size: width,
    remap_axes: |p| Point::new(p.y, p.x),
    diagonal: path::hdiagonal,
    top_left: |n| Point::new(n.x, n.y - n.height / 2.0),
};

static RIGHT: OrientationBindings = OrientationBindings {
    node_left_x: |n| -n.width,
    node_right_x: |_| 0.0,
    node_top_y: |n| -n.height / 2.0,
    node_bottom_y: |n| n.height / 2.0,
    link_x: |n| n.x,
    link_y: |n| n.y,
    link_join_x: |n| n.x - n.width,
    link_join_y: |n| n.y,
    link_parent_x: |p| p.x - p.width,
    link_parent_y: |p| p.y,
    link_compact_x_start: |n, _| n.x - n.width / 2.0,
    link_compact_y_start: |n, even| n.y + half_side(even, n.height),
    compact_link_mid: |first, block, pair| {
        Point::new(first.x, first.y + block / 4.0 + pair / 4.0)
    },
    cross_size: height,
    main_size: width,
    remap_axes: |p| Point::new(-p.y, p.x),
    diagonal: path::hdiagonal,
    top_left: |n| Point::new(n.x - n.width, n.y - n.height / 2.0),
};
