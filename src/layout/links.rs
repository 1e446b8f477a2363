//! Link endpoint selection.
//!
//! Picks the anchor points for parent/child links and cross-tree connections
//! from the orientation table, then hands them to the path generators.

use super::compact::CompactSlot;
use super::orientation::{NodeBox, Orientation, Point};
use crate::path::{self, LinkOffsets, PathDescription};

/// A compact member's link is routed through its block's spine.
#[derive(Debug, Clone, Copy)]
pub struct CompactRoute<'a> {
    pub first: &'a NodeBox,
    pub slot: CompactSlot,
    pub pair_margin: f32,
}

pub fn route_link(
    orientation: Orientation,
    child: &NodeBox,
    parent: &NodeBox,
    compact: Option<CompactRoute<'_>>,
    offsets: LinkOffsets,
) -> PathDescription {
    let b = orientation.bindings();
    let target = Point::new((b.link_parent_x)(parent), (b.link_parent_y)(parent));
    let (source, via) = match compact {
        Some(route) => {
            let even = route.slot.is_even();
            let mid = (b.compact_link_mid)(route.first, route.slot.block_cross, route.pair_margin);
            let via = Point::new(
                (b.link_compact_x_start)(child, even),
                (b.link_compact_y_start)(child, even),
            );
            (mid, Some(via))
        }
        None => (Point::new((b.link_x)(child), (b.link_y)(child)), None),
    };
    (b.diagonal)(source, target, via, offsets)
}

/// Arc between two displayed nodes, plus the label anchor at its midpoint.
pub fn route_connection(orientation: Orientation, from: &NodeBox, to: &NodeBox) -> (PathDescription, Point) {
    let b = orientation.bindings();
    let source = Point::new((b.link_x)(from), (b.link_y)(from));
    let target = Point::new((b.link_join_x)(to), (b.link_join_y)(to));
    let label = Point::new((source.x + target.x) / 2.0, (source.y + target.y) / 2.0);
    (path::connection_arc(source, target), label)
}
