//! Layout algorithms for the org chart.
//!
//! This module computes a screen position for every displayed node. Layout
//! runs in an orientation-agnostic frame (cross axis spreads siblings, main
//! axis points away from the root) and is remapped onto screen axes at the
//! end by the orientation's strategy table.

pub mod bounds;
pub mod compact;
pub mod flextree;
pub mod links;
pub mod orientation;

pub use bounds::{bounds, fit_transform, BoundingBox, FitTransform};
pub use compact::{CompactGroup, CompactMargins, CompactSlot, RECENTER_THRESHOLD};
pub use flextree::{FlexTreeConfig, FlexTreeLayout};
pub use orientation::{NodeBox, Orientation, OrientationBindings, Point, Size};

use crate::hierarchy::Record;
use crate::visibility::{DisplayNode, DisplayTree};

/// Supplies the rendered size of a record.
///
/// `None` falls back to the configured default node size.
pub trait SizeAccessor {
    fn size(&self, record: &Record) -> Option<Size>;
}

impl<F> SizeAccessor for F
where
    F: Fn(&Record) -> Option<Size>,
{
    fn size(&self, record: &Record) -> Option<Size> {
        self(record)
    }
}

/// Spacing and mode parameters for one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    pub compact: bool,
    /// Extra cross-axis room around every node.
    pub siblings_margin: f32,
    /// Main-axis gap between a parent and its children.
    pub children_margin: f32,
    /// Cross-axis gap between adjacent nodes with different parents.
    pub neighbour_margin: f32,
    pub compact_margin_pair: f32,
    pub compact_margin_between: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Top,
            compact: false,
            siblings_margin: 20.0,
            children_margin: 60.0,
            neighbour_margin: 80.0,
            compact_margin_pair: 100.0,
            compact_margin_between: 20.0,
        }
    }
}

impl LayoutConfig {
    fn compact_margins(&self) -> CompactMargins {
        CompactMargins {
            pair: self.compact_margin_pair,
            between: self.compact_margin_between,
        }
    }
}

/// The shape handed to the layout pass: ordered children and sizes.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    pub root: usize,
    pub children: Vec<Vec<usize>>,
    pub sizes: Vec<Size>,
}

impl LayoutTree {
    /// Mirror `display`, sizing each node with `size_of`. Indices match the
    /// display tree's.
    pub fn from_display(display: &DisplayTree, mut size_of: impl FnMut(&DisplayNode) -> Size) -> Self {
        let mut children = Vec::with_capacity(display.len());
        let mut sizes = Vec::with_capacity(display.len());
        for node in display.nodes() {
            children.push(node.children().to_vec());
            sizes.push(size_of(node));
        }
        Self {
            root: display.root(),
            children,
            sizes,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Layout output, indexed like the [`LayoutTree`].
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    /// Screen-space anchor and size of every node.
    pub nodes: Vec<NodeBox>,
    /// Grid cell for compact members.
    pub compact: Vec<Option<CompactSlot>>,
    pub groups: Vec<CompactGroup>,
}

/// The layout engine.
pub struct Layout {
    config: LayoutConfig,
}

impl Layout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for every node of `tree`.
    pub fn compute(&self, tree: &LayoutTree) -> LayoutResult {
        let n = tree.len();
        if n == 0 {
            return LayoutResult::default();
        }
        let b = self.config.orientation.bindings();
        let cross: Vec<f32> = tree.sizes.iter().map(|&s| (b.cross_size)(s)).collect();
        let main: Vec<f32> = tree.sizes.iter().map(|&s| (b.main_size)(s)).collect();

        let mut footprints: Vec<[f32; 2]> = cross
            .iter()
            .zip(&main)
            .map(|(&c, &m)| [c + self.config.siblings_margin, m + self.config.children_margin])
            .collect();

        let margins = self.config.compact_margins();
        let groups = if self.config.compact {
            compact::pack(&tree.children, &cross, &main, margins)
        } else {
            Vec::new()
        };
        let mut slots: Vec<Option<CompactSlot>> = vec![None; n];
        for group in &groups {
            for (i, &m) in group.members.iter().enumerate() {
                footprints[m] = group.footprint(i);
                slots[m] = Some(group.slot(i));
            }
        }

        let flex = FlexTreeLayout::new(FlexTreeConfig {
            neighbour_separation: self.config.neighbour_margin,
        })
        .compute(tree.root, &tree.children, &footprints);
        let placed = flex.node_count;
        let (mut x, mut y) = (flex.positions_x, flex.positions_y);
        compact::position(&groups, &mut x, &mut y, margins);

        let nodes = (0..n)
            .map(|i| {
                let p = (b.remap_axes)(Point::new(x[i], y[i]));
                NodeBox::new(p.x, p.y, tree.sizes[i])
            })
            .collect();

        tracing::debug!(
            nodes = n,
            placed,
            compact_groups = groups.len(),
            orientation = ?self.config.orientation,
            "layout complete"
        );
        LayoutResult {
            nodes,
            compact: slots,
            groups,
        }
    }
}

/// Lay out `tree` with `config`.
pub fn layout(tree: &LayoutTree, config: &LayoutConfig) -> LayoutResult {
    Layout::new(config.clone()).compute(tree)
}
