//! OrgChart - the chart controller.
//!
//! Owns the record list, the per-node flag table and the cross-tree
//! connections. Every mutation is validated against a freshly built tree
//! before it is committed, and every `render` rebuilds the visible tree, the
//! display tree and the layout from scratch.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::output::{
    ChartConnection, ChartLayout, ChartLink, ChartNode, CompactInfo, Focus, NodeRef,
};
use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::hierarchy::{Connection, KeyFields, NodeKey, Record, Tree, TreeBuilder};
use crate::layout::links::{self, CompactRoute};
use crate::layout::{self, BoundingBox, FitTransform, LayoutResult, LayoutTree, NodeBox, SizeAccessor};
use crate::path::LinkOffsets;
use crate::spatial::{NodeRect, SpatialIndex};
use crate::visibility::{
    expansion, resolver, DisplayKind, DisplayTree, FlagTable, HiddenSet, VisibilityState,
};

/// The org chart controller.
///
/// This struct manages:
/// - The caller's records, in input order
/// - Expansion, focus, highlight and paging flags keyed by node id
/// - Cross-tree connections
/// - The last render pass and a spatial index over it
pub struct OrgChart {
    config: ChartConfig,

    /// Id field names the current records were keyed with.
    key_fields: KeyFields,

    /// Records in input order. Arena indices of `tree` follow this order.
    records: Vec<Record>,

    /// Full tree over `records`; `None` while the chart is empty.
    tree: Option<Tree>,

    /// Per-node state, keyed by id so it survives tree rebuilds.
    flags: FlagTable,

    connections: Vec<Connection>,

    /// Per-record size override.
    sizer: Option<Box<dyn SizeAccessor>>,

    /// Node the next render should report as its focus.
    pending_focus: Option<NodeKey>,

    last_layout: Option<ChartLayout>,

    /// Hit testing over `last_layout`, indexed by node slot.
    spatial: SpatialIndex,
}

impl OrgChart {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            key_fields: config.key_fields(),
            config,
            records: Vec::new(),
            tree: None,
            flags: FlagTable::new(),
            connections: Vec::new(),
            sizer: None,
            pending_focus: None,
            last_layout: None,
            spatial: SpatialIndex::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Replace the configuration. Id field names apply from the next
    /// `set_data`.
    pub fn set_config(&mut self, config: ChartConfig) {
        self.config = config;
    }

    pub fn set_size_accessor(&mut self, sizer: impl SizeAccessor + 'static) {
        self.sizer = Some(Box::new(sizer));
    }

    pub fn clear_size_accessor(&mut self) {
        self.sizer = None;
    }

    /// Current records, in input order.
    #[inline]
    pub fn data(&self) -> &[Record] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> &FlagTable {
        &self.flags
    }

    pub fn contains(&self, id: &NodeKey) -> bool {
        self.tree.as_ref().is_some_and(|t| t.contains(id))
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace every record.
    ///
    /// On error the previous records and flags are kept. On success all flags
    /// are reset: nodes shallower than `initial_expand_level` start expanded,
    /// and payload seeds (`_expanded`, `_centered`, `_highlighted`,
    /// `_upToTheRootHighlighted`) are applied on top.
    pub fn set_data(&mut self, payloads: Vec<Value>) -> Result<()> {
        let key_fields = self.config.key_fields();
        let records = key_fields.extract_all(payloads)?;
        let tree = TreeBuilder::build(&records)?;

        self.flags.clear();
        self.pending_focus = None;
        expansion::apply_initial_expansion(&tree, &records, &mut self.flags, self.config.initial_expand_level);
        for (idx, record) in records.iter().enumerate() {
            if record.seed_flag("_highlighted") == Some(true) {
                self.flags.entry(&record.key).set_highlighted(true);
                expansion::expand_ancestors(&tree, idx, &mut self.flags);
            }
            if record.seed_flag("_upToTheRootHighlighted") == Some(true) {
                self.flags.entry(&record.key).set_highlighted_to_root(true);
                expansion::expand_ancestors(&tree, idx, &mut self.flags);
            }
            if record.seed_flag("_centered") == Some(true) {
                self.flags.entry(&record.key).set_centered(true);
                expansion::expand_ancestors(&tree, idx, &mut self.flags);
                self.pending_focus = Some(record.key.clone());
            }
        }

        tracing::debug!(records = records.len(), "data replaced");
        self.key_fields = key_fields;
        self.records = records;
        self.tree = Some(tree);
        Ok(())
    }

    /// Append one record and center on it.
    pub fn add_node(&mut self, payload: Value) -> Result<()> {
        let record = self.key_fields.extract(self.records.len(), payload)?;
        let key = record.key.clone();
        self.records.push(record);
        let tree = match TreeBuilder::build(&self.records) {
            Ok(tree) => tree,
            Err(e) => {
                self.records.pop();
                return Err(e.into());
            }
        };
        let idx = self.records.len() - 1;
        self.center(&tree, idx, false);
        self.tree = Some(tree);
        tracing::debug!(id = %key, "node added");
        Ok(())
    }

    /// Append several records at once. All or nothing.
    pub fn add_nodes(&mut self, payloads: Vec<Value>) -> Result<()> {
        let base = self.records.len();
        let added = payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| self.key_fields.extract(base + i, payload))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let count = added.len();
        self.records.extend(added);
        match TreeBuilder::build(&self.records) {
            Ok(tree) => {
                self.tree = Some(tree);
                tracing::debug!(count, "nodes added");
                Ok(())
            }
            Err(e) => {
                self.records.truncate(base);
                Err(e.into())
            }
        }
    }

    /// Remove `id` and all of its descendants. Removing the root empties the
    /// chart.
    pub fn remove_node(&mut self, id: &NodeKey) -> Result<()> {
        let (tree, idx) = locate(self.tree.as_ref(), id)?;
        if idx == tree.root() {
            self.records.clear();
            self.flags.clear();
            self.tree = None;
            self.pending_focus = None;
            tracing::debug!(id = %id, "root removed, chart cleared");
            return Ok(());
        }

        let removed: HashSet<NodeKey> = tree
            .pre_order_from(idx)
            .into_iter()
            .map(|v| tree.node(v).key.clone())
            .collect();
        for key in &removed {
            self.flags.remove(key);
        }
        if self.pending_focus.as_ref().is_some_and(|k| removed.contains(k)) {
            self.pending_focus = None;
        }
        self.records.retain(|r| !removed.contains(&r.key));
        // Dropping a whole subtree keeps the rest a valid tree.
        self.tree = Some(TreeBuilder::build(&self.records)?);
        tracing::debug!(id = %id, removed = removed.len(), "subtree removed");
        Ok(())
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Expand `id`, or collapse it together with its whole subtree.
    pub fn set_expanded(&mut self, id: &NodeKey, expanded: bool) -> Result<()> {
        let (tree, idx) = locate(self.tree.as_ref(), id)?;
        expansion::set_expanded(tree, idx, &mut self.flags, expanded);
        Ok(())
    }

    /// Flip `id` open or closed. Returns whether it is now open.
    pub fn toggle(&mut self, id: &NodeKey) -> Result<bool> {
        let (tree, idx) = locate(self.tree.as_ref(), id)?;
        Ok(expansion::toggle(tree, idx, &mut self.flags))
    }

    pub fn expand_all(&mut self) {
        if let Some(tree) = &self.tree {
            expansion::expand_all(tree, &mut self.flags);
        }
    }

    pub fn collapse_all(&mut self) {
        if let Some(tree) = &self.tree {
            expansion::collapse_all(tree, &mut self.flags);
        }
    }

    // =========================================================================
    // Focus and highlighting
    // =========================================================================

    /// Make `id` the only centered node, open the path to it and focus it on
    /// the next render.
    pub fn set_centered(&mut self, id: &NodeKey) -> Result<()> {
        let idx = locate(self.tree.as_ref(), id)?.1;
        if let Some(tree) = self.tree.take() {
            self.center(&tree, idx, false);
            self.tree = Some(tree);
        }
        Ok(())
    }

    /// Highlight `id` alone and focus it together with its descendants.
    /// `None` clears the highlight.
    pub fn set_highlighted(&mut self, id: Option<&NodeKey>) -> Result<()> {
        let Some(id) = id else {
            self.flags.for_each_mut(|s| s.set_highlighted(false));
            return Ok(());
        };
        let idx = locate(self.tree.as_ref(), id)?.1;
        self.flags.for_each_mut(|s| s.set_highlighted(false));
        self.flags.entry(id).set_highlighted(true);
        if let Some(tree) = self.tree.take() {
            self.center(&tree, idx, true);
            self.tree = Some(tree);
        }
        Ok(())
    }

    /// Highlight `id` and every ancestor up to the root. `None` clears it.
    pub fn set_highlighted_to_root(&mut self, id: Option<&NodeKey>) -> Result<()> {
        let Some(id) = id else {
            self.flags.for_each_mut(|s| s.set_highlighted_to_root(false));
            return Ok(());
        };
        let (tree, idx) = locate(self.tree.as_ref(), id)?;
        self.flags.for_each_mut(|s| s.set_highlighted_to_root(false));
        self.flags.entry(id).set_highlighted_to_root(true);
        for a in tree.ancestors(idx) {
            self.flags.entry(&tree.node(a).key).set_highlighted_to_root(true);
        }
        expansion::expand_ancestors(tree, idx, &mut self.flags);
        Ok(())
    }

    pub fn clear_highlighting(&mut self) {
        self.flags.for_each_mut(|s| {
            s.set_highlighted(false);
            s.set_highlighted_to_root(false);
        });
    }

    fn center(&mut self, tree: &Tree, idx: usize, with_descendants: bool) {
        let key = tree.node(idx).key.clone();
        self.flags.for_each_mut(|s| {
            s.set_centered(false);
            s.set_centered_with_descendants(false);
        });
        let state = self.flags.entry(&key);
        state.set_centered(true);
        state.set_centered_with_descendants(with_descendants);
        expansion::expand_ancestors(tree, idx, &mut self.flags);
        self.pending_focus = Some(key);
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Reveal the next page of `id`'s children. Returns how many of its
    /// children are now revealed.
    pub fn load_more(&mut self, id: &NodeKey) -> Result<usize> {
        let (tree, idx) = locate(self.tree.as_ref(), id)?;
        let cursor = resolver::load_more(tree, idx, &mut self.flags, &self.config.paging());
        tracing::debug!(id = %id, cursor, "paging advanced");
        Ok(cursor)
    }

    // =========================================================================
    // Connections
    // =========================================================================

    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        self.connections = connections;
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    #[inline]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    // =========================================================================
    // Passes
    // =========================================================================

    /// Run the visibility pass alone.
    pub fn resolve_visibility(&mut self) -> HiddenSet {
        match &self.tree {
            Some(tree) => resolver::resolve(tree, &mut self.flags, &self.config.paging()),
            None => HiddenSet::default(),
        }
    }

    /// Full pass: visibility, display tree, layout, links, connections,
    /// bounds and focus.
    pub fn render(&mut self) -> Result<&ChartLayout> {
        let orientation = self.config.layout;
        let chart = match &self.tree {
            None => ChartLayout::empty(orientation),
            Some(tree) => {
                let hidden = resolver::resolve(tree, &mut self.flags, &self.config.paging());
                let kept: Vec<&Record> = self
                    .records
                    .iter()
                    .filter(|r| !hidden.contains(&r.key))
                    .collect();
                let visible = TreeBuilder::build(kept.iter().copied())?;
                let display = DisplayTree::build(&visible, &self.flags, &hidden);

                let node_size = self.config.node_size();
                let button_size = self.config.paging_button_size();
                let sizer = self.sizer.as_deref();
                let layout_tree = LayoutTree::from_display(&display, |node| match node.tree_index() {
                    Some(i) => sizer.and_then(|s| s.size(kept[i])).unwrap_or(node_size),
                    None => button_size,
                });
                let result = layout::layout(&layout_tree, &self.config.layout_config());

                let pass = Pass {
                    config: &self.config,
                    flags: &self.flags,
                    full: tree,
                    visible: &visible,
                    kept: &kept,
                    display: &display,
                    result: &result,
                };
                let nodes = pass.nodes();
                let links = pass.links(&nodes);
                let connections = pass.connections(&nodes, &self.connections);
                let focus = self.pending_focus.take().and_then(|key| pass.focus(key));
                let bounds = layout::bounds(&result.nodes, orientation, self.config.fit_padding);

                let placeholders = display.nodes().filter(|n| n.is_placeholder()).count();
                tracing::debug!(
                    records = self.records.len(),
                    hidden = hidden.len(),
                    displayed = nodes.len(),
                    placeholders,
                    links = links.len(),
                    connections = connections.len(),
                    "render pass complete"
                );
                ChartLayout {
                    orientation,
                    nodes,
                    links,
                    connections,
                    bounds,
                    focus,
                }
            }
        };

        let bindings = orientation.bindings();
        let rects = chart
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| {
                let (min, max) = bindings.rect(&node.node_box());
                NodeRect::new(slot, [min.x, min.y], [max.x, max.y])
            })
            .collect();
        self.spatial.rebuild(rects);
        Ok(&*self.last_layout.insert(chart))
    }

    #[inline]
    pub fn last_layout(&self) -> Option<&ChartLayout> {
        self.last_layout.as_ref()
    }

    // =========================================================================
    // Queries over the last render
    // =========================================================================

    /// Padded bounds of the given nodes, or of the whole chart for `None`.
    pub fn fit_bounds(&self, ids: Option<&[NodeKey]>) -> Option<BoundingBox> {
        let chart = self.last_layout.as_ref()?;
        let Some(ids) = ids else {
            return chart.bounds;
        };
        let boxes: Vec<NodeBox> = chart
            .nodes
            .iter()
            .filter(|n| n.key().is_some_and(|k| ids.contains(k)))
            .map(ChartNode::node_box)
            .collect();
        layout::bounds(&boxes, chart.orientation, self.config.fit_padding)
    }

    /// Transform that fits the whole chart into a viewport.
    pub fn fit_transform(&self, viewport_width: f32, viewport_height: f32) -> Option<FitTransform> {
        let bounds = self.last_layout.as_ref()?.bounds?;
        Some(layout::fit_transform(
            &bounds,
            viewport_width,
            viewport_height,
            self.config.max_fit_scale,
        ))
    }

    /// Topmost displayed node under a point.
    pub fn node_at(&self, x: f32, y: f32) -> Option<&ChartNode> {
        let chart = self.last_layout.as_ref()?;
        let slot = *self.spatial.at_point(x, y).last()?;
        chart.nodes.get(slot)
    }

    /// Nearest displayed node whose rectangle lies within `max_distance` of a
    /// point.
    pub fn nearest_node(&self, x: f32, y: f32, max_distance: f32) -> Option<&ChartNode> {
        let chart = self.last_layout.as_ref()?;
        let slot = self.spatial.nearest_within(x, y, max_distance)?;
        chart.nodes.get(slot)
    }

    /// Displayed nodes intersecting a rectangle, in display order.
    pub fn nodes_in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<&ChartNode> {
        let Some(chart) = self.last_layout.as_ref() else {
            return Vec::new();
        };
        self.spatial
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .filter_map(|slot| chart.nodes.get(slot))
            .collect()
    }
}

impl Default for OrgChart {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

fn locate<'a>(tree: Option<&'a Tree>, id: &NodeKey) -> Result<(&'a Tree, usize)> {
    match tree.and_then(|t| t.find(id).map(|idx| (t, idx))) {
        Some(found) => Ok(found),
        None => {
            tracing::warn!(id = %id, "node not found");
            Err(ChartError::NodeNotFound { id: id.clone() })
        }
    }
}

/// Borrowed state of one render pass, used to assemble the output.
struct Pass<'a> {
    config: &'a ChartConfig,
    flags: &'a FlagTable,
    full: &'a Tree,
    visible: &'a Tree,
    /// Records backing `visible`, index-aligned with it.
    kept: &'a [&'a Record],
    display: &'a DisplayTree,
    result: &'a LayoutResult,
}

impl Pass<'_> {
    fn key_of(&self, display_idx: usize) -> Option<&NodeKey> {
        self.display
            .node(display_idx)
            .tree_index()
            .map(|i| &self.kept[i].key)
    }

    fn nodes(&self) -> Vec<ChartNode> {
        let bindings = self.config.layout.bindings();
        let descendants = self.full.descendant_counts();
        self.display
            .nodes()
            .enumerate()
            .map(|(d, dn)| {
                let nb = self.result.nodes[d];
                let corner = (bindings.top_left)(&nb);
                let parent = dn.parent.and_then(|p| self.key_of(p)).cloned();
                let compact = self.result.compact[d].and_then(|slot| {
                    Some(CompactInfo {
                        first: self.key_of(slot.first)?.clone(),
                        row: slot.row,
                        even: slot.is_even(),
                        block_cross: slot.block_cross,
                    })
                });
                let (node, data, state, (direct, total)) = match &dn.kind {
                    DisplayKind::Real { tree_index } => {
                        let record = self.kept[*tree_index];
                        let counts = self
                            .full
                            .find(&record.key)
                            .map(|i| (self.full.node(i).children.len(), descendants[i]))
                            .unwrap_or_default();
                        (
                            NodeRef::Record {
                                id: record.key.clone(),
                            },
                            record.payload.clone(),
                            self.flags.get(&record.key),
                            counts,
                        )
                    }
                    DisplayKind::PagingPlaceholder { parent, remaining } => (
                        NodeRef::PagingPlaceholder {
                            parent: parent.clone(),
                            remaining: *remaining,
                        },
                        Value::Null,
                        VisibilityState::default(),
                        (0, 0),
                    ),
                };
                ChartNode {
                    node,
                    parent,
                    depth: dn.depth,
                    x: nb.x,
                    y: nb.y,
                    width: nb.width,
                    height: nb.height,
                    left: corner.x,
                    top: corner.y,
                    compact,
                    expanded: dn.is_open(),
                    collapsed_children: dn.collapsed_count(),
                    direct_subordinates: direct,
                    total_subordinates: total,
                    highlighted: state.is_highlighted(),
                    highlighted_to_root: state.is_highlighted_to_root(),
                    centered: state.is_centered(),
                    data,
                }
            })
            .collect()
    }

    fn links(&self, nodes: &[ChartNode]) -> Vec<ChartLink> {
        let orientation = self.config.layout;
        let offsets = LinkOffsets::main(self.config.link_y_offset);
        let boxes = &self.result.nodes;
        self.display
            .nodes()
            .enumerate()
            .filter_map(|(d, dn)| {
                let p = dn.parent?;
                let parent = self.key_of(p)?.clone();
                let route = self.result.compact[d].map(|slot| CompactRoute {
                    first: &boxes[slot.first],
                    slot,
                    pair_margin: self.config.compact_margin_pair,
                });
                let path = links::route_link(orientation, &boxes[d], &boxes[p], route, offsets);
                Some(ChartLink {
                    child: nodes[d].node.clone(),
                    parent,
                    path: path.to_string(),
                    radius: path.radius,
                    highlighted: nodes[d].highlighted_to_root,
                })
            })
            .collect()
    }

    fn connections(&self, nodes: &[ChartNode], connections: &[Connection]) -> Vec<ChartConnection> {
        let slots: HashMap<&NodeKey, usize> = nodes
            .iter()
            .enumerate()
            .filter_map(|(slot, n)| n.key().map(|k| (k, slot)))
            .collect();
        connections
            .iter()
            .filter_map(|conn| {
                let (Some(&from), Some(&to)) = (slots.get(&conn.from), slots.get(&conn.to)) else {
                    tracing::debug!(%conn, "connection dropped, endpoint not displayed");
                    return None;
                };
                let (path, label) = links::route_connection(
                    self.config.layout,
                    &self.result.nodes[from],
                    &self.result.nodes[to],
                );
                Some(ChartConnection {
                    from: conn.from.clone(),
                    to: conn.to.clone(),
                    label: conn.label.clone(),
                    path: path.to_string(),
                    label_x: label.x,
                    label_y: label.y,
                })
            })
            .collect()
    }

    fn focus(&self, key: NodeKey) -> Option<Focus> {
        let Some(d) = self.visible.find(&key).and_then(|i| self.display.find(i)) else {
            tracing::debug!(id = %key, "focus target not displayed");
            return None;
        };
        let with_descendants = self.flags.get(&key).is_centered_with_descendants();
        let members = if with_descendants {
            self.display.subtree(d)
        } else {
            vec![d]
        };
        let bounds = layout::bounds(
            members.iter().map(|&i| &self.result.nodes[i]),
            self.config.layout,
            self.config.fit_padding,
        )?;
        Some(Focus {
            id: key,
            bounds,
            with_descendants,
        })
    }
}
