//! Expand/collapse state machine and the display tree.
//!
//! Expansion is stored as one flag per node. A node is *open* (shows its
//! children) when it is flagged expanded or when any of its descendants is,
//! so flagging a deep node expanded pulls every ancestor open with it.
//!
//! The display tree is what the layout pass consumes: the visible tree with
//! collapsed children set aside and a synthetic paging placeholder appended
//! under every open node that still has children held back.

use std::collections::{HashMap, VecDeque};

use super::resolver::HiddenSet;
use super::state::FlagTable;
use crate::hierarchy::{NodeKey, Record, Tree};

// ===== State transitions =====

/// `expanded(v) || some descendant of v is flagged expanded`, for every node.
pub fn open_states(tree: &Tree, flags: &FlagTable) -> Vec<bool> {
    let mut open = vec![false; tree.len()];
    for &v in tree.pre_order().iter().rev() {
        let node = tree.node(v);
        open[v] |= flags.get(&node.key).is_expanded();
        if open[v] {
            if let Some(p) = node.parent {
                open[p] = true;
            }
        }
    }
    open
}

/// Whether `idx` currently shows its children.
pub fn is_open(tree: &Tree, idx: usize, flags: &FlagTable) -> bool {
    tree.pre_order_from(idx)
        .into_iter()
        .any(|v| flags.get(&tree.node(v).key).is_expanded())
}

/// Flag nodes shallower than `level` expanded.
///
/// Records that carry an explicit `_expanded` seed keep it. Applied once per
/// full data replace.
pub fn apply_initial_expansion(tree: &Tree, records: &[Record], flags: &mut FlagTable, level: usize) {
    for (idx, record) in records.iter().enumerate() {
        let expanded = record
            .seed_flag("_expanded")
            .unwrap_or(tree.node(idx).depth < level);
        flags.entry(&record.key).set_expanded(expanded);
    }
}

/// Flip `idx` between showing and hiding its children.
///
/// Collapsing clears the expanded flag on the whole subtree so a later expand
/// reveals only the direct children again. Returns the new open state.
pub fn toggle(tree: &Tree, idx: usize, flags: &mut FlagTable) -> bool {
    let open = !is_open(tree, idx, flags);
    set_expanded(tree, idx, flags, open);
    open
}

pub fn set_expanded(tree: &Tree, idx: usize, flags: &mut FlagTable, expanded: bool) {
    if expanded {
        flags.entry(&tree.node(idx).key).set_expanded(true);
        return;
    }
    for v in tree.pre_order_from(idx) {
        flags.entry(&tree.node(v).key).set_expanded(false);
    }
}

pub fn expand_all(tree: &Tree, flags: &mut FlagTable) {
    for node in tree.nodes() {
        flags.entry(&node.key).set_expanded(true);
    }
}

pub fn collapse_all(tree: &Tree, flags: &mut FlagTable) {
    for node in tree.nodes() {
        flags.entry(&node.key).set_expanded(false);
    }
}

/// Flag every strict ancestor of `idx` expanded.
pub fn expand_ancestors(tree: &Tree, idx: usize, flags: &mut FlagTable) {
    for a in tree.ancestors(idx) {
        flags.entry(&tree.node(a).key).set_expanded(true);
    }
}

// ===== Display tree =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayKind {
    /// Backed by a record: index into the visible tree.
    Real { tree_index: usize },
    /// "Show more" stand-in for children held back by paging.
    PagingPlaceholder { parent: NodeKey, remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Leaf,
    /// Displayed children (display indices).
    Expanded(Vec<usize>),
    /// Children set aside by a collapse (visible-tree indices).
    Collapsed(Vec<usize>),
}

#[derive(Debug, Clone)]
pub struct DisplayNode {
    pub kind: DisplayKind,
    pub depth: usize,
    pub parent: Option<usize>,
    pub branch: Branch,
}

impl DisplayNode {
    #[inline]
    pub fn tree_index(&self) -> Option<usize> {
        match self.kind {
            DisplayKind::Real { tree_index } => Some(tree_index),
            DisplayKind::PagingPlaceholder { .. } => None,
        }
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, DisplayKind::PagingPlaceholder { .. })
    }

    #[inline]
    pub fn children(&self) -> &[usize] {
        match &self.branch {
            Branch::Expanded(children) => children,
            Branch::Leaf | Branch::Collapsed(_) => &[],
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.branch, Branch::Expanded(_))
    }

    /// Number of children set aside by a collapse.
    #[inline]
    pub fn collapsed_count(&self) -> usize {
        match &self.branch {
            Branch::Collapsed(stash) => stash.len(),
            _ => 0,
        }
    }
}

/// Nodes that will be laid out, parents before children.
#[derive(Debug, Clone)]
pub struct DisplayTree {
    nodes: Vec<DisplayNode>,
    by_tree_index: HashMap<usize, usize>,
}

impl DisplayTree {
    /// Derive the display tree from the visible tree.
    ///
    /// `hidden` supplies the per-parent count of children still behind a
    /// paging placeholder; the visible tree itself no longer contains them.
    pub fn build(visible: &Tree, flags: &FlagTable, hidden: &HiddenSet) -> Self {
        let open = open_states(visible, flags);
        let mut nodes: Vec<DisplayNode> = Vec::with_capacity(visible.len());
        let mut by_tree_index = HashMap::with_capacity(visible.len());

        nodes.push(DisplayNode {
            kind: DisplayKind::Real {
                tree_index: visible.root(),
            },
            depth: 0,
            parent: None,
            branch: Branch::Leaf,
        });
        by_tree_index.insert(visible.root(), 0);

        let mut queue = VecDeque::from([0usize]);
        while let Some(d) = queue.pop_front() {
            let Some(v) = nodes[d].tree_index() else {
                continue;
            };
            let node = visible.node(v);
            let remaining = hidden.remaining(&node.key);

            let branch = if node.children.is_empty() && remaining == 0 {
                Branch::Leaf
            } else if !open[v] {
                Branch::Collapsed(node.children.clone())
            } else {
                let depth = nodes[d].depth + 1;
                let mut shown = Vec::with_capacity(node.children.len() + 1);
                for &c in &node.children {
                    let idx = nodes.len();
                    nodes.push(DisplayNode {
                        kind: DisplayKind::Real { tree_index: c },
                        depth,
                        parent: Some(d),
                        branch: Branch::Leaf,
                    });
                    by_tree_index.insert(c, idx);
                    shown.push(idx);
                    queue.push_back(idx);
                }
                if remaining > 0 {
                    shown.push(nodes.len());
                    nodes.push(DisplayNode {
                        kind: DisplayKind::PagingPlaceholder {
                            parent: node.key.clone(),
                            remaining,
                        },
                        depth,
                        parent: Some(d),
                        branch: Branch::Leaf,
                    });
                }
                Branch::Expanded(shown)
            };
            nodes[d].branch = branch;
        }

        tracing::debug!(displayed = nodes.len(), "built display tree");
        Self {
            nodes,
            by_tree_index,
        }
    }

    #[inline]
    pub fn root(&self) -> usize {
        0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, idx: usize) -> &DisplayNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DisplayNode> {
        self.nodes.iter()
    }

    /// Display index of the visible-tree node `tree_index`, if it is shown.
    pub fn find(&self, tree_index: usize) -> Option<usize> {
        self.by_tree_index.get(&tree_index).copied()
    }

    /// `idx` and its displayed descendants.
    pub fn subtree(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(v) = stack.pop() {
            out.push(v);
            stack.extend(self.nodes[v].children().iter().rev().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::TreeBuilder;
    use crate::visibility::resolver::{resolve, PagingConfig};

    fn rec(id: i64, parent: Option<i64>) -> Record {
        Record::new(id, parent.map(NodeKey::Int))
    }

    fn sample() -> Vec<Record> {
        vec![rec(1, None), rec(2, Some(1)), rec(3, Some(1)), rec(4, Some(2))]
    }

    fn displayed_keys(display: &DisplayTree, tree: &Tree) -> Vec<NodeKey> {
        let mut keys: Vec<_> = display
            .nodes()
            .filter_map(|n| n.tree_index())
            .map(|i| tree.node(i).key.clone())
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_initial_expand_level() {
        let records = sample();
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        apply_initial_expansion(&tree, &records, &mut flags, 1);
        let hidden = resolve(&tree, &mut flags, &PagingConfig::default());
        let display = DisplayTree::build(&tree, &flags, &hidden);

        assert_eq!(
            displayed_keys(&display, &tree),
            vec![NodeKey::Int(1), NodeKey::Int(2), NodeKey::Int(3)]
        );
        let two = display.find(1).unwrap();
        assert_eq!(display.node(two).branch, Branch::Collapsed(vec![3]));
        assert_eq!(display.node(two).collapsed_count(), 1);
    }

    #[test]
    fn test_expanded_descendant_opens_ancestors() {
        let records = sample();
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        // Nothing expanded except the deep node 2
        flags.entry(&NodeKey::Int(2)).set_expanded(true);

        let open = open_states(&tree, &flags);
        assert_eq!(open, vec![true, true, false, false]);
        assert!(is_open(&tree, 0, &flags));

        let display = DisplayTree::build(&tree, &flags, &HiddenSet::default());
        assert_eq!(display.len(), 4, "root opened through its expanded child");
    }

    #[test]
    fn test_toggle_collapses_whole_subtree() {
        let records = sample();
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        expand_all(&tree, &mut flags);

        assert!(!toggle(&tree, 0, &mut flags));
        assert!(flags.keys_where(|s| s.is_expanded()).is_empty());

        // Re-expanding shows only the direct children
        assert!(toggle(&tree, 0, &mut flags));
        let display = DisplayTree::build(&tree, &flags, &HiddenSet::default());
        assert_eq!(display.len(), 3);
    }

    #[test]
    fn test_seeded_expanded_wins_over_level() {
        let mut records = sample();
        records[1].payload = serde_json::json!({"_expanded": true});
        records[0].payload = serde_json::json!({"_expanded": false});
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        apply_initial_expansion(&tree, &records, &mut flags, 1);

        assert!(!flags.get(&NodeKey::Int(1)).is_expanded());
        assert!(flags.get(&NodeKey::Int(2)).is_expanded());
        // Root is still open through node 2
        assert!(is_open(&tree, 0, &flags));
    }

    #[test]
    fn test_collapse_all_leaves_root_only() {
        let records = sample();
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        expand_all(&tree, &mut flags);
        collapse_all(&tree, &mut flags);

        let display = DisplayTree::build(&tree, &flags, &HiddenSet::default());
        assert_eq!(display.len(), 1);
        assert_eq!(display.node(0).collapsed_count(), 2);
    }

    #[test]
    fn test_placeholder_appended_after_revealed_children() {
        let mut records = vec![rec(0, None)];
        records.extend((1..=6).map(|i| rec(i, Some(0))));
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        flags.entry(&NodeKey::Int(0)).set_expanded(true);
        let paging = PagingConfig {
            min_visible: 4,
            step: 1,
        };
        let hidden = resolve(&tree, &mut flags, &paging);
        let kept = records.iter().filter(|r| !hidden.contains(&r.key));
        let visible = TreeBuilder::build(kept).unwrap();
        let display = DisplayTree::build(&visible, &flags, &hidden);

        let children = display.node(0).children();
        assert_eq!(children.len(), 5, "four real children and one placeholder");
        let last = display.node(*children.last().unwrap());
        assert_eq!(
            last.kind,
            DisplayKind::PagingPlaceholder {
                parent: NodeKey::Int(0),
                remaining: 2
            }
        );
        assert_eq!(last.branch, Branch::Leaf);
        assert_eq!(display.subtree(0).len(), 6);
    }

    #[test]
    fn test_expand_ancestors() {
        let records = sample();
        let tree = TreeBuilder::build(&records).unwrap();
        let mut flags = FlagTable::new();
        expand_ancestors(&tree, 3, &mut flags);

        assert!(flags.get(&NodeKey::Int(1)).is_expanded());
        assert!(flags.get(&NodeKey::Int(2)).is_expanded());
        assert!(!flags.get(&NodeKey::Int(4)).is_expanded());
    }
}
