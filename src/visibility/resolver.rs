//! Paging-aware hidden set computation.
//!
//! Wide fan-outs are revealed a page at a time. A node's paging cursor is the
//! number of its children currently revealed; children past the cursor are
//! hidden together with their subtrees. Nodes that are expanded, centered or
//! highlighted are pulled back out of a hidden page, along with every paged-out
//! ancestor on their path to the root.

use std::collections::{HashMap, HashSet};

use super::state::FlagTable;
use crate::hierarchy::{NodeKey, Tree};

/// Paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Initial number of children revealed per node.
    pub min_visible: usize,
    /// Children revealed by each `load_more`.
    pub step: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            min_visible: 2000,
            step: 5,
        }
    }
}

/// Result of a visibility pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenSet {
    ids: HashSet<NodeKey>,
    /// Parent key -> number of its children still held back by paging.
    paged: HashMap<NodeKey, usize>,
}

impl HiddenSet {
    #[inline]
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.ids.contains(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Children of `parent` still behind its paging placeholder.
    pub fn remaining(&self, parent: &NodeKey) -> usize {
        self.paged.get(parent).copied().unwrap_or(0)
    }
}

/// Number of `idx`'s children revealed by paging.
///
/// A stored cursor only records pages loaded with [`load_more`]; the first
/// page is always `min_visible`, so children added later still fall inside it.
/// Clamped to the current child count.
pub fn effective_cursor(tree: &Tree, idx: usize, flags: &FlagTable, paging: &PagingConfig) -> usize {
    let node = tree.node(idx);
    let loaded = flags.get(&node.key).paging_cursor().unwrap_or(0);
    loaded.max(paging.min_visible).min(node.children.len())
}

/// Compute which nodes are excluded from the next layout pass.
///
/// Stored cursors left above a node's child count by removals are clamped;
/// otherwise read-only, so two calls with unchanged flags return the same set.
/// The root is never hidden.
pub fn resolve(tree: &Tree, flags: &mut FlagTable, paging: &PagingConfig) -> HiddenSet {
    let order = tree.pre_order();
    let n = tree.len();

    for &v in &order {
        let node = tree.node(v);
        let total = node.children.len();
        if flags.get(&node.key).paging_cursor().is_some_and(|c| c > total) {
            flags.entry(&node.key).set_paging_cursor(total);
        }
    }

    // Children at or past their parent's cursor fall outside the page
    let mut paged_out = vec![false; n];
    for &v in &order {
        let cursor = effective_cursor(tree, v, flags, paging);
        for &child in tree.node(v).children.iter().skip(cursor) {
            paged_out[child] = true;
        }
    }

    // Re-surface flagged nodes by forcing every paged-out node on their path
    let mut forced = vec![false; n];
    for &v in &order {
        if !flags.get(&tree.node(v).key).forces_visible() {
            continue;
        }
        let path = std::iter::once(v).chain(tree.ancestors(v));
        for u in path {
            if !paged_out[u] {
                continue;
            }
            if forced[u] {
                break;
            }
            forced[u] = true;
        }
    }

    let mut hidden = vec![false; n];
    let mut result = HiddenSet::default();
    for &v in &order {
        let node = tree.node(v);
        let Some(parent) = node.parent else {
            continue;
        };
        let held_back = paged_out[v] && !forced[v];
        hidden[v] = held_back || hidden[parent];
        if hidden[v] {
            result.ids.insert(node.key.clone());
        }
        if held_back {
            *result
                .paged
                .entry(tree.node(parent).key.clone())
                .or_insert(0) += 1;
        }
    }

    tracing::debug!(
        hidden = result.ids.len(),
        paged_parents = result.paged.len(),
        "resolved visibility"
    );
    result
}

/// Advance `idx`'s paging cursor by one page, clamped to its child count.
///
/// Returns the new cursor. Never moves the cursor backwards.
pub fn load_more(tree: &Tree, idx: usize, flags: &mut FlagTable, paging: &PagingConfig) -> usize {
    let node = tree.node(idx);
    let total = node.children.len();
    let current = effective_cursor(tree, idx, flags, paging);
    let next = current.saturating_add(paging.step).min(total).max(current);
    flags.entry(&node.key).set_paging_cursor(next);
    next
}
