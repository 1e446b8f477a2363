//! Per-node visibility state.
//!
//! Flags live in a side-table keyed by [`NodeKey`] rather than on the records
//! themselves, so rebuilding the tree never loses or aliases them.

use std::collections::HashMap;

use crate::hierarchy::NodeKey;

/// Visibility flags packed into a single byte, plus the paging cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityState {
    flags: u8,
    /// Number of children currently revealed. `None` until the first pass
    /// over a node that has children.
    paging_cursor: Option<usize>,
}

impl VisibilityState {
    const EXPANDED: u8 = 0b0000_0001;
    const CENTERED: u8 = 0b0000_0010;
    const CENTERED_WITH_DESCENDANTS: u8 = 0b0000_0100;
    const HIGHLIGHTED: u8 = 0b0000_1000;
    const HIGHLIGHTED_TO_ROOT: u8 = 0b0001_0000;

    /// Flags that pull a node out of a hidden paging window.
    const FORCES_VISIBLE: u8 =
        Self::EXPANDED | Self::CENTERED | Self::HIGHLIGHTED | Self::HIGHLIGHTED_TO_ROOT;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Whether the node shows its children.
    #[inline]
    pub fn is_expanded(self) -> bool {
        self.flags & Self::EXPANDED != 0
    }

    #[inline]
    pub fn set_expanded(&mut self, expanded: bool) {
        self.set_flag(Self::EXPANDED, expanded);
    }

    #[inline]
    pub fn is_centered(self) -> bool {
        self.flags & Self::CENTERED != 0
    }

    #[inline]
    pub fn set_centered(&mut self, centered: bool) {
        self.set_flag(Self::CENTERED, centered);
    }

    #[inline]
    pub fn is_centered_with_descendants(self) -> bool {
        self.flags & Self::CENTERED_WITH_DESCENDANTS != 0
    }

    #[inline]
    pub fn set_centered_with_descendants(&mut self, centered: bool) {
        self.set_flag(Self::CENTERED_WITH_DESCENDANTS, centered);
    }

    #[inline]
    pub fn is_highlighted(self) -> bool {
        self.flags & Self::HIGHLIGHTED != 0
    }

    #[inline]
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.set_flag(Self::HIGHLIGHTED, highlighted);
    }

    #[inline]
    pub fn is_highlighted_to_root(self) -> bool {
        self.flags & Self::HIGHLIGHTED_TO_ROOT != 0
    }

    #[inline]
    pub fn set_highlighted_to_root(&mut self, highlighted: bool) {
        self.set_flag(Self::HIGHLIGHTED_TO_ROOT, highlighted);
    }

    /// Expanded, centered or highlighted nodes must stay visible even when
    /// they fall outside their parent's paging window.
    #[inline]
    pub fn forces_visible(self) -> bool {
        self.flags & Self::FORCES_VISIBLE != 0
    }

    #[inline]
    pub fn paging_cursor(self) -> Option<usize> {
        self.paging_cursor
    }

    #[inline]
    pub fn set_paging_cursor(&mut self, cursor: usize) {
        self.paging_cursor = Some(cursor);
    }
}

/// Side-table of [`VisibilityState`] keyed by node.
///
/// Unknown keys read as the default (all flags off, no cursor).
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    states: HashMap<NodeKey, VisibilityState>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &NodeKey) -> VisibilityState {
        self.states.get(key).copied().unwrap_or_default()
    }

    /// Mutable state for `key`, created on first access.
    pub fn entry(&mut self, key: &NodeKey) -> &mut VisibilityState {
        self.states.entry(key.clone()).or_default()
    }

    /// Apply `f` to every stored state.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut VisibilityState)) {
        self.states.values_mut().for_each(|s| f(s));
    }

    pub fn remove(&mut self, key: &NodeKey) {
        self.states.remove(key);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Keys whose state satisfies `pred`.
    pub fn keys_where(&self, pred: impl Fn(VisibilityState) -> bool) -> Vec<NodeKey> {
        self.states
            .iter()
            .filter(|(_, s)| pred(**s))
            .map(|(k, _)| k.clone())
            .collect()
    }
}
