//! Tree construction from flat records.
//!
//! `TreeBuilder` turns a parent-referenced record list into an arena tree and
//! rejects anything that is not a single rooted tree. It is called twice per
//! render pass: once on the full record set and once on the records that
//! survived visibility filtering.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Dfs;
use std::collections::HashMap;

use super::record::{NodeKey, Record};
use crate::error::StructuralError;

/// One placed record.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub key: NodeKey,
    /// Depth in the tree (root = 0).
    pub depth: usize,
    /// Parent arena index (None for root).
    pub parent: Option<usize>,
    /// Children in input order.
    pub children: Vec<usize>,
}

/// Arena tree. Node indices follow the order the records were supplied in.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    index: HashMap<NodeKey, usize>,
    root: usize,
}

impl Tree {
    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    #[inline]
    pub fn node(&self, idx: usize) -> &TreeNode {
        &self.nodes[idx]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, key: &NodeKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Node indices in pre-order (parents before children, siblings in input order).
    pub fn pre_order(&self) -> Vec<usize> {
        self.pre_order_from(self.root)
    }

    /// `idx` and all of its descendants in pre-order.
    pub fn pre_order_from(&self, idx: usize) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![idx];
        while let Some(v) = stack.pop() {
            order.push(v);
            stack.extend(self.nodes[v].children.iter().rev().copied());
        }
        order
    }

    /// Strict ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[idx].parent, move |&p| self.nodes[p].parent)
    }

    /// Number of descendants (excluding the node itself) for every node.
    pub fn descendant_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.nodes.len()];
        for &v in self.pre_order().iter().rev() {
            if let Some(p) = self.nodes[v].parent {
                counts[p] += counts[v] + 1;
            }
        }
        counts
    }
}

/// Builds [`Tree`]s from records.
pub struct TreeBuilder;

impl TreeBuilder {
    /// Build a tree from any sequence of records.
    ///
    /// Fails when ids repeat, when there is not exactly one root candidate,
    /// when a parent id does not resolve, or when a parent cycle leaves some
    /// records unreachable from the root. No partial tree is ever returned.
    pub fn build<'a, I>(records: I) -> Result<Tree, StructuralError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let records: Vec<&Record> = records.into_iter().collect();
        if records.is_empty() {
            return Err(StructuralError::Empty);
        }

        let mut index: HashMap<NodeKey, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.key.clone(), i).is_some() {
                return Err(StructuralError::DuplicateId {
                    id: record.key.clone(),
                });
            }
        }

        let mut roots = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_root_candidate())
            .map(|(i, _)| i);
        let root = roots.next().ok_or(StructuralError::NoRoot)?;
        if let Some(second) = roots.next() {
            return Err(StructuralError::MultipleRoots {
                first: records[root].key.clone(),
                second: records[second].key.clone(),
            });
        }

        let mut parents: Vec<Option<usize>> = Vec::with_capacity(records.len());
        for record in &records {
            let parent = match &record.parent {
                Some(parent) if !record.is_root_candidate() => {
                    Some(*index.get(parent).ok_or_else(|| StructuralError::DanglingParent {
                        id: record.key.clone(),
                        parent: parent.clone(),
                    })?)
                }
                _ => None,
            };
            parents.push(parent);
        }

        Self::check_reachable(&records, &parents, root)?;

        let mut nodes: Vec<TreeNode> = records
            .iter()
            .zip(&parents)
            .map(|(record, &parent)| TreeNode {
                key: record.key.clone(),
                depth: 0,
                parent,
                children: Vec::new(),
            })
            .collect();
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = *parent {
                nodes[p].children.push(i);
            }
        }

        let mut tree = Tree { nodes, index, root };
        for v in tree.pre_order() {
            if let Some(p) = tree.nodes[v].parent {
                tree.nodes[v].depth = tree.nodes[p].depth + 1;
            }
        }
        Ok(tree)
    }

    /// Every record must be reachable from the root; anything left over sits
    /// on a parent cycle.
    fn check_reachable(
        records: &[&Record],
        parents: &[Option<usize>],
        root: usize,
    ) -> Result<(), StructuralError> {
        let mut graph: StableDiGraph<usize, ()> =
            StableDiGraph::with_capacity(records.len(), records.len().saturating_sub(1));
        let handles: Vec<NodeIndex> = (0..records.len()).map(|i| graph.add_node(i)).collect();
        for (child, parent) in parents.iter().enumerate() {
            if let Some(p) = *parent {
                graph.add_edge(handles[p], handles[child], ());
            }
        }

        let mut dfs = Dfs::new(&graph, handles[root]);
        let mut reached = 0usize;
        while dfs.next(&graph).is_some() {
            reached += 1;
        }
        if reached == records.len() {
            return Ok(());
        }

        let stray = handles
            .iter()
            .position(|h| !dfs.discovered.contains(h.index()))
            .unwrap_or(root);
        Err(StructuralError::Unreachable {
            id: records[stray].key.clone(),
        })
    }
}
