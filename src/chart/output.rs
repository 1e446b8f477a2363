//! Render pass output.
//!
//! Everything the renderer needs for one frame, serialized to JS with
//! camelCase keys.

use serde::Serialize;
use serde_json::Value;

use crate::hierarchy::NodeKey;
use crate::layout::{BoundingBox, NodeBox, Orientation};

/// What a laid-out node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeRef {
    Record { id: NodeKey },
    PagingPlaceholder { parent: NodeKey, remaining: usize },
}

impl NodeRef {
    /// The record key, if this is a real node.
    pub fn key(&self) -> Option<&NodeKey> {
        match self {
            Self::Record { id } => Some(id),
            Self::PagingPlaceholder { .. } => None,
        }
    }
}

/// Position of a compact member inside its block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactInfo {
    pub first: NodeKey,
    pub row: usize,
    pub even: bool,
    pub block_cross: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartNode {
    pub node: NodeRef,
    pub parent: Option<NodeKey>,
    pub depth: usize,
    /// Orientation anchor.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Top-left corner of the node rectangle.
    pub left: f32,
    pub top: f32,
    pub compact: Option<CompactInfo>,
    /// Whether the node currently shows its children.
    pub expanded: bool,
    /// Children set aside by a collapse.
    pub collapsed_children: usize,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
    pub highlighted: bool,
    pub highlighted_to_root: bool,
    pub centered: bool,
    /// The caller's payload; `null` for placeholders.
    pub data: Value,
}

impl ChartNode {
    #[inline]
    pub fn node_box(&self) -> NodeBox {
        NodeBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<&NodeKey> {
        self.node.key()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLink {
    pub child: NodeRef,
    pub parent: NodeKey,
    /// SVG path data.
    pub path: String,
    pub radius: f32,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConnection {
    pub from: NodeKey,
    pub to: NodeKey,
    pub label: Option<String>,
    pub path: String,
    pub label_x: f32,
    pub label_y: f32,
}

/// Region the viewport should move to after this pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Focus {
    pub id: NodeKey,
    pub bounds: BoundingBox,
    pub with_descendants: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartLayout {
    pub orientation: Orientation,
    pub nodes: Vec<ChartNode>,
    pub links: Vec<ChartLink>,
    pub connections: Vec<ChartConnection>,
    /// Padded bounds of all nodes; `None` for an empty chart.
    pub bounds: Option<BoundingBox>,
    pub focus: Option<Focus>,
}

impl ChartLayout {
    pub fn empty(orientation: Orientation) -> Self {
        Self {
            orientation,
            nodes: Vec::new(),
            links: Vec::new(),
            connections: Vec::new(),
            bounds: None,
            focus: None,
        }
    }

    /// The displayed node for `key`.
    pub fn node(&self, key: &NodeKey) -> Option<&ChartNode> {
        self.nodes.iter().find(|n| n.key() == Some(key))
    }

    /// The paging placeholder under `parent`, if one is displayed.
    pub fn placeholder_for(&self, parent: &NodeKey) -> Option<&ChartNode> {
        self.nodes.iter().find(|n| {
            matches!(&n.node, NodeRef::PagingPlaceholder { parent: p, .. } if p == parent)
        })
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.node(key).is_some()
    }

    /// Keys of all displayed records.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> {
        self.nodes.iter().filter_map(ChartNode::key)
    }
}
