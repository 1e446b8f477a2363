//! Cross-tree connections.
//!
//! Connections are edges between two nodes that are independent of the
//! hierarchy. Each one has:
//! - Source and target node keys
//! - An optional label drawn at the midpoint of the arc

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::NodeKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeKey,
    pub to: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    pub fn new(from: impl Into<NodeKey>, to: impl Into<NodeKey>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({} -> {})", self.from, self.to)
    }
}
