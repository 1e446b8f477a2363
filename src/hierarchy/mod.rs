//! Hierarchy data structures.
//!
//! This module turns caller-supplied flat records into arena trees. The tree
//! is rebuilt from scratch on every pass; node identity across rebuilds is
//! carried only by the record's key.

mod connection;
mod record;
mod tree;

pub use connection::Connection;
pub use record::{KeyFields, NodeKey, Record};
pub use tree::{Tree, TreeBuilder, TreeNode};
