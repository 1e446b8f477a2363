//! Error types for hierarchy construction and chart operations.

use crate::hierarchy::NodeKey;

/// The record set cannot form a single rooted tree.
///
/// Fatal to the build that produced it. Callers keep whatever state they had
/// before the build was attempted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructuralError {
    #[error("record set is empty")]
    Empty,
    #[error("record {index} has no usable `{field}` value")]
    MissingId { index: usize, field: String },
    #[error("duplicate node id: {id}")]
    DuplicateId { id: NodeKey },
    #[error("no root record: every record references a parent")]
    NoRoot,
    #[error("multiple root records: {first} and {second}")]
    MultipleRoots { first: NodeKey, second: NodeKey },
    #[error("node {id} references missing parent {parent}")]
    DanglingParent { id: NodeKey, parent: NodeKey },
    #[error("node {id} is not reachable from the root (parent cycle)")]
    Unreachable { id: NodeKey },
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// The operation named an id that is not in the hierarchy. Nothing changed.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeKey },
    /// A caller-supplied value could not be decoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ChartError {
    /// Not-found errors are warnings: the chart is untouched and usable.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NodeNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
