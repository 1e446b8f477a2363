//! Visibility state and the passes that read it.
//!
//! Three layers:
//! - `state`: per-node flags kept in a side-table owned by the chart
//! - `resolver`: which nodes paging holds back, with flagged nodes re-surfaced
//! - `expansion`: expand/collapse transitions and the display tree

pub mod expansion;
pub mod resolver;
pub mod state;

pub use expansion::{Branch, DisplayKind, DisplayNode, DisplayTree};
pub use resolver::{effective_cursor, resolve, HiddenSet, PagingConfig};
pub use state::{FlagTable, VisibilityState};
