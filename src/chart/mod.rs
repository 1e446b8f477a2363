//! The chart controller and its render output.

mod engine;
mod output;

pub use engine::OrgChart;
pub use output::{
    ChartConnection, ChartLayout, ChartLink, ChartNode, CompactInfo, Focus, NodeRef,
};
