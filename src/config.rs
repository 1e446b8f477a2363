//! Chart configuration.
//!
//! Deserialized from a plain JS object (camelCase keys); every field is
//! optional and falls back to its default.

use serde::{Deserialize, Serialize};

use crate::hierarchy::KeyFields;
use crate::layout::{LayoutConfig, Orientation, Size};
use crate::visibility::PagingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub layout: Orientation,
    pub compact: bool,

    /// Default node size, used when no size accessor answers.
    pub node_width: f32,
    pub node_height: f32,

    pub siblings_margin: f32,
    pub children_margin: f32,
    pub neighbour_margin: f32,
    pub compact_margin_pair: f32,
    pub compact_margin_between: f32,

    /// Depth above which nodes start expanded after a full data replace.
    #[serde(alias = "expandLevel")]
    pub initial_expand_level: usize,

    pub min_paging_visible_nodes: usize,
    pub paging_step: usize,
    /// Size of the "show more" placeholder. Defaults to the node size.
    pub paging_button_width: Option<f32>,
    pub paging_button_height: Option<f32>,

    /// Main-axis shift applied to every link's source end.
    pub link_y_offset: f32,

    pub fit_padding: f32,
    pub max_fit_scale: f32,

    /// Payload field holding the node id.
    pub node_id: String,
    /// Payload field holding the parent id.
    pub parent_node_id: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            layout: Orientation::Top,
            compact: false,
            node_width: 250.0,
            node_height: 150.0,
            siblings_margin: 20.0,
            children_margin: 60.0,
            neighbour_margin: 80.0,
            compact_margin_pair: 100.0,
            compact_margin_between: 20.0,
            initial_expand_level: 1,
            min_paging_visible_nodes: 2000,
            paging_step: 5,
            paging_button_width: None,
            paging_button_height: None,
            link_y_offset: 0.0,
            fit_padding: 50.0,
            max_fit_scale: 8.0,
            node_id: "id".to_owned(),
            parent_node_id: "parentId".to_owned(),
        }
    }
}

impl ChartConfig {
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            orientation: self.layout,
            compact: self.compact,
            siblings_margin: self.siblings_margin,
            children_margin: self.children_margin,
            neighbour_margin: self.neighbour_margin,
            compact_margin_pair: self.compact_margin_pair,
            compact_margin_between: self.compact_margin_between,
        }
    }

    pub fn paging(&self) -> PagingConfig {
        PagingConfig {
            min_visible: self.min_paging_visible_nodes,
            step: self.paging_step,
        }
    }

    pub fn key_fields(&self) -> KeyFields {
        KeyFields::new(self.node_id.clone(), self.parent_node_id.clone())
    }

    #[inline]
    pub fn node_size(&self) -> Size {
        Size::new(self.node_width, self.node_height)
    }

    pub fn paging_button_size(&self) -> Size {
        Size::new(
            self.paging_button_width.unwrap_or(self.node_width),
            self.paging_button_height.unwrap_or(self.node_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: ChartConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ChartConfig::default());
        assert_eq!(config.paging(), PagingConfig::default());
        assert_eq!(config.key_fields(), KeyFields::default());
        assert_eq!(config.layout_config(), LayoutConfig::default());
    }

    #[test]
    fn test_camel_case_fields() {
        let config: ChartConfig = serde_json::from_str(
            r#"{
                "layout": "right",
                "compact": true,
                "nodeWidth": 120,
                "expandLevel": 3,
                "minPagingVisibleNodes": 10,
                "pagingButtonHeight": 40,
                "nodeId": "uid",
                "parentNodeId": "boss"
            }"#,
        )
        .unwrap();

        assert_eq!(config.layout, Orientation::Right);
        assert!(config.compact);
        assert_eq!(config.initial_expand_level, 3);
        assert_eq!(config.paging().min_visible, 10);
        assert_eq!(config.paging_button_size(), Size::new(120.0, 40.0));
        assert_eq!(config.key_fields(), KeyFields::new("uid", "boss"));
    }

    #[test]
    fn test_unknown_orientation_rejected() {
        let result: Result<ChartConfig, _> = serde_json::from_str(r#"{"layout": "diagonal"}"#);
        assert!(result.is_err());
    }
}
