//! Org Chart - WASM Module
//!
//! This module provides the hierarchy, visibility state and layout engine
//! behind an interactive org chart. It is compiled to WebAssembly and exposes
//! a JavaScript-friendly API via wasm-bindgen; the host page draws the nodes,
//! links and connections it returns.
//!
//! # Architecture
//!
//! - `hierarchy`: Records, tree construction and cross-tree connections
//! - `visibility`: Flag table, paging resolver and expand/collapse state
//! - `layout`: Flextree layout, compact packing, orientations, bounds
//! - `path`: SVG path generation for links and connections
//! - `spatial`: R-tree spatial indexing for hit testing
//! - `chart`: The controller tying a render pass together

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

pub mod chart;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod path;
pub mod spatial;
pub mod visibility;

use chart::OrgChart;
use config::ChartConfig;
use error::ChartError;
use hierarchy::{Connection, NodeKey, Record};
use layout::{Size, SizeAccessor};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    tracing_wasm::set_as_global_default();
}

/// Main entry point for the org chart engine.
///
/// This struct wraps the internal OrgChart and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct OrgChartWasm {
    chart: OrgChart,
}

#[wasm_bindgen]
impl OrgChartWasm {
    /// Create a chart. `config` may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<OrgChartWasm, JsError> {
        Ok(Self {
            chart: OrgChart::new(config_from_js(config)?),
        })
    }

    /// Replace the configuration. Takes effect on the next render.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsError> {
        self.chart.set_config(config_from_js(config)?);
        Ok(())
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Replace all records with an array of plain objects.
    ///
    /// Throws on a structural error; the previous data stays in place.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, data: JsValue) -> Result<(), JsError> {
        let payloads = from_js(data)?;
        self.chart.set_data(payloads)?;
        Ok(())
    }

    /// Append one record and center on it.
    #[wasm_bindgen(js_name = addNode)]
    pub fn add_node(&mut self, node: JsValue) -> Result<(), JsError> {
        let payload = from_js(node)?;
        self.chart.add_node(payload)?;
        Ok(())
    }

    /// Append several records. Nothing is added if any of them is invalid.
    #[wasm_bindgen(js_name = addNodes)]
    pub fn add_nodes(&mut self, nodes: JsValue) -> Result<(), JsError> {
        let payloads = from_js(nodes)?;
        self.chart.add_nodes(payloads)?;
        Ok(())
    }

    /// Remove a node and its descendants.
    ///
    /// Returns false if the node does not exist.
    #[wasm_bindgen(js_name = removeNode)]
    pub fn remove_node(&mut self, id: JsValue) -> Result<bool, JsError> {
        let id = key_from_js(id)?;
        found(self.chart.remove_node(&id))
    }

    /// Get the number of records.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.chart.len()
    }

    // =========================================================================
    // Expand / Collapse
    // =========================================================================

    #[wasm_bindgen(js_name = setExpanded)]
    pub fn set_expanded(&mut self, id: JsValue, expanded: bool) -> Result<bool, JsError> {
        let id = key_from_js(id)?;
        found(self.chart.set_expanded(&id, expanded))
    }

    /// Flip a node open or closed.
    ///
    /// Returns the new open state, or undefined if the node does not exist.
    pub fn toggle(&mut self, id: JsValue) -> Result<Option<bool>, JsError> {
        let id = key_from_js(id)?;
        warn_missing(self.chart.toggle(&id))
    }

    #[wasm_bindgen(js_name = expandAll)]
    pub fn expand_all(&mut self) {
        self.chart.expand_all();
    }

    #[wasm_bindgen(js_name = collapseAll)]
    pub fn collapse_all(&mut self) {
        self.chart.collapse_all();
    }

    // =========================================================================
    // Focus and Highlighting
    // =========================================================================

    #[wasm_bindgen(js_name = setCentered)]
    pub fn set_centered(&mut self, id: JsValue) -> Result<bool, JsError> {
        let id = key_from_js(id)?;
        found(self.chart.set_centered(&id))
    }

    /// Highlight a single node; `null` clears the highlight.
    #[wasm_bindgen(js_name = setHighlighted)]
    pub fn set_highlighted(&mut self, id: JsValue) -> Result<bool, JsError> {
        let id = optional_key_from_js(id)?;
        found(self.chart.set_highlighted(id.as_ref()))
    }

    /// Highlight a node and its path to the root; `null` clears it.
    #[wasm_bindgen(js_name = setUpToTheRootHighlighted)]
    pub fn set_up_to_the_root_highlighted(&mut self, id: JsValue) -> Result<bool, JsError> {
        let id = optional_key_from_js(id)?;
        found(self.chart.set_highlighted_to_root(id.as_ref()))
    }

    #[wasm_bindgen(js_name = clearHighlighting)]
    pub fn clear_highlighting(&mut self) {
        self.chart.clear_highlighting();
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Reveal the next page of a node's children.
    ///
    /// Returns how many children are now revealed, or undefined if the node
    /// does not exist.
    #[wasm_bindgen(js_name = loadMore)]
    pub fn load_more(&mut self, id: JsValue) -> Result<Option<u32>, JsError> {
        let id = key_from_js(id)?;
        Ok(warn_missing(self.chart.load_more(&id))?.map(|cursor| cursor as u32))
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Replace the connections with an array of `{from, to, label?}`.
    #[wasm_bindgen(js_name = setConnections)]
    pub fn set_connections(&mut self, connections: JsValue) -> Result<(), JsError> {
        let connections: Vec<Connection> = from_js(connections)?;
        self.chart.set_connections(connections);
        Ok(())
    }

    #[wasm_bindgen(js_name = addConnection)]
    pub fn add_connection(&mut self, connection: JsValue) -> Result<(), JsError> {
        let connection: Connection = from_js(connection)?;
        self.chart.add_connection(connection);
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Run a full render pass.
    ///
    /// Returns `{orientation, nodes, links, connections, bounds, focus}`.
    pub fn render(&mut self) -> Result<JsValue, JsError> {
        let layout = self.chart.render()?;
        to_js(layout)
    }

    /// Padded bounds of the listed node ids, or of the whole chart when
    /// `ids` is omitted. Uses the last render.
    #[wasm_bindgen(js_name = fitBounds)]
    pub fn fit_bounds(&self, ids: JsValue) -> Result<JsValue, JsError> {
        let ids: Option<Vec<NodeKey>> = if ids.is_undefined() || ids.is_null() {
            None
        } else {
            Some(from_js(ids)?)
        };
        to_js(&self.chart.fit_bounds(ids.as_deref()))
    }

    /// `{scale, translateX, translateY}` fitting the last render into a
    /// viewport.
    #[wasm_bindgen(js_name = fitTransform)]
    pub fn fit_transform(&self, viewport_width: f32, viewport_height: f32) -> Result<JsValue, JsError> {
        to_js(&self.chart.fit_transform(viewport_width, viewport_height))
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// The node under a screen point, or null.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f32, y: f32) -> Result<JsValue, JsError> {
        to_js(&self.chart.node_at(x, y).map(|n| &n.node))
    }

    /// The nearest node within `max_distance` of a point, or null.
    #[wasm_bindgen(js_name = nearestNode)]
    pub fn nearest_node(&self, x: f32, y: f32, max_distance: f32) -> Result<JsValue, JsError> {
        to_js(&self.chart.nearest_node(x, y, max_distance).map(|n| &n.node))
    }

    /// Nodes intersecting a rectangle (for viewport culling).
    #[wasm_bindgen(js_name = nodesInRect)]
    pub fn nodes_in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Result<JsValue, JsError> {
        let hits: Vec<_> = self
            .chart
            .nodes_in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|n| &n.node)
            .collect();
        to_js(&hits)
    }

    // =========================================================================
    // Node Sizing
    // =========================================================================

    /// Size nodes with `fn(data) -> {width, height}`. Passing undefined
    /// restores the configured node size.
    #[wasm_bindgen(js_name = setSizeAccessor)]
    pub fn set_size_accessor(&mut self, accessor: Option<js_sys::Function>) {
        match accessor {
            Some(f) => self.chart.set_size_accessor(JsSizeAccessor(f)),
            None => self.chart.clear_size_accessor(),
        }
    }
}

/// Size accessor backed by a JS callback.
struct JsSizeAccessor(js_sys::Function);

impl SizeAccessor for JsSizeAccessor {
    fn size(&self, record: &Record) -> Option<Size> {
        let data = record.payload.serialize(&Serializer::json_compatible()).ok()?;
        let size = self.0.call1(&JsValue::NULL, &data).ok()?;
        if size.is_undefined() || size.is_null() {
            return None;
        }
        serde_wasm_bindgen::from_value(size).ok()
    }
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, ChartError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ChartError::InvalidInput(e.to_string()))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    Ok(value.serialize(&Serializer::json_compatible())?)
}

fn config_from_js(config: JsValue) -> Result<ChartConfig, ChartError> {
    if config.is_undefined() || config.is_null() {
        return Ok(ChartConfig::default());
    }
    from_js(config)
}

fn key_from_js(id: JsValue) -> Result<NodeKey, ChartError> {
    from_js(id)
}

fn optional_key_from_js(id: JsValue) -> Result<Option<NodeKey>, ChartError> {
    if id.is_undefined() || id.is_null() {
        return Ok(None);
    }
    key_from_js(id).map(Some)
}

/// Not-found becomes `false`; anything else throws.
fn found(result: error::Result<()>) -> Result<bool, JsError> {
    Ok(warn_missing(result)?.is_some())
}

fn warn_missing<T>(result: error::Result<T>) -> Result<Option<T>, JsError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_warning() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use chart::{ChartLayout, NodeRef};
    use layout::Orientation;
    use serde_json::{json, Value};

    /// Root 1 with a fixed multi-level shape:
    /// 1 -> 2, 3; 2 -> 4, 5; 3 -> 6; 4 -> 7, 8, 9
    fn company() -> Vec<Value> {
        let edges = [(2, 1), (3, 1), (4, 2), (5, 2), (6, 3), (7, 4), (8, 4), (9, 4)];
        let mut data = vec![json!({"id": 1, "name": "root"})];
        data.extend(
            edges
                .iter()
                .map(|&(id, parent)| json!({"id": id, "parentId": parent, "name": format!("n{id}")})),
        );
        data
    }

    fn fan_out(children: i64) -> Vec<Value> {
        let mut data = vec![json!({"id": 0})];
        data.extend((1..=children).map(|i| json!({"id": i, "parentId": 0})));
        data
    }

    fn keys(layout: &ChartLayout) -> Vec<i64> {
        layout
            .keys()
            .map(|k| match k {
                NodeKey::Int(v) => *v,
                NodeKey::Str(s) => panic!("unexpected string key {s}"),
            })
            .collect()
    }

    fn assert_no_overlap(layout: &ChartLayout) {
        let b = layout.orientation.bindings();
        let rects: Vec<_> = layout.nodes.iter().map(|n| b.rect(&n.node_box())).collect();
        for i in 0..rects.len() {
            for j in i + 1..rects.len() {
                let (a_min, a_max) = rects[i];
                let (b_min, b_max) = rects[j];
                let apart = a_max.x <= b_min.x + 1e-3
                    || b_max.x <= a_min.x + 1e-3
                    || a_max.y <= b_min.y + 1e-3
                    || b_max.y <= a_min.y + 1e-3;
                assert!(
                    apart,
                    "{:?} overlaps {:?} ({:?})",
                    layout.nodes[i].node, layout.nodes[j].node, layout.orientation
                );
            }
        }
    }

    /// Expanding a collapsed node shows its children; depth limit applies.
    #[test]
    fn test_expand_level_and_expand() {
        let config = ChartConfig {
            initial_expand_level: 2,
            ..Default::default()
        };
        let mut chart = OrgChart::new(config);
        chart.set_data(company()).unwrap();

        let shown = keys(chart.render().unwrap());
        assert_eq!(shown, vec![1, 2, 3, 4, 5, 6], "depth 2 visible, depth 3 not");

        chart.set_expanded(&NodeKey::Int(4), true).unwrap();
        let shown = keys(chart.render().unwrap());
        assert_eq!(shown, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);

        chart.set_expanded(&NodeKey::Int(2), false).unwrap();
        let layout = chart.render().unwrap();
        assert_eq!(keys(layout), vec![1, 2, 3, 6]);
        assert_eq!(layout.node(&NodeKey::Int(2)).unwrap().collapsed_children, 2);
    }

    /// 2001 children: one held back behind a placeholder until loadMore.
    #[test]
    fn test_paging_default_threshold() {
        let mut chart = OrgChart::default();
        chart.set_data(fan_out(2001)).unwrap();

        let layout = chart.render().unwrap();
        assert_eq!(layout.nodes.len(), 2002, "root, 2000 children, placeholder");
        assert!(!layout.contains(&NodeKey::Int(2001)));
        let placeholder = layout.placeholder_for(&NodeKey::Int(0)).unwrap();
        assert_eq!(
            placeholder.node,
            NodeRef::PagingPlaceholder {
                parent: NodeKey::Int(0),
                remaining: 1
            }
        );
        assert_eq!(placeholder.depth, 1);

        assert_eq!(chart.load_more(&NodeKey::Int(0)).unwrap(), 2001);
        let layout = chart.render().unwrap();
        assert!(layout.contains(&NodeKey::Int(2001)));
        assert!(layout.placeholder_for(&NodeKey::Int(0)).is_none());
        assert_eq!(layout.nodes.len(), 2002);
    }

    #[test]
    fn test_paging_steps_are_monotonic() {
        let config = ChartConfig {
            min_paging_visible_nodes: 3,
            paging_step: 2,
            ..Default::default()
        };
        let mut chart = OrgChart::new(config);
        chart.set_data(fan_out(6)).unwrap();

        let layout = chart.render().unwrap();
        assert_eq!(keys(layout), vec![0, 1, 2, 3]);
        assert_eq!(layout.links.len(), 4, "placeholder is linked too");

        let root = NodeKey::Int(0);
        let cursors: Vec<usize> = (0..3).map(|_| chart.load_more(&root).unwrap()).collect();
        assert_eq!(cursors, vec![5, 6, 6]);
        let layout = chart.render().unwrap();
        assert_eq!(keys(layout), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    /// A highlighted node inside the held-back page is surfaced anyway.
    #[test]
    fn test_paged_node_resurfaces_when_highlighted() {
        let config = ChartConfig {
            min_paging_visible_nodes: 2,
            ..Default::default()
        };
        let mut chart = OrgChart::new(config);
        chart.set_data(fan_out(5)).unwrap();
        chart.set_highlighted_to_root(Some(&NodeKey::Int(5))).unwrap();

        let layout = chart.render().unwrap();
        assert_eq!(keys(layout), vec![0, 1, 2, 5]);
        let placeholder = layout.placeholder_for(&NodeKey::Int(0)).unwrap();
        assert_eq!(
            placeholder.node,
            NodeRef::PagingPlaceholder {
                parent: NodeKey::Int(0),
                remaining: 2
            }
        );
        assert!(layout.node(&NodeKey::Int(0)).unwrap().highlighted_to_root);
    }

    /// A cyclic record set is rejected and the chart keeps rendering the old data.
    #[test]
    fn test_structural_error_rolls_back() {
        let mut chart = OrgChart::default();
        chart.set_data(company()).unwrap();
        let before = keys(chart.render().unwrap());

        let cyclic = vec![
            json!({"id": 1}),
            json!({"id": 2, "parentId": 3}),
            json!({"id": 3, "parentId": 2}),
        ];
        let err = chart.set_data(cyclic).unwrap_err();
        assert!(
            err.to_string().contains("not reachable"),
            "unexpected error: {err}"
        );
        assert_eq!(chart.len(), 9);
        assert_eq!(keys(chart.render().unwrap()), before);
    }

    #[test]
    fn test_remove_node_with_descendants() {
        let mut chart = OrgChart::default();
        chart.set_data(company()).unwrap();
        chart.set_connections(vec![Connection::new(7, 6)]);
        chart.expand_all();

        chart.remove_node(&NodeKey::Int(4)).unwrap();
        assert_eq!(chart.len(), 5);
        let layout = chart.render().unwrap();
        assert_eq!(keys(layout), vec![1, 2, 3, 5, 6]);
        assert!(layout.connections.is_empty(), "endpoint 7 is gone");
    }

    /// Connections follow the displayed set.
    #[test]
    fn test_connection_hidden_until_expanded() {
        let mut chart = OrgChart::default();
        chart.set_data(company()).unwrap();
        chart.set_connections(vec![Connection::new(5, 6).with_label("pairing")]);

        assert!(chart.render().unwrap().connections.is_empty());

        chart.set_expanded(&NodeKey::Int(2), true).unwrap();
        chart.set_expanded(&NodeKey::Int(3), true).unwrap();
        let layout = chart.render().unwrap();
        assert_eq!(layout.connections.len(), 1);
        let conn = &layout.connections[0];
        let from = layout.node(&NodeKey::Int(5)).unwrap();
        let to = layout.node(&NodeKey::Int(6)).unwrap();
        // Label sits halfway between the child-side anchor of 5 and the
        // bottom of 6
        assert_eq!(conn.label_x, (from.x + to.x) / 2.0);
        assert_eq!(conn.label_y, (from.y + to.y + to.height) / 2.0);
    }

    /// Compact mode packs childless siblings two per row.
    #[test]
    fn test_compact_rows_and_columns() {
        let config = ChartConfig {
            compact: true,
            ..Default::default()
        };
        let mut chart = OrgChart::new(config);
        chart.set_data(fan_out(5)).unwrap();
        let layout = chart.render().unwrap();

        let root = layout.node(&NodeKey::Int(0)).unwrap();
        assert!(root.compact.is_none());
        for i in 1..=5i64 {
            let info = layout
                .node(&NodeKey::Int(i))
                .unwrap()
                .compact
                .as_ref()
                .unwrap_or_else(|| panic!("child {i} is packed"));
            assert_eq!(info.first, NodeKey::Int(1));
            assert_eq!(info.row, (i as usize - 1) / 2);
            assert_eq!(info.even, i % 2 == 1, "child {i}");
        }

        let first = layout.node(&NodeKey::Int(1)).unwrap();
        let second = layout.node(&NodeKey::Int(2)).unwrap();
        let third = layout.node(&NodeKey::Int(3)).unwrap();
        assert_eq!(first.y, second.y, "pair shares a row");
        assert_eq!(third.y - first.y, 150.0 + 20.0, "row pitch");
        assert!(first.x < root.x && second.x > root.x, "block centered on parent");
        assert_no_overlap(layout);
    }

    #[test]
    fn test_every_orientation_is_overlap_free() {
        for compact in [false, true] {
            for orientation in Orientation::ALL {
                let config = ChartConfig {
                    layout: orientation,
                    compact,
                    ..Default::default()
                };
                let mut chart = OrgChart::new(config);
                chart.set_data(company()).unwrap();
                chart.expand_all();
                let layout = chart.render().unwrap();
                assert_eq!(layout.nodes.len(), 9);
                assert_eq!(layout.links.len(), 8);
                assert_no_overlap(layout);

                let bounds = layout.bounds.unwrap();
                for node in &layout.nodes {
                    let (min, max) = orientation.bindings().rect(&node.node_box());
                    assert!(bounds.contains(min) && bounds.contains(max));
                }
            }
        }
    }

    #[test]
    fn test_string_keys_and_custom_fields() {
        let config = ChartConfig {
            node_id: "uid".to_owned(),
            parent_node_id: "manager".to_owned(),
            ..Default::default()
        };
        let mut chart = OrgChart::new(config);
        chart
            .set_data(vec![
                json!({"uid": "ceo"}),
                json!({"uid": "cto", "manager": "ceo"}),
                json!({"uid": "1", "manager": "cto"}),
            ])
            .unwrap();
        chart.set_centered(&NodeKey::from("1")).unwrap();
        let layout = chart.render().unwrap();
        assert!(layout.contains(&NodeKey::from("1")));
        assert!(!layout.contains(&NodeKey::Int(1)), "\"1\" is not 1");
        assert_eq!(layout.focus.as_ref().unwrap().id, NodeKey::from("1"));
    }
}
