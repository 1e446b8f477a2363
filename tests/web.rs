//! Tests of the JS-facing API. Run with `wasm-pack test --node`.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Reflect};
use org_chart_wasm::OrgChartWasm;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

fn data() -> JsValue {
    let rows = Array::new();
    for (id, parent) in [(1, None), (2, Some(1)), (3, Some(1)), (4, Some(2))] {
        let row = js_sys::Object::new();
        Reflect::set(&row, &"id".into(), &JsValue::from(id)).unwrap();
        if let Some(parent) = parent {
            Reflect::set(&row, &"parentId".into(), &JsValue::from(parent)).unwrap();
        }
        rows.push(&row);
    }
    rows.into()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &key.into()).unwrap()
}

fn node_count(layout: &JsValue) -> u32 {
    Array::from(&get(layout, "nodes")).length()
}

#[wasm_bindgen_test]
fn test_render_returns_plain_objects() {
    let mut chart = OrgChartWasm::new(JsValue::UNDEFINED).unwrap();
    chart.set_data(data()).unwrap();
    let layout = chart.render().unwrap();

    assert_eq!(node_count(&layout), 3);
    assert_eq!(get(&layout, "orientation").as_string().as_deref(), Some("top"));
    let first = Array::from(&get(&layout, "nodes")).get(0);
    assert_eq!(get(&get(&first, "node"), "kind").as_string().as_deref(), Some("record"));
    assert!(get(&layout, "bounds").is_object());
}

#[wasm_bindgen_test]
fn test_missing_node_returns_false() {
    let mut chart = OrgChartWasm::new(JsValue::NULL).unwrap();
    chart.set_data(data()).unwrap();

    assert!(!chart.remove_node(JsValue::from(99)).unwrap());
    assert_eq!(chart.toggle(JsValue::from(99)).unwrap(), None);
    assert_eq!(chart.toggle(JsValue::from(2)).unwrap(), Some(true));
    assert_eq!(node_count(&chart.render().unwrap()), 4);
}

#[wasm_bindgen_test]
fn test_structural_error_throws() {
    let mut chart = OrgChartWasm::new(JsValue::UNDEFINED).unwrap();
    chart.set_data(data()).unwrap();

    let orphan = js_sys::Object::new();
    Reflect::set(&orphan, &"id".into(), &JsValue::from(5)).unwrap();
    Reflect::set(&orphan, &"parentId".into(), &JsValue::from(42)).unwrap();
    assert!(chart.add_node(orphan.into()).is_err());
    assert_eq!(chart.node_count(), 4);
}

#[wasm_bindgen_test]
fn test_config_and_size_accessor() {
    let config = js_sys::Object::new();
    Reflect::set(&config, &"layout".into(), &"left".into()).unwrap();
    let mut chart = OrgChartWasm::new(config.into()).unwrap();
    chart.set_data(data()).unwrap();

    let sizer = Function::new_with_args("d", "return { width: 80, height: 40 + d.id };");
    chart.set_size_accessor(Some(sizer));
    let layout = chart.render().unwrap();
    let root = Array::from(&get(&layout, "nodes")).get(0);
    assert_eq!(get(&root, "width").as_f64(), Some(80.0));
    assert_eq!(get(&root, "height").as_f64(), Some(41.0));

    let transform = chart.fit_transform(800.0, 600.0).unwrap();
    assert!(get(&transform, "scale").as_f64().unwrap() > 0.0);
}
