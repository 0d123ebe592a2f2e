use fraglab::{
    compiler::compile,
    graph::{control_uniform, ControlBinding, WidgetGraph, WidgetInstance},
    types::ValueType,
    widgetlib,
};

use std::collections::HashMap;

use anyhow::Context;

/// Builds a small demo creation and prints the compiled fragment source.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let registry = &*widgetlib::WIDGETLIB;
    log::info!("loaded {} built-in widgets", registry.len());

    let mut graph = WidgetGraph::new();

    graph.insert(
        "spun",
        WidgetInstance {
            id: 1,
            func: "swirl".to_owned(),
            inputs: HashMap::from([("v".to_owned(), ".pos".to_owned())]),
            controls: vec![ControlBinding {
                param: "strength".to_owned(),
                uniform: control_uniform(1, "strength"),
                ty: ValueType::Float,
            }],
        },
    );

    graph.insert(
        "osc",
        WidgetInstance {
            id: 2,
            func: "wave".to_owned(),
            inputs: HashMap::from([("phase".to_owned(), ".time".to_owned())]),
            controls: vec![ControlBinding {
                param: "shape".to_owned(),
                uniform: control_uniform(2, "shape"),
                ty: ValueType::Int,
            }],
        },
    );

    graph.insert(
        "col",
        WidgetInstance {
            id: 3,
            func: "rgb".to_owned(),
            inputs: HashMap::from([
                ("r".to_owned(), "spun.x".to_owned()),
                ("g".to_owned(), "spun.y".to_owned()),
                ("b".to_owned(), "osc".to_owned()),
            ]),
            controls: Vec::new(),
        },
    );

    let source = compile(registry, &graph, "col").context("compiling demo graph")?;
    println!("{source}");

    Ok(())
}
