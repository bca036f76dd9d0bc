//! Common test utilities for optimizer tests.
//!
//! Graph builders shared by the pass and pipeline integration tests.

#![allow(dead_code)]

use tributary_core::graph_utils::{OUTPUT_SHAPES, OUTPUT_TYPES};
use tributary_core::{
    AttrValue, DataType, Dimension, NodeDef, NodeInput, PipelineGraph, PipelineItem, TensorShape,
};

/// Initialize a tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Element signature of an image pipeline: `(image: f32[?, 224, 224, 3], label: i64[?])`.
pub fn image_signature() -> (AttrValue, AttrValue) {
    (
        AttrValue::Types(vec![DataType::F32, DataType::I64]),
        AttrValue::Shapes(vec![
            TensorShape::Dynamic(vec![
                Dimension::Unknown,
                Dimension::Static(224),
                Dimension::Static(224),
                Dimension::Static(3),
            ]),
            TensorShape::Dynamic(vec![Dimension::Unknown]),
        ]),
    )
}

/// A dataset node carrying the image element signature.
pub fn dataset(name: &str, op: &str, inputs: &[&str]) -> NodeDef {
    let (types, shapes) = image_signature();
    let mut node = NodeDef::named(name, op)
        .with_attr(OUTPUT_TYPES, types)
        .with_attr(OUTPUT_SHAPES, shapes);
    for input in inputs {
        node.add_input(input.parse().expect("valid input reference"));
    }
    node
}

/// Build the canonical `A -> B -> Sink` pipeline, fetching `Sink`.
///
/// `A` is a `TFRecordDataset`, `B` has op `last_op`, and `Sink` is an
/// `Identity` over `B`.
pub fn make_linear_pipeline(last_op: &str) -> PipelineItem {
    let mut graph = PipelineGraph::new();
    graph
        .add_node(dataset("A", "TFRecordDataset", &[]))
        .expect("add A");
    graph.add_node(dataset("B", last_op, &["A"])).expect("add B");
    graph
        .add_node(NodeDef::named("Sink", "Identity").with_input(NodeInput::data("B")))
        .expect("add Sink");

    PipelineItem::new("linear", graph, vec!["Sink".to_string()])
}

/// Build a pipeline where `B` has several consumers besides the sink.
///
/// ```text
/// A -> B -> Sink
///      B -> Stats (data, port 1)
///      B -> Checkpoint (control)
/// ```
pub fn make_fanout_pipeline() -> PipelineItem {
    let mut item = make_linear_pipeline("BatchDatasetV2");
    item.graph
        .add_node(
            NodeDef::named("Stats", "SetStatsAggregatorDataset")
                .with_input(NodeInput::data_port("B", 1)),
        )
        .expect("add Stats");
    item.graph
        .add_node(NodeDef::named("Checkpoint", "NoOp").with_input(NodeInput::control("B")))
        .expect("add Checkpoint");
    item
}

/// Names of nodes consuming `name`, in graph order.
pub fn consumers(graph: &PipelineGraph, name: &str) -> Vec<String> {
    graph
        .fanouts(name)
        .expect("node exists")
        .into_iter()
        .map(|fanout| fanout.node.name.clone())
        .collect()
}
