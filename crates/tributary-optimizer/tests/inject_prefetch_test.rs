//! Integration tests for prefetch injection.

mod common;

use common::{consumers, init_tracing, make_fanout_pipeline, make_linear_pipeline};
use tributary_core::graph_utils::{CONST_OP, OUTPUT_SHAPES, OUTPUT_TYPES, RETVAL_OP};
use tributary_core::{FunctionLibrary, NodeDef, NodeInput, PipelineGraph, TensorValue};
use tributary_optimizer::{
    AUTOTUNE, Error, GraphOptimizer, InjectPrefetchPass, OptimizationStats, PREFETCH_DATASET,
    PipelineItem,
};

fn run(pass: &InjectPrefetchPass, item: &PipelineItem) -> (PipelineGraph, u64) {
    let mut stats = OptimizationStats::default();
    let graph = pass.optimize(item, &mut stats).expect("optimize succeeds");
    (graph, stats.num_changes)
}

#[test]
fn test_linear_pipeline_gets_prefetch() {
    init_tracing();
    let item = make_linear_pipeline("MapDataset");

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 1);
    assert_eq!(graph.node_count(), item.graph.node_count() + 2);

    // A -> B -> NewBuffer -> Sink
    let sink = graph.node("Sink").unwrap();
    assert_eq!(sink.inputs.len(), 1);
    let new_buffer = graph.node(sink.inputs[0].node_name()).unwrap();
    assert_eq!(new_buffer.name, "inject/prefetch_B");
    assert_eq!(new_buffer.op, PREFETCH_DATASET);

    // NewBuffer inputs = [B, ConstAutotuneSentinel]
    assert_eq!(new_buffer.inputs.len(), 2);
    assert_eq!(new_buffer.inputs[0], NodeInput::data("B"));
    let sentinel = graph.node(new_buffer.inputs[1].node_name()).unwrap();
    assert_eq!(sentinel.op, CONST_OP);
    let value: TensorValue = sentinel.attr_as("value").unwrap();
    assert!(value.is_scalar());
    assert_eq!(value.as_i64(), Some(&[AUTOTUNE][..]));

    assert_eq!(graph.node("B").unwrap().inputs, vec![NodeInput::data("A")]);
    assert!(graph.validate().is_ok());
    assert_eq!(
        graph.topological_order().unwrap().last().copied(),
        Some("Sink")
    );
}

#[test]
fn test_metadata_copied_from_last_node() {
    init_tracing();
    let item = make_linear_pipeline("ParallelMapDatasetV2");

    let (graph, _) = run(&InjectPrefetchPass::new(), &item);

    let last = graph.node("B").unwrap();
    let prefetch = graph.node("inject/prefetch_B").unwrap();
    assert_eq!(prefetch.attr(OUTPUT_TYPES), last.attr(OUTPUT_TYPES));
    assert_eq!(prefetch.attr(OUTPUT_SHAPES), last.attr(OUTPUT_SHAPES));
    assert!(prefetch.attr(OUTPUT_TYPES).is_some());
}

#[test]
fn test_every_consumer_redirected() {
    init_tracing();
    let item = make_fanout_pipeline();
    let before = consumers(&item.graph, "B");
    assert_eq!(before, vec!["Sink", "Stats", "Checkpoint"]);

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);
    assert_eq!(num_changes, 1);

    // The new node is the only consumer left on B...
    assert_eq!(consumers(&graph, "B"), vec!["inject/prefetch_B"]);
    // ...and inherits all former consumers with ports and edge kinds intact.
    assert_eq!(consumers(&graph, "inject/prefetch_B"), before);
    assert_eq!(
        graph.node("Stats").unwrap().inputs,
        vec![NodeInput::data_port("inject/prefetch_B", 1)]
    );
    assert_eq!(
        graph.node("Checkpoint").unwrap().inputs,
        vec![NodeInput::control("inject/prefetch_B")]
    );
}

#[test]
fn test_idempotent() {
    init_tracing();
    let item = make_linear_pipeline("MapDataset");
    let pass = InjectPrefetchPass::new();

    let (once, first_changes) = run(&pass, &item);
    let second_item = PipelineItem::new(item.id.clone(), once.clone(), item.fetch.clone());
    let (twice, second_changes) = run(&pass, &second_item);

    assert_eq!(first_changes, 1);
    assert_eq!(second_changes, 0);
    assert_eq!(twice.to_def(), once.to_def());
}

#[test]
fn test_already_buffered_unchanged() {
    init_tracing();
    let item = make_linear_pipeline(PREFETCH_DATASET);

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 0);
    assert_eq!(graph.to_def(), item.graph.to_def());
}

#[test]
fn test_autotune_disabled_is_identity() {
    init_tracing();
    for item in [
        make_linear_pipeline("MapDataset"),
        make_fanout_pipeline(),
        PipelineItem::default(),
    ] {
        let (graph, num_changes) = run(&InjectPrefetchPass::with_autotune(false), &item);
        assert_eq!(num_changes, 0);
        assert_eq!(graph.to_def(), item.graph.to_def());
    }
}

#[test]
fn test_fetch_count_must_be_one() {
    init_tracing();
    let base = make_linear_pipeline("MapDataset");

    for fetch in [vec![], vec!["X", "Y"], vec!["Sink", "A", "B"]] {
        let fetch: Vec<String> = fetch.into_iter().map(String::from).collect();
        let item = PipelineItem::new("bad_fetch", base.graph.clone(), fetch.clone());

        let mut stats = OptimizationStats::default();
        let err = InjectPrefetchPass::new()
            .optimize(&item, &mut stats)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)), "got {err}");
        let message = err.to_string();
        assert!(message.contains(&format!("there were {}", fetch.len())));
        for name in &fetch {
            assert!(message.contains(name.as_str()), "{message} should name {name}");
        }
        assert_eq!(stats.num_changes, 0);
        assert_eq!(item.graph.to_def(), base.graph.to_def());
    }
}

#[test]
fn test_function_body_not_rewritten() {
    init_tracing();
    let mut item = make_linear_pipeline("MapDataset");
    item.graph
        .add_node(NodeDef::named("retval", RETVAL_OP).with_input(NodeInput::data("B")))
        .unwrap();
    item.fetch = vec!["retval".to_string()];

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 0);
    assert_eq!(graph.to_def(), item.graph.to_def());
}

#[test]
fn test_missing_signature_aborts_without_side_effects() {
    init_tracing();
    let mut item = make_linear_pipeline("MapDataset");
    let mut graph = PipelineGraph::new();
    for node in item.graph.nodes() {
        let mut node = node.clone();
        if node.name == "B" {
            node.attrs.remove(OUTPUT_SHAPES);
        }
        graph.add_node(node).unwrap();
    }
    item.graph = graph;

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 0);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.to_def(), item.graph.to_def());
}

#[test]
fn test_unique_name_on_collision() {
    init_tracing();
    let mut item = make_linear_pipeline("MapDataset");
    item.graph
        .add_node(NodeDef::named("inject/prefetch_B", "RangeDataset"))
        .unwrap();

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 1);
    let sink = graph.node("Sink").unwrap();
    let new_name = sink.inputs[0].node_name();
    assert_ne!(new_name, "inject/prefetch_B");
    assert!(new_name.starts_with("inject/prefetch_B/_"));
    assert_eq!(graph.node(new_name).unwrap().op, PREFETCH_DATASET);
    assert_eq!(
        graph.node("inject/prefetch_B").unwrap().op,
        "RangeDataset"
    );
}

#[test]
fn test_buffer_size_const_does_not_capture_library_callers() {
    init_tracing();
    let base = make_linear_pipeline("MapDataset");

    let mut library = FunctionLibrary::new();
    library.add(CONST_OP);
    let mut graph = PipelineGraph::with_library(library);
    for node in base.graph.nodes() {
        graph.add_node(node.clone()).unwrap();
    }
    graph
        .add_node(NodeDef::named("call", "PartitionedCall").with_input(NodeInput::data(CONST_OP)))
        .unwrap();
    let item = PipelineItem::new("with_library", graph, base.fetch.clone());

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 1);
    let prefetch = graph.node("inject/prefetch_B").unwrap();
    let buffer_size = prefetch.inputs[1].node_name();
    assert_ne!(buffer_size, CONST_OP);
    assert_eq!(consumers(&graph, buffer_size), vec!["inject/prefetch_B"]);
    assert!(graph.fanins("call").unwrap().is_empty());
    assert!(graph.validate().is_ok());
}

#[test]
fn test_missing_sink_is_structural_error() {
    init_tracing();
    let mut item = make_linear_pipeline("MapDataset");
    item.fetch = vec!["Nowhere".to_string()];

    let mut stats = OptimizationStats::default();
    let err = InjectPrefetchPass::new()
        .optimize(&item, &mut stats)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidGraph(_)));
}

#[test]
fn test_sink_without_input_is_noop() {
    init_tracing();
    let mut item = make_linear_pipeline("MapDataset");
    item.fetch = vec!["A".to_string()];

    let (graph, num_changes) = run(&InjectPrefetchPass::new(), &item);

    assert_eq!(num_changes, 0);
    assert_eq!(graph.to_def(), item.graph.to_def());
}
