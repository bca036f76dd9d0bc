//! Graphviz DOT output for pipeline graphs.

use anyhow::{Result, bail};
use std::collections::HashSet;
use std::fmt::Write;
use tributary_core::graph_utils::CONST_OP;
use tributary_core::{NodeDef, PipelineItem};
use tributary_optimizer::PREFETCH_DATASET;

/// Generate DOT for the whole pipeline.
pub fn to_dot(item: &PipelineItem) -> Result<String> {
    let selected: HashSet<&str> = item.graph.nodes().map(|node| node.name.as_str()).collect();
    generate_dot(item, &selected)
}

/// Generate DOT for nodes whose name starts with `prefix`, plus every node
/// within `depth` hops of them in either direction.
pub fn to_filtered_dot(item: &PipelineItem, prefix: &str, depth: usize) -> Result<String> {
    let graph = &item.graph;
    let mut selected: HashSet<&str> = graph
        .nodes()
        .filter(|node| node.name.starts_with(prefix))
        .map(|node| node.name.as_str())
        .collect();

    if selected.is_empty() {
        bail!("No nodes found matching filter '{}'", prefix);
    }

    for _ in 0..depth {
        let mut to_add = Vec::new();
        for &name in &selected {
            to_add.extend(graph.fanins(name)?.into_iter().map(|n| n.name.as_str()));
            to_add.extend(graph.fanouts(name)?.into_iter().map(|f| f.node.name.as_str()));
        }
        selected.extend(to_add);
    }

    tracing::debug!(
        num_selected = selected.len(),
        filter = prefix,
        depth,
        "selected nodes for DOT output"
    );

    generate_dot(item, &selected)
}

fn generate_dot(item: &PipelineItem, selected: &HashSet<&str>) -> Result<String> {
    let mut dot = String::from("digraph pipeline {\n");
    dot.push_str("  rankdir=TB;\n");
    dot.push_str("  node [shape=box, style=rounded];\n\n");

    for node in item.graph.nodes() {
        if !selected.contains(node.name.as_str()) {
            continue;
        }
        writeln!(
            dot,
            "  \"{}\" [label=\"{}\\n({})\"{}];",
            escape_dot_string(&node.name),
            escape_dot_string(&node.name),
            escape_dot_string(&node.op),
            node_style(item, node)
        )?;
    }

    dot.push('\n');

    for node in item.graph.nodes() {
        if !selected.contains(node.name.as_str()) {
            continue;
        }
        for input in &node.inputs {
            let producer = input.node_name();
            if !selected.contains(producer) {
                continue;
            }
            let style = if input.is_control() {
                " [style=dashed]"
            } else {
                ""
            };
            writeln!(
                dot,
                "  \"{}\" -> \"{}\"{};",
                escape_dot_string(producer),
                escape_dot_string(&node.name),
                style
            )?;
        }
    }

    dot.push_str("}\n");
    Ok(dot)
}

fn node_style(item: &PipelineItem, node: &NodeDef) -> &'static str {
    if item.fetch.contains(&node.name) {
        ", style=\"rounded,filled\", fillcolor=lightgreen"
    } else if node.op == PREFETCH_DATASET {
        ", style=\"rounded,filled\", fillcolor=lightblue"
    } else if node.op == CONST_OP {
        ", shape=ellipse, style=filled, fillcolor=lightyellow"
    } else {
        ""
    }
}

/// Escape special characters for DOT format.
fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\"', "\\\"")
        .replace('\n', "\\n")
}
