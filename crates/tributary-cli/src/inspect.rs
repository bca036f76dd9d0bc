//! Pipeline inspection utilities.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write;
use tributary_core::graph_utils::{OUTPUT_SHAPES, OUTPUT_TYPES};
use tributary_core::{NodeDef, PipelineItem};

/// Build a human-readable summary of a pipeline item.
pub fn summarize(item: &PipelineItem) -> Result<String> {
    let graph = &item.graph;
    let mut out = String::new();

    writeln!(out, "Pipeline: {}", item.id)?;
    writeln!(out, "  Nodes: {}", graph.node_count())?;
    writeln!(out, "  Library functions: {}", graph.library().len())?;
    writeln!(out, "  Fetch: {:?}", item.fetch)?;
    writeln!(out)?;

    let mut op_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *op_counts.entry(node.op.as_str()).or_default() += 1;
    }
    writeln!(out, "Ops ({}):", op_counts.len())?;
    for (op, count) in &op_counts {
        writeln!(out, "  {op}: {count}")?;
    }
    writeln!(out)?;

    writeln!(out, "Nodes (topological order):")?;
    for (i, name) in graph.topological_order()?.into_iter().enumerate() {
        let node = graph.node(name)?;
        writeln!(out, "  {}. {} ({})", i + 1, node.name, node.op)?;
        write_node_details(&mut out, item, node)?;
    }

    Ok(out)
}

fn write_node_details(out: &mut String, item: &PipelineItem, node: &NodeDef) -> Result<()> {
    if !node.inputs.is_empty() {
        let inputs: Vec<String> = node.inputs.iter().map(ToString::to_string).collect();
        writeln!(out, "     Inputs: {}", inputs.join(", "))?;
    }

    let fanouts = item.graph.fanouts(&node.name)?;
    if !fanouts.is_empty() {
        let consumers: Vec<String> = fanouts
            .iter()
            .map(|fanout| format!("{}[{}]", fanout.node.name, fanout.input_index))
            .collect();
        writeln!(out, "     Consumers: {}", consumers.join(", "))?;
    }

    if let (Some(types), Some(shapes)) = (node.attr(OUTPUT_TYPES), node.attr(OUTPUT_SHAPES)) {
        writeln!(out, "     Element: {types} {shapes}")?;
    }

    if item.fetch.contains(&node.name) {
        writeln!(out, "     (fetched)")?;
    }

    Ok(())
}
