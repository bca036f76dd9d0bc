//! Graph rewrite helpers shared by optimizer passes.

use crate::graph::{NodeDef, PipelineGraph};
use crate::item::PipelineItem;
use crate::types::{AttrValue, TensorValue};
use crate::{Error, Result};

pub const CONST_OP: &str = "Const";
pub const RETVAL_OP: &str = "_Retval";
pub const OUTPUT_TYPES: &str = "output_types";
pub const TOUTPUT_TYPES: &str = "Toutput_types";
pub const OUTPUT_SHAPES: &str = "output_shapes";

/// Return the producer feeding the first data input of `node`.
///
/// Returns `None` if the node has no data input or the producer is not a node
/// of `graph` (e.g. a library function).
pub fn get_input_node<'g>(node: &NodeDef, graph: &'g PipelineGraph) -> Option<&'g NodeDef> {
    let input = node.data_inputs().next()?;
    graph.node(input.node_name()).ok()
}

/// Give `node` a name derived from `prefix` that no node or library function
/// of `graph` uses.
///
/// `prefix` itself is used when free; otherwise `prefix/_N` with `N` counting
/// up from the current node count.
pub fn set_unique_graph_node_name(prefix: &str, graph: &PipelineGraph, node: &mut NodeDef) {
    let mut name = prefix.to_string();
    let mut id = graph.node_count();
    while graph.contains_node(&name) || graph.library().contains(&name) {
        name = format!("{prefix}/_{id}");
        id += 1;
    }
    node.name = name;
}

/// Insert a scalar `Const` node holding `value` and return it.
///
/// # Errors
///
/// Returns an error if `value` is not a scalar.
pub fn add_scalar_const_node(value: TensorValue, graph: &mut PipelineGraph) -> Result<&NodeDef> {
    if !value.is_scalar() {
        return Err(Error::InvalidArgument(format!(
            "Expected a scalar constant, got shape {:?} with {} elements",
            value.shape,
            value.data.len()
        )));
    }

    let mut node = NodeDef::new(CONST_OP);
    set_unique_graph_node_name(CONST_OP, graph, &mut node);
    node.set_attr("dtype", AttrValue::Type(value.dtype));
    node.set_attr("value", AttrValue::Tensor(value));

    graph.add_node(node)
}

/// Copy `output_types` and `output_shapes` from `from` onto `to`.
///
/// Types are read from `output_types`, falling back to `Toutput_types`. Returns
/// `false` without touching `to` if either attribute is missing or does not
/// hold a list of the expected kind.
pub fn copy_shapes_and_types_attrs(from: &NodeDef, to: &mut NodeDef) -> bool {
    let types = match from.attr(OUTPUT_TYPES).or_else(|| from.attr(TOUTPUT_TYPES)) {
        Some(types @ AttrValue::Types(_)) => types.clone(),
        _ => return false,
    };
    let shapes = match from.attr(OUTPUT_SHAPES) {
        Some(shapes @ AttrValue::Shapes(_)) => shapes.clone(),
        _ => return false,
    };

    to.set_attr(OUTPUT_TYPES, types);
    to.set_attr(OUTPUT_SHAPES, shapes);
    true
}

/// Check whether the item's graph is the body of a reusable function.
///
/// Function bodies expose their results through `_Retval` nodes: the item is
/// function-derived when at least one fetch resolves to a `_Retval` node and
/// no fetch resolves to anything else. Fetches missing from the graph are
/// ignored.
pub fn is_item_derived_from_function_def(item: &PipelineItem, graph: &PipelineGraph) -> bool {
    let mut found_retval = false;
    for fetch in &item.fetch {
        match graph.node(fetch) {
            Ok(node) if node.op != RETVAL_OP => return false,
            Ok(_) => found_retval = true,
            Err(_) => {}
        }
    }
    found_retval
}
