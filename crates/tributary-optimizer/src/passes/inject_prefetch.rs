//! Prefetch injection pass.
//!
//! Appends `prefetch(AUTOTUNE)` to the end of an input pipeline so that element
//! production overlaps with consumption. The buffer size is left to the
//! runtime autotuner; this pass only decides whether and where to buffer.

use tributary_core::graph_utils::{
    add_scalar_const_node, copy_shapes_and_types_attrs, get_input_node,
    is_item_derived_from_function_def, set_unique_graph_node_name,
};
use tributary_core::{
    Error, GraphOptimizer, NodeDef, NodeInput, OptimizationStats, PassConfig, PipelineGraph,
    PipelineItem, Result, TensorValue,
};
use tracing::{debug, info};

/// Op type of the buffering stage.
pub const PREFETCH_DATASET: &str = "PrefetchDataset";

/// Buffer size sentinel asking the runtime to tune the size.
pub const AUTOTUNE: i64 = -1;

const AUTOTUNE_PARAM: &str = "autotune";
const NAME_PREFIX: &str = "inject/prefetch_";

/// Pass that inserts a `PrefetchDataset` between the last dataset and the sink.
///
/// The rewrite only happens when:
/// 1. Autotuning is enabled (otherwise nothing would size the buffer)
/// 2. The graph is a top-level pipeline, not a function body
/// 3. The last dataset is not already a prefetch
///
/// and is abandoned without error if the last dataset lacks well-formed
/// `output_types`/`output_shapes` attributes.
pub struct InjectPrefetchPass {
    autotune: bool,
}

impl InjectPrefetchPass {
    /// Create a new prefetch injection pass with autotuning enabled.
    pub fn new() -> Self {
        Self { autotune: true }
    }

    /// Create a pass with an explicit autotune setting.
    pub fn with_autotune(autotune: bool) -> Self {
        Self { autotune }
    }

    /// Whether autotuning is enabled.
    pub fn autotune(&self) -> bool {
        self.autotune
    }
}

impl Default for InjectPrefetchPass {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphOptimizer for InjectPrefetchPass {
    fn name(&self) -> &str {
        "inject_prefetch"
    }

    fn init(&mut self, config: &PassConfig) -> Result<()> {
        if let Some(autotune) = config.get_bool(AUTOTUNE_PARAM)? {
            self.autotune = autotune;
        }
        Ok(())
    }

    fn optimize(
        &self,
        item: &PipelineItem,
        stats: &mut OptimizationStats,
    ) -> Result<PipelineGraph> {
        let mut graph = item.graph.clone();

        if !self.autotune {
            debug!("inject_prefetch is not applied if autotune is off");
            return Ok(graph);
        }

        // Rewriting a function body would change every call site.
        if is_item_derived_from_function_def(item, &graph) {
            debug!(item = %item.id, "inject_prefetch skips function-derived graphs");
            return Ok(graph);
        }

        if item.fetch.len() != 1 {
            return Err(Error::InvalidArgument(format!(
                "Expected only one fetch node but there were {}: {}",
                item.fetch.len(),
                item.fetch.join(", ")
            )));
        }

        let sink = graph.node(&item.fetch[0])?;
        let Some(last_node) = get_input_node(sink, &graph) else {
            debug!(sink = %sink.name, "inject_prefetch found no dataset feeding the sink");
            return Ok(graph);
        };

        if last_node.op == PREFETCH_DATASET {
            debug!(
                node = %last_node.name,
                "inject_prefetch is not applied since the last dataset is already prefetched"
            );
            return Ok(graph);
        }

        let last_name = last_node.name.clone();
        let mut prefetch_node = NodeDef::new(PREFETCH_DATASET);

        // Without the element signature the new node would break downstream
        // consumers, so the rewrite is abandoned rather than half-applied.
        if !copy_shapes_and_types_attrs(last_node, &mut prefetch_node) {
            debug!(
                node = %last_name,
                "inject_prefetch aborted: missing output_types/output_shapes"
            );
            return Ok(graph);
        }

        let prefix = format!("{NAME_PREFIX}{last_name}");
        set_unique_graph_node_name(&prefix, &graph, &mut prefetch_node);

        // `input_dataset`
        prefetch_node.add_input(NodeInput::data(last_name.as_str()));
        // `buffer_size`
        let buffer_size = add_scalar_const_node(TensorValue::scalar_i64(AUTOTUNE), &mut graph)?
            .name
            .clone();
        prefetch_node.add_input(NodeInput::data(buffer_size));

        let prefetch_name = graph.add_node(prefetch_node)?.name.clone();
        graph.update_fanouts(&last_name, &prefetch_name)?;

        stats.num_changes += 1;
        info!(after = %last_name, node = %prefetch_name, "injected autotuned prefetch");

        Ok(graph)
    }
}
