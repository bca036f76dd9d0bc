//! Graph optimizer for Tributary data pipelines.
//!
//! This crate takes a `PipelineItem` and runs a configured sequence of graph
//! optimizers over it, each one seeing the graph produced by the previous one.
//! Optimizers are looked up by name in an `OptimizerRegistry`; the built-in set
//! is available from `default_registry()`.
//!
//! # Example
//!
//! ```no_run
//! use tributary_core::{PipelineGraph, PipelineItem};
//! use tributary_optimizer::{OptimizerConfig, optimize};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let graph = PipelineGraph::new();
//! let item = PipelineItem::new("train_input", graph, vec!["dataset".to_string()]);
//!
//! let (graph, report) = optimize(&item, &OptimizerConfig::default())?;
//!
//! println!("Applied {} rewrites, {} nodes", report.total_changes(), graph.node_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod passes;
pub mod registry;

pub use config::OptimizerConfig;
pub use passes::{AUTOTUNE, InjectPrefetchPass, PREFETCH_DATASET};
pub use registry::{INJECT_PREFETCH, default_registry};

// Re-export commonly used types from tributary-core
pub use tributary_core::{
    Error, GraphOptimizer, OptimizationStats, OptimizerRegistry, PipelineGraph, PipelineItem,
    Result,
};

/// Per-optimizer outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationReport {
    /// `(optimizer name, stats)` in execution order.
    pub passes: Vec<(String, OptimizationStats)>,
}

impl OptimizationReport {
    /// Sum of changes over all optimizers.
    pub fn total_changes(&self) -> u64 {
        self.passes.iter().map(|(_, stats)| stats.num_changes).sum()
    }

    /// Changes applied by the named optimizer, if it ran.
    pub fn changes_for(&self, name: &str) -> Option<u64> {
        self.passes
            .iter()
            .find(|(pass, _)| pass == name)
            .map(|(_, stats)| stats.num_changes)
    }
}

/// Optimizer pipeline with pluggable passes.
///
/// Optimizers run in configuration order. Each one receives an item whose
/// graph is the previous optimizer's output; the caller's item is never
/// modified.
pub struct OptimizerPipeline {
    optimizers: Vec<Box<dyn GraphOptimizer>>,
}

impl OptimizerPipeline {
    /// Create a pipeline from configuration.
    ///
    /// Every configured name is instantiated from `registry` and initialized
    /// with its effective parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A configured optimizer is not registered
    /// - An optimizer rejects its parameters
    pub fn new(registry: &OptimizerRegistry, config: &OptimizerConfig) -> Result<Self> {
        let mut optimizers = Vec::with_capacity(config.optimizers.len());

        for name in &config.optimizers {
            let mut optimizer = registry.create(name)?;
            optimizer.init(&config.pass_config(name))?;
            optimizers.push(optimizer);
        }

        Ok(Self { optimizers })
    }

    /// Append an already-initialized optimizer.
    ///
    /// # Returns
    ///
    /// Returns a mutable reference to self for method chaining.
    pub fn add_optimizer(&mut self, optimizer: impl GraphOptimizer + 'static) -> &mut Self {
        self.optimizers.push(Box::new(optimizer));
        self
    }

    /// Names of the optimizers in execution order.
    pub fn optimizer_names(&self) -> impl Iterator<Item = &str> {
        self.optimizers.iter().map(|optimizer| optimizer.name())
    }

    /// Run every optimizer over the item.
    ///
    /// # Errors
    ///
    /// Returns the first optimizer error. Nothing from the failed run is
    /// returned.
    #[tracing::instrument(skip_all, fields(item = %item.id, num_nodes = item.graph.node_count()))]
    pub fn optimize(&self, item: &PipelineItem) -> Result<(PipelineGraph, OptimizationReport)> {
        let mut current = item.clone();
        let mut report = OptimizationReport::default();

        for optimizer in &self.optimizers {
            let _span = tracing::debug_span!("pass", name = optimizer.name()).entered();

            let mut stats = OptimizationStats::default();
            current.graph = optimizer.optimize(&current, &mut stats).inspect_err(|e| {
                tracing::warn!(optimizer = optimizer.name(), error = %e, "optimizer failed");
            })?;

            tracing::debug!(num_changes = stats.num_changes, "optimizer finished");
            report.passes.push((optimizer.name().to_string(), stats));
        }

        Ok((current.graph, report))
    }
}

/// Convenience function: builds a pipeline from the default registry and runs it.
///
/// # Example
///
/// ```no_run
/// use tributary_core::PipelineItem;
/// use tributary_optimizer::{OptimizerConfig, optimize};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let item = PipelineItem::default();
/// let config = OptimizerConfig::default().with_autotune(false);
/// let (graph, report) = optimize(&item, &config)?;
/// assert_eq!(report.total_changes(), 0);
/// # let _ = graph;
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all)]
pub fn optimize(
    item: &PipelineItem,
    config: &OptimizerConfig,
) -> Result<(PipelineGraph, OptimizationReport)> {
    let registry = default_registry();
    OptimizerPipeline::new(&registry, config)?.optimize(item)
}
