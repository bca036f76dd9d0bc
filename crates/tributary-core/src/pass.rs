//! Graph optimizer trait, per-run statistics, and pass parameters.

use crate::graph::PipelineGraph;
use crate::item::PipelineItem;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Statistics collected during a single optimizer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizationStats {
    /// Number of rewrites applied.
    pub num_changes: u64,
}

/// String parameters passed to an optimizer's `init`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassConfig {
    parameters: BTreeMap<String, String>,
}

impl PassConfig {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, returning `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Get a raw parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(|s| s.as_str())
    }

    /// Get a boolean parameter (`"true"` or `"false"`).
    ///
    /// Returns `Ok(None)` if the parameter is not set.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(Error::InvalidArgument(format!(
                "Received an invalid value for parameter {}: {}",
                key, other
            ))),
        }
    }

    /// Check if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Iterate over parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Trait for implementing graph optimizers.
///
/// An optimizer rewrites the graph of a `PipelineItem`. Optimizers are created
/// by name through the `OptimizerRegistry` and sequenced by a driver, so each
/// one must treat conditions that simply mean "not applicable here" as a
/// successful no-op rather than an error.
///
/// # Example
///
/// ```ignore
/// struct NoOpOptimizer;
///
/// impl GraphOptimizer for NoOpOptimizer {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn optimize(
///         &self,
///         item: &PipelineItem,
///         _stats: &mut OptimizationStats,
///     ) -> Result<PipelineGraph> {
///         Ok(item.graph.clone())
///     }
/// }
/// ```
pub trait GraphOptimizer: Send + Sync {
    /// Get the optimizer name (used for registration and logging).
    fn name(&self) -> &str;

    /// Configure the optimizer from string parameters.
    ///
    /// Called once by the driver before any `optimize()` call.
    fn init(&mut self, _config: &PassConfig) -> Result<()> {
        Ok(())
    }

    /// Optimize the item's graph.
    ///
    /// # Returns
    ///
    /// * `Ok(graph)` with the rewritten graph (a copy of `item.graph` when
    ///   nothing applies); `stats.num_changes` counts applied rewrites.
    /// * `Err(_)` if the item violates the optimizer's input contract or the
    ///   graph is structurally broken. No partially rewritten graph escapes.
    fn optimize(&self, item: &PipelineItem, stats: &mut OptimizationStats)
    -> Result<PipelineGraph>;
}
