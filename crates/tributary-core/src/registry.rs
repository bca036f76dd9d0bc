//! Optimizer registry for name-based construction.

use crate::pass::GraphOptimizer;
use crate::{Error, Result};
use std::collections::HashMap;

/// Constructor for a fresh optimizer instance.
pub type OptimizerFactory = Box<dyn Fn() -> Box<dyn GraphOptimizer> + Send + Sync>;

/// Registry of optimizer constructors.
///
/// Maps optimizer names (e.g., "inject_prefetch") to factories producing
/// fresh, uninitialized instances. A driver looks optimizers up by name so
/// they can be enabled, disabled and ordered from configuration.
///
/// # Example
///
/// ```ignore
/// let mut registry = OptimizerRegistry::new();
/// registry.register("inject_prefetch", InjectPrefetchPass::new);
///
/// let optimizer = registry.create("inject_prefetch")?;
/// ```
pub struct OptimizerRegistry {
    /// Map from optimizer name to factory.
    factories: HashMap<String, OptimizerFactory>,
}

impl OptimizerRegistry {
    /// Create a new empty optimizer registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register an optimizer factory.
    ///
    /// Registering a name twice replaces the earlier factory. Returns `self`
    /// for method chaining.
    pub fn register<F, O>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: GraphOptimizer + 'static,
    {
        self.factories.insert(
            name.to_string(),
            Box::new(move || Box::new(factory()) as Box<dyn GraphOptimizer>),
        );
        self
    }

    /// Create a fresh optimizer by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownOptimizer` if no factory is registered.
    pub fn create(&self, name: &str) -> Result<Box<dyn GraphOptimizer>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownOptimizer(name.to_string()))
    }

    /// Check if an optimizer is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Get the number of registered optimizers.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Iterate over all registered optimizer names.
    pub fn optimizer_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }
}

impl Default for OptimizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
