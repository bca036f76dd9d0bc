//! Default optimizer registry.

use tributary_core::OptimizerRegistry;

use crate::passes::InjectPrefetchPass;

/// Name under which `InjectPrefetchPass` is registered.
pub const INJECT_PREFETCH: &str = "inject_prefetch";

/// Returns an optimizer registry pre-populated with the built-in passes.
///
/// The registry includes:
/// - `inject_prefetch` (`InjectPrefetchPass`)
///
/// Custom optimizers can be added to the returned registry via
/// `registry.register(name, factory)`.
pub fn default_registry() -> OptimizerRegistry {
    let mut registry = OptimizerRegistry::new();

    registry.register(INJECT_PREFETCH, InjectPrefetchPass::new);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let registry = default_registry();
        assert_eq!(registry.len(), 1);

        let optimizer = registry.create(INJECT_PREFETCH).unwrap();
        assert_eq!(optimizer.name(), INJECT_PREFETCH);
    }
}
