//! Optimizer pipeline configuration.

use crate::registry::INJECT_PREFETCH;
use std::collections::HashMap;
use tributary_core::{Error, PassConfig, Result};

/// Which optimizers run, in what order, and with which parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Optimizer names in execution order.
    pub optimizers: Vec<String>,

    /// Global autotune switch, forwarded to every optimizer as `autotune`.
    pub autotune: Option<bool>,

    /// Per-optimizer parameters. These override the global `autotune`.
    pub parameters: HashMap<String, PassConfig>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            optimizers: vec![INJECT_PREFETCH.to_string()],
            autotune: None,
            parameters: HashMap::new(),
        }
    }
}

impl OptimizerConfig {
    /// Configuration running exactly the given optimizers.
    pub fn with_optimizers<I, S>(optimizers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            optimizers: optimizers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the global autotune switch.
    pub fn with_autotune(mut self, autotune: bool) -> Self {
        self.autotune = Some(autotune);
        self
    }

    /// Set one optimizer parameter.
    pub fn set_parameter(
        &mut self,
        optimizer: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.parameters
            .entry(optimizer.into())
            .or_default()
            .set(key, value);
    }

    /// Parse an `optimizer:key:value` entry and apply it.
    ///
    /// The value may itself contain `:`.
    pub fn parse_entry(&mut self, entry: &str) -> Result<()> {
        let mut parts = entry.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(optimizer), Some(key), Some(value))
                if !optimizer.is_empty() && !key.is_empty() =>
            {
                self.set_parameter(optimizer, key, value);
                Ok(())
            }
            _ => Err(Error::InvalidArgument(format!(
                "Invalid optimizer config '{}', expected optimizer:key:value",
                entry
            ))),
        }
    }

    /// Effective parameters for one optimizer.
    pub fn pass_config(&self, optimizer: &str) -> PassConfig {
        let mut config = PassConfig::new();
        if let Some(autotune) = self.autotune {
            config.set("autotune", autotune.to_string());
        }
        if let Some(parameters) = self.parameters.get(optimizer) {
            for (key, value) in parameters.iter() {
                config.set(key, value);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_inject_prefetch() {
        let config = OptimizerConfig::default();
        assert_eq!(config.optimizers, vec!["inject_prefetch"]);
        assert!(config.pass_config(INJECT_PREFETCH).is_empty());
    }

    #[test]
    fn test_parse_entry() {
        let mut config = OptimizerConfig::default();
        config.parse_entry("inject_prefetch:autotune:false").unwrap();
        config.parse_entry("other:path:/tmp/a:b").unwrap();

        assert_eq!(
            config.pass_config(INJECT_PREFETCH).get("autotune"),
            Some("false")
        );
        assert_eq!(config.pass_config("other").get("path"), Some("/tmp/a:b"));

        assert!(config.parse_entry("inject_prefetch:autotune").is_err());
        assert!(config.parse_entry(":autotune:true").is_err());
        assert!(config.parse_entry("").is_err());
    }

    #[test]
    fn test_per_pass_parameters_override_global_autotune() {
        let mut config = OptimizerConfig::default().with_autotune(true);
        assert_eq!(
            config.pass_config(INJECT_PREFETCH).get_bool("autotune").unwrap(),
            Some(true)
        );

        config.set_parameter(INJECT_PREFETCH, "autotune", "false");
        assert_eq!(
            config.pass_config(INJECT_PREFETCH).get_bool("autotune").unwrap(),
            Some(false)
        );
        assert_eq!(
            config.pass_config("other").get_bool("autotune").unwrap(),
            Some(true)
        );
    }
}
