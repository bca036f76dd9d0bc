//! Serializable graph definitions.

use crate::graph::{FunctionLibrary, NodeDef, PipelineGraph};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Plain, serializable form of a `PipelineGraph`.
///
/// Nodes are kept in insertion order, so two definitions compare equal exactly
/// when the graphs hold the same nodes with the same inputs and attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    pub nodes: Vec<NodeDef>,

    #[serde(default, skip_serializing_if = "FunctionLibrary::is_empty")]
    pub library: FunctionLibrary,
}

impl PipelineGraph {
    /// Build a pipeline graph from a graph definition.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Two nodes share a name, or a node has no name
    /// - A node references an input that is neither a node nor a library function
    pub fn from_def(def: GraphDef) -> Result<Self> {
        let mut graph = PipelineGraph::with_library(def.library);

        for node in def.nodes {
            graph.add_node(node).map_err(|e| {
                Error::InvalidGraph(format!("Failed to build graph from definition: {e}"))
            })?;
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Snapshot the graph as a definition.
    pub fn to_def(&self) -> GraphDef {
        GraphDef {
            nodes: self.nodes().cloned().collect(),
            library: self.library().clone(),
        }
    }
}
