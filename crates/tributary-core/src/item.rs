//! Optimization items: a graph plus the nodes the caller observes.

use crate::Result;
use crate::graph::PipelineGraph;
use crate::graph_def::GraphDef;
use serde::{Deserialize, Serialize};

/// A pipeline graph handed to the optimizer.
#[derive(Debug, Clone, Default)]
pub struct PipelineItem {
    /// Identifier used in logs.
    pub id: String,

    /// The pipeline graph.
    pub graph: PipelineGraph,

    /// Names of nodes whose outputs are externally observed.
    pub fetch: Vec<String>,
}

impl PipelineItem {
    /// Create an item for a graph with the given fetch nodes.
    pub fn new(id: impl Into<String>, graph: PipelineGraph, fetch: Vec<String>) -> Self {
        Self {
            id: id.into(),
            graph,
            fetch,
        }
    }

    /// Build an item from its serializable form.
    pub fn from_def(def: PipelineItemDef) -> Result<Self> {
        Ok(Self {
            id: def.id,
            graph: PipelineGraph::from_def(def.graph)?,
            fetch: def.fetch,
        })
    }

    /// Snapshot the item in serializable form.
    pub fn to_def(&self) -> PipelineItemDef {
        PipelineItemDef {
            id: self.id.clone(),
            fetch: self.fetch.clone(),
            graph: self.graph.to_def(),
        }
    }
}

/// Serializable form of a `PipelineItem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineItemDef {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub fetch: Vec<String>,

    pub graph: GraphDef,
}
