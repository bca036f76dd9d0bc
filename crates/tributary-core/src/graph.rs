//! Mutable pipeline graph.
//!
//! The graph is a directed dataflow graph where:
//! - **Nodes** (`NodeDef`) are pipeline stages (e.g. `TFRecordDataset`,
//!   `MapDataset`, `BatchDataset`) identified by a unique name
//! - **Inputs** (`NodeInput`) reference producers by name, either as data
//!   edges (`name`, `name:1`) or control edges (`^name`)
//!
//! Nodes live in a `StableGraph` arena keyed by name. petgraph edges mirror the
//! declared inputs and serve as the fanin/fanout index; every mutation goes
//! through `PipelineGraph` so the index never goes stale.

use crate::types::AttrValue;
use crate::{Error, Result};
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────── NodeInput ───────────────────────────────

/// A reference from a consumer to one of its producers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeInput {
    /// Data edge from output `port` of `node`.
    Data { node: String, port: usize },

    /// Control dependency: ordering only, no data flows.
    Control(String),
}

impl NodeInput {
    /// Data edge from output 0 of `node`.
    pub fn data(node: impl Into<String>) -> Self {
        NodeInput::Data {
            node: node.into(),
            port: 0,
        }
    }

    /// Data edge from a specific output port of `node`.
    pub fn data_port(node: impl Into<String>, port: usize) -> Self {
        NodeInput::Data {
            node: node.into(),
            port,
        }
    }

    /// Control edge from `node`.
    pub fn control(node: impl Into<String>) -> Self {
        NodeInput::Control(node.into())
    }

    /// Name of the referenced producer.
    pub fn node_name(&self) -> &str {
        match self {
            NodeInput::Data { node, .. } => node,
            NodeInput::Control(node) => node,
        }
    }

    /// Check if this is a control edge.
    pub fn is_control(&self) -> bool {
        matches!(self, NodeInput::Control(_))
    }
}

impl fmt::Display for NodeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeInput::Data { node, port: 0 } => f.write_str(node),
            NodeInput::Data { node, port } => write!(f, "{node}:{port}"),
            NodeInput::Control(node) => write!(f, "^{node}"),
        }
    }
}

impl FromStr for NodeInput {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(node) = s.strip_prefix('^') {
            if node.is_empty() {
                return Err(Error::InvalidGraph(format!(
                    "Invalid control input reference '{s}'"
                )));
            }
            return Ok(NodeInput::control(node));
        }

        if let Some((node, port)) = s.rsplit_once(':')
            && let Ok(port) = port.parse::<usize>()
            && !node.is_empty()
        {
            return Ok(NodeInput::data_port(node, port));
        }

        if s.is_empty() {
            return Err(Error::InvalidGraph("Empty input reference".to_string()));
        }

        Ok(NodeInput::data(s))
    }
}

impl TryFrom<String> for NodeInput {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NodeInput> for String {
    fn from(input: NodeInput) -> Self {
        input.to_string()
    }
}

// ──────────────────────────────── NodeDef ────────────────────────────────

/// A pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Node name (unique within the graph).
    pub name: String,

    /// Op type (e.g. "MapDataset", "PrefetchDataset").
    pub op: String,

    /// Ordered inputs. Data inputs come before control inputs.
    #[serde(default)]
    pub inputs: Vec<NodeInput>,

    /// Typed attributes (e.g. `output_types`, `output_shapes`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl NodeDef {
    /// Create an unnamed node of the given op type.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            op: op.into(),
            inputs: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Create a named node of the given op type.
    pub fn named(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(op)
        }
    }

    /// Append an input.
    pub fn add_input(&mut self, input: NodeInput) {
        self.inputs.push(input);
    }

    /// Builder-style `add_input`.
    pub fn with_input(mut self, input: NodeInput) -> Self {
        self.add_input(input);
        self
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: AttrValue) {
        self.attrs.insert(key.into(), value);
    }

    /// Builder-style `set_attr`.
    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Get an attribute.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Get an attribute converted to a concrete type.
    pub fn attr_as<T>(&self, key: &str) -> Result<T>
    where
        T: TryFrom<AttrValue>,
        T::Error: fmt::Display,
    {
        let value = self.attrs.get(key).ok_or_else(|| {
            Error::Attribute(format!("Node '{}' has no attribute '{}'", self.name, key))
        })?;

        T::try_from(value.clone()).map_err(|e| {
            Error::Attribute(format!("Attribute '{}' on node '{}': {}", key, self.name, e))
        })
    }

    /// Iterate over data inputs in order.
    pub fn data_inputs(&self) -> impl Iterator<Item = &NodeInput> {
        self.inputs.iter().filter(|input| !input.is_control())
    }
}

// ───────────────────────────── FunctionLibrary ────────────────────────────

/// Reusable functions a graph may reference by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionLibrary {
    functions: BTreeSet<String>,
}

impl FunctionLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function name.
    pub fn add(&mut self, name: impl Into<String>) {
        self.functions.insert(name.into());
    }

    /// Check if a function is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

// ─────────────────────────────── PipelineGraph ────────────────────────────

/// A consumer edge of some node.
#[derive(Debug, Clone, Copy)]
pub struct Fanout<'a> {
    /// The consuming node.
    pub node: &'a NodeDef,

    /// Position of the reference in `node.inputs`.
    pub input_index: usize,
}

/// Mutable pipeline graph.
///
/// Edge weights are the index of the input in the consumer's input list.
#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    graph: StableGraph<NodeDef, usize>,

    /// Lookup table: node name -> node index.
    node_by_name: HashMap<String, NodeIndex>,

    /// Consumers whose inputs name a node that has not been added yet.
    unresolved: HashMap<String, Vec<NodeIndex>>,

    library: FunctionLibrary,
}

impl PipelineGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph backed by a function library.
    pub fn with_library(library: FunctionLibrary) -> Self {
        Self {
            library,
            ..Self::default()
        }
    }

    // ── Node access ──

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Result<&NodeDef> {
        let index = self.index_of(name)?;
        Ok(&self.graph[index])
    }

    /// Check if a node with the given name exists.
    pub fn contains_node(&self, name: &str) -> bool {
        self.node_by_name.contains_key(name)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDef> {
        self.graph
            .node_indices()
            .filter_map(|index| self.graph.node_weight(index))
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The companion function library.
    pub fn library(&self) -> &FunctionLibrary {
        &self.library
    }

    /// All consumer edges of a node, ordered by consumer insertion then input index.
    pub fn fanouts(&self, name: &str) -> Result<Vec<Fanout<'_>>> {
        let index = self.index_of(name)?;
        let mut fanouts: Vec<(NodeIndex, usize)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
            .collect();
        fanouts.sort();

        Ok(fanouts
            .into_iter()
            .map(|(consumer, input_index)| Fanout {
                node: &self.graph[consumer],
                input_index,
            })
            .collect())
    }

    /// Producers referenced by a node's inputs that exist in the graph, in input order.
    pub fn fanins(&self, name: &str) -> Result<Vec<&NodeDef>> {
        let index = self.index_of(name)?;
        let mut fanins: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| (*edge.weight(), edge.source()))
            .collect();
        fanins.sort();

        Ok(fanins
            .into_iter()
            .map(|(_, producer)| &self.graph[producer])
            .collect())
    }

    // ── Graph mutation ──

    /// Insert a fully formed node and return the graph-owned instance.
    ///
    /// Inputs may reference nodes that are added later; the fanout index picks
    /// them up when the producer arrives.
    pub fn add_node(&mut self, node: NodeDef) -> Result<&NodeDef> {
        if node.name.is_empty() {
            return Err(Error::InvalidGraph(format!(
                "Cannot add unnamed node with op '{}'",
                node.op
            )));
        }
        if self.node_by_name.contains_key(&node.name) {
            return Err(Error::InvalidGraph(format!(
                "Node name '{}' already exists",
                node.name
            )));
        }
        if self.library.contains(&node.name) {
            return Err(Error::InvalidGraph(format!(
                "Node name '{}' is already a library function",
                node.name
            )));
        }

        let name = node.name.clone();
        let index = self.graph.add_node(node);
        self.node_by_name.insert(name.clone(), index);
        self.connect_inputs(index);

        // Wire up consumers that were waiting for this producer
        if let Some(waiting) = self.unresolved.remove(&name) {
            for consumer in waiting {
                let positions: Vec<usize> = self.graph[consumer]
                    .inputs
                    .iter()
                    .enumerate()
                    .filter(|(_, input)| input.node_name() == name)
                    .map(|(i, _)| i)
                    .collect();
                for position in positions {
                    self.graph.add_edge(index, consumer, position);
                }
            }
        }

        Ok(&self.graph[index])
    }

    /// Redirect every consumer of `from` to consume `to` instead.
    ///
    /// Data inputs keep their port; control inputs are rewritten and dropped
    /// when the consumer already depends on `to`. The node `to` itself is never
    /// rewritten, so an edge `to -> from` cannot turn into a self-loop.
    ///
    /// All rewritten input lists are computed before any is committed: on error
    /// the graph is untouched.
    pub fn update_fanouts(&mut self, from: &str, to: &str) -> Result<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        if from_index == to_index {
            return Ok(());
        }

        let consumers: BTreeSet<NodeIndex> = self
            .graph
            .edges_directed(from_index, Direction::Outgoing)
            .map(|edge| edge.target())
            .filter(|&consumer| consumer != to_index)
            .collect();

        let rewrites: Vec<(NodeIndex, Vec<NodeInput>)> = consumers
            .into_iter()
            .map(|consumer| {
                let inputs = redirect_inputs(&self.graph[consumer].inputs, from, to);
                (consumer, inputs)
            })
            .collect();

        tracing::trace!(from, to, num_consumers = rewrites.len(), "updating fanouts");

        for (consumer, inputs) in rewrites {
            self.set_inputs(consumer, inputs);
        }

        Ok(())
    }

    // ── Graph queries ──

    /// Get the topological order of node names.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        let order = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            Error::InvalidGraph(format!(
                "Graph contains a cycle through node '{}'",
                self.graph[cycle.node_id()].name
            ))
        })?;

        Ok(order
            .into_iter()
            .map(|index| self.graph[index].name.as_str())
            .collect())
    }

    /// Validate graph structure.
    ///
    /// Every input must reference a node in the graph or a function in the
    /// companion library.
    pub fn validate(&self) -> Result<()> {
        for node in self.nodes() {
            for input in &node.inputs {
                let name = input.node_name();
                if !self.contains_node(name) && !self.library.contains(name) {
                    return Err(Error::InvalidGraph(format!(
                        "Node '{}' references unknown input '{}'",
                        node.name, input
                    )));
                }
            }
        }

        Ok(())
    }

    // ── Internals ──

    fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.node_by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidGraph(format!("Node '{}' not found", name)))
    }

    /// Add fanin edges for every input of `index`, parking unknown producers.
    fn connect_inputs(&mut self, index: NodeIndex) {
        let producers: Vec<(usize, String)> = self.graph[index]
            .inputs
            .iter()
            .enumerate()
            .map(|(i, input)| (i, input.node_name().to_string()))
            .collect();

        for (position, producer) in producers {
            match self.node_by_name.get(&producer) {
                Some(&producer_index) => {
                    self.graph.add_edge(producer_index, index, position);
                }
                None => {
                    let waiting = self.unresolved.entry(producer).or_default();
                    if !waiting.contains(&index) {
                        waiting.push(index);
                    }
                }
            }
        }
    }

    /// Replace a node's inputs and rebuild its fanin edges.
    fn set_inputs(&mut self, index: NodeIndex, inputs: Vec<NodeInput>) {
        let stale: Vec<EdgeIndex> = self
            .graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| edge.id())
            .collect();
        for edge in stale {
            self.graph.remove_edge(edge);
        }

        for waiting in self.unresolved.values_mut() {
            waiting.retain(|&consumer| consumer != index);
        }
        self.unresolved.retain(|_, waiting| !waiting.is_empty());

        self.graph[index].inputs = inputs;
        self.connect_inputs(index);
    }
}

/// Rewrite references to `from` into references to `to`.
///
/// A control input on `to` is kept at most once, and not at all when the
/// rewritten list also has a data input from `to`.
fn redirect_inputs(inputs: &[NodeInput], from: &str, to: &str) -> Vec<NodeInput> {
    let has_data_from_to = inputs.iter().any(|input| match input {
        NodeInput::Data { node, .. } => node == from || node == to,
        NodeInput::Control(_) => false,
    });

    let mut redirected: Vec<NodeInput> = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            NodeInput::Data { node, port } if node == from => {
                redirected.push(NodeInput::data_port(to, *port));
            }
            NodeInput::Control(node) if node == from || node == to => {
                let control = NodeInput::control(to);
                if !has_data_from_to && !redirected.contains(&control) {
                    redirected.push(control);
                }
            }
            other => redirected.push(other.clone()),
        }
    }

    redirected
}
