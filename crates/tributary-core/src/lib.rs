//! Core pipeline graph IR, mutation utilities, and optimizer traits for Tributary.
//!
//! This crate provides the foundational abstractions the optimizer and CLI depend on:
//! - Name-keyed pipeline graph (`PipelineGraph`, `NodeDef`, `NodeInput`)
//! - Typed node attributes (`AttrValue`, `DataType`, `TensorShape`, `TensorValue`)
//! - Optimization items (`PipelineItem`) and serializable definitions (`GraphDef`)
//! - Graph rewrite helpers shared by passes (`graph_utils`)
//! - Optimizer trait and name-keyed optimizer registry

pub mod graph;
pub mod graph_def;
pub mod graph_utils;
pub mod item;
pub mod pass;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use graph::{Fanout, FunctionLibrary, NodeDef, NodeInput, PipelineGraph};
pub use graph_def::GraphDef;
pub use item::{PipelineItem, PipelineItemDef};
pub use pass::{GraphOptimizer, OptimizationStats, PassConfig};
pub use registry::OptimizerRegistry;
pub use types::{AttrValue, DataType, Dimension, TensorData, TensorShape, TensorValue};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tributary-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Attribute error: {0}")]
    Attribute(String),

    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),
}
