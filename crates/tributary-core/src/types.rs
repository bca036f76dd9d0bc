//! Core types for element types, shapes, constant values, and node attributes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element types a pipeline stage can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    F32,
    F64,
    I32,
    I64,
    U8,
    Bool,
    String,
    /// Opaque handle type (nested datasets, resources).
    Variant,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Variant => "variant",
        };
        f.write_str(name)
    }
}

/// A single dimension in a partially known shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Dimension with a known size.
    Static(usize),

    /// Dimension whose size is only known when the pipeline runs.
    Unknown,
}

/// Shape of a single element component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorShape {
    /// All dimensions are known.
    Static(Vec<usize>),

    /// Known rank, some dimensions unknown (e.g. a ragged final batch).
    Dynamic(Vec<Dimension>),

    /// Rank is unknown.
    Unknown,
}

impl TensorShape {
    /// Scalar shape.
    pub fn scalar() -> Self {
        TensorShape::Static(Vec::new())
    }

    /// Check if the shape is fully static.
    pub fn is_static(&self) -> bool {
        matches!(self, TensorShape::Static(_))
    }

    /// Number of dimensions, if known.
    pub fn ndim(&self) -> Option<usize> {
        match self {
            TensorShape::Static(dims) => Some(dims.len()),
            TensorShape::Dynamic(dims) => Some(dims.len()),
            TensorShape::Unknown => None,
        }
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorShape::Static(dims) => {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "[{}]", dims.join(", "))
            }
            TensorShape::Dynamic(dims) => {
                let dims: Vec<String> = dims
                    .iter()
                    .map(|d| match d {
                        Dimension::Static(n) => n.to_string(),
                        Dimension::Unknown => "?".to_string(),
                    })
                    .collect();
                write!(f, "[{}]", dims.join(", "))
            }
            TensorShape::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// Typed storage for constant values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorData {
    I64(Vec<i64>),
    F32(Vec<f32>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl TensorData {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            TensorData::I64(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::String(v) => v.len(),
        }
    }

    /// Check if no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A constant value carried by a `Const` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorValue {
    pub dtype: DataType,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

impl TensorValue {
    /// Create a new constant value.
    pub fn new(data: TensorData, shape: Vec<usize>, dtype: DataType) -> Self {
        Self { dtype, shape, data }
    }

    /// Scalar `i64` constant.
    pub fn scalar_i64(value: i64) -> Self {
        Self::new(TensorData::I64(vec![value]), Vec::new(), DataType::I64)
    }

    /// Scalar `bool` constant.
    pub fn scalar_bool(value: bool) -> Self {
        Self::new(TensorData::Bool(vec![value]), Vec::new(), DataType::Bool)
    }

    /// Check if this value is a scalar (rank 0, one element).
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty() && self.data.len() == 1
    }

    /// Get the data as `i64` slice, if it has that type.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            TensorData::I64(v) => Some(v),
            _ => None,
        }
    }
}

/// Attribute values attached to pipeline nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    Int(i64),
    Float(f32),
    Bool(bool),
    String(String),
    Type(DataType),
    Types(Vec<DataType>),
    Shape(TensorShape),
    Shapes(Vec<TensorShape>),
    Tensor(TensorValue),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::String(v) => write!(f, "{v:?}"),
            AttrValue::Type(t) => write!(f, "{t}"),
            AttrValue::Types(types) => {
                let types: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", types.join(", "))
            }
            AttrValue::Shape(shape) => write!(f, "{shape}"),
            AttrValue::Shapes(shapes) => {
                let shapes: Vec<String> = shapes.iter().map(|s| s.to_string()).collect();
                write!(f, "({})", shapes.join(", "))
            }
            AttrValue::Tensor(value) => write!(f, "{}{:?}", value.dtype, value.data),
        }
    }
}

impl TryFrom<AttrValue> for i64 {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::Int(v) => Ok(v),
            _ => Err("Not an int".to_string()),
        }
    }
}

impl TryFrom<AttrValue> for bool {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::Bool(v) => Ok(v),
            _ => Err("Not a bool".to_string()),
        }
    }
}

impl TryFrom<AttrValue> for String {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::String(v) => Ok(v),
            _ => Err("Not a string".to_string()),
        }
    }
}

impl TryFrom<AttrValue> for Vec<DataType> {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::Types(v) => Ok(v),
            _ => Err("Not a type list".to_string()),
        }
    }
}

impl TryFrom<AttrValue> for Vec<TensorShape> {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::Shapes(v) => Ok(v),
            _ => Err("Not a shape list".to_string()),
        }
    }
}

impl TryFrom<AttrValue> for TensorValue {
    type Error = String;

    fn try_from(value: AttrValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttrValue::Tensor(v) => Ok(v),
            _ => Err("Not a tensor".to_string()),
        }
    }
}
