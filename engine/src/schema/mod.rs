//! Field schema
//!
//! Semantic field types, the operator registry, and type resolution from
//! column configuration with naming heuristics as fallback.

pub mod operators;
mod resolver;
mod types;

pub use operators::{
    Arity, DatePreset, Operator, OperatorDescriptor, default_value_for,
    default_value_for_operator, descriptors_for, is_operator_valid, operators_for,
    operators_for_node,
};
pub use resolver::{FieldTypeResolver, infer_from_name};
pub use types::{ColumnConfig, ColumnSchema, FieldNode, FieldOption, SemanticType};
