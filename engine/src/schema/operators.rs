//! Operator registry
//!
//! Maps a semantic field type to its valid comparison operators. Each
//! operator carries the value arity it expects, which drives default values,
//! wire decoding, and label phrasing.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{FieldNode, SemanticType};
use crate::filter::types::{RuleValue, ScalarValue};

/// Shape of the value an operator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    None,
    Single,
    Multi,
    Range,
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Before,
    After,
    Between,
    In,
    NotIn,
    /// Relative date shortcut; the value is a [`DatePreset`] key
    Preset,
    IsSet,
    IsNotSet,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Before => "before",
            Self::After => "after",
            Self::Between => "between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Preset => "preset",
            Self::IsSet => "is_set",
            Self::IsNotSet => "is_not_set",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::IsSet | Self::IsNotSet => Arity::None,
            Self::Between => Arity::Range,
            Self::In | Self::NotIn => Arity::Multi,
            _ => Arity::Single,
        }
    }

    pub fn is_preset(&self) -> bool {
        matches!(self, Self::Preset)
    }

    /// Menu label shown next to the operator
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equals => "is",
            Self::NotEquals => "is not",
            Self::Contains => "contains",
            Self::NotContains => "does not contain",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqual => "greater than or equal to",
            Self::LessThan => "less than",
            Self::LessThanOrEqual => "less than or equal to",
            Self::Before => "before",
            Self::After => "after",
            Self::Between => "between",
            Self::In => "is one of",
            Self::NotIn => "is not one of",
            Self::Preset => "within",
            Self::IsSet => "is set",
            Self::IsNotSet => "is not set",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("Unknown operator '{}'", s))
    }
}

/// Registry entry describing one operator for UI menus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorDescriptor {
    pub value: Operator,
    pub label: &'static str,
    pub arity: Arity,
}

impl From<Operator> for OperatorDescriptor {
    fn from(op: Operator) -> Self {
        Self {
            value: op,
            label: op.label(),
            arity: op.arity(),
        }
    }
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::Contains,
    Operator::NotContains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::IsSet,
    Operator::IsNotSet,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::GreaterThanOrEqual,
    Operator::LessThan,
    Operator::LessThanOrEqual,
    Operator::Between,
    Operator::IsSet,
    Operator::IsNotSet,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Before,
    Operator::After,
    Operator::Between,
    Operator::Preset,
    Operator::IsSet,
    Operator::IsNotSet,
];

const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Equals, Operator::NotEquals];

const ENUM_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::In,
    Operator::NotIn,
];

const RELATION_OPERATORS: &[Operator] = &[Operator::IsSet, Operator::IsNotSet];

/// Operators valid for a type, in menu order. Never empty.
pub fn operators_for(field_type: SemanticType) -> &'static [Operator] {
    match field_type {
        SemanticType::String | SemanticType::Text => TEXT_OPERATORS,
        SemanticType::Number => NUMBER_OPERATORS,
        SemanticType::Date | SemanticType::Datetime => DATE_OPERATORS,
        SemanticType::Boolean => BOOLEAN_OPERATORS,
        SemanticType::Enum => ENUM_OPERATORS,
        SemanticType::Relation => RELATION_OPERATORS,
    }
}

/// Descriptors for a type, for building operator menus
pub fn descriptors_for(field_type: SemanticType) -> Vec<OperatorDescriptor> {
    operators_for(field_type)
        .iter()
        .copied()
        .map(OperatorDescriptor::from)
        .collect()
}

/// Operators for a discovered node, honoring its precomputed allow-list.
///
/// Registry order is kept. An allow-list that shares nothing with the
/// registry is ignored.
pub fn operators_for_node(node: &FieldNode) -> Vec<Operator> {
    let registry = operators_for(node.field_type);
    match node.operators.as_deref() {
        Some(allowed) if !allowed.is_empty() => {
            let filtered: Vec<Operator> = registry
                .iter()
                .copied()
                .filter(|op| allowed.contains(op))
                .collect();
            if filtered.is_empty() {
                tracing::debug!(
                    field = %node.name,
                    field_type = %node.field_type,
                    "Operator allow-list matches nothing in registry, using full list"
                );
                registry.to_vec()
            } else {
                filtered
            }
        }
        _ => registry.to_vec(),
    }
}

pub fn is_operator_valid(field_type: SemanticType, op: Operator) -> bool {
    operators_for(field_type).contains(&op)
}

/// Empty value matching the arity of the type's first operator
pub fn default_value_for(field_type: SemanticType) -> RuleValue {
    match field_type {
        SemanticType::String | SemanticType::Text | SemanticType::Enum => {
            RuleValue::Scalar(ScalarValue::Text(String::new()))
        }
        SemanticType::Number | SemanticType::Date | SemanticType::Datetime => {
            RuleValue::Scalar(ScalarValue::Null)
        }
        SemanticType::Boolean => RuleValue::Scalar(ScalarValue::Bool(false)),
        SemanticType::Relation => RuleValue::None,
    }
}

/// Value to seed when a rule switches to `op`
pub fn default_value_for_operator(field_type: SemanticType, op: Operator) -> RuleValue {
    if op.is_preset() {
        return RuleValue::Scalar(ScalarValue::Text(DatePreset::Today.as_str().to_string()));
    }
    match op.arity() {
        Arity::None => RuleValue::None,
        Arity::Range => RuleValue::Range(ScalarValue::Null, ScalarValue::Null),
        Arity::Multi => RuleValue::Multi(Vec::new()),
        Arity::Single => match default_value_for(field_type) {
            RuleValue::Scalar(v) => RuleValue::Scalar(v),
            // Relation fields have no single-value operators; keep the arity right anyway
            _ => RuleValue::Scalar(ScalarValue::Null),
        },
    }
}

// ============================================================================
// DATE PRESETS
// ============================================================================

/// Relative date shortcut used with [`Operator::Preset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePreset {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
    ThisYear,
}

impl DatePreset {
    pub const ALL: [DatePreset; 7] = [
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last30Days,
        Self::ThisMonth,
        Self::LastMonth,
        Self::ThisYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::ThisYear => "this_year",
        }
    }

    /// Phrase used after "is" in labels
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "in the last 7 days",
            Self::Last30Days => "in the last 30 days",
            Self::ThisMonth => "this month",
            Self::LastMonth => "last month",
            Self::ThisYear => "this year",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == key)
    }

    /// Inclusive date range this preset covers, relative to `today`
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Today => (today, today),
            Self::Yesterday => {
                let day = today - Duration::days(1);
                (day, day)
            }
            Self::Last7Days => (today - Duration::days(6), today),
            Self::Last30Days => (today - Duration::days(29), today),
            Self::ThisMonth => (first_of_month(today), today),
            Self::LastMonth => {
                let last_day = first_of_month(today) - Duration::days(1);
                (first_of_month(last_day), last_day)
            }
            Self::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                today,
            ),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
