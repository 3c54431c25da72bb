//! Requestable filter shape
//!
//! Converts the editing tree into the payload sent with data queries:
//! dotted paths, resolved date presets, no ids or labels.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::types::{ComplexFilter, ComplexFilterRule, FilterGroup, Logic, RuleValue};
use crate::schema::{DatePreset, Operator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestCondition {
    pub path: String,
    pub operator: Operator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestGroup {
    pub logic: Logic,
    pub conditions: Vec<RequestCondition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RequestGroup>,
}

fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

fn to_condition(rule: &ComplexFilterRule, today: NaiveDate) -> Option<RequestCondition> {
    let path = rule.field_path.join(".");
    if rule.operator != Operator::Preset {
        return Some(RequestCondition {
            path,
            operator: rule.operator,
            value: rule.value.to_json(),
        });
    }

    let preset = match &rule.value {
        RuleValue::Scalar(v) => v.as_text().and_then(DatePreset::parse),
        _ => None,
    };
    let Some(preset) = preset else {
        tracing::warn!(rule_id = %rule.id, path = %path, "Unknown date preset, dropping condition");
        return None;
    };
    let (from, to) = preset.resolve(today);
    Some(RequestCondition {
        path,
        operator: Operator::Between,
        value: Some(Value::Array(vec![date_value(from), date_value(to)])),
    })
}

fn to_group(group: &FilterGroup, today: NaiveDate) -> Option<RequestGroup> {
    let conditions: Vec<RequestCondition> = group
        .rules
        .iter()
        .filter_map(|r| to_condition(r, today))
        .collect();
    let groups: Vec<RequestGroup> = group
        .groups
        .iter()
        .filter_map(|g| to_group(g, today))
        .collect();
    if conditions.is_empty() && groups.is_empty() {
        return None;
    }
    Some(RequestGroup {
        logic: group.logic,
        conditions,
        groups,
    })
}

/// Request payload for a filter, resolving presets against `today`.
/// Absent and empty filters produce `None`.
pub fn to_request(filter: Option<&ComplexFilter>, today: NaiveDate) -> Option<RequestGroup> {
    filter.and_then(|f| to_group(&f.root_group, today))
}
