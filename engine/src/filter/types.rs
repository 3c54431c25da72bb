//! Filter descriptor types
//!
//! The recursive AND/OR filter tree. Rule values are a tagged union over
//! operator arity; on the wire they keep the plain JSON shapes
//! (omitted / scalar / `[from, to]` / array) and are decoded by arity.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::schema::{Arity, Operator};

/// Fresh opaque id for rules and groups
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// VALUES
// ============================================================================

/// Single comparison value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ScalarValue {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            },
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Whole numbers print and serialize without a fractional part
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{}", i),
                None => write!(f, "{}", n),
            },
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| D::Error::custom("expected a scalar value"))
    }
}

/// Rule value, shaped by the operator's arity
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RuleValue {
    #[default]
    None,
    Scalar(ScalarValue),
    Range(ScalarValue, ScalarValue),
    Multi(Vec<ScalarValue>),
}

impl RuleValue {
    pub fn arity(&self) -> Arity {
        match self {
            Self::None => Arity::None,
            Self::Scalar(_) => Arity::Single,
            Self::Range(..) => Arity::Range,
            Self::Multi(_) => Arity::Multi,
        }
    }

    pub fn scalar(value: impl Into<ScalarValue>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn range(from: impl Into<ScalarValue>, to: impl Into<ScalarValue>) -> Self {
        Self::Range(from.into(), to.into())
    }

    pub fn multi<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self::Multi(values.into_iter().map(Into::into).collect())
    }

    /// Wire shape; `None` means the `value` key is omitted
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Scalar(v) => Some(v.to_json()),
            Self::Range(from, to) => Some(Value::Array(vec![from.to_json(), to.to_json()])),
            Self::Multi(values) => Some(Value::Array(
                values.iter().map(ScalarValue::to_json).collect(),
            )),
        }
    }

    /// Decode a wire value for an operator of the given arity
    pub fn from_json(arity: Arity, value: Option<&Value>) -> Result<Self, String> {
        match arity {
            Arity::None => Ok(Self::None),
            Arity::Single => match value {
                None => Ok(Self::Scalar(ScalarValue::Null)),
                Some(v) => ScalarValue::from_json(v)
                    .map(Self::Scalar)
                    .ok_or_else(|| "expected a scalar value".to_string()),
            },
            Arity::Range => match value {
                Some(Value::Array(items)) if items.len() == 2 => {
                    let from = ScalarValue::from_json(&items[0]);
                    let to = ScalarValue::from_json(&items[1]);
                    match (from, to) {
                        (Some(from), Some(to)) => Ok(Self::Range(from, to)),
                        _ => Err("range bounds must be scalar values".to_string()),
                    }
                }
                _ => Err("expected a [from, to] pair".to_string()),
            },
            Arity::Multi => match value {
                None | Some(Value::Null) => Ok(Self::Multi(Vec::new())),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|v| {
                        ScalarValue::from_json(v)
                            .ok_or_else(|| "list items must be scalar values".to_string())
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Multi),
                // A lone scalar is a one-element list
                Some(v) => ScalarValue::from_json(v)
                    .map(|s| Self::Multi(vec![s]))
                    .ok_or_else(|| "expected a list of values".to_string()),
            },
        }
    }
}

// ============================================================================
// TREE
// ============================================================================

/// How a group combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf condition of the filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct ComplexFilterRule {
    pub id: String,
    pub field: String,
    pub field_path: Vec<String>,
    pub operator: Operator,
    pub value: RuleValue,
    pub label: Option<String>,
}

impl ComplexFilterRule {
    /// Same field, operator, and value; ids and labels are ignored
    pub fn same_condition(&self, other: &Self) -> bool {
        self.field == other.field && self.operator == other.operator && self.value == other.value
    }
}

/// Wire representation of a rule; the value is decoded by operator arity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(default = "new_id")]
    id: String,
    #[serde(default)]
    field: String,
    #[serde(default)]
    field_path: Vec<String>,
    operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl TryFrom<RawRule> for ComplexFilterRule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let value = RuleValue::from_json(raw.operator.arity(), raw.value.as_ref())
            .map_err(|e| format!("rule '{}' ({}): {}", raw.field, raw.operator, e))?;
        Ok(Self {
            id: raw.id,
            field: raw.field,
            field_path: raw.field_path,
            operator: raw.operator,
            value,
            label: raw.label,
        })
    }
}

impl From<ComplexFilterRule> for RawRule {
    fn from(rule: ComplexFilterRule) -> Self {
        Self {
            value: rule.value.to_json(),
            id: rule.id,
            field: rule.field,
            field_path: rule.field_path,
            operator: rule.operator,
            label: rule.label,
        }
    }
}

/// Node of the filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub rules: Vec<ComplexFilterRule>,
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn new(logic: Logic) -> Self {
        Self {
            id: new_id(),
            logic,
            rules: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ComplexFilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// No rules and no subgroups: semantically "no filter"
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.groups.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.rules.len() + self.groups.len()
    }

    /// Logic only matters with more than one child
    pub fn is_quantified(&self) -> bool {
        self.child_count() > 1
    }

    /// Nesting depth; a group without subgroups has depth 1
    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(FilterGroup::depth).max().unwrap_or(0)
    }

    /// All rules in the subtree, depth-first, group rules before subgroups
    pub fn all_rules(&self) -> Vec<&ComplexFilterRule> {
        let mut out = Vec::new();
        self.collect_rules(&mut out);
        out
    }

    fn collect_rules<'a>(&'a self, out: &mut Vec<&'a ComplexFilterRule>) {
        out.extend(self.rules.iter());
        for group in &self.groups {
            group.collect_rules(out);
        }
    }

    /// Equal shape and conditions, ignoring ids and labels
    pub fn same_structure(&self, other: &Self) -> bool {
        self.logic == other.logic
            && self.rules.len() == other.rules.len()
            && self.groups.len() == other.groups.len()
            && self
                .rules
                .iter()
                .zip(&other.rules)
                .all(|(a, b)| a.same_condition(b))
            && self
                .groups
                .iter()
                .zip(&other.groups)
                .all(|(a, b)| a.same_structure(b))
    }
}

/// Root wrapper. An absent filter is `Option::<ComplexFilter>::None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexFilter {
    pub root_group: FilterGroup,
}

impl ComplexFilter {
    pub fn new(root_group: FilterGroup) -> Self {
        Self { root_group }
    }

    /// Single-rule filter with an AND root
    pub fn single(rule: ComplexFilterRule) -> Self {
        Self::new(FilterGroup::new(Logic::And).with_rule(rule))
    }

    pub fn is_empty(&self) -> bool {
        self.root_group.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.root_group.all_rules().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(field: &str, operator: Operator, value: RuleValue) -> ComplexFilterRule {
        ComplexFilterRule {
            id: new_id(),
            field: field.to_string(),
            field_path: vec![field.to_string()],
            operator,
            value,
            label: None,
        }
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(
            ScalarValue::from_json(&json!(1)),
            ScalarValue::from_json(&json!(1.0))
        );
        assert_eq!(ScalarValue::Number(3.0).to_json(), json!(3));
        assert_eq!(ScalarValue::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn rule_wire_shape_by_arity() {
        let between = rule(
            "createdAt",
            Operator::Between,
            RuleValue::range("2024-01-01", "2024-02-01"),
        );
        let json = serde_json::to_value(&between).unwrap();
        assert_eq!(json["value"], json!(["2024-01-01", "2024-02-01"]));
        assert_eq!(json["fieldPath"], json!(["createdAt"]));

        let is_set = rule("deletedAt", Operator::IsSet, RuleValue::None);
        let json = serde_json::to_value(&is_set).unwrap();
        assert!(json.get("value").is_none());
        assert!(json.get("label").is_none());
    }

    #[test]
    fn two_element_list_decodes_by_operator() {
        let in_rule: ComplexFilterRule = serde_json::from_value(json!({
            "id": "r1", "field": "role", "fieldPath": ["role"],
            "operator": "in", "value": ["ADMIN", "EDITOR"]
        }))
        .unwrap();
        assert_eq!(in_rule.value, RuleValue::multi(["ADMIN", "EDITOR"]));

        let between: ComplexFilterRule = serde_json::from_value(json!({
            "id": "r2", "field": "age", "fieldPath": ["age"],
            "operator": "between", "value": [18, 65]
        }))
        .unwrap();
        assert_eq!(between.value, RuleValue::range(18i64, 65i64));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let result: Result<ComplexFilterRule, _> = serde_json::from_value(json!({
            "field": "age", "fieldPath": ["age"], "operator": "between", "value": [1, 2, 3]
        }));
        assert!(result.is_err());

        let result: Result<ComplexFilterRule, _> = serde_json::from_value(json!({
            "field": "name", "fieldPath": ["name"], "operator": "equals", "value": {"a": 1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_ids_are_generated() {
        let filter: ComplexFilter = serde_json::from_value(json!({
            "rootGroup": {"logic": "OR", "rules": [
                {"field": "isSuperAdmin", "fieldPath": ["isSuperAdmin"], "operator": "equals", "value": true}
            ]}
        }))
        .unwrap();
        assert!(!filter.root_group.id.is_empty());
        assert!(!filter.root_group.rules[0].id.is_empty());
        assert_eq!(filter.root_group.logic, Logic::Or);
    }

    #[test]
    fn depth_and_rules_walk_subgroups() {
        let inner = FilterGroup::new(Logic::Or)
            .with_rule(rule("a", Operator::Equals, RuleValue::scalar("x")))
            .with_rule(rule("b", Operator::Equals, RuleValue::scalar("y")));
        let root = FilterGroup::new(Logic::And)
            .with_rule(rule("c", Operator::IsSet, RuleValue::None))
            .with_group(inner);
        assert_eq!(root.depth(), 2);
        let fields: Vec<&str> = root.all_rules().iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["c", "a", "b"]);
        assert!(root.is_quantified());
    }

    #[test]
    fn same_structure_ignores_ids() {
        let a = FilterGroup::new(Logic::And).with_rule(rule("x", Operator::Equals, RuleValue::scalar(1i64)));
        let b = FilterGroup::new(Logic::And).with_rule(rule("x", Operator::Equals, RuleValue::scalar(1.0)));
        assert_ne!(a.id, b.id);
        assert!(a.same_structure(&b));
    }
}
