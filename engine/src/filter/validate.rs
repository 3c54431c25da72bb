//! Rule validation and descriptor parsing
//!
//! Validation runs before any rule crosses the public tree operations, and
//! parsing rejects descriptors that are too large, too deep, or malformed.

use thiserror::Error;

use super::types::{ComplexFilter, ComplexFilterRule, FilterGroup};
use crate::core::constants::{MAX_FILTER_JSON_SIZE, MAX_FILTER_RULES};
use crate::schema::{SemanticType, is_operator_valid};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    #[error("Invalid filter JSON: {0}")]
    InvalidJson(String),

    #[error("Maximum {max} rules allowed, found {found}")]
    TooManyRules { max: usize, found: usize },

    #[error("Filter nesting depth {depth} exceeds limit of {max}")]
    TooDeep { depth: usize, max: usize },

    #[error("Invalid rule '{rule_id}': {reason}")]
    InvalidRule { rule_id: String, reason: String },
}

/// Why a rule is unusable, or `None` if it is valid
pub fn rule_problem(rule: &ComplexFilterRule) -> Option<String> {
    if rule.field.trim().is_empty() {
        return Some("missing field".to_string());
    }
    let Some(last) = rule.field_path.last() else {
        return Some("empty field path".to_string());
    };
    if last != &rule.field {
        return Some(format!(
            "field path must end with '{}', ends with '{}'",
            rule.field, last
        ));
    }
    if rule.field_path.iter().any(|s| s.trim().is_empty()) {
        return Some("empty field path segment".to_string());
    }
    if rule.value.arity() != rule.operator.arity() {
        return Some(format!(
            "operator '{}' expects a {:?} value",
            rule.operator,
            rule.operator.arity()
        ));
    }
    None
}

/// Structural validity: field present, path ends in field, value fits the operator
pub fn is_valid_rule(rule: &ComplexFilterRule) -> bool {
    rule_problem(rule).is_none()
}

/// Structural validity plus operator membership for the field's type
pub fn is_valid_rule_for(rule: &ComplexFilterRule, field_type: SemanticType) -> bool {
    is_valid_rule(rule) && is_operator_valid(field_type, rule.operator)
}

fn check_group(group: &FilterGroup) -> Result<(), FilterError> {
    for rule in &group.rules {
        if let Some(reason) = rule_problem(rule) {
            return Err(FilterError::InvalidRule {
                rule_id: rule.id.clone(),
                reason,
            });
        }
    }
    group.groups.iter().try_for_each(check_group)
}

/// Check limits and rule validity of an already typed descriptor
pub fn validate_filter(filter: &ComplexFilter, max_depth: usize) -> Result<(), FilterError> {
    let depth = filter.root_group.depth();
    if depth > max_depth {
        return Err(FilterError::TooDeep {
            depth,
            max: max_depth,
        });
    }
    let found = filter.rule_count();
    if found > MAX_FILTER_RULES {
        return Err(FilterError::TooManyRules {
            max: MAX_FILTER_RULES,
            found,
        });
    }
    check_group(&filter.root_group)
}

/// Parse a filter descriptor nested at most `max_depth` groups deep.
/// `null` and empty trees parse to absent.
pub fn parse_filter(
    json_str: &str,
    max_depth: usize,
) -> Result<Option<ComplexFilter>, FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::TooLarge {
            max: MAX_FILTER_JSON_SIZE,
        });
    }

    let filter: Option<ComplexFilter> =
        serde_json::from_str(json_str).map_err(|e| FilterError::InvalidJson(e.to_string()))?;

    let Some(filter) = filter else {
        return Ok(None);
    };
    validate_filter(&filter, max_depth)?;

    Ok(super::tree::normalize(Some(filter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::DEFAULT_MAX_GROUP_DEPTH;
    use crate::filter::types::{RuleValue, new_id};
    use crate::schema::Operator;

    fn rule(field: &str, path: &[&str], operator: Operator, value: RuleValue) -> ComplexFilterRule {
        ComplexFilterRule {
            id: new_id(),
            field: field.to_string(),
            field_path: path.iter().map(|s| s.to_string()).collect(),
            operator,
            value,
            label: None,
        }
    }

    #[test]
    fn valid_rule() {
        let r = rule(
            "name",
            &["company", "name"],
            Operator::Contains,
            RuleValue::scalar("acme"),
        );
        assert!(is_valid_rule(&r));
        assert!(is_valid_rule_for(&r, SemanticType::String));
        assert!(!is_valid_rule_for(&r, SemanticType::Boolean));
    }

    #[test]
    fn missing_field_or_path_is_invalid() {
        assert!(!is_valid_rule(&rule(
            "",
            &[""],
            Operator::Equals,
            RuleValue::scalar("x")
        )));
        assert!(!is_valid_rule(&rule(
            "name",
            &[],
            Operator::Equals,
            RuleValue::scalar("x")
        )));
        assert!(!is_valid_rule(&rule(
            "name",
            &["company", "title"],
            Operator::Equals,
            RuleValue::scalar("x")
        )));
    }

    #[test]
    fn arity_mismatch_is_invalid() {
        let r = rule("age", &["age"], Operator::Between, RuleValue::scalar(3i64));
        assert_eq!(
            rule_problem(&r).as_deref(),
            Some("operator 'between' expects a Range value")
        );
    }

    #[test]
    fn parse_null_is_absent() {
        assert_eq!(parse_filter("null", DEFAULT_MAX_GROUP_DEPTH), Ok(None));
    }

    #[test]
    fn parse_empty_tree_is_absent() {
        let json = r#"{"rootGroup": {"id": "g", "logic": "AND", "rules": [], "groups": []}}"#;
        assert_eq!(parse_filter(json, DEFAULT_MAX_GROUP_DEPTH), Ok(None));
    }

    #[test]
    fn parse_rejects_invalid_rule() {
        let json = r#"{"rootGroup": {"rules": [
            {"id": "r1", "field": "status", "fieldPath": [], "operator": "equals", "value": "A"}
        ]}}"#;
        assert!(matches!(
            parse_filter(json, DEFAULT_MAX_GROUP_DEPTH),
            Err(FilterError::InvalidRule { rule_id, .. }) if rule_id == "r1"
        ));
    }

    #[test]
    fn parse_rejects_missing_root_group() {
        assert!(matches!(
            parse_filter(r#"{"rules": []}"#, DEFAULT_MAX_GROUP_DEPTH),
            Err(FilterError::InvalidJson(_))
        ));
    }

    #[test]
    fn parse_rejects_oversized_json() {
        let json = " ".repeat(MAX_FILTER_JSON_SIZE + 1);
        assert_eq!(
            parse_filter(&json, DEFAULT_MAX_GROUP_DEPTH),
            Err(FilterError::TooLarge {
                max: MAX_FILTER_JSON_SIZE
            })
        );
    }

    #[test]
    fn validate_rejects_deep_nesting() {
        let mut group = FilterGroup::new(Default::default()).with_rule(rule(
            "a",
            &["a"],
            Operator::IsSet,
            RuleValue::None,
        ));
        for _ in 0..5 {
            group = FilterGroup::new(Default::default()).with_group(group);
        }
        let filter = ComplexFilter::new(group);
        assert!(matches!(
            validate_filter(&filter, 3),
            Err(FilterError::TooDeep { depth: 6, max: 3 })
        ));
        assert!(validate_filter(&filter, 10).is_ok());
    }

    #[test]
    fn parse_honours_configured_depth() {
        let leaf = r#"{"logic": "AND", "rules": [
            {"id": "r1", "field": "age", "fieldPath": ["age"], "operator": "is_set"}
        ]}"#;
        let root = (1..36).fold(leaf.to_string(), |inner, _| {
            format!(r#"{{"logic": "OR", "groups": [{}]}}"#, inner)
        });
        let json = format!(r#"{{"rootGroup": {}}}"#, root);

        let parsed = parse_filter(&json, 40).unwrap().unwrap();
        assert_eq!(parsed.root_group.depth(), 36);
        assert_eq!(
            parse_filter(&json, DEFAULT_MAX_GROUP_DEPTH),
            Err(FilterError::TooDeep { depth: 36, max: 32 })
        );
    }
}
