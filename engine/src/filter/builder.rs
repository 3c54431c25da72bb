//! Rule construction from discovered fields
//!
//! Rules built here carry a label so serialized filters stay readable
//! without the column schema that produced them.

use super::label::{fallback_label, format_rule_label};
use super::types::{ComplexFilter, ComplexFilterRule, RuleValue, new_id};
use crate::schema::{FieldNode, Operator, default_value_for_operator};

fn label_for(
    field: &FieldNode,
    operator: Operator,
    value: &RuleValue,
    display_field_name: Option<&str>,
) -> String {
    match display_field_name.filter(|d| !d.trim().is_empty()) {
        Some(display) => format_rule_label(
            display,
            operator,
            value,
            field.options.as_deref().unwrap_or_default(),
        ),
        None => fallback_label(&field.name, operator, value),
    }
}

/// Build a labelled rule for `field`.
///
/// A value whose shape does not fit the operator is replaced by the
/// operator's default. A non-blank display name goes into the label as
/// given, padding included. Never fails.
pub fn build_rule(
    field: &FieldNode,
    operator: Operator,
    value: RuleValue,
    display_field_name: Option<&str>,
) -> ComplexFilterRule {
    let value = if value.arity() == operator.arity() {
        value
    } else {
        tracing::debug!(
            field = %field.name,
            operator = %operator,
            "Value shape does not fit operator, using default"
        );
        default_value_for_operator(field.field_type, operator)
    };

    let field_path = if field.path.is_empty() {
        vec![field.name.clone()]
    } else {
        field.path.clone()
    };

    ComplexFilterRule {
        id: new_id(),
        label: Some(label_for(field, operator, &value, display_field_name)),
        field: field.name.clone(),
        field_path,
        operator,
        value,
    }
}

/// Switch a rule's operator, keeping its id.
///
/// The value is always reset to the operator's default; a preset gets the
/// `today` key.
pub fn change_operator(
    rule: &ComplexFilterRule,
    field: &FieldNode,
    operator: Operator,
    display_field_name: Option<&str>,
) -> ComplexFilterRule {
    let value = default_value_for_operator(field.field_type, operator);
    ComplexFilterRule {
        id: rule.id.clone(),
        ..build_rule(field, operator, value, display_field_name)
    }
}

/// Replace a rule's value and refresh its label, keeping its id
pub fn change_value(
    rule: &ComplexFilterRule,
    field: &FieldNode,
    value: RuleValue,
    display_field_name: Option<&str>,
) -> ComplexFilterRule {
    ComplexFilterRule {
        id: rule.id.clone(),
        ..build_rule(field, rule.operator, value, display_field_name)
    }
}

/// Single-rule filter, as produced by a quick-filter action
pub fn quick_filter(
    field: &FieldNode,
    operator: Operator,
    value: RuleValue,
    display_field_name: Option<&str>,
) -> ComplexFilter {
    ComplexFilter::single(build_rule(field, operator, value, display_field_name))
}
