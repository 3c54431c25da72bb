//! Human-readable labels for rules and whole filters
//!
//! Produces stable sentences like `Status is ACTIVE` independent of any UI.

use serde::Serialize;

use super::types::{ComplexFilter, ComplexFilterRule, FilterGroup, RuleValue, ScalarValue};
use crate::schema::{ColumnSchema, DatePreset, FieldOption, Operator};

const EMPTY_VALUE: &str = "(empty)";
const OPEN_BOUND: &str = "any";

fn describe_scalar(value: &ScalarValue, options: &[FieldOption], empty: &str) -> String {
    match value {
        ScalarValue::Null => empty.to_string(),
        ScalarValue::Text(s) if s.trim().is_empty() => empty.to_string(),
        ScalarValue::Text(s) => options
            .iter()
            .find(|o| &o.value == s)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

fn describe_list(values: &[ScalarValue], options: &[FieldOption]) -> String {
    if values.is_empty() {
        return EMPTY_VALUE.to_string();
    }
    values
        .iter()
        .map(|v| describe_scalar(v, options, EMPTY_VALUE))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display text for a value, using option labels where they match
pub fn describe_value(value: &RuleValue, options: &[FieldOption]) -> String {
    match value {
        RuleValue::None => String::new(),
        RuleValue::Scalar(v) => describe_scalar(v, options, EMPTY_VALUE),
        RuleValue::Range(from, to) => format!(
            "{} and {}",
            describe_scalar(from, options, OPEN_BOUND),
            describe_scalar(to, options, OPEN_BOUND)
        ),
        RuleValue::Multi(values) => describe_list(values, options),
    }
}

/// Sentence for a condition on a field with the given display name
pub fn format_rule_label(
    display_name: &str,
    operator: Operator,
    value: &RuleValue,
    options: &[FieldOption],
) -> String {
    let shown = describe_value(value, options);
    match operator {
        Operator::IsSet | Operator::IsNotSet => format!("{} {}", display_name, operator.label()),
        Operator::Equals => format!("{} is {}", display_name, shown),
        Operator::NotEquals => format!("{} is not {}", display_name, shown),
        Operator::GreaterThan => format!("{} is greater than {}", display_name, shown),
        Operator::GreaterThanOrEqual => format!("{} is at least {}", display_name, shown),
        Operator::LessThan => format!("{} is less than {}", display_name, shown),
        Operator::LessThanOrEqual => format!("{} is at most {}", display_name, shown),
        Operator::Before | Operator::After | Operator::Between => {
            format!("{} is {} {}", display_name, operator.label(), shown)
        }
        Operator::Preset => {
            let phrase = preset_key(value)
                .and_then(DatePreset::parse)
                .map(|p| p.phrase().to_string())
                .unwrap_or(shown);
            format!("{} is {}", display_name, phrase)
        }
        _ => format!("{} {} {}", display_name, operator.label(), shown),
    }
}

/// Label used when no display name is known: `<field> <operator> <value>`
pub fn fallback_label(field: &str, operator: Operator, value: &RuleValue) -> String {
    let shown = describe_value(value, &[]);
    if shown.is_empty() {
        format!("{} {}", field, operator.as_str())
    } else {
        format!("{} {} {}", field, operator.as_str(), shown)
    }
}

/// A stored label is a complete sentence unless it is blank or just the field name
pub fn is_complete_label(label: &str, display_name: &str) -> bool {
    let label = label.trim();
    !label.is_empty() && !label.eq_ignore_ascii_case(display_name.trim())
}

fn preset_key(value: &RuleValue) -> Option<&str> {
    match value {
        RuleValue::Scalar(v) => v.as_text(),
        _ => None,
    }
}

/// Removable chip for a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTag {
    pub rule_id: String,
    pub group_id: String,
    pub label: String,
}

/// Renders rules and filters using column display names and options
#[derive(Debug, Clone, Copy)]
pub struct LabelFormatter<'a> {
    columns: &'a ColumnSchema,
}

impl<'a> LabelFormatter<'a> {
    pub fn new(columns: &'a ColumnSchema) -> Self {
        Self { columns }
    }

    /// Label for a rule; a complete stored label is used verbatim
    pub fn rule_label(&self, rule: &ComplexFilterRule) -> String {
        let display = self.columns.display_name(&rule.field, &rule.field_path);
        if let Some(label) = rule.label.as_deref()
            && is_complete_label(label, &display)
        {
            return label.to_string();
        }
        if display.trim().is_empty() {
            return fallback_label(&rule.field, rule.operator, &rule.value);
        }
        let options = self
            .columns
            .options(&rule.field, &rule.field_path)
            .unwrap_or_default();
        format_rule_label(&display, rule.operator, &rule.value, options)
    }

    /// Whole-filter sentence. Absent filters render as an empty string.
    pub fn filter_label(&self, filter: Option<&ComplexFilter>) -> String {
        filter
            .map(|f| self.group_label(&f.root_group))
            .unwrap_or_default()
    }

    fn group_label(&self, group: &FilterGroup) -> String {
        let mut parts: Vec<String> = group.rules.iter().map(|r| self.rule_label(r)).collect();
        for sub in group.groups.iter().filter(|g| !g.is_empty()) {
            let inner = self.group_label(sub);
            if sub.is_quantified() {
                parts.push(format!("({})", inner));
            } else {
                parts.push(inner);
            }
        }
        parts.join(&format!(" {} ", group.logic))
    }

    /// One chip per rule, depth-first
    pub fn tags(&self, filter: Option<&ComplexFilter>) -> Vec<FilterTag> {
        let mut tags = Vec::new();
        if let Some(filter) = filter {
            self.collect_tags(&filter.root_group, &mut tags);
        }
        tags
    }

    fn collect_tags(&self, group: &FilterGroup, tags: &mut Vec<FilterTag>) {
        tags.extend(group.rules.iter().map(|r| FilterTag {
            rule_id: r.id.clone(),
            group_id: group.id.clone(),
            label: self.rule_label(r),
        }));
        for sub in &group.groups {
            self.collect_tags(sub, tags);
        }
    }
}

/// Whole-filter sentence using `columns` for display names
pub fn format_filter(filter: Option<&ComplexFilter>, columns: &ColumnSchema) -> String {
    LabelFormatter::new(columns).filter_label(filter)
}

/// One chip per rule using `columns` for display names
pub fn filter_tags(filter: Option<&ComplexFilter>, columns: &ColumnSchema) -> Vec<FilterTag> {
    LabelFormatter::new(columns).tags(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{Logic, new_id};
    use crate::schema::ColumnConfig;

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
    fn equals_label() {
        assert_eq!(
            format_rule_label("Status", Operator::Equals, &RuleValue::scalar("ACTIVE"), &[]),
            "Status is ACTIVE"
        );
    }

    #[test]
    fn labels_per_arity() {
        assert_eq!(
            format_rule_label(
                "Created At",
                Operator::Between,
                &RuleValue::range("2024-01-01", ScalarValue::Null),
                &[]
            ),
            "Created At is between 2024-01-01 and any"
        );
        assert_eq!(
            format_rule_label(
                "Role",
                Operator::In,
                &RuleValue::multi(["ADMIN", "EDITOR"]),
                &[FieldOption::new("ADMIN", "Admin")]
            ),
            "Role is one of Admin, EDITOR"
        );
        assert_eq!(
            format_rule_label("Deleted At", Operator::IsNotSet, &RuleValue::None, &[]),
            "Deleted At is not set"
        );
        assert_eq!(
            format_rule_label("Name", Operator::NotContains, &RuleValue::scalar(""), &[]),
            "Name does not contain (empty)"
        );
        assert_eq!(
            format_rule_label("Age", Operator::GreaterThanOrEqual, &RuleValue::scalar(18i64), &[]),
            "Age is at least 18"
        );
    }

    #[test]
    fn preset_label_uses_phrase() {
        assert_eq!(
            format_rule_label(
                "Created At",
                Operator::Preset,
                &RuleValue::scalar("last_7_days"),
                &[]
            ),
            "Created At is in the last 7 days"
        );
    }

    #[test]
    fn fallback_label_shape() {
        assert_eq!(
            fallback_label("status", Operator::Equals, &RuleValue::scalar("ACTIVE")),
            "status equals ACTIVE"
        );
        assert_eq!(
            fallback_label("deletedAt", Operator::IsSet, &RuleValue::None),
            "deletedAt is_set"
        );
    }

    #[test]
    fn stored_sentence_is_used_verbatim() {
        let columns = ColumnSchema::default();
        let formatter = LabelFormatter::new(&columns);
        let mut r = rule("status", Operator::Equals, RuleValue::scalar("ACTIVE"));
        r.label = Some("Account is live".to_string());
        assert_eq!(formatter.rule_label(&r), "Account is live");

        // A bare field name is a header, not a sentence
        r.label = Some("Status".to_string());
        assert_eq!(formatter.rule_label(&r), "Status is ACTIVE");
    }

    #[test]
    fn column_display_and_options_are_used() {
        let columns = ColumnSchema::new(vec![ColumnConfig {
            field: "status".to_string(),
            display: Some("Account Status".to_string()),
            field_type: Some("enum".to_string()),
            options: Some(vec![FieldOption::new("ACTIVE", "Active")]),
            filter_source: None,
        }]);
        let formatter = LabelFormatter::new(&columns);
        let r = rule("status", Operator::Equals, RuleValue::scalar("ACTIVE"));
        assert_eq!(formatter.rule_label(&r), "Account Status is Active");
    }

    #[test]
    fn filter_label_quantifies_only_multi_child_groups() {
        let columns = ColumnSchema::default();
        let formatter = LabelFormatter::new(&columns);
        let inner = FilterGroup::new(Logic::Or)
            .with_rule(rule("role", Operator::Equals, RuleValue::scalar("ADMIN")))
            .with_rule(rule("role", Operator::Equals, RuleValue::scalar("EDITOR")));
        let single = FilterGroup::new(Logic::Or)
            .with_rule(rule("isSuperAdmin", Operator::Equals, RuleValue::scalar(true)));
        let filter = ComplexFilter::new(
            FilterGroup::new(Logic::And)
                .with_rule(rule("status", Operator::Equals, RuleValue::scalar("ACTIVE")))
                .with_group(inner)
                .with_group(single),
        );
        assert_eq!(
            formatter.filter_label(Some(&filter)),
            "Status is ACTIVE AND (Role is ADMIN OR Role is EDITOR) AND Is Super Admin is true"
        );
        assert_eq!(formatter.filter_label(None), "");
    }

    #[test]
    fn tags_flatten_rules() {
        let columns = ColumnSchema::default();
        let formatter = LabelFormatter::new(&columns);
        let inner = FilterGroup::new(Logic::Or)
            .with_rule(rule("role", Operator::Equals, RuleValue::scalar("ADMIN")));
        let inner_id = inner.id.clone();
        let filter = ComplexFilter::new(
            FilterGroup::new(Logic::And)
                .with_rule(rule("status", Operator::Equals, RuleValue::scalar("ACTIVE")))
                .with_group(inner),
        );
        let tags = formatter.tags(Some(&filter));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[1].group_id, inner_id);
        assert_eq!(tags[1].label, "Role is ADMIN");
        assert!(formatter.tags(None).is_empty());
    }
}
