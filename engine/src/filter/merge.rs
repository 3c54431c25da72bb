//! Additive merge with duplicate suppression
//!
//! Quick-filter actions produce single-rule filters that are folded into the
//! current filter. Applying the same condition twice yields one rule.

use serde_json::Value;

use super::tree::normalize;
use super::types::{ComplexFilter, ComplexFilterRule, FilterGroup};
use super::validate::is_valid_rule;

/// Whether `rules` already holds a rule with the same field, operator, and value
pub fn contains_condition(rules: &[ComplexFilterRule], candidate: &ComplexFilterRule) -> bool {
    rules.iter().any(|r| r.same_condition(candidate))
}

/// Fold `incoming` into `existing` without replacing it.
///
/// Root rules of `incoming` are appended unless an equal condition is
/// already at the root; invalid rules are skipped. Subgroups of `incoming`
/// are appended unless a structurally equal subgroup exists. The existing
/// root's id and logic are kept. Subgroups holding an invalid rule at any
/// depth are skipped. An absent `existing` takes the valid part of
/// `incoming`, or stays absent when nothing survives.
pub fn merge_additive(
    existing: Option<&ComplexFilter>,
    incoming: &ComplexFilter,
) -> Option<ComplexFilter> {
    let mut root = match existing {
        Some(existing) => existing.root_group.clone(),
        None => FilterGroup {
            id: incoming.root_group.id.clone(),
            logic: incoming.root_group.logic,
            rules: Vec::new(),
            groups: Vec::new(),
        },
    };
    let mut added = 0usize;
    let mut skipped = 0usize;

    for rule in &incoming.root_group.rules {
        if !is_valid_rule(rule) {
            tracing::debug!(rule_id = %rule.id, "Skipping invalid incoming rule");
            continue;
        }
        if contains_condition(&root.rules, rule) {
            skipped += 1;
            continue;
        }
        root.rules.push(rule.clone());
        added += 1;
    }

    for group in &incoming.root_group.groups {
        if !all_rules_valid(group) {
            tracing::debug!(group_id = %group.id, "Skipping incoming group with invalid rules");
            continue;
        }
        if group.is_empty() || root.groups.iter().any(|g| g.same_structure(group)) {
            skipped += 1;
            continue;
        }
        root.groups.push(group.clone());
        added += 1;
    }

    tracing::trace!(added, skipped, "Merged incoming filter");
    normalize(Some(ComplexFilter::new(root)))
}

fn all_rules_valid(group: &FilterGroup) -> bool {
    group.rules.iter().all(is_valid_rule) && group.groups.iter().all(all_rules_valid)
}

/// Merge an untyped incoming descriptor.
///
/// Malformed input (missing `rootGroup`, non-array `rules`, undecodable
/// rules) leaves `existing` unchanged.
pub fn merge_additive_value(
    existing: Option<&ComplexFilter>,
    incoming: &Value,
) -> Option<ComplexFilter> {
    let Some(root) = incoming.get("rootGroup") else {
        tracing::warn!("Incoming filter has no rootGroup, keeping existing filter");
        return existing.cloned();
    };
    if root.get("rules").is_some_and(|rules| !rules.is_array()) {
        tracing::warn!("Incoming filter rules is not a list, keeping existing filter");
        return existing.cloned();
    }
    match serde_json::from_value::<ComplexFilter>(incoming.clone()) {
        Ok(incoming) => merge_additive(existing, &incoming),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed incoming filter, keeping existing filter");
            existing.cloned()
        }
    }
}

/// Merge several single-rule filters in order
pub fn merge_all<'a, I>(existing: Option<&ComplexFilter>, incoming: I) -> Option<ComplexFilter>
where
    I: IntoIterator<Item = &'a ComplexFilter>,
{
    incoming
        .into_iter()
        .fold(existing.cloned(), |acc, next| merge_additive(acc.as_ref(), next))
}

/// Drop duplicate conditions inside each group, keeping first occurrences
pub fn dedup_group(group: &FilterGroup) -> FilterGroup {
    let mut rules: Vec<ComplexFilterRule> = Vec::with_capacity(group.rules.len());
    for rule in &group.rules {
        if !contains_condition(&rules, rule) {
            rules.push(rule.clone());
        }
    }
    FilterGroup {
        id: group.id.clone(),
        logic: group.logic,
        rules,
        groups: group.groups.iter().map(dedup_group).collect(),
    }
}
