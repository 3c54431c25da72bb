//! Copy-on-write filter tree operations
//!
//! Every operation takes the current descriptor by reference and returns a
//! new one; inputs are never mutated. The absent filter is `None`, and an
//! operation that empties the root returns `None` rather than an empty tree.
//!
//! Nested edits go through [`edit_group`], a lens over the recursive
//! structure addressed by the path of group ids from the root.

use super::types::{ComplexFilter, ComplexFilterRule, FilterGroup, Logic, RuleValue};
use super::validate::{is_valid_rule, rule_problem};
use crate::schema::Operator;

/// Shallow patch applied by [`update_rule`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub field: Option<String>,
    pub field_path: Option<Vec<String>>,
    pub operator: Option<Operator>,
    pub value: Option<RuleValue>,
    /// `Some(None)` clears the label
    pub label: Option<Option<String>>,
}

impl RulePatch {
    pub fn value(value: RuleValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    fn apply(&self, rule: &ComplexFilterRule) -> ComplexFilterRule {
        ComplexFilterRule {
            id: rule.id.clone(),
            field: self.field.clone().unwrap_or_else(|| rule.field.clone()),
            field_path: self
                .field_path
                .clone()
                .unwrap_or_else(|| rule.field_path.clone()),
            operator: self.operator.unwrap_or(rule.operator),
            value: self.value.clone().unwrap_or_else(|| rule.value.clone()),
            label: self.label.clone().unwrap_or_else(|| rule.label.clone()),
        }
    }
}

/// Shallow patch applied by [`update_group`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub logic: Option<Logic>,
    pub rules: Option<Vec<ComplexFilterRule>>,
    pub groups: Option<Vec<FilterGroup>>,
}

// ============================================================================
// LENS
// ============================================================================

/// Group ids from the root down to the group with `group_id`
pub fn locate_group(root: &FilterGroup, group_id: &str) -> Option<Vec<String>> {
    fn walk(group: &FilterGroup, group_id: &str, trail: &mut Vec<String>) -> bool {
        trail.push(group.id.clone());
        if group.id == group_id || group.groups.iter().any(|g| walk(g, group_id, trail)) {
            return true;
        }
        trail.pop();
        false
    }

    let mut trail = Vec::new();
    walk(root, group_id, &mut trail).then_some(trail)
}

/// Group ids from the root down to the group holding rule `rule_id`
pub fn locate_rule(root: &FilterGroup, rule_id: &str) -> Option<Vec<String>> {
    fn walk(group: &FilterGroup, rule_id: &str, trail: &mut Vec<String>) -> bool {
        trail.push(group.id.clone());
        if group.rules.iter().any(|r| r.id == rule_id)
            || group.groups.iter().any(|g| walk(g, rule_id, trail))
        {
            return true;
        }
        trail.pop();
        false
    }

    let mut trail = Vec::new();
    walk(root, rule_id, &mut trail).then_some(trail)
}

/// Group addressed by a path of ids starting at the root
pub fn group_at<'a>(root: &'a FilterGroup, path: &[String]) -> Option<&'a FilterGroup> {
    let (first, rest) = path.split_first()?;
    if first != &root.id {
        return None;
    }
    rest.iter().try_fold(root, |group, id| group.groups.iter().find(|g| &g.id == id))
}

/// Rebuild the tree with the group at `path` replaced by `edit(group)`.
///
/// Only groups along the path are rebuilt. Returns `None` if the path does
/// not resolve.
pub fn edit_group<F>(root: &FilterGroup, path: &[String], edit: F) -> Option<FilterGroup>
where
    F: FnOnce(&FilterGroup) -> FilterGroup,
{
    let (first, rest) = path.split_first()?;
    if first != &root.id {
        return None;
    }
    descend(root, rest, edit)
}

fn descend<F>(group: &FilterGroup, rest: &[String], edit: F) -> Option<FilterGroup>
where
    F: FnOnce(&FilterGroup) -> FilterGroup,
{
    let Some((next, tail)) = rest.split_first() else {
        return Some(edit(group));
    };
    let index = group.groups.iter().position(|g| &g.id == next)?;
    let edited = descend(&group.groups[index], tail, edit)?;
    let mut groups = Vec::with_capacity(group.groups.len());
    groups.extend(group.groups[..index].iter().cloned());
    groups.push(edited);
    groups.extend(group.groups[index + 1..].iter().cloned());
    Some(FilterGroup {
        id: group.id.clone(),
        logic: group.logic,
        rules: group.rules.clone(),
        groups,
    })
}

/// Remove subgroups along `path` that are now empty, deepest first.
/// The root itself is left to the caller.
fn prune_emptied(mut root: FilterGroup, path: &[String]) -> FilterGroup {
    for depth in (1..path.len()).rev() {
        let emptied = group_at(&root, &path[..=depth]).is_some_and(FilterGroup::is_empty);
        if !emptied {
            break;
        }
        let child_id = &path[depth];
        match edit_group(&root, &path[..depth], |parent| FilterGroup {
            groups: parent
                .groups
                .iter()
                .filter(|g| &g.id != child_id)
                .cloned()
                .collect(),
            ..parent.clone()
        }) {
            Some(pruned) => root = pruned,
            None => break,
        }
    }
    root
}

fn collapse(root: FilterGroup) -> Option<ComplexFilter> {
    if root.is_empty() {
        None
    } else {
        Some(ComplexFilter::new(root))
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// Whether a filter is present: at least one rule or subgroup somewhere
pub fn is_present(filter: Option<&ComplexFilter>) -> bool {
    filter.is_some_and(|f| !f.is_empty())
}

pub fn find_rule<'a>(filter: &'a ComplexFilter, rule_id: &str) -> Option<&'a ComplexFilterRule> {
    let path = locate_rule(&filter.root_group, rule_id)?;
    group_at(&filter.root_group, &path)?
        .rules
        .iter()
        .find(|r| r.id == rule_id)
}

// ============================================================================
// RULE OPERATIONS
// ============================================================================

/// Append a rule to the root group, creating an AND root for the absent filter.
/// Invalid rules are not added.
pub fn add_rule(filter: Option<&ComplexFilter>, rule: ComplexFilterRule) -> Option<ComplexFilter> {
    if let Some(reason) = rule_problem(&rule) {
        tracing::debug!(rule_id = %rule.id, reason = %reason, "Rejected invalid rule");
        return filter.cloned();
    }
    match filter {
        None => Some(ComplexFilter::single(rule)),
        Some(existing) => {
            let mut root = existing.root_group.clone();
            root.rules.push(rule);
            Some(ComplexFilter::new(root))
        }
    }
}

/// Append a rule to a nested group. Unknown group ids leave the filter unchanged.
pub fn add_rule_to_group(
    filter: &ComplexFilter,
    group_id: &str,
    rule: ComplexFilterRule,
) -> ComplexFilter {
    if let Some(reason) = rule_problem(&rule) {
        tracing::debug!(rule_id = %rule.id, reason = %reason, "Rejected invalid rule");
        return filter.clone();
    }
    let Some(path) = locate_group(&filter.root_group, group_id) else {
        tracing::debug!(group_id = %group_id, "Group not found for rule insert");
        return filter.clone();
    };
    edit_group(&filter.root_group, &path, |group| {
        let mut group = group.clone();
        group.rules.push(rule);
        group
    })
    .map(ComplexFilter::new)
    .unwrap_or_else(|| filter.clone())
}

/// Shallow-merge `patch` into the rule with `rule_id`.
///
/// Unknown ids and patches that would make the rule invalid are no-ops.
pub fn update_rule(filter: &ComplexFilter, rule_id: &str, patch: &RulePatch) -> ComplexFilter {
    let Some(path) = locate_rule(&filter.root_group, rule_id) else {
        return filter.clone();
    };
    let Some(current) = find_rule(filter, rule_id) else {
        return filter.clone();
    };
    let updated = patch.apply(current);
    if !is_valid_rule(&updated) {
        tracing::debug!(rule_id = %rule_id, "Ignoring update that invalidates rule");
        return filter.clone();
    }
    edit_group(&filter.root_group, &path, |group| FilterGroup {
        rules: group
            .rules
            .iter()
            .map(|r| {
                if r.id == rule_id {
                    updated.clone()
                } else {
                    r.clone()
                }
            })
            .collect(),
        ..group.clone()
    })
    .map(ComplexFilter::new)
    .unwrap_or_else(|| filter.clone())
}

/// Remove a rule. Groups it leaves empty are pruned, and an empty root
/// collapses to the absent filter.
pub fn remove_rule(filter: &ComplexFilter, rule_id: &str) -> Option<ComplexFilter> {
    let Some(path) = locate_rule(&filter.root_group, rule_id) else {
        return Some(filter.clone());
    };
    let Some(root) = edit_group(&filter.root_group, &path, |group| FilterGroup {
        rules: group
            .rules
            .iter()
            .filter(|r| r.id != rule_id)
            .cloned()
            .collect(),
        ..group.clone()
    }) else {
        return Some(filter.clone());
    };
    collapse(prune_emptied(root, &path))
}

/// Replace the root group's logic
pub fn set_logic(filter: &ComplexFilter, logic: Logic) -> ComplexFilter {
    ComplexFilter::new(FilterGroup {
        logic,
        ..filter.root_group.clone()
    })
}

// ============================================================================
// GROUP OPERATIONS
// ============================================================================

/// Add a subgroup under `parent_id` (the root when `None`).
///
/// For the absent filter a new AND root holding the group is created.
/// Unknown parents and inserts that would nest deeper than `max_depth`
/// are no-ops.
pub fn add_group(
    filter: Option<&ComplexFilter>,
    parent_id: Option<&str>,
    group: FilterGroup,
    max_depth: usize,
) -> Option<ComplexFilter> {
    if let Some(rule) = group.all_rules().into_iter().find(|r| !is_valid_rule(r)) {
        tracing::debug!(rule_id = %rule.id, "Rejected group containing invalid rule");
        return filter.cloned();
    }
    let Some(existing) = filter else {
        if 1 + group.depth() > max_depth {
            tracing::warn!(max = max_depth, "Refusing group insert beyond nesting limit");
            return None;
        }
        return Some(ComplexFilter::new(
            FilterGroup::new(Logic::And).with_group(group),
        ));
    };
    let root = &existing.root_group;
    let parent_path = match parent_id {
        None => vec![root.id.clone()],
        Some(id) => match locate_group(root, id) {
            Some(path) => path,
            None => {
                tracing::debug!(group_id = %id, "Parent group not found");
                return filter.cloned();
            }
        },
    };
    if parent_path.len() + group.depth() > max_depth {
        tracing::warn!(max = max_depth, "Refusing group insert beyond nesting limit");
        return filter.cloned();
    }
    edit_group(root, &parent_path, |parent| {
        let mut parent = parent.clone();
        parent.groups.push(group);
        parent
    })
    .map(ComplexFilter::new)
    .or_else(|| filter.cloned())
}

/// Shallow-merge `patch` into the group with `group_id`.
///
/// Patches carrying invalid rules, or nesting the tree deeper than
/// `max_depth`, are no-ops. A group emptied by the patch is pruned, and an
/// emptied root collapses to the absent filter.
pub fn update_group(
    filter: &ComplexFilter,
    group_id: &str,
    patch: &GroupPatch,
    max_depth: usize,
) -> Option<ComplexFilter> {
    let Some(path) = locate_group(&filter.root_group, group_id) else {
        return Some(filter.clone());
    };
    let patched_rules = patch.rules.iter().flatten();
    let patched_groups = patch.groups.iter().flatten().flat_map(|g| g.all_rules());
    if patched_rules.chain(patched_groups).any(|r| !is_valid_rule(r)) {
        tracing::debug!(group_id = %group_id, "Ignoring group update with invalid rules");
        return Some(filter.clone());
    }
    let Some(root) = edit_group(&filter.root_group, &path, |group| FilterGroup {
        id: group.id.clone(),
        logic: patch.logic.unwrap_or(group.logic),
        rules: patch.rules.clone().unwrap_or_else(|| group.rules.clone()),
        groups: patch.groups.clone().unwrap_or_else(|| group.groups.clone()),
    }) else {
        return Some(filter.clone());
    };
    if root.depth() > max_depth {
        tracing::warn!(max = max_depth, "Refusing group update beyond nesting limit");
        return Some(filter.clone());
    }
    collapse(prune_emptied(root, &path))
}

/// Remove a group and its subtree. Removing the root yields the absent filter.
pub fn remove_group(filter: &ComplexFilter, group_id: &str) -> Option<ComplexFilter> {
    let Some(path) = locate_group(&filter.root_group, group_id) else {
        return Some(filter.clone());
    };
    let Some((_, parent_path)) = path.split_last() else {
        return Some(filter.clone());
    };
    if parent_path.is_empty() {
        return None;
    }
    let Some(root) = edit_group(&filter.root_group, parent_path, |parent| FilterGroup {
        groups: parent
            .groups
            .iter()
            .filter(|g| g.id != group_id)
            .cloned()
            .collect(),
        ..parent.clone()
    }) else {
        return Some(filter.clone());
    };
    collapse(prune_emptied(root, parent_path))
}

/// Prune every empty subgroup and collapse an empty root to absent.
/// Run before handing a filter to any consumer.
pub fn normalize(filter: Option<ComplexFilter>) -> Option<ComplexFilter> {
    fn prune(group: FilterGroup) -> FilterGroup {
        FilterGroup {
            groups: group
                .groups
                .into_iter()
                .map(prune)
                .filter(|g| !g.is_empty())
                .collect(),
            ..group
        }
    }

    collapse(prune(filter?.root_group))
}
