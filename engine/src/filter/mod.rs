//! Filter descriptors
//!
//! The recursive AND/OR filter tree with copy-on-write editing, additive
//! merge for quick filters, labels, validation, and the request payload.

pub mod builder;
pub mod label;
pub mod merge;
pub mod request;
pub mod tree;
pub mod types;
pub mod validate;

pub use builder::{build_rule, change_operator, change_value, quick_filter};
pub use label::{
    FilterTag, LabelFormatter, fallback_label, filter_tags, format_filter, format_rule_label,
};
pub use merge::{merge_additive, merge_additive_value, merge_all};
pub use request::{RequestCondition, RequestGroup, to_request};
pub use tree::{
    GroupPatch, RulePatch, add_group, add_rule, add_rule_to_group, edit_group, find_rule,
    is_present, normalize, remove_group, remove_rule, set_logic, update_group, update_rule,
};
pub use types::{ComplexFilter, ComplexFilterRule, FilterGroup, Logic, RuleValue, ScalarValue, new_id};
pub use validate::{FilterError, is_valid_rule, is_valid_rule_for, parse_filter, validate_filter};
