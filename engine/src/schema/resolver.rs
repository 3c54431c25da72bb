//! Field type resolution
//!
//! Column configuration is authoritative. Naming heuristics only apply when
//! no configured type is available, and unknown names fall back to `string`.

use std::sync::Arc;

use super::types::{ColumnSchema, FieldNode, SemanticType};

const ENUM_FIELDS: &[&str] = &[
    "status",
    "accesstype",
    "role",
    "type",
    "state",
    "priority",
    "kind",
    "gender",
    "level",
    "category",
];

const TEXT_FIELDS: &[&str] = &["description", "notes", "content", "body", "comment", "bio"];

const DATE_FIELDS: &[&str] = &["date", "birthday", "birthdate", "dob"];

const DATETIME_FIELDS: &[&str] = &["timestamp", "lastlogin", "expiry", "expires"];

const NUMBER_FIELDS: &[&str] = &[
    "amount", "price", "total", "quantity", "age", "score", "count", "size",
];

const BOOLEAN_PREFIXES: &[&str] = &["is", "has", "can"];

/// Resolves semantic field types from configuration, falling back to names
#[derive(Debug, Clone, Default)]
pub struct FieldTypeResolver {
    columns: Arc<ColumnSchema>,
}

impl FieldTypeResolver {
    pub fn new(columns: Arc<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &ColumnSchema {
        &self.columns
    }

    /// Resolve the type of `field` at `path`. Total: never fails.
    pub fn resolve(&self, field: &str, path: &[String]) -> SemanticType {
        if let Some(declared) = self
            .columns
            .lookup(field, path)
            .and_then(|c| c.field_type.as_deref())
        {
            match declared.parse::<SemanticType>() {
                Ok(t) => return t,
                Err(e) => {
                    tracing::debug!(field = %field, error = %e, "Ignoring configured field type")
                }
            }
        }
        infer_from_name(field)
    }

    /// Resolve a discovered node. Configuration still wins; then expandable
    /// nodes are relations; then the type the endpoint declared.
    pub fn resolve_node(&self, node: &FieldNode) -> SemanticType {
        let configured = self
            .columns
            .lookup(&node.name, &node.path)
            .and_then(|c| c.field_type.as_deref())
            .and_then(|t| t.parse::<SemanticType>().ok());
        if let Some(t) = configured {
            return t;
        }
        if node.has_children {
            return SemanticType::Relation;
        }
        if node.field_type != SemanticType::String {
            return node.field_type;
        }
        infer_from_name(&node.name)
    }
}

/// Naming heuristics for fields without configuration
pub fn infer_from_name(field: &str) -> SemanticType {
    let name = field.trim();
    if name.is_empty() {
        return SemanticType::String;
    }
    let lower = name.to_ascii_lowercase();

    if has_boolean_prefix(name) {
        return SemanticType::Boolean;
    }
    if name.ends_with("At") || lower.ends_with("_at") || DATETIME_FIELDS.contains(&lower.as_str())
    {
        return SemanticType::Datetime;
    }
    if name.ends_with("Date") || lower.ends_with("_date") || DATE_FIELDS.contains(&lower.as_str()) {
        return SemanticType::Date;
    }
    if ENUM_FIELDS.contains(&lower.as_str()) {
        return SemanticType::Enum;
    }
    if TEXT_FIELDS.contains(&lower.as_str()) {
        return SemanticType::Text;
    }
    if name.ends_with("Count")
        || lower.ends_with("_count")
        || NUMBER_FIELDS.contains(&lower.as_str())
    {
        return SemanticType::Number;
    }
    SemanticType::String
}

/// `isActive`, `has_children`, `canEdit`; not `issue` or `hash`
fn has_boolean_prefix(name: &str) -> bool {
    BOOLEAN_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ColumnConfig;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn column(field: &str, field_type: &str) -> ColumnConfig {
        ColumnConfig {
            field: field.to_string(),
            display: None,
            field_type: Some(field_type.to_string()),
            options: None,
            filter_source: None,
        }
    }

    #[test]
    fn created_at_is_datetime() {
        let resolver = FieldTypeResolver::default();
        assert_eq!(
            resolver.resolve("createdAt", &path(&["createdAt"])),
            SemanticType::Datetime
        );
        assert_eq!(infer_from_name("updated_at"), SemanticType::Datetime);
    }

    #[test]
    fn boolean_prefixes_need_word_boundary() {
        assert_eq!(infer_from_name("isSuperAdmin"), SemanticType::Boolean);
        assert_eq!(infer_from_name("has_avatar"), SemanticType::Boolean);
        assert_eq!(infer_from_name("issue"), SemanticType::String);
        assert_eq!(infer_from_name("hash"), SemanticType::String);
    }

    #[test]
    fn closed_vocabulary_names_are_enums() {
        assert_eq!(infer_from_name("status"), SemanticType::Enum);
        assert_eq!(infer_from_name("accessType"), SemanticType::Enum);
    }

    #[test]
    fn other_heuristics() {
        assert_eq!(infer_from_name("dueDate"), SemanticType::Date);
        assert_eq!(infer_from_name("description"), SemanticType::Text);
        assert_eq!(infer_from_name("loginCount"), SemanticType::Number);
    }

    #[test]
    fn unknown_and_empty_names_default_to_string() {
        assert_eq!(infer_from_name("email"), SemanticType::String);
        assert_eq!(infer_from_name(""), SemanticType::String);
        assert_eq!(infer_from_name("   "), SemanticType::String);
    }

    #[test]
    fn configuration_wins_over_heuristics() {
        let resolver = FieldTypeResolver::new(Arc::new(ColumnSchema::new(vec![
            column("status", "string"),
            column("createdAt", "date"),
        ])));
        assert_eq!(
            resolver.resolve("status", &path(&["status"])),
            SemanticType::String
        );
        assert_eq!(
            resolver.resolve("createdAt", &path(&["createdAt"])),
            SemanticType::Date
        );
    }

    #[test]
    fn unparseable_configured_type_falls_back() {
        let resolver = FieldTypeResolver::new(Arc::new(ColumnSchema::new(vec![column(
            "createdAt",
            "geometry",
        )])));
        assert_eq!(
            resolver.resolve("createdAt", &path(&["createdAt"])),
            SemanticType::Datetime
        );
    }

    #[test]
    fn resolve_node_order() {
        let resolver = FieldTypeResolver::default();
        let relation = FieldNode::relation(&path(&["user"]), "profile");
        assert_eq!(resolver.resolve_node(&relation), SemanticType::Relation);

        let declared = FieldNode::leaf(&[], "score", SemanticType::Enum);
        assert_eq!(resolver.resolve_node(&declared), SemanticType::Enum);

        let undeclared = FieldNode::leaf(&[], "isVerified", SemanticType::String);
        assert_eq!(resolver.resolve_node(&undeclared), SemanticType::Boolean);
    }
}
