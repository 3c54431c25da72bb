//! Field and column schema types
//!
//! Defines the discovered field tree nodes and the externally supplied
//! column configuration used to override type inference and display names.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::operators::Operator;
use crate::utils::string::humanize_identifier;

// ============================================================================
// SEMANTIC TYPE
// ============================================================================

/// Abstract field type used to select valid operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    Enum,
    Text,
    Relation,
}

impl SemanticType {
    pub const ALL: [SemanticType; 8] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Enum,
        Self::Text,
        Self::Relation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Enum => "enum",
            Self::Text => "text",
            Self::Relation => "relation",
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Datetime)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    /// Accepts the canonical names plus the storage-type spellings column
    /// configurations commonly carry (`int`, `timestamp`, `bool`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "varchar" | "uuid" | "email" => Ok(Self::String),
            "number" | "int" | "integer" | "float" | "decimal" | "numeric" | "bigint" => {
                Ok(Self::Number)
            }
            "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" | "timestamp" | "timestamptz" => Ok(Self::Datetime),
            "enum" | "select" | "options" => Ok(Self::Enum),
            "text" | "longtext" | "richtext" => Ok(Self::Text),
            "relation" | "object" | "reference" => Ok(Self::Relation),
            other => Err(format!("Unknown field type '{}'", other)),
        }
    }
}

/// Lenient `type` field: storage spellings map through [`FromStr`] and
/// anything unrecognised degrades to `string` so name inference can run.
fn deserialize_semantic_type<'de, D>(deserializer: D) -> Result<SemanticType, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(SemanticType::default());
    };
    Ok(raw.parse().unwrap_or_else(|e: String| {
        tracing::debug!(field_type = %raw, error = %e, "Unknown field type, treating as string");
        SemanticType::String
    }))
}

// ============================================================================
// FIELD TREE
// ============================================================================

/// Enumerated choice for enum-typed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A node of the discovered field tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_semantic_type"
    )]
    pub field_type: SemanticType,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<Operator>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
}

impl FieldNode {
    /// Create a leaf node under `parent`, labelled from its name
    pub fn leaf(parent: &[String], name: &str, field_type: SemanticType) -> Self {
        let mut path = parent.to_vec();
        path.push(name.to_string());
        Self {
            name: name.to_string(),
            label: humanize_identifier(name),
            field_type,
            path,
            has_children: false,
            operators: None,
            options: None,
        }
    }

    /// Create an expandable relation node under `parent`
    pub fn relation(parent: &[String], name: &str) -> Self {
        Self {
            has_children: true,
            ..Self::leaf(parent, name, SemanticType::Relation)
        }
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Fill in what the endpoint may omit: the path (from the parent) and the label
    pub(crate) fn normalized(mut self, parent: &[String]) -> Self {
        if self.path.last().map(String::as_str) != Some(self.name.as_str()) {
            let mut path = parent.to_vec();
            path.push(self.name.clone());
            self.path = path;
        }
        if self.label.trim().is_empty() {
            self.label = humanize_identifier(&self.name);
        }
        self
    }

    /// Dot-joined path, used as cache key and request path
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

// ============================================================================
// COLUMN CONFIGURATION
// ============================================================================

/// Externally supplied field descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub field: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    /// Remote option source for large enumerations
    #[serde(default)]
    pub filter_source: Option<String>,
}

/// Ordered column configuration with lookup by path and by leaf name
#[derive(Debug, Clone, Default)]
pub struct ColumnSchema {
    columns: Vec<ColumnConfig>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnConfig>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            // First definition wins, matching column display order
            index.entry(column.field.clone()).or_insert(i);
        }
        Self { columns, index }
    }

    /// Load column configuration from a JSON array file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column file: {}", path.display()))?;
        let columns: Vec<ColumnConfig> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse column file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), columns = columns.len(), "Loaded column schema");
        Ok(Self::new(columns))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    /// Find the column for a field, trying the full dot path before the leaf name
    pub fn lookup(&self, field: &str, path: &[String]) -> Option<&ColumnConfig> {
        if path.len() > 1 {
            let dotted = path.join(".");
            if let Some(&i) = self.index.get(&dotted) {
                return Some(&self.columns[i]);
            }
        }
        self.index.get(field).map(|&i| &self.columns[i])
    }

    /// Human name for a field: configured display text, otherwise the humanized name
    pub fn display_name(&self, field: &str, path: &[String]) -> String {
        self.lookup(field, path)
            .and_then(|c| c.display.as_deref())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| humanize_identifier(field))
    }

    /// Static options configured for a field
    pub fn options(&self, field: &str, path: &[String]) -> Option<&[FieldOption]> {
        self.lookup(field, path).and_then(|c| c.options.as_deref())
    }

    /// Apply display and option overrides to a discovered node
    pub fn apply_overrides(&self, mut node: FieldNode) -> FieldNode {
        if let Some(column) = self.lookup(&node.name, &node.path) {
            if let Some(display) = column.display.as_deref().filter(|d| !d.trim().is_empty()) {
                node.label = display.to_string();
            }
            if node.options.is_none() {
                node.options = column.options.clone();
            }
        }
        node
    }
}
