//! Saved search store trait and the list both stores share

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SavedSearchError;
use crate::core::constants::MAX_SAVED_SEARCH_NAME_LEN;
use crate::filter::{ComplexFilter, new_id, normalize, validate_filter};

/// A named filter descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    pub filter: ComplexFilter,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence for saved searches
///
/// Implementations must be thread-safe (Send + Sync) for use in async contexts.
#[async_trait]
pub trait SavedSearchStore: Send + Sync {
    /// All saved searches, favorites first, then by name
    async fn list(&self) -> Result<Vec<SavedSearch>, SavedSearchError>;

    async fn get(&self, id: &str) -> Result<SavedSearch, SavedSearchError>;

    /// Save `filter` under `name`.
    ///
    /// Saving under an existing name (ignoring case) replaces that search's
    /// filter and keeps its id and favorite flag. An absent or empty filter
    /// is rejected.
    async fn save(
        &self,
        name: &str,
        filter: Option<&ComplexFilter>,
    ) -> Result<SavedSearch, SavedSearchError>;

    async fn delete(&self, id: &str) -> Result<(), SavedSearchError>;

    async fn set_favorite(&self, id: &str, favorite: bool)
    -> Result<SavedSearch, SavedSearchError>;
}

fn validate_name(name: &str) -> Result<String, SavedSearchError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SavedSearchError::InvalidName("name is empty".to_string()));
    }
    if name.chars().count() > MAX_SAVED_SEARCH_NAME_LEN {
        return Err(SavedSearchError::InvalidName(format!(
            "longer than {} characters",
            MAX_SAVED_SEARCH_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn prepare_filter(
    filter: Option<&ComplexFilter>,
    max_depth: usize,
) -> Result<ComplexFilter, SavedSearchError> {
    let filter = normalize(filter.cloned()).ok_or(SavedSearchError::EmptyFilter)?;
    validate_filter(&filter, max_depth)?;
    Ok(filter)
}

/// Saved searches in insertion order. Serialized as a plain JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(super) struct SavedSearchList {
    searches: Vec<SavedSearch>,
}

impl SavedSearchList {
    pub(super) fn sorted(&self) -> Vec<SavedSearch> {
        let mut searches = self.searches.clone();
        searches.sort_by(|a, b| {
            b.is_favorite
                .cmp(&a.is_favorite)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        searches
    }

    pub(super) fn get(&self, id: &str) -> Result<SavedSearch, SavedSearchError> {
        self.searches
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| SavedSearchError::NotFound(id.to_string()))
    }

    /// Save `filter` under `name`, refusing trees deeper than `max_depth`
    pub(super) fn save(
        &mut self,
        name: &str,
        filter: Option<&ComplexFilter>,
        max_depth: usize,
    ) -> Result<SavedSearch, SavedSearchError> {
        let name = validate_name(name)?;
        let filter = prepare_filter(filter, max_depth)?;
        let now = Utc::now();
        let key = name.to_lowercase();

        if let Some(existing) = self
            .searches
            .iter_mut()
            .find(|s| s.name.to_lowercase() == key)
        {
            existing.name = name;
            existing.filter = filter;
            existing.updated_at = now;
            tracing::debug!(id = %existing.id, name = %existing.name, "Saved search replaced");
            return Ok(existing.clone());
        }

        let search = SavedSearch {
            id: new_id(),
            name,
            filter,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(id = %search.id, name = %search.name, "Saved search created");
        self.searches.push(search.clone());
        Ok(search)
    }

    pub(super) fn delete(&mut self, id: &str) -> Result<(), SavedSearchError> {
        let before = self.searches.len();
        self.searches.retain(|s| s.id != id);
        if self.searches.len() == before {
            return Err(SavedSearchError::NotFound(id.to_string()));
        }
        tracing::debug!(id, "Saved search deleted");
        Ok(())
    }

    pub(super) fn set_favorite(
        &mut self,
        id: &str,
        favorite: bool,
    ) -> Result<SavedSearch, SavedSearchError> {
        let search = self
            .searches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SavedSearchError::NotFound(id.to_string()))?;
        if search.is_favorite != favorite {
            search.is_favorite = favorite;
            search.updated_at = Utc::now();
        }
        Ok(search.clone())
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::core::constants::DEFAULT_MAX_GROUP_DEPTH as MAX_DEPTH;
    use crate::filter::{FilterGroup, Logic, RuleValue, build_rule};
    use crate::schema::{FieldNode, Operator, SemanticType};

    pub(in crate::saved) fn status_filter(status: &str) -> ComplexFilter {
        let field = FieldNode::leaf(&[], "status", SemanticType::Enum);
        ComplexFilter::single(build_rule(
            &field,
            Operator::Equals,
            RuleValue::scalar(status),
            Some("Status"),
        ))
    }

    #[test]
    fn test_rejects_absent_and_empty_filters() {
        let mut list = SavedSearchList::default();
        assert!(matches!(
            list.save("Nothing", None, MAX_DEPTH),
            Err(SavedSearchError::EmptyFilter)
        ));

        // A root holding only an empty subgroup normalizes to absent
        let hollow =
            ComplexFilter::new(FilterGroup::new(Logic::And).with_group(FilterGroup::new(Logic::Or)));
        assert!(matches!(
            list.save("Hollow", Some(&hollow), MAX_DEPTH),
            Err(SavedSearchError::EmptyFilter)
        ));
    }

    #[test]
    fn test_depth_limit_is_caller_supplied() {
        let mut deep = status_filter("ACTIVE").root_group;
        for _ in 0..MAX_DEPTH {
            deep = FilterGroup::new(Logic::Or).with_group(deep);
        }
        let deep = ComplexFilter::new(deep);
        let mut list = SavedSearchList::default();
        assert!(matches!(
            list.save("Deep", Some(&deep), MAX_DEPTH),
            Err(SavedSearchError::InvalidFilter(_))
        ));
        assert!(list.save("Deep", Some(&deep), 40).is_ok());
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut list = SavedSearchList::default();
        let filter = status_filter("ACTIVE");
        assert!(matches!(
            list.save("   ", Some(&filter), MAX_DEPTH),
            Err(SavedSearchError::InvalidName(_))
        ));
        let long = "x".repeat(MAX_SAVED_SEARCH_NAME_LEN + 1);
        assert!(matches!(
            list.save(&long, Some(&filter), MAX_DEPTH),
            Err(SavedSearchError::InvalidName(_))
        ));
    }

    #[test]
    fn test_save_same_name_replaces_filter() {
        let mut list = SavedSearchList::default();
        let first = list.save("Active users", Some(&status_filter("ACTIVE")), MAX_DEPTH).unwrap();
        list.set_favorite(&first.id, true).unwrap();

        let second = list
            .save("active USERS", Some(&status_filter("PENDING")), MAX_DEPTH)
            .unwrap();

        assert_eq!(second.id, first.id);
        assert!(second.is_favorite);
        assert_eq!(second.name, "active USERS");
        assert_eq!(second.filter, list.get(&first.id).unwrap().filter);
        assert_eq!(list.sorted().len(), 1);
    }

    #[test]
    fn test_sorted_lists_favorites_first() {
        let mut list = SavedSearchList::default();
        list.save("beta", Some(&status_filter("B")), MAX_DEPTH).unwrap();
        let gamma = list.save("Gamma", Some(&status_filter("G")), MAX_DEPTH).unwrap();
        list.save("alpha", Some(&status_filter("A")), MAX_DEPTH).unwrap();
        list.set_favorite(&gamma.id, true).unwrap();

        let names: Vec<String> = list.sorted().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_missing_ids() {
        let mut list = SavedSearchList::default();
        assert!(matches!(list.get("nope"), Err(SavedSearchError::NotFound(_))));
        assert!(matches!(list.delete("nope"), Err(SavedSearchError::NotFound(_))));
        assert!(matches!(
            list.set_favorite("nope", true),
            Err(SavedSearchError::NotFound(_))
        ));
    }

    #[test]
    fn test_serializes_as_camel_case_array() {
        let mut list = SavedSearchList::default();
        list.save("Active", Some(&status_filter("ACTIVE")), MAX_DEPTH).unwrap();
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["isFavorite"], false);
        assert!(json[0]["filter"]["rootGroup"].is_object());
    }
}
