//! In-memory saved search store

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::SavedSearchError;
use super::store::{SavedSearch, SavedSearchList, SavedSearchStore};
use crate::core::constants::DEFAULT_MAX_GROUP_DEPTH;
use crate::filter::ComplexFilter;

/// Process-local store, lost on exit
#[derive(Debug)]
pub struct InMemorySavedSearchStore {
    searches: RwLock<SavedSearchList>,
    max_depth: usize,
}

impl Default for InMemorySavedSearchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySavedSearchStore {
    pub fn new() -> Self {
        Self {
            searches: RwLock::new(SavedSearchList::default()),
            max_depth: DEFAULT_MAX_GROUP_DEPTH,
        }
    }

    /// Nesting limit applied to saved filters
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[async_trait]
impl SavedSearchStore for InMemorySavedSearchStore {
    async fn list(&self) -> Result<Vec<SavedSearch>, SavedSearchError> {
        Ok(self.searches.read().sorted())
    }

    async fn get(&self, id: &str) -> Result<SavedSearch, SavedSearchError> {
        self.searches.read().get(id)
    }

    async fn save(
        &self,
        name: &str,
        filter: Option<&ComplexFilter>,
    ) -> Result<SavedSearch, SavedSearchError> {
        self.searches.write().save(name, filter, self.max_depth)
    }

    async fn delete(&self, id: &str) -> Result<(), SavedSearchError> {
        self.searches.write().delete(id)
    }

    async fn set_favorite(
        &self,
        id: &str,
        favorite: bool,
    ) -> Result<SavedSearch, SavedSearchError> {
        self.searches.write().set_favorite(id, favorite)
    }
}
