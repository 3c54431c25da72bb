//! JSON file saved search store
//!
//! Keeps the whole list in one JSON array file. The file is read on first
//! use; every change is written through an atomic replace and only applied
//! in memory once the write succeeds.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::SavedSearchError;
use super::store::{SavedSearch, SavedSearchList, SavedSearchStore};
use crate::core::constants::DEFAULT_MAX_GROUP_DEPTH;
use crate::filter::ComplexFilter;
use crate::utils::file::write_atomic;

#[derive(Debug)]
pub struct JsonFileSavedSearchStore {
    path: PathBuf,
    state: Mutex<Option<SavedSearchList>>,
    max_depth: usize,
}

impl JsonFileSavedSearchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
            max_depth: DEFAULT_MAX_GROUP_DEPTH,
        }
    }

    /// Nesting limit applied to saved filters
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<SavedSearchList, SavedSearchError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved searches file yet");
                return Ok(SavedSearchList::default());
            }
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(SavedSearchList::default());
        }
        serde_json::from_str(&contents).map_err(|e| SavedSearchError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    async fn write_file(&self, list: &SavedSearchList) -> Result<(), SavedSearchError> {
        let json = serde_json::to_vec_pretty(list).map_err(std::io::Error::other)?;
        write_atomic(&self.path, &json).await?;
        Ok(())
    }

    /// Snapshot of the current list, loading it on first use
    async fn snapshot(&self) -> Result<SavedSearchList, SavedSearchError> {
        let mut state = self.state.lock().await;
        if let Some(list) = state.as_ref() {
            return Ok(list.clone());
        }
        let list = self.read_file().await?;
        *state = Some(list.clone());
        Ok(list)
    }

    /// Apply `change` to a copy of the list, persist it, then commit
    async fn modify<T, F>(&self, change: F) -> Result<T, SavedSearchError>
    where
        F: FnOnce(&mut SavedSearchList) -> Result<T, SavedSearchError>,
    {
        let mut state = self.state.lock().await;
        let mut list = match state.as_ref() {
            Some(list) => list.clone(),
            None => self.read_file().await?,
        };
        let result = change(&mut list)?;
        self.write_file(&list).await?;
        *state = Some(list);
        Ok(result)
    }
}

#[async_trait]
impl SavedSearchStore for JsonFileSavedSearchStore {
    async fn list(&self) -> Result<Vec<SavedSearch>, SavedSearchError> {
        Ok(self.snapshot().await?.sorted())
    }

    async fn get(&self, id: &str) -> Result<SavedSearch, SavedSearchError> {
        self.snapshot().await?.get(id)
    }

    async fn save(
        &self,
        name: &str,
        filter: Option<&ComplexFilter>,
    ) -> Result<SavedSearch, SavedSearchError> {
        self.modify(|list| list.save(name, filter, self.max_depth)).await
    }

    async fn delete(&self, id: &str) -> Result<(), SavedSearchError> {
        self.modify(|list| list.delete(id)).await
    }

    async fn set_favorite(
        &self,
        id: &str,
        favorite: bool,
    ) -> Result<SavedSearch, SavedSearchError> {
        self.modify(|list| list.set_favorite(id, favorite)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RuleValue;
    use crate::saved::store::tests::status_filter;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSavedSearchStore::new(dir.path().join("saved.json"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_changes_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("saved.json");

        let store = JsonFileSavedSearchStore::new(&path);
        let active = store
            .save("Active", Some(&status_filter("ACTIVE")))
            .await
            .unwrap();
        let pending = store
            .save("Pending", Some(&status_filter("PENDING")))
            .await
            .unwrap();
        store.set_favorite(&pending.id, true).await.unwrap();
        store.delete(&active.id).await.unwrap();

        let reopened = JsonFileSavedSearchStore::new(&path);
        let searches = reopened.list().await.unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].id, pending.id);
        assert!(searches[0].is_favorite);
        assert_eq!(
            searches[0].filter.root_group.rules[0].value,
            RuleValue::scalar("PENDING")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileSavedSearchStore::new(&path);
        assert!(matches!(
            store.list().await,
            Err(SavedSearchError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_save_does_not_touch_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.json");
        let store = JsonFileSavedSearchStore::new(&path);

        assert!(matches!(
            store.save("Empty", None).await,
            Err(SavedSearchError::EmptyFilter)
        ));
        assert!(!path.exists());
    }
}
