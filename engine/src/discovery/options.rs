//! Debounced remote option search
//!
//! Multi-value pickers for large enumerations query an option source as the
//! user types. Only the latest query reaches the source; superseded queries
//! resolve to `None` without a request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::error::DiscoveryError;
use super::source::OptionSource;
use crate::core::constants::OPTION_SEARCH_LIMIT;
use crate::schema::FieldOption;

pub struct OptionSearch {
    source: Arc<dyn OptionSource>,
    debounce: Duration,
    generation: AtomicU64,
}

impl OptionSearch {
    pub fn new(source: Arc<dyn OptionSource>, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Search `source_name` for `query` once the debounce window passes.
    ///
    /// Returns `Ok(None)` when a newer search or [`cancel`](Self::cancel)
    /// superseded this one.
    pub async fn search(
        &self,
        source_name: &str,
        query: &str,
    ) -> Result<Option<Vec<FieldOption>>, DiscoveryError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;
        if !self.is_current(ticket) {
            tracing::trace!(source = source_name, query, "Option search superseded before request");
            return Ok(None);
        }

        let mut options = self.source.search_options(source_name, query.trim()).await?;
        if !self.is_current(ticket) {
            tracing::trace!(source = source_name, query, "Option search superseded during request");
            return Ok(None);
        }
        options.truncate(OPTION_SEARCH_LIMIT);
        Ok(Some(options))
    }

    /// Supersede any pending search
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OptionSource for RecordingSource {
        async fn search_options(
            &self,
            _source: &str,
            query: &str,
        ) -> Result<Vec<FieldOption>, DiscoveryError> {
            self.queries.lock().push(query.to_string());
            Ok((0..OPTION_SEARCH_LIMIT + 10)
                .map(|i| FieldOption::new(format!("{}{}", query, i), format!("{} {}", query, i)))
                .collect())
        }
    }

    fn search(source: &Arc<RecordingSource>) -> OptionSearch {
        OptionSearch::new(
            Arc::clone(source) as Arc<dyn OptionSource>,
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_only_latest_query_is_sent() {
        let source = Arc::new(RecordingSource::default());
        let search = search(&source);

        let (first, second) = tokio::join!(
            search.search("countries", "ge"),
            search.search("countries", "ger")
        );

        assert_eq!(first, Ok(None));
        let options = second.unwrap().unwrap();
        assert_eq!(options.len(), OPTION_SEARCH_LIMIT);
        assert_eq!(*source.queries.lock(), vec!["ger".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_supersedes_pending_search() {
        let source = Arc::new(RecordingSource::default());
        let search = search(&source);

        let (result, _) = tokio::join!(search.search("countries", "fr"), async {
            search.cancel();
        });

        assert_eq!(result, Ok(None));
        assert!(source.queries.lock().is_empty());
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let source = Arc::new(RecordingSource::default());
        let search = search(&source);
        search.search("countries", "  it ").await.unwrap();
        assert_eq!(*source.queries.lock(), vec!["it".to_string()]);
    }
}
