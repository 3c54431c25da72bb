//! Field tree navigation
//!
//! Drives the drill-down picker: the active path, its breadcrumb trail, the
//! current children, client-side search, and selection. Each navigation is
//! tagged with a ticket so a slow response for an abandoned path cannot
//! overwrite a newer one. A failed listing leaves the navigator on the target
//! path with no children and the error recorded.

use std::sync::Arc;

use serde::Serialize;

use super::client::{FieldDiscoveryClient, FieldList};
use super::error::DiscoveryError;
use crate::schema::FieldNode;
use crate::utils::string::{contains_ignore_case, humanize_identifier};

/// One step of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: Vec<String>,
}

/// What selecting a node did
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// The node had children; the navigator moved into it
    Navigated,
    /// The node is a leaf; the selection callback ran
    Selected(FieldNode),
}

/// Identifies one navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTicket {
    generation: u64,
    path: Vec<String>,
}

impl NavigationTicket {
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

type SelectCallback = Box<dyn Fn(&FieldNode) + Send + Sync>;

pub struct FieldNavigator {
    client: Arc<FieldDiscoveryClient>,
    path: Vec<String>,
    breadcrumbs: Vec<Breadcrumb>,
    children: FieldList,
    loading: bool,
    error: Option<DiscoveryError>,
    generation: u64,
    on_select: Option<SelectCallback>,
}

impl FieldNavigator {
    pub fn new(client: Arc<FieldDiscoveryClient>) -> Self {
        let breadcrumbs = vec![root_crumb(&client)];
        Self {
            client,
            path: Vec::new(),
            breadcrumbs,
            children: Arc::new(Vec::new()),
            loading: false,
            error: None,
            generation: 0,
            on_select: None,
        }
    }

    /// Callback invoked when a leaf is selected
    pub fn on_select<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FieldNode) + Send + Sync + 'static,
    {
        self.on_select = Some(Box::new(callback));
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn children(&self) -> &[FieldNode] {
        &self.children
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&DiscoveryError> {
        self.error.as_ref()
    }

    /// Start navigating to `path`. Any earlier ticket becomes stale.
    pub fn begin_navigation(&mut self, path: Vec<String>) -> NavigationTicket {
        self.generation += 1;
        self.loading = true;
        NavigationTicket {
            generation: self.generation,
            path,
        }
    }

    /// Apply the result of a navigation. Returns `false` and changes nothing
    /// when a newer navigation has started since `ticket` was issued.
    pub fn complete_navigation(
        &mut self,
        ticket: NavigationTicket,
        result: Result<FieldList, DiscoveryError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                path = %ticket.path.join("."),
                "Discarding stale navigation result"
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(children) => {
                self.children = children;
                self.error = None;
            }
            Err(e) => {
                // Stay on the target with an empty listing
                tracing::warn!(path = %ticket.path.join("."), error = %e, "Navigation failed");
                self.children = Arc::new(Vec::new());
                self.error = Some(e);
            }
        }
        self.breadcrumbs = self.build_breadcrumbs(&ticket.path);
        self.path = ticket.path;
        true
    }

    /// Move to `path`, serving from cache when possible
    pub async fn navigate_to(&mut self, path: Vec<String>) -> Result<(), DiscoveryError> {
        let ticket = self.begin_navigation(path);
        let result = match self.client.cached_children(ticket.path()) {
            Some(hit) => Ok(hit),
            None => self.client.fetch_children(ticket.path()).await,
        };
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.complete_navigation(ticket, result);
        outcome
    }

    /// Pop one path segment. Returns `Ok(false)` at the root.
    pub async fn go_back(&mut self) -> Result<bool, DiscoveryError> {
        let Some((_, parent)) = self.path.split_last() else {
            return Ok(false);
        };
        let parent = parent.to_vec();
        self.navigate_to(parent).await?;
        Ok(true)
    }

    /// Current children whose label or name contains `query`, ignoring case.
    /// Never fetches.
    pub fn search(&self, query: &str) -> Vec<&FieldNode> {
        let query = query.trim();
        self.children
            .iter()
            .filter(|n| {
                query.is_empty()
                    || contains_ignore_case(&n.label, query)
                    || contains_ignore_case(&n.name, query)
            })
            .collect()
    }

    /// Expand a node with children, or select a leaf
    pub async fn select(&mut self, node: &FieldNode) -> Result<SelectOutcome, DiscoveryError> {
        if node.has_children {
            self.navigate_to(node.path.clone()).await?;
            return Ok(SelectOutcome::Navigated);
        }
        tracing::debug!(field = %node.dotted_path(), "Field selected");
        if let Some(callback) = &self.on_select {
            callback(node);
        }
        Ok(SelectOutcome::Selected(node.clone()))
    }

    /// Switch module and start over at its root
    pub async fn change_module(&mut self, module: &str) -> Result<(), DiscoveryError> {
        self.client.set_module(module);
        self.breadcrumbs = vec![root_crumb(&self.client)];
        self.path.clear();
        self.children = Arc::new(Vec::new());
        self.navigate_to(Vec::new()).await
    }

    /// Breadcrumbs from the root to `path`, labelled from cached parents
    fn build_breadcrumbs(&self, path: &[String]) -> Vec<Breadcrumb> {
        let mut crumbs = vec![root_crumb(&self.client)];
        for depth in 1..=path.len() {
            let parent = &path[..depth - 1];
            let name = &path[depth - 1];
            let label = self
                .client
                .cached_children(parent)
                .and_then(|nodes| nodes.iter().find(|n| &n.name == name).map(|n| n.label.clone()))
                .unwrap_or_else(|| humanize_identifier(name));
            crumbs.push(Breadcrumb {
                label,
                path: path[..depth].to_vec(),
            });
        }
        crumbs
    }
}

fn root_crumb(client: &FieldDiscoveryClient) -> Breadcrumb {
    Breadcrumb {
        label: humanize_identifier(&client.module()),
        path: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::source::FieldSource;
    use crate::schema::ColumnSchema;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Two-level tree: root -> company -> address
    #[derive(Default)]
    struct TreeSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FieldSource for TreeSource {
        async fn fetch_fields(
            &self,
            _module: &str,
            path: &[String],
        ) -> Result<Vec<FieldNode>, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let json = match path.join(".").as_str() {
                "" => serde_json::json!([
                    {"name": "email", "label": "Email"},
                    {"name": "company", "label": "Employer", "hasChildren": true},
                    {"name": "createdAt", "label": "Created"}
                ]),
                "company" => serde_json::json!([
                    {"name": "name", "label": "Company Name"},
                    {"name": "address", "label": "Address", "hasChildren": true}
                ]),
                "company.address" => serde_json::json!([{"name": "city", "label": "City"}]),
                _ => return Err(DiscoveryError::Status { status: 404 }),
            };
            let nodes: Vec<FieldNode> = serde_json::from_value(json).unwrap();
            Ok(nodes.into_iter().map(|n| n.normalized(path)).collect())
        }
    }

    fn segments(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    fn navigator() -> (FieldNavigator, Arc<TreeSource>) {
        let source = Arc::new(TreeSource::default());
        let client = Arc::new(FieldDiscoveryClient::new(
            Arc::clone(&source) as Arc<dyn FieldSource>,
            Arc::new(ColumnSchema::default()),
            "users",
            100,
        ));
        (FieldNavigator::new(client), source)
    }

    #[tokio::test]
    async fn test_navigate_builds_breadcrumbs() {
        let (mut nav, _) = navigator();
        nav.navigate_to(Vec::new()).await.unwrap();
        nav.navigate_to(segments(&["company"])).await.unwrap();
        nav.navigate_to(segments(&["company", "address"])).await.unwrap();

        let labels: Vec<&str> = nav.breadcrumbs().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Users", "Employer", "Address"]);
        assert_eq!(nav.breadcrumbs()[2].path, segments(&["company", "address"]));
        assert_eq!(nav.children()[0].name, "city");
        assert!(!nav.is_loading());
    }

    #[tokio::test]
    async fn test_go_back_uses_cache() {
        let (mut nav, source) = navigator();
        nav.navigate_to(Vec::new()).await.unwrap();
        nav.navigate_to(segments(&["company"])).await.unwrap();

        assert!(nav.go_back().await.unwrap());
        assert!(nav.path().is_empty());
        assert_eq!(nav.breadcrumbs().len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // Already at the root
        assert!(!nav.go_back().await.unwrap());
    }

    #[tokio::test]
    async fn test_search_filters_loaded_children_without_fetching() {
        let (mut nav, source) = navigator();
        nav.navigate_to(Vec::new()).await.unwrap();

        let names: Vec<&str> = nav.search("EMPL").iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["company"]);
        let names: Vec<&str> = nav.search("creat").iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["createdAt"]);
        assert_eq!(nav.search("").len(), 3);
        assert!(nav.search("zzz").is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_select_navigates_or_selects() {
        let selected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&selected);
        let (nav, _) = navigator();
        let mut nav = nav.on_select(move |node| sink.lock().unwrap().push(node.dotted_path()));

        nav.navigate_to(Vec::new()).await.unwrap();
        let company = nav.children()[1].clone();
        assert_eq!(nav.select(&company).await.unwrap(), SelectOutcome::Navigated);
        assert_eq!(nav.path(), segments(&["company"]).as_slice());

        let name = nav.children()[0].clone();
        let outcome = nav.select(&name).await.unwrap();
        assert_eq!(outcome, SelectOutcome::Selected(name));
        assert_eq!(*selected.lock().unwrap(), vec!["company.name".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_navigation_is_discarded() {
        let (mut nav, _) = navigator();
        let client = Arc::clone(&nav.client);

        let slow = nav.begin_navigation(segments(&["company"]));
        let fast = nav.begin_navigation(Vec::new());

        let root = client.fetch_children(fast.path()).await;
        assert!(nav.complete_navigation(fast, root));
        let company = client.fetch_children(slow.path()).await;
        assert!(!nav.complete_navigation(slow, company));

        assert!(nav.path().is_empty());
        assert_eq!(nav.children().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_navigation_shows_empty_children() {
        let (mut nav, _) = navigator();
        nav.navigate_to(Vec::new()).await.unwrap();

        let result = nav.navigate_to(segments(&["missing"])).await;
        assert_eq!(result, Err(DiscoveryError::Status { status: 404 }));
        assert_eq!(nav.path(), segments(&["missing"]).as_slice());
        assert!(nav.children().is_empty());
        assert!(nav.search("e").is_empty());
        assert!(nav.error().is_some());

        assert!(nav.go_back().await.unwrap());
        assert!(nav.path().is_empty());
        assert_eq!(nav.children().len(), 3);
        assert!(nav.error().is_none());
    }

    #[tokio::test]
    async fn test_change_module_returns_to_root() {
        let (mut nav, source) = navigator();
        nav.navigate_to(Vec::new()).await.unwrap();
        nav.navigate_to(segments(&["company"])).await.unwrap();

        nav.change_module("customerAccounts").await.unwrap();
        assert!(nav.path().is_empty());
        assert_eq!(nav.breadcrumbs()[0].label, "Customer Accounts");
        // The cache was dropped, so the root was fetched again
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }
}
