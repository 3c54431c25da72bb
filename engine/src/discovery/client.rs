//! Field discovery client
//!
//! Memoizes child listings per module, keyed by dot-joined path. Concurrent
//! requests for the same path share one fetch. Changing the module clears
//! the cache in full, and fetches started for the old module never
//! populate the new module's cache.

use std::sync::Arc;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::sync::Cache;
use parking_lot::RwLock;

use super::error::DiscoveryError;
use super::source::{FieldSource, HttpFieldSource};
use crate::core::config::DiscoveryConfig;
use crate::schema::{ColumnSchema, FieldNode, FieldTypeResolver};

/// Children of one path, shared between cache and callers
pub type FieldList = Arc<Vec<FieldNode>>;

type FetchFuture = Shared<BoxFuture<'static, Result<FieldList, DiscoveryError>>>;

#[derive(Debug)]
struct ModuleScope {
    module: String,
    epoch: u64,
}

pub struct FieldDiscoveryClient {
    source: Arc<dyn FieldSource>,
    resolver: FieldTypeResolver,
    scope: Arc<RwLock<ModuleScope>>,
    cache: Cache<String, FieldList>,
    in_flight: DashMap<String, FetchFuture>,
}

impl FieldDiscoveryClient {
    pub fn new(
        source: Arc<dyn FieldSource>,
        columns: Arc<ColumnSchema>,
        module: impl Into<String>,
        cache_capacity: u64,
    ) -> Self {
        Self {
            source,
            resolver: FieldTypeResolver::new(columns),
            scope: Arc::new(RwLock::new(ModuleScope {
                module: module.into(),
                epoch: 0,
            })),
            cache: Cache::new(cache_capacity.max(1)),
            in_flight: DashMap::new(),
        }
    }

    /// Client over the HTTP discovery endpoints
    pub fn from_config(
        config: &DiscoveryConfig,
        columns: Arc<ColumnSchema>,
        module: impl Into<String>,
    ) -> Result<Self, DiscoveryError> {
        let source = Arc::new(HttpFieldSource::new(config)?);
        Ok(Self::new(source, columns, module, config.cache_capacity))
    }

    pub fn module(&self) -> String {
        self.scope.read().module.clone()
    }

    pub fn columns(&self) -> &ColumnSchema {
        self.resolver.columns()
    }

    /// Switch module identity. Clears the whole cache and forgets in-flight
    /// fetches when the module actually changes.
    pub fn set_module(&self, module: &str) {
        let mut scope = self.scope.write();
        if scope.module == module {
            return;
        }
        tracing::debug!(from = %scope.module, to = %module, "Module changed, clearing field cache");
        scope.module = module.to_string();
        scope.epoch += 1;
        self.cache.invalidate_all();
        self.in_flight.clear();
    }

    /// Cached children of `path`, without fetching
    pub fn cached_children(&self, path: &[String]) -> Option<FieldList> {
        self.cache.get(&path.join("."))
    }

    /// Children of `path`, from cache or the source
    pub async fn fetch_children(&self, path: &[String]) -> Result<FieldList, DiscoveryError> {
        let key = path.join(".");
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(path = %key, "Field cache hit");
            return Ok(hit);
        }

        let (module, epoch) = {
            let scope = self.scope.read();
            (scope.module.clone(), scope.epoch)
        };
        let flight_key = format!("{}\u{1f}{}", module, key);

        let fetch = self
            .in_flight
            .entry(flight_key.clone())
            .or_insert_with(|| self.start_fetch(module, epoch, path.to_vec()))
            .value()
            .clone();

        let result = fetch.clone().await;
        self.in_flight
            .remove_if(&flight_key, |_, pending| pending.ptr_eq(&fetch));
        result
    }

    fn start_fetch(&self, module: String, epoch: u64, path: Vec<String>) -> FetchFuture {
        let source = Arc::clone(&self.source);
        let resolver = self.resolver.clone();
        let scope = Arc::clone(&self.scope);
        let cache = self.cache.clone();

        async move {
            let key = path.join(".");
            tracing::debug!(module = %module, path = %key, "Fetching fields");
            let nodes = source.fetch_fields(&module, &path).await?;
            let nodes: FieldList = Arc::new(
                nodes
                    .into_iter()
                    .map(|node| prepare_node(&resolver, node, &path))
                    .collect(),
            );

            // Insert under the scope lock so a concurrent module switch
            // either sees the entry and clears it, or bumps the epoch first
            let current = scope.read();
            if current.epoch == epoch {
                cache.insert(key, Arc::clone(&nodes));
            } else {
                tracing::debug!(module = %module, path = %key, "Discarding fields of superseded module");
            }
            drop(current);
            Ok(nodes)
        }
        .boxed()
        .shared()
    }
}

/// Fill in path and label, apply column overrides, and settle the type
fn prepare_node(resolver: &FieldTypeResolver, node: FieldNode, parent: &[String]) -> FieldNode {
    let mut node = resolver.columns().apply_overrides(node.normalized(parent));
    node.field_type = resolver.resolve_node(&node);
    node
}
