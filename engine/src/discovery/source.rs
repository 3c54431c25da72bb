//! Field and option sources
//!
//! The client and option search talk to these traits; [`HttpFieldSource`]
//! is the production implementation over the discovery REST endpoints.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::DiscoveryError;
use crate::core::config::DiscoveryConfig;
use crate::core::constants::{APP_NAME, DISCOVERY_RETRY_BASE_DELAY_MS};
use crate::schema::{FieldNode, FieldOption};
use crate::utils::retry::retry_with_backoff_async;

/// Lists the children of a path in a module's field tree
#[async_trait]
pub trait FieldSource: Send + Sync {
    /// Children of `path`; the empty path is the module root
    async fn fetch_fields(
        &self,
        module: &str,
        path: &[String],
    ) -> Result<Vec<FieldNode>, DiscoveryError>;
}

/// Searches the remote values of a large enumeration
#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn search_options(
        &self,
        source: &str,
        query: &str,
    ) -> Result<Vec<FieldOption>, DiscoveryError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldPage {
    #[serde(default)]
    fields: Vec<FieldNode>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OptionPage {
    #[serde(default)]
    options: Vec<FieldOption>,
}

/// Discovery endpoints over HTTP
///
/// - `GET {base}/fields?module=&path=&cursor=` returns `{fields, nextCursor?}`
/// - `GET {base}/options?source=&q=` returns `{options}`
pub struct HttpFieldSource {
    client: reqwest::Client,
    base_url: reqwest::Url,
    max_pages: usize,
    retry_attempts: u32,
}

impl HttpFieldSource {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| DiscoveryError::Config(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DiscoveryError::Config(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DiscoveryError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            max_pages: config.max_pages.max(1),
            retry_attempts: config.retry_attempts.max(1),
        })
    }

    fn endpoint(&self, name: &str) -> Result<reqwest::Url, DiscoveryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Config("base URL cannot have path segments".to_string()))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: reqwest::Url,
    ) -> Result<T, DiscoveryError> {
        tracing::trace!(url = %url, "Discovery request");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.json::<T>().await?)
    }

    async fn fetch_page(
        &self,
        module: &str,
        dotted_path: &str,
        cursor: Option<&str>,
    ) -> Result<FieldPage, DiscoveryError> {
        let mut url = self.endpoint("fields")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("module", module)
                .append_pair("path", dotted_path);
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        self.get_json(url).await
    }

    async fn fetch_page_with_retry(
        &self,
        module: &str,
        dotted_path: &str,
        cursor: Option<&str>,
    ) -> Result<FieldPage, DiscoveryError> {
        retry_with_backoff_async(
            self.retry_attempts,
            DISCOVERY_RETRY_BASE_DELAY_MS,
            DiscoveryError::is_transient,
            || self.fetch_page(module, dotted_path, cursor),
        )
        .await
        .map(|(page, attempts)| {
            if attempts > 1 {
                tracing::debug!(module, path = dotted_path, attempts, "Field page fetched after retry");
            }
            page
        })
        .map_err(|(e, attempts)| {
            tracing::warn!(module, path = dotted_path, attempts, error = %e, "Field page fetch failed");
            e
        })
    }
}

#[async_trait]
impl FieldSource for HttpFieldSource {
    async fn fetch_fields(
        &self,
        module: &str,
        path: &[String],
    ) -> Result<Vec<FieldNode>, DiscoveryError> {
        let dotted = path.join(".");
        let mut fields = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        for page_number in 1..=self.max_pages {
            let page = self
                .fetch_page_with_retry(module, &dotted, cursor.as_deref())
                .await?;
            fields.extend(page.fields);

            match page.next_cursor.filter(|c| !c.is_empty()) {
                None => break,
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    tracing::warn!(module, path = %dotted, cursor = %next, "Repeated page cursor, stopping");
                    break;
                }
                Some(next) => {
                    if page_number == self.max_pages {
                        tracing::warn!(
                            module,
                            path = %dotted,
                            max_pages = self.max_pages,
                            "Field listing truncated at page limit"
                        );
                    }
                    cursor = Some(next);
                }
            }
        }

        tracing::debug!(module, path = %dotted, fields = fields.len(), "Fetched fields");
        Ok(fields)
    }
}

#[async_trait]
impl OptionSource for HttpFieldSource {
    async fn search_options(
        &self,
        source: &str,
        query: &str,
    ) -> Result<Vec<FieldOption>, DiscoveryError> {
        let mut url = self.endpoint("options")?;
        url.query_pairs_mut()
            .append_pair("source", source)
            .append_pair("q", query);
        let page: OptionPage = retry_with_backoff_async(
            self.retry_attempts,
            DISCOVERY_RETRY_BASE_DELAY_MS,
            DiscoveryError::is_transient,
            || self.get_json(url.clone()),
        )
        .await
        .map(|(page, _)| page)
        .map_err(|(e, _)| e)?;
        tracing::debug!(source, options = page.options.len(), "Fetched options");
        Ok(page.options)
    }
}
