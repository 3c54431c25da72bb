//! Command-line application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::core::cli::{self, CliConfig, Commands, SavedCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::discovery::{FieldDiscoveryClient, FieldNavigator, HttpFieldSource, OptionSearch};
use crate::filter::{
    ComplexFilter, filter_tags, format_filter, merge_additive_value, parse_filter, to_request,
};
use crate::saved::{JsonFileSavedSearchStore, SavedSearchStore};
use crate::schema::{ColumnSchema, FieldTypeResolver, descriptors_for};

pub struct FilterForgeApp {
    pub config: AppConfig,
    pub columns: Arc<ColumnSchema>,
}

impl FilterForgeApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        app.execute(command).await
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let columns = match &config.columns {
            Some(path) => ColumnSchema::from_json_file(path)?,
            None => ColumnSchema::default(),
        };
        Ok(Self {
            config,
            columns: Arc::new(columns),
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Operators { field_type } => print_json(&descriptors_for(field_type)),
            Commands::Resolve { path } => print_json(&self.resolve(&path)),
            Commands::Label { file, tags } => {
                let filter = self.read_filter(&file).await?;
                if tags {
                    print_json(&filter_tags(filter.as_ref(), &self.columns))
                } else {
                    println!("{}", format_filter(filter.as_ref(), &self.columns));
                    Ok(())
                }
            }
            Commands::Merge { existing, incoming } => {
                let existing = self.read_filter(&existing).await?;
                let incoming = read_json(&incoming).await?;
                print_json(&merge_additive_value(existing.as_ref(), &incoming))
            }
            Commands::Request { file, today } => {
                let filter = self.read_filter(&file).await?;
                let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
                print_json(&to_request(filter.as_ref(), today))
            }
            Commands::Fields { module, path } => self.list_fields(&module, path.as_deref()).await,
            Commands::Options { source, query } => {
                let http = HttpFieldSource::new(&self.config.discovery)?;
                let search = OptionSearch::new(Arc::new(http), self.config.search.debounce);
                let options = search.search(&source, &query).await?.unwrap_or_default();
                print_json(&options)
            }
            Commands::Saved { command } => self.saved(command).await,
        }
    }

    fn resolve(&self, dotted: &str) -> serde_json::Value {
        let path = split_path(dotted);
        let field = path.last().map(String::as_str).unwrap_or_default();
        let resolver = FieldTypeResolver::new(Arc::clone(&self.columns));
        json!({
            "path": path.join("."),
            "display": self.columns.display_name(field, &path),
            "type": resolver.resolve(field, &path),
        })
    }

    async fn list_fields(&self, module: &str, path: Option<&str>) -> Result<()> {
        let client = FieldDiscoveryClient::from_config(
            &self.config.discovery,
            Arc::clone(&self.columns),
            module,
        )?;
        let mut navigator = FieldNavigator::new(Arc::new(client));

        // Walk down so every breadcrumb is labelled from its parent listing
        let target = split_path(path.unwrap_or_default());
        navigator.navigate_to(Vec::new()).await?;
        for depth in 1..=target.len() {
            navigator.navigate_to(target[..depth].to_vec()).await?;
        }

        print_json(&json!({
            "breadcrumbs": navigator.breadcrumbs(),
            "fields": navigator.children(),
        }))
    }

    async fn saved(&self, command: SavedCommands) -> Result<()> {
        let store = JsonFileSavedSearchStore::new(&self.config.saved_searches)
            .with_max_depth(self.config.filter.max_depth);
        match command {
            SavedCommands::List => print_json(&store.list().await?),
            SavedCommands::Save { name, file } => {
                let filter = self.read_filter(&file).await?;
                print_json(&store.save(&name, filter.as_ref()).await?)
            }
            SavedCommands::Delete { id } => {
                store.delete(&id).await?;
                println!("Deleted: {}", id);
                Ok(())
            }
            SavedCommands::Favorite { id, off } => {
                print_json(&store.set_favorite(&id, !off).await?)
            }
        }
    }

    /// Read, parse, and check a descriptor file against the configured depth
    async fn read_filter(&self, path: &Path) -> Result<Option<ComplexFilter>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read filter file: {}", path.display()))?;
        parse_filter(&content, self.config.filter.max_depth)
            .with_context(|| format!("Invalid filter file: {}", path.display()))
    }
}

async fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON: {}", path.display()))
}

fn split_path(dotted: &str) -> Vec<String> {
    dotted
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
