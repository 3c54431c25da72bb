//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;

pub use cli::{CliConfig, Commands, SavedCommands};
pub use config::{AppConfig, DiscoveryConfig, FilterConfig, SearchConfig};
