use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_COLUMNS, ENV_CONFIG, ENV_DISCOVERY_URL};
use crate::schema::SemanticType;

#[derive(Parser)]
#[command(name = "filterforge")]
#[command(version, about = "Filter descriptor toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Column schema JSON file (display names, types, options)
    #[arg(long, global = true, env = ENV_COLUMNS)]
    pub columns: Option<PathBuf>,

    /// Field discovery base URL
    #[arg(long, global = true, env = ENV_DISCOVERY_URL)]
    pub discovery_url: Option<String>,

    /// Maximum filter group nesting depth
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,
}

/// Parse semantic type from CLI string
fn parse_semantic_type(s: &str) -> Result<SemanticType, String> {
    s.parse::<SemanticType>().map_err(|_| {
        format!(
            "Invalid field type '{}'. Valid options: string, number, boolean, date, datetime, enum, text, relation",
            s
        )
    })
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List the operators valid for a field type
    Operators {
        #[arg(value_parser = parse_semantic_type)]
        field_type: SemanticType,
    },
    /// Resolve the semantic type of a dotted field path
    Resolve {
        /// Field path, e.g. `company.createdAt`
        path: String,
    },
    /// Print the human-readable label of a filter descriptor
    Label {
        /// Filter descriptor JSON file
        file: PathBuf,
        /// Print one chip per rule instead of the whole sentence
        #[arg(long)]
        tags: bool,
    },
    /// Merge an incoming filter into an existing one
    Merge {
        /// Existing filter descriptor (may contain `null`)
        existing: PathBuf,
        /// Incoming filter descriptor
        incoming: PathBuf,
    },
    /// Print the request payload of a filter descriptor
    Request {
        /// Filter descriptor JSON file
        file: PathBuf,
        /// Reference date for presets (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<chrono::NaiveDate>,
    },
    /// List discoverable fields of a module
    Fields {
        /// Module identity
        #[arg(long, short = 'm')]
        module: String,
        /// Dotted parent path (omit for the module root)
        #[arg(long, short = 'p')]
        path: Option<String>,
    },
    /// Search remote options for a multi-value field
    Options {
        /// Option source name
        source: String,
        /// Search text
        #[arg(default_value = "")]
        query: String,
    },
    /// Saved searches
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SavedCommands {
    /// List saved searches, favorites first
    List,
    /// Save a filter descriptor under a name
    Save {
        name: String,
        /// Filter descriptor JSON file
        file: PathBuf,
    },
    /// Delete a saved search
    Delete { id: String },
    /// Mark or unmark a saved search as favorite
    Favorite {
        id: String,
        /// Remove the favorite mark instead
        #[arg(long)]
        off: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub columns: Option<PathBuf>,
    pub discovery_url: Option<String>,
    pub max_depth: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        columns: cli.columns,
        discovery_url: cli.discovery_url,
        max_depth: cli.max_depth,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators_command() {
        let cli = Cli::try_parse_from(["filterforge", "operators", "datetime"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Operators {
                field_type: SemanticType::Datetime
            }
        ));
    }

    #[test]
    fn test_invalid_field_type_is_rejected() {
        assert!(Cli::try_parse_from(["filterforge", "operators", "geometry"]).is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "filterforge",
            "fields",
            "--module",
            "users",
            "--path",
            "company",
            "--discovery-url",
            "http://localhost:9000",
        ])
        .unwrap();
        assert_eq!(cli.discovery_url.as_deref(), Some("http://localhost:9000"));
        match cli.command {
            Commands::Fields { module, path } => {
                assert_eq!(module, "users");
                assert_eq!(path.as_deref(), Some("company"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_request_today_parses_date() {
        let cli = Cli::try_parse_from(["filterforge", "request", "f.json", "--today", "2025-03-15"])
            .unwrap();
        match cli.command {
            Commands::Request { today, .. } => {
                assert_eq!(today, chrono::NaiveDate::from_ymd_opt(2025, 3, 15));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_saved_subcommands() {
        let cli =
            Cli::try_parse_from(["filterforge", "saved", "favorite", "abc", "--off"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Saved {
                command: SavedCommands::Favorite { ref id, off: true }
            } if id == "abc"
        ));
        assert!(Cli::try_parse_from(["filterforge", "saved", "save", "Active"]).is_err());
    }
}
