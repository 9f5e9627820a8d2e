//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ctx::{DEFAULT_CONFIG_PATH, DisplayOverrides, PathConfig};

#[derive(Parser, Debug)]
#[command(name = "archive-view", version)]
#[command(about = "Browse metainfo archives in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Schema document (JSON)
    #[arg(short, long, global = true, default_value = "schema.json")]
    pub schema: PathBuf,

    /// Archive document (JSON)
    #[arg(short, long, global = true, default_value = "archive.json")]
    pub archive: PathBuf,

    /// Config file (.toml or .json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show code-specific (`x_`) properties
    #[arg(long, global = true)]
    pub code_specific: bool,

    /// Show properties the schema defines but the archive lacks
    #[arg(long, global = true)]
    pub all_defined: bool,

    /// Show definition details
    #[arg(long, global = true)]
    pub meta: bool,

    /// Unit system used for display
    #[arg(short, long, global = true)]
    pub units: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the node at a path
    Show {
        /// Path such as `run:0/system:1`
        #[arg(default_value = "")]
        path: String,

        /// Print the render description as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the lanes for a path
    Lanes {
        path: String,
    },

    /// List search index entries, optionally filtered
    Search {
        query: Option<String>,
    },

    /// Interactive browsing on stdin
    Browse,

    /// Print the JSON Schema of the config file
    ConfigSchema,
}

impl Cli {
    pub fn paths(&self) -> PathConfig {
        PathConfig {
            schema: self.schema.clone(),
            archive: self.archive.clone(),
            config: self
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    pub fn overrides(&self) -> DisplayOverrides {
        DisplayOverrides {
            show_code_specific: self.code_specific,
            show_all_defined: self.all_defined,
            show_meta: self.meta,
            unit_system: self.units.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show() {
        let cli = Cli::parse_from([
            "archive-view",
            "show",
            "run:0/system:1",
            "--json",
            "--schema",
            "s.json",
            "--meta",
        ]);
        assert_eq!(cli.schema, PathBuf::from("s.json"));
        assert!(cli.meta);
        match &cli.command {
            Commands::Show { path, json } => {
                assert_eq!(path, "run:0/system:1");
                assert!(*json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.paths().config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_parse_search_without_query() {
        let cli = Cli::parse_from(["archive-view", "search"]);
        assert!(matches!(cli.command, Commands::Search { query: None }));
    }
}
