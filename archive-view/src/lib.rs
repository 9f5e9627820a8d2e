//! # archive-view
//!
//! Terminal viewer for metainfo archives, built on `metainfo-browser`.
//!
//! ## Features
//!
//! - **Show**: render any node of an archive, as text or JSON
//! - **Lanes**: print the breadcrumb lanes leading to a path
//! - **Search**: list where properties carry data
//! - **Browse**: interactive navigation with paging of long lists
//! - **Config schema**: JSON Schema of the config file
//!
//! ## Modules
//!
//! - [`cli`] - Command line arguments
//! - [`ctx`] - Application context and file loading
//! - [`output`] - Colored terminal output
//! - [`shell`] - Interactive browsing

use std::io::Write;

use metainfo_browser::{config::BrowserConfig, search};

/// Command line arguments.
pub mod cli;

/// Application context and state management.
pub mod ctx;

/// Colored rendering of nodes, lanes and search results.
pub mod output;

/// Line-oriented interactive browser.
pub mod shell;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use cli::{Cli, Commands};
use ctx::ViewContext;

/// Execute a parsed command line, writing results to `out`.
pub async fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    if let Commands::ConfigSchema = cli.command {
        let schema = BrowserConfig::json_schema();
        writeln!(out, "{}", serde_json::to_string_pretty(&schema)?)?;
        return Ok(());
    }

    let ctx = ViewContext::load(&cli.paths(), &cli.overrides()).await?;
    match cli.command {
        Commands::Show { path, json } => {
            let mut nav = ctx.navigator();
            nav.navigate(&path)?;
            let node = nav.render(&ctx.flags(), &ctx.units);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&node)?)?;
            } else {
                output::write_node(out, &node)?;
            }
        }
        Commands::Lanes { path } => {
            let mut nav = ctx.navigator();
            nav.navigate(&path)?;
            output::write_lanes(out, &nav)?;
        }
        Commands::Search { query } => {
            let index = ctx.search_index();
            let hits = search::filter(&index, query.as_deref().unwrap_or(""));
            output::write_search(out, &hits)?;
        }
        Commands::Browse => {
            let stdin = std::io::stdin();
            shell::Shell::new(&ctx).run(stdin.lock(), out).await?;
        }
        Commands::ConfigSchema => {}
    }
    Ok(())
}
