//! # metainfo-browser
//!
//! Lazy, schema-driven navigation over large nested archive documents.
//!
//! A document is a JSON tree whose every node is governed by a definition
//! from a schema: sections group named properties, quantities are typed,
//! possibly unit-bearing leaves, and sub-sections nest further sections,
//! optionally as repeating lists.
//!
//! ## Features
//!
//! - Schema registry with name and positional references, inheritance and
//!   eager detection of unresolved references
//! - Adaptors pairing a data node with its definition, created one step at a
//!   time as the user navigates
//! - Breadcrumb lanes with atomic transitions
//! - Windowed access to long lists, with remote page fetching
//! - A search index over the data actually present
//! - Display-time unit conversion through a configurable table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use metainfo_browser::{Adaptor, ArchiveContext, Navigator, SchemaRegistry, config::BrowserConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema: serde_json::Value = serde_json::from_str(&std::fs::read_to_string("schema.json")?)?;
//! let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string("archive.json")?)?;
//! let config = BrowserConfig::load("browser.toml")?;
//!
//! let registry = Arc::new(SchemaRegistry::from_json(&schema)?);
//! let archive = ArchiveContext::new(registry, Arc::new(document));
//! let mut nav = Navigator::new(Adaptor::root(archive), config.pagination);
//! nav.push("run:0")?;
//! let node = nav.render(&config.display.flags, &config.unit_context()?);
//! println!("{}", serde_json::to_string_pretty(&node)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Definitions, schema registry and document paths
//! - [`adaptor`] - Data node and definition pairs
//! - [`lanes`] - Breadcrumb navigation
//! - [`pager`] - List windows
//! - [`search`] - Search index
//! - [`source`] - Document and page sources

#[macro_use]
extern crate log;

pub mod adaptor;
pub mod config;
/// Definitions, schema loading and document paths.
pub mod data;
pub mod error;
pub mod lanes;
pub mod pager;
pub mod render;
pub mod search;
pub mod source;
pub mod units;

pub use adaptor::{Adaptor, AdaptorId, AdaptorKind, ArchiveContext};
pub use data::{ArchivePath, ChildKey, SchemaRegistry};
pub use error::{NavError, SchemaError, SourceError, UnitError};
pub use lanes::{Lane, LaneId, Navigator};
pub use render::{RenderKind, RenderNode, ViewFlags};
pub use serde_json::Value;
