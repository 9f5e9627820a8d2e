//! Schema definitions and archive paths.
//!
//! - [`definition`] - Section, quantity and sub-section definitions
//! - [`schema`] - Schema documents and the definition registry
//! - [`path`] - Child keys and archive paths

/// Section, quantity and sub-section definitions.
pub mod definition;

/// Child keys (`name:index`) and archive paths.
pub mod path;

/// Schema document parsing and the read-only definition registry.
pub mod schema;

pub use definition::{
    DataType, Definition, Dim, Property, PropertyRef, QuantityDef, SectionDef, SectionId, Shape,
    ShapeKind, SubSectionDef,
};
pub use path::{ArchivePath, ChildKey};
pub use schema::{SchemaDoc, SchemaRegistry};
