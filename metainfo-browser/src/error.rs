//! Error types for schema loading, navigation, unit conversion and document
//! sources.

use thiserror::Error;

/// Errors raised while loading a schema. Any of them aborts the load.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A definition refers to a section that is not part of the schema.
    #[error("unresolved reference `{target}` in `{from}`")]
    UnresolvedReference { from: String, target: String },

    /// A lookup on a loaded registry named no section.
    #[error("no section `{0}` in the schema")]
    UnknownSection(String),

    /// Two sections share the same name.
    #[error("section `{name}` is defined more than once")]
    DuplicateDefinition { name: String },

    /// A section declares the same property twice.
    #[error("property `{property}` is declared more than once in section `{section}`")]
    DuplicateProperty { section: String, property: String },

    /// Section inheritance loops back onto itself.
    #[error("section `{section}` extends itself through {chain}")]
    InheritanceCycle { section: String, chain: String },

    /// The schema document is not valid JSON for the schema format.
    #[error("invalid schema document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by navigation. The navigator rejects the transition and
/// keeps its lanes unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    /// The key names no property of the current section.
    #[error("section `{section}` has no property `{key}`")]
    UnknownProperty { section: String, key: String },

    /// Array or lane access past the end.
    #[error("index {index} out of range for `{key}` (length {len})")]
    IndexOutOfRange { key: String, index: usize, len: usize },

    /// The key does not parse as `name` or `name:index`.
    #[error("invalid key `{0}`")]
    InvalidKey(String),

    /// Only section adaptors have children.
    #[error("`{0}` is not a section")]
    NotASection(String),

    /// A data-level reference points at nothing in this document.
    #[error("reference `{reference}` does not resolve in this document")]
    DanglingDataReference { reference: String },

    /// No lane with that index or id exists.
    #[error("no lane {0}")]
    LaneOutOfRange(usize),
}

/// Errors raised while preparing a value for display.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    /// The conversion table has no entry for the requested unit pair.
    #[error("no conversion from `{from}` to `{to}`")]
    MissingConversion { from: String, to: String },

    /// A unit-bearing quantity holds something that is not a number.
    #[error("expected a number, found {0}")]
    NotNumeric(String),
}

/// Errors raised by a [`crate::source::DocumentSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// The page path does not exist in the document.
    #[error("no value at `{0}`")]
    NotFound(String),

    /// The page path exists but is not an array.
    #[error("`{0}` is not a list")]
    NotAList(String),
}
