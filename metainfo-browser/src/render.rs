//! Render descriptions handed to the presentation layer.
//!
//! The core never draws anything. For every adaptor it describes what to
//! show: kind, title, preview, child keys and, per lane, the visible window
//! of each long list.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Toggles read by every render call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ViewFlags {
    /// Include code-specific fields (names starting with `x_`).
    pub show_code_specific: bool,
    /// Include fields the schema declares but the document lacks, disabled.
    pub show_all_defined: bool,
    /// Attach definition details to each rendered node.
    pub show_meta: bool,
}

/// Reserved prefix of code-specific property names.
pub const CODE_SPECIFIC_PREFIX: &str = "x_";

impl ViewFlags {
    /// Whether a property with this name is shown under these flags.
    pub fn shows(&self, name: &str) -> bool {
        self.show_code_specific || !name.starts_with(CODE_SPECIFIC_PREFIX)
    }
}

/// Preview text of a value that could not be prepared for display.
pub const UNAVAILABLE: &str = "unavailable";

/// Preview text of a reference that resolves to nothing.
pub const DANGLING_REFERENCE: &str = "reference…";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    Section,
    Quantity,
    List,
    Reference,
    Unavailable,
}

/// Description of one adaptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub kind: RenderKind,
    pub title: String,
    /// Document location, `run:0/system:1`.
    pub path: String,
    pub preview: String,
    /// Raw value of quantities and dangling references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub children: Vec<ChildEntry>,
    /// Visible windows of repeating sub-sections, filled in by the lane.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<ListView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaInfo>,
    /// Why this node shows as unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One selectable child of a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildEntry {
    pub key: String,
    pub label: String,
    pub kind: RenderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Declared by the schema but absent in the document.
    pub disabled: bool,
    /// Element count of repeating sub-sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// The visible part of a repeating sub-section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    pub name: String,
    pub len: usize,
    /// Keys of the visible elements, `name:index`, in index order.
    pub items: Vec<String>,
    /// Number of elements between the two windows.
    pub hidden: usize,
    /// Whether "more" controls are shown.
    pub controls: bool,
}

/// Definition details shown with `show_meta`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaInfo {
    pub definition: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub description: String,
}
