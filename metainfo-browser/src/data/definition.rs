use std::collections::HashMap;

use serde::Serialize;

/// Position of a section definition inside a [`super::SchemaRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SectionId(pub(crate) usize);

impl SectionId {
    /// Raw index into the registry's section list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identity of a declared property: the section that declares it and its
/// slot in that section's own property list.
///
/// Inherited properties keep the identity of the declaring base section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub(crate) owner: SectionId,
    pub(crate) slot: usize,
}

impl PropertyRef {
    /// The section that declares this property.
    pub fn owner(self) -> SectionId {
        self.owner
    }
}

/// Value type of a quantity.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
    /// One of a fixed list of labels.
    Enum(Vec<String>),
    /// A path to another section of the same document.
    Reference(SectionId),
    /// Any type the browser has no special handling for.
    Other(String),
}

impl DataType {
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "int" | "int32" | "int64" | "integer" => DataType::Int,
            "float" | "float32" | "float64" | "number" => DataType::Float,
            "str" | "string" => DataType::Str,
            "bool" | "boolean" => DataType::Bool,
            other => DataType::Other(other.to_string()),
        }
    }

    /// Human readable type name, used in meta information.
    pub fn name(&self) -> String {
        match self {
            DataType::Int => "int".into(),
            DataType::Float => "float".into(),
            DataType::Str => "str".into(),
            DataType::Bool => "bool".into(),
            DataType::Enum(values) => format!("enum[{}]", values.join(", ")),
            DataType::Reference(_) => "reference".into(),
            DataType::Other(name) => name.clone(),
        }
    }
}

/// One dimension of a quantity shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    /// Sized by another quantity, e.g. `n_atoms`.
    Named(String),
    /// `*`, any length.
    Any,
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Named(name) => f.write_str(name),
            Dim::Any => f.write_str("*"),
        }
    }
}

/// Coarse classification of a shape by its number of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Scalar,
    Vector,
    Matrix,
    Tensor,
}

impl ShapeKind {
    pub fn of_rank(rank: usize) -> Self {
        match rank {
            0 => ShapeKind::Scalar,
            1 => ShapeKind::Vector,
            2 => ShapeKind::Matrix,
            _ => ShapeKind::Tensor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Scalar => "scalar",
            ShapeKind::Vector => "vector",
            ShapeKind::Matrix => "matrix",
            ShapeKind::Tensor => "tensor",
        }
    }
}

/// Declared shape of a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shape(pub Vec<Dim>);

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        ShapeKind::of_rank(self.0.len())
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

/// A terminal, possibly unit-bearing value definition.
#[derive(Debug, Clone)]
pub struct QuantityDef {
    pub name: String,
    pub data_type: DataType,
    pub shape: Shape,
    /// Storage unit of the value, if any.
    pub unit: Option<String>,
    pub description: String,
}

impl QuantityDef {
    /// Scalar quantities whose value points elsewhere in the document.
    pub fn reference_target(&self) -> Option<SectionId> {
        match self.data_type {
            DataType::Reference(target) if self.shape.is_scalar() => Some(target),
            _ => None,
        }
    }
}

/// A named, possibly repeating, child section of a section.
#[derive(Debug, Clone)]
pub struct SubSectionDef {
    pub name: String,
    /// The section definition governing the child data.
    pub section: SectionId,
    pub repeats: bool,
    pub description: String,
}

/// A property declared by a section.
#[derive(Debug, Clone)]
pub enum Property {
    Quantity(QuantityDef),
    SubSection(SubSectionDef),
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Quantity(q) => &q.name,
            Property::SubSection(s) => &s.name,
        }
    }

    pub fn as_definition(&self) -> Definition<'_> {
        match self {
            Property::Quantity(q) => Definition::Quantity(q),
            Property::SubSection(s) => Definition::SubSection(s),
        }
    }
}

/// Definition of a composite data node.
#[derive(Debug, Clone)]
pub struct SectionDef {
    pub name: String,
    pub description: String,
    /// Base sections whose properties this section inherits.
    pub extends: Vec<SectionId>,
    /// Properties declared by this section itself, in declaration order.
    pub properties: Vec<Property>,
    /// Merged (inherited + own) properties in display order.
    pub(crate) order: Vec<PropertyRef>,
    /// Name index over `order`.
    pub(crate) index: HashMap<String, PropertyRef>,
}

/// Any schema definition, borrowed from the registry.
#[derive(Debug, Clone, Copy)]
pub enum Definition<'r> {
    Section(&'r SectionDef),
    Quantity(&'r QuantityDef),
    SubSection(&'r SubSectionDef),
}

impl<'r> Definition<'r> {
    pub fn name(&self) -> &'r str {
        match self {
            Definition::Section(s) => &s.name,
            Definition::Quantity(q) => &q.name,
            Definition::SubSection(s) => &s.name,
        }
    }

    pub fn description(&self) -> &'r str {
        match self {
            Definition::Section(s) => &s.description,
            Definition::Quantity(q) => &q.description,
            Definition::SubSection(s) => &s.description,
        }
    }

    /// `section`, `quantity` or `sub_section`.
    pub fn kind(&self) -> &'static str {
        match self {
            Definition::Section(_) => "section",
            Definition::Quantity(_) => "quantity",
            Definition::SubSection(_) => "sub_section",
        }
    }
}
