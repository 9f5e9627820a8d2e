//! Schema documents and the read-only definition registry built from them.
//!
//! A schema document lists section definitions by name:
//!
//! ```json
//! {
//!   "root": "Archive",
//!   "sections": [
//!     {
//!       "name": "Archive",
//!       "sub_sections": [{ "name": "run", "section": "Run", "repeats": true }]
//!     },
//!     {
//!       "name": "Run",
//!       "quantities": [{ "name": "energy", "type": "float64", "unit": "joule" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Section references are names or positions (`/sections/3`, optionally
//! prefixed with `#`). Every reference is resolved while loading; a single
//! unresolved reference fails the whole load.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::data::definition::{
    DataType, Definition, Dim, Property, PropertyRef, QuantityDef, SectionDef, SectionId, Shape,
    SubSectionDef,
};
use crate::error::SchemaError;

/// Data objects may name a more specific section than the one declared.
pub const SECTION_TAG: &str = "m_def";

/// Serialized schema as delivered by the schema source.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDoc {
    /// Section governing the document root.
    pub root: String,
    pub sections: Vec<SectionDoc>,
}

/// A section as written in the schema file.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionDoc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub quantities: Vec<QuantityDoc>,
    #[serde(default)]
    pub sub_sections: Vec<SubSectionDoc>,
}

/// A quantity as written in the schema file. `type` is a primitive name,
/// `{"enum": [..]}` or `{"reference": "Section"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuantityDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: TypeDoc,
    #[serde(default)]
    pub shape: Vec<DimDoc>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeDoc {
    Reference { reference: String },
    Enum {
        #[serde(rename = "enum")]
        values: Vec<String>,
    },
    Named(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DimDoc {
    Fixed(usize),
    Named(String),
}

/// A sub-section as written in the schema file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubSectionDoc {
    pub name: String,
    pub section: String,
    #[serde(default)]
    pub repeats: bool,
    #[serde(default)]
    pub description: String,
}

/// Immutable, name-indexed set of section definitions.
///
/// Built once per process and shared behind an `Arc`; there is no mutation
/// API after [`SchemaRegistry::load`].
#[derive(Debug)]
pub struct SchemaRegistry {
    sections: Vec<SectionDef>,
    by_name: HashMap<String, SectionId>,
    root: SectionId,
}

impl SchemaRegistry {
    /// Parse and load a schema from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = serde_json::from_value(value.clone())?;
        Self::load(doc)
    }

    /// Build the registry, resolving every section reference.
    pub fn load(doc: SchemaDoc) -> Result<Self, SchemaError> {
        let mut by_name = HashMap::new();
        for (i, section) in doc.sections.iter().enumerate() {
            if by_name.insert(section.name.clone(), SectionId(i)).is_some() {
                return Err(SchemaError::DuplicateDefinition {
                    name: section.name.clone(),
                });
            }
        }

        let count = doc.sections.len();
        let lookup = |from: &str, target: &str| {
            lookup_section(&by_name, count, target).ok_or_else(|| SchemaError::UnresolvedReference {
                from: from.to_string(),
                target: target.to_string(),
            })
        };

        let mut sections = Vec::with_capacity(count);
        for section in &doc.sections {
            let mut properties = Vec::new();
            let mut seen = HashSet::new();
            let mut declare = |name: &str| {
                if !seen.insert(name.to_string()) {
                    return Err(SchemaError::DuplicateProperty {
                        section: section.name.clone(),
                        property: name.to_string(),
                    });
                }
                Ok(())
            };

            for q in &section.quantities {
                declare(&q.name)?;
                let from = format!("{}.{}", section.name, q.name);
                let data_type = match &q.data_type {
                    TypeDoc::Reference { reference } => DataType::Reference(lookup(&from, reference)?),
                    TypeDoc::Enum { values } => DataType::Enum(values.clone()),
                    TypeDoc::Named(name) => DataType::from_name(name),
                };
                let shape = q
                    .shape
                    .iter()
                    .map(|d| match d {
                        DimDoc::Fixed(n) => Dim::Fixed(*n),
                        DimDoc::Named(s) if s == "*" => Dim::Any,
                        DimDoc::Named(s) => Dim::Named(s.clone()),
                    })
                    .collect();
                properties.push(Property::Quantity(QuantityDef {
                    name: q.name.clone(),
                    data_type,
                    shape: Shape(shape),
                    unit: q.unit.clone(),
                    description: q.description.clone(),
                }));
            }

            for s in &section.sub_sections {
                declare(&s.name)?;
                let from = format!("{}.{}", section.name, s.name);
                properties.push(Property::SubSection(SubSectionDef {
                    name: s.name.clone(),
                    section: lookup(&from, &s.section)?,
                    repeats: s.repeats,
                    description: s.description.clone(),
                }));
            }

            let extends = section
                .extends
                .iter()
                .map(|base| lookup(&section.name, base))
                .collect::<Result<Vec<_>, _>>()?;

            sections.push(SectionDef {
                name: section.name.clone(),
                description: section.description.clone(),
                extends,
                properties,
                order: Vec::new(),
                index: HashMap::new(),
            });
        }

        let root = lookup("root", &doc.root)?;

        let mut merged: Vec<Option<Vec<PropertyRef>>> = vec![None; count];
        for i in 0..count {
            merge_properties(&sections, SectionId(i), &mut merged, &mut Vec::new())?;
        }
        for (section, order) in sections.iter_mut().zip(merged) {
            section.order = order.unwrap_or_default();
        }
        for i in 0..count {
            let index = sections[i]
                .order
                .iter()
                .map(|p| (property_name(&sections, *p).to_string(), *p))
                .collect();
            sections[i].index = index;
        }

        info!("schema loaded: {} sections, root `{}`", count, doc.root);

        Ok(Self {
            sections,
            by_name,
            root,
        })
    }

    /// Resolve a section reference (name or `/sections/<i>`).
    pub fn resolve(&self, reference: &str) -> Result<SectionId, SchemaError> {
        lookup_section(&self.by_name, self.sections.len(), reference)
            .ok_or_else(|| SchemaError::UnknownSection(reference.to_string()))
    }

    pub fn root(&self) -> SectionId {
        self.root
    }

    pub fn section(&self, id: SectionId) -> &SectionDef {
        &self.sections[id.0]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Merged properties of a section in display order.
    pub fn properties_of(&self, id: SectionId) -> impl Iterator<Item = (&str, Definition<'_>)> {
        self.section(id).order.iter().map(move |p| {
            let prop = self.property(*p);
            (prop.name(), prop.as_definition())
        })
    }

    /// Identity of the property `name` of a section, inherited or own.
    pub fn property_ref(&self, id: SectionId, name: &str) -> Option<PropertyRef> {
        self.section(id).index.get(name).copied()
    }

    pub fn property(&self, p: PropertyRef) -> &Property {
        &self.sections[p.owner.0].properties[p.slot]
    }

    /// Definition of the property `name` of a section.
    pub fn property_of(&self, id: SectionId, name: &str) -> Option<Definition<'_>> {
        self.property_ref(id, name)
            .map(|p| self.property(p).as_definition())
    }

    /// Whether `id` is `base` or inherits from it.
    pub fn is_a(&self, id: SectionId, base: SectionId) -> bool {
        if id == base {
            return true;
        }
        // inheritance is acyclic after load
        self.section(id).extends.iter().any(|b| self.is_a(*b, base))
    }

    /// The section governing `value`: the one named by its `m_def` tag when
    /// that derives from `declared`, `declared` otherwise.
    pub fn tagged_section(&self, declared: SectionId, value: &Value) -> SectionId {
        value
            .get(SECTION_TAG)
            .and_then(Value::as_str)
            .and_then(|name| self.resolve(name).ok())
            .filter(|id| self.is_a(*id, declared))
            .unwrap_or(declared)
    }
}

fn lookup_section(
    by_name: &HashMap<String, SectionId>,
    count: usize,
    reference: &str,
) -> Option<SectionId> {
    let trimmed = reference.trim_start_matches('#');
    if let Some(pos) = trimmed.strip_prefix("/sections/") {
        return pos
            .parse::<usize>()
            .ok()
            .filter(|i| *i < count)
            .map(SectionId);
    }
    by_name.get(trimmed).copied()
}

fn property_name(sections: &[SectionDef], p: PropertyRef) -> &str {
    sections[p.owner.0].properties[p.slot].name()
}

/// Compute the merged property order of `id`: base sections first, then own
/// properties. An own property replaces an inherited one of the same name
/// in place.
fn merge_properties(
    sections: &[SectionDef],
    id: SectionId,
    merged: &mut [Option<Vec<PropertyRef>>],
    stack: &mut Vec<SectionId>,
) -> Result<(), SchemaError> {
    if merged[id.0].is_some() {
        return Ok(());
    }
    if stack.contains(&id) {
        let chain: Vec<&str> = stack
            .iter()
            .chain(std::iter::once(&id))
            .map(|s| sections[s.0].name.as_str())
            .collect();
        return Err(SchemaError::InheritanceCycle {
            section: sections[id.0].name.clone(),
            chain: chain.join(" -> "),
        });
    }

    stack.push(id);
    let mut order: Vec<PropertyRef> = Vec::new();
    for base in &sections[id.0].extends {
        merge_properties(sections, *base, merged, stack)?;
        for p in merged[base.0].iter().flatten() {
            upsert(sections, &mut order, *p);
        }
    }
    for slot in 0..sections[id.0].properties.len() {
        upsert(sections, &mut order, PropertyRef { owner: id, slot });
    }
    stack.pop();

    merged[id.0] = Some(order);
    Ok(())
}

fn upsert(sections: &[SectionDef], order: &mut Vec<PropertyRef>, p: PropertyRef) {
    let name = property_name(sections, p);
    match order
        .iter()
        .position(|q| property_name(sections, *q) == name)
    {
        Some(pos) => order[pos] = p,
        None => order.push(p),
    }
}
