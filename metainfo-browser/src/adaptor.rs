//! Adaptors pair a data node with the definition that governs it.
//!
//! Adaptors are created lazily, one navigation step at a time, and know how
//! to derive the adaptor of any child key by schema lookup. A child refers to
//! its parent only by [`AdaptorId`], so dropping a lane releases its adaptor
//! regardless of what other lanes hold.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use serde_json::Value;

use crate::{
    data::{
        ArchivePath, ChildKey, Definition, Property, PropertyRef, QuantityDef, SchemaRegistry,
        SectionId, ShapeKind, SubSectionDef, path::pointer_push,
    },
    error::{NavError, UnitError},
    render::{
        ChildEntry, DANGLING_REFERENCE, MetaInfo, RenderKind, RenderNode, UNAVAILABLE, ViewFlags,
    },
    units::{UnitContext, format_number},
};

static NULL: Value = Value::Null;
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const MAX_TEXT_PREVIEW: usize = 60;

/// Process-unique identity of an adaptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AdaptorId(u64);

impl AdaptorId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The schema and document shared by every adaptor of one view.
#[derive(Debug, Clone)]
pub struct ArchiveContext {
    registry: Arc<SchemaRegistry>,
    document: Arc<Value>,
}

impl ArchiveContext {
    pub fn new(registry: Arc<SchemaRegistry>, document: Arc<Value>) -> Self {
        Self { registry, document }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    fn concrete_section(&self, declared: SectionId, value: &Value) -> SectionId {
        self.registry.tagged_section(declared, value)
    }
}

/// A data node addressed as a JSON pointer into a shared value.
#[derive(Debug, Clone)]
struct NodeHandle {
    root: Arc<Value>,
    pointer: String,
}

impl NodeHandle {
    fn get(&self) -> &Value {
        self.root.pointer(&self.pointer).unwrap_or(&NULL)
    }

    fn child(&self, token: &str) -> NodeHandle {
        NodeHandle {
            root: self.root.clone(),
            pointer: pointer_push(&self.pointer, token),
        }
    }
}

/// What an adaptor stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptorKind {
    /// A section instance; navigable.
    Section(SectionId),
    /// A quantity value; a leaf.
    Quantity(PropertyRef),
    /// A reference quantity whose target is not in this document. Carries
    /// only the raw reference value.
    Dangling(PropertyRef),
}

/// A lazy view of one node of the document under its governing definition.
///
/// Children are built on demand by [`Adaptor::child_at`]; nothing below the
/// node is read until asked for.
#[derive(Debug, Clone)]
pub struct Adaptor {
    id: AdaptorId,
    parent: Option<AdaptorId>,
    archive: ArchiveContext,
    node: NodeHandle,
    path: ArchivePath,
    kind: AdaptorKind,
}

impl Adaptor {
    /// Adaptor over the document root, governed by the schema root.
    pub fn root(archive: ArchiveContext) -> Self {
        let node = NodeHandle {
            root: archive.document.clone(),
            pointer: String::new(),
        };
        let section = archive.concrete_section(archive.registry.root(), node.get());
        Self {
            id: AdaptorId::next(),
            parent: None,
            archive,
            node,
            path: ArchivePath::root(),
            kind: AdaptorKind::Section(section),
        }
    }

    pub fn id(&self) -> AdaptorId {
        self.id
    }

    pub fn parent(&self) -> Option<AdaptorId> {
        self.parent
    }

    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    pub fn kind(&self) -> AdaptorKind {
        self.kind
    }

    pub fn archive(&self) -> &ArchiveContext {
        &self.archive
    }

    /// The raw data node.
    pub fn value(&self) -> &Value {
        self.node.get()
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, AdaptorKind::Section(_))
    }

    pub fn definition(&self) -> Definition<'_> {
        let registry = self.archive.registry();
        match self.kind {
            AdaptorKind::Section(id) => Definition::Section(registry.section(id)),
            AdaptorKind::Quantity(p) | AdaptorKind::Dangling(p) => {
                registry.property(p).as_definition()
            }
        }
    }

    /// Display title: the key that led here, or the root section's name.
    pub fn title(&self) -> String {
        match self.path.last() {
            Some(key) => key.to_string(),
            None => self.definition().name().to_string(),
        }
    }

    /// Derive the adaptor for `key` (`name` or `name:index`).
    pub fn child_at(&self, key: &str) -> Result<Adaptor, NavError> {
        let key: ChildKey = key.parse()?;
        self.child(&key)
    }

    pub fn child(&self, key: &ChildKey) -> Result<Adaptor, NavError> {
        let AdaptorKind::Section(section) = self.kind else {
            return Err(NavError::NotASection(self.title()));
        };
        let registry = self.archive.registry();
        let prop = registry
            .property_ref(section, &key.name)
            .ok_or_else(|| NavError::UnknownProperty {
                section: registry.section(section).name.clone(),
                key: key.to_string(),
            })?;

        match registry.property(prop) {
            Property::SubSection(sub) => self.sub_section_child(sub, key),
            Property::Quantity(quantity) => {
                if key.index.is_some() {
                    return Err(NavError::InvalidKey(key.to_string()));
                }
                self.quantity_child(prop, quantity)
            }
        }
    }

    fn sub_section_child(&self, sub: &SubSectionDef, key: &ChildKey) -> Result<Adaptor, NavError> {
        let raw = self.value().get(&sub.name);
        let node = self.node.child(&sub.name);

        if !sub.repeats {
            if let Some(index) = key.index
                && index > 0
            {
                return Err(NavError::IndexOutOfRange {
                    key: sub.name.clone(),
                    index,
                    len: 1,
                });
            }
            let path = self.path.join(ChildKey::new(&sub.name));
            return Ok(self.derive(node, path, AdaptorKind::Section(sub.section)));
        }

        let index = key.index.unwrap_or(0);
        let (node, len) = match raw {
            Some(Value::Array(items)) => (node.child(&index.to_string()), items.len()),
            None | Some(Value::Null) => (node, 0),
            // a lone object where a list is declared counts as one element
            Some(_) => (node, 1),
        };
        if index >= len {
            return Err(NavError::IndexOutOfRange {
                key: sub.name.clone(),
                index,
                len,
            });
        }
        let path = self.path.join(ChildKey::indexed(&sub.name, index));
        Ok(self.derive(node, path, AdaptorKind::Section(sub.section)))
    }

    fn quantity_child(&self, prop: PropertyRef, quantity: &QuantityDef) -> Result<Adaptor, NavError> {
        let node = self.node.child(&quantity.name);
        let path = self.path.join(ChildKey::new(&quantity.name));

        if let Some(target) = quantity.reference_target()
            && !node.get().is_null()
        {
            return Ok(match self.resolve_reference(node.get(), target) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!("{}: {err}", path);
                    self.derive(node, path, AdaptorKind::Dangling(prop))
                }
            });
        }
        Ok(self.derive(node, path, AdaptorKind::Quantity(prop)))
    }

    /// Adaptor over an element of a repeating sub-section that was fetched
    /// separately from the document.
    pub fn fetched_item(
        &self,
        name: &str,
        index: usize,
        value: Arc<Value>,
    ) -> Result<Adaptor, NavError> {
        let AdaptorKind::Section(section) = self.kind else {
            return Err(NavError::NotASection(self.title()));
        };
        let registry = self.archive.registry();
        match registry
            .property_ref(section, name)
            .map(|p| registry.property(p))
        {
            Some(Property::SubSection(sub)) if sub.repeats => {
                let node = NodeHandle {
                    root: value,
                    pointer: String::new(),
                };
                let path = self.path.join(ChildKey::indexed(name, index));
                Ok(self.derive(node, path, AdaptorKind::Section(sub.section)))
            }
            Some(_) => Err(NavError::InvalidKey(format!("{name}:{index}"))),
            None => Err(NavError::UnknownProperty {
                section: registry.section(section).name.clone(),
                key: name.to_string(),
            }),
        }
    }

    /// Dereference a data-level reference against the whole document.
    ///
    /// The reference is a path such as `/run/0/system/1` and must lead,
    /// through sub-sections only, to a present section governed by `target`.
    /// The result is a child of `self` for navigation purposes.
    pub fn resolve_reference(&self, reference: &Value, target: SectionId) -> Result<Adaptor, NavError> {
        let dangling = || NavError::DanglingDataReference {
            reference: match reference {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };
        let path = reference
            .as_str()
            .and_then(ArchivePath::from_reference)
            .ok_or_else(dangling)?;

        let registry = self.archive.registry();
        let mut current = Adaptor::root(self.archive.clone());
        for key in path.keys() {
            let AdaptorKind::Section(section) = current.kind else {
                return Err(dangling());
            };
            let Some(Property::SubSection(sub)) = registry
                .property_ref(section, &key.name)
                .map(|p| registry.property(p))
            else {
                return Err(dangling());
            };
            current = current
                .sub_section_child(sub, key)
                .map_err(|_| dangling())?;
        }

        match current.kind {
            AdaptorKind::Section(found)
                if registry.is_a(found, target) && !current.value().is_null() =>
            {
                debug!("{} -> {}", self.path, current.path);
                Ok(Adaptor {
                    id: AdaptorId::next(),
                    parent: Some(self.id),
                    ..current
                })
            }
            _ => Err(dangling()),
        }
    }

    fn derive(&self, node: NodeHandle, path: ArchivePath, kind: AdaptorKind) -> Adaptor {
        let kind = match kind {
            AdaptorKind::Section(declared) => {
                AdaptorKind::Section(self.archive.concrete_section(declared, node.get()))
            }
            other => other,
        };
        Adaptor {
            id: AdaptorId::next(),
            parent: Some(self.id),
            archive: self.archive.clone(),
            node,
            path,
            kind,
        }
    }

    /// Repeating sub-sections present in this section, with their lengths.
    pub fn repeating_children(&self) -> Vec<(String, usize)> {
        let AdaptorKind::Section(section) = self.kind else {
            return Vec::new();
        };
        let value = self.value();
        self.archive
            .registry()
            .properties_of(section)
            .filter_map(|(name, def)| match (def, value.get(name)) {
                (Definition::SubSection(sub), Some(Value::Array(items))) if sub.repeats => {
                    Some((name.to_string(), items.len()))
                }
                _ => None,
            })
            .collect()
    }

    /// Short display form of this node.
    pub fn preview(&self, units: &UnitContext) -> Result<String, UnitError> {
        match self.kind {
            AdaptorKind::Section(id) => Ok(self.archive.registry().section(id).name.clone()),
            AdaptorKind::Quantity(p) => match self.archive.registry().property(p) {
                Property::Quantity(q) => quantity_preview(q, self.value(), units),
                Property::SubSection(sub) => Ok(sub.name.clone()),
            },
            AdaptorKind::Dangling(_) => Ok(DANGLING_REFERENCE.to_string()),
        }
    }

    /// [`Adaptor::preview`], with failures shown as the unavailable marker.
    pub fn preview_or_unavailable(&self, units: &UnitContext) -> String {
        self.preview(units)
            .unwrap_or_else(|_| UNAVAILABLE.to_string())
    }

    /// Describe this node for the presentation layer.
    ///
    /// Pure: the result depends only on the data node, its definition and
    /// the arguments.
    pub fn render(&self, flags: &ViewFlags, units: &UnitContext) -> RenderNode {
        let meta = flags.show_meta.then(|| meta_info(self.definition()));
        let mut node = RenderNode {
            kind: RenderKind::Section,
            title: self.title(),
            path: self.path.to_string(),
            preview: String::new(),
            value: None,
            children: Vec::new(),
            lists: Vec::new(),
            meta,
            error: None,
        };

        match self.kind {
            AdaptorKind::Section(section) => {
                node.preview = self.archive.registry().section(section).name.clone();
                node.children = self.section_children(section, flags, units);
            }
            AdaptorKind::Quantity(p) => {
                node.kind = match self.archive.registry().property(p) {
                    Property::Quantity(q) if q.reference_target().is_some() => {
                        RenderKind::Reference
                    }
                    _ => RenderKind::Quantity,
                };
                node.value = Some(self.value().clone());
                match self.preview(units) {
                    Ok(preview) => node.preview = preview,
                    Err(err) => {
                        node.kind = RenderKind::Unavailable;
                        node.preview = UNAVAILABLE.to_string();
                        node.error = Some(err.to_string());
                    }
                }
            }
            AdaptorKind::Dangling(_) => {
                node.kind = RenderKind::Reference;
                node.preview = DANGLING_REFERENCE.to_string();
                node.value = Some(self.value().clone());
            }
        }
        node
    }

    fn section_children(
        &self,
        section: SectionId,
        flags: &ViewFlags,
        units: &UnitContext,
    ) -> Vec<ChildEntry> {
        let value = self.value();
        let mut children = Vec::new();
        for (name, def) in self.archive.registry().properties_of(section) {
            if !flags.shows(name) {
                continue;
            }
            let raw = value.get(name).filter(|v| is_present(v));
            if raw.is_none() && !flags.show_all_defined {
                continue;
            }
            let mut entry = ChildEntry {
                key: name.to_string(),
                label: name.to_string(),
                kind: RenderKind::Section,
                preview: None,
                disabled: raw.is_none(),
                count: None,
            };
            match def {
                Definition::SubSection(sub) if sub.repeats => {
                    entry.kind = RenderKind::List;
                    entry.count = Some(match raw {
                        Some(Value::Array(items)) => items.len(),
                        Some(_) => 1,
                        None => 0,
                    });
                }
                Definition::SubSection(_) => {}
                Definition::Quantity(q) => {
                    entry.kind = if q.reference_target().is_some() {
                        RenderKind::Reference
                    } else {
                        RenderKind::Quantity
                    };
                    entry.preview = raw.map(|raw| self.child_preview(q, raw, units));
                }
                Definition::Section(_) => continue,
            }
            children.push(entry);
        }
        children
    }

    fn child_preview(&self, q: &QuantityDef, raw: &Value, units: &UnitContext) -> String {
        if let Some(target) = q.reference_target() {
            return match self.resolve_reference(raw, target) {
                Ok(resolved) => resolved.path.to_reference(),
                Err(_) => DANGLING_REFERENCE.to_string(),
            };
        }
        quantity_preview(q, raw, units).unwrap_or_else(|err| {
            debug!("{}/{}: {err}", self.path, q.name);
            UNAVAILABLE.to_string()
        })
    }
}

/// Empty containers count as absent data.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Type-dependent summary of a quantity value.
pub fn quantity_preview(
    q: &QuantityDef,
    value: &Value,
    units: &UnitContext,
) -> Result<String, UnitError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Array(_) => {
            let dims = data_dims(value);
            let dims: Vec<String> = dims.iter().map(ToString::to_string).collect();
            Ok(format!(
                "{} ({})",
                ShapeKind::of_rank(dims.len()).as_str(),
                dims.join("×")
            ))
        }
        Value::Number(n) => {
            let f = n
                .as_f64()
                .ok_or_else(|| UnitError::NotNumeric(n.to_string()))?;
            match &q.unit {
                Some(unit) => {
                    let (converted, display) = units.convert(f, unit)?;
                    Ok(format!("{} {}", format_number(converted), display))
                }
                None if n.is_i64() || n.is_u64() => Ok(n.to_string()),
                None => Ok(format_number(f)),
            }
        }
        other if q.unit.is_some() => Err(UnitError::NotNumeric(other.to_string())),
        Value::String(s) => Ok(truncate(s, MAX_TEXT_PREVIEW)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Object(map) => Ok(format!("{{{} fields}}", map.len())),
    }
}

/// Dimensions of nested arrays, following first elements.
fn data_dims(value: &Value) -> Vec<usize> {
    let mut dims = Vec::new();
    let mut current = value;
    while let Value::Array(items) = current {
        dims.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    dims
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push('…');
    out
}

fn meta_info(def: Definition<'_>) -> MetaInfo {
    let mut meta = MetaInfo {
        definition: def.name().to_string(),
        kind: def.kind().to_string(),
        data_type: None,
        shape: None,
        unit: None,
        description: def.description().to_string(),
    };
    if let Definition::Quantity(q) = def {
        meta.data_type = Some(q.data_type.name());
        meta.shape = Some(q.shape.to_string());
        meta.unit = q.unit.clone();
    }
    meta
}
