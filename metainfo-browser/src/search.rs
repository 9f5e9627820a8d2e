//! Jump-to index over the data present in a document.
//!
//! Only properties that carry data are indexed: the index answers "where is
//! there something called `energy`", not "where could there be".

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::{
    adaptor::is_present,
    data::{ArchivePath, ChildKey, Definition, PropertyRef, SchemaRegistry, SectionId},
};

/// One entry of the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOption {
    /// Label shown to the user, `energy` or `energy (dos)`.
    pub label: String,
    /// The property name.
    pub name: String,
    /// First location with data for this property.
    pub path: ArchivePath,
    /// Name of the section declaring the property.
    pub section: String,
    /// `quantity` or `sub_section`.
    pub kind: &'static str,
    /// Key of the enclosing node, used for disambiguation.
    parent: String,
}

impl SearchOption {
    /// The `/`-separated navigation path, `run:0/calc:0/energy`.
    pub fn target(&self) -> String {
        self.path.to_string()
    }
}

struct IndexBuilder<'r> {
    registry: &'r SchemaRegistry,
    options: Vec<SearchOption>,
    /// `(enclosing sub-section, property name)` pairs already indexed.
    seen: HashSet<(Option<PropertyRef>, String)>,
    /// Name to the index of its first option, and whether that option has
    /// been decorated.
    first: HashMap<String, (usize, bool)>,
}

impl IndexBuilder<'_> {
    fn visit(&mut self, declared: SectionId, value: &Value, via: Option<PropertyRef>, path: &ArchivePath) {
        let registry = self.registry;
        let section = registry.tagged_section(declared, value);
        let parent = match path.last() {
            Some(key) => key.name.clone(),
            None => registry.section(section).name.clone(),
        };
        for (name, def) in registry.properties_of(section) {
            let Some(raw) = value.get(name).filter(|v| is_present(v)) else {
                continue;
            };
            let here = path.join(ChildKey::new(name));
            let kind = match def {
                Definition::SubSection(_) => "sub_section",
                _ => "quantity",
            };
            if self.seen.insert((via, name.to_string())) {
                self.add(SearchOption {
                    label: name.to_string(),
                    name: name.to_string(),
                    path: here,
                    section: registry.section(section).name.clone(),
                    kind,
                    parent: parent.clone(),
                });
            }

            let Definition::SubSection(sub) = def else {
                continue;
            };
            let prop = registry.property_ref(section, name);
            match raw {
                Value::Array(items) if sub.repeats => {
                    for (i, item) in items.iter().enumerate() {
                        let at = path.join(ChildKey::indexed(name, i));
                        self.visit(sub.section, item, prop, &at);
                    }
                }
                item if sub.repeats => {
                    let at = path.join(ChildKey::indexed(name, 0));
                    self.visit(sub.section, item, prop, &at);
                }
                item => {
                    let at = path.join(ChildKey::new(name));
                    self.visit(sub.section, item, prop, &at);
                }
            }
        }
    }

    /// Append an option. A repeated name decorates itself and, the first
    /// time, the option that first used the name.
    fn add(&mut self, mut option: SearchOption) {
        let index = self.options.len();
        match self.first.get_mut(&option.name) {
            None => {
                self.first.insert(option.name.clone(), (index, false));
            }
            Some((first, decorated)) => {
                if !*decorated {
                    let first = &mut self.options[*first];
                    first.label = format!("{} ({})", first.name, first.parent);
                    *decorated = true;
                }
                option.label = format!("{} ({})", option.name, option.parent);
            }
        }
        self.options.push(option);
    }
}

/// Index every property with data under `root`, depth first in declaration
/// order.
pub fn build_index(registry: &SchemaRegistry, root: &Value, section: SectionId) -> Vec<SearchOption> {
    let mut builder = IndexBuilder {
        registry,
        options: Vec::new(),
        seen: HashSet::new(),
        first: HashMap::new(),
    };
    builder.visit(section, root, None, &ArchivePath::root());
    info!("search index built with {} entries", builder.options.len());
    builder.options
}

/// Options whose label contains `query`, ignoring case.
pub fn filter<'a>(options: &'a [SearchOption], query: &str) -> Vec<&'a SearchOption> {
    let query = query.to_lowercase();
    options
        .iter()
        .filter(|o| o.label.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_json(&json!({
            "root": "Root",
            "sections": [
                {"name": "Root", "sub_sections": [
                    {"name": "dos", "section": "Dos"},
                    {"name": "bs", "section": "Bs"},
                    {"name": "calc", "section": "Calc", "repeats": true}
                ]},
                {"name": "Dos", "quantities": [{"name": "energy", "type": "float64"}]},
                {"name": "Bs", "quantities": [
                    {"name": "energy", "type": "float64"},
                    {"name": "kpoints", "type": "float64"}
                ]},
                {"name": "Calc", "quantities": [
                    {"name": "energy", "type": "float64"},
                    {"name": "label", "type": "str"}
                ]}
            ]
        }))
        .unwrap()
    }

    fn labels(options: &[SearchOption]) -> Vec<&str> {
        options.iter().map(|o| o.label.as_str()).collect()
    }

    #[test]
    fn test_duplicate_names_are_decorated() {
        let registry = registry();
        let doc = json!({"dos": {"energy": [1.0]}, "bs": {"energy": [2.0]}});
        let options = build_index(&registry, &doc, registry.root());
        assert_eq!(labels(&options), ["dos", "energy (dos)", "bs", "energy (bs)"]);
        assert!(!options.iter().any(|o| o.label == "energy"));
    }

    #[test]
    fn test_single_occurrence_stays_plain() {
        let registry = registry();
        let doc = json!({"dos": {"energy": [1.0]}, "bs": {"kpoints": [0.0]}});
        let options = build_index(&registry, &doc, registry.root());
        assert_eq!(labels(&options), ["dos", "energy", "bs", "kpoints"]);
        assert_eq!(options[1].target(), "dos/energy");
    }

    #[test]
    fn test_only_present_data_is_indexed() {
        let registry = registry();
        let doc = json!({"dos": {}, "bs": {"energy": null, "kpoints": []}, "calc": []});
        assert!(build_index(&registry, &doc, registry.root()).is_empty());
    }

    #[test]
    fn test_list_elements_index_once() {
        let registry = registry();
        let doc = json!({"calc": [{"energy": 1.0}, {"energy": 2.0, "label": "b"}]});
        let options = build_index(&registry, &doc, registry.root());
        assert_eq!(labels(&options), ["calc", "energy", "label"]);
        assert_eq!(options[1].target(), "calc:0/energy");
        // first seen in the second element
        assert_eq!(options[2].target(), "calc:1/label");
        assert_eq!(options[2].section, "Calc");
        assert_eq!(options[0].kind, "sub_section");
    }

    #[test]
    fn test_third_occurrence() {
        let registry = registry();
        let doc = json!({
            "dos": {"energy": [1.0]},
            "bs": {"energy": [2.0]},
            "calc": [{"energy": 3.0}]
        });
        let options = build_index(&registry, &doc, registry.root());
        assert_eq!(
            labels(&options),
            ["dos", "energy (dos)", "bs", "energy (bs)", "calc", "energy (calc)"]
        );
    }

    #[test]
    fn test_filter() {
        let registry = registry();
        let doc = json!({"dos": {"energy": [1.0]}, "bs": {"energy": [2.0]}});
        let options = build_index(&registry, &doc, registry.root());
        let hits = filter(&options, "ENERGY (b");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target(), "bs/energy");
        assert_eq!(filter(&options, "").len(), 4);
    }
}
