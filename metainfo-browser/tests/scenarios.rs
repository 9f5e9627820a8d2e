use std::sync::Arc;

use metainfo_browser::{
    Adaptor, ArchiveContext, NavError, Navigator, SchemaError, SchemaRegistry, Value, ViewFlags,
    config::PaginationConfig,
    pager::{Direction, ListPager},
    search::build_index,
    source::{DocumentSource, InMemorySource},
    units::UnitContext,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn abx_registry() -> Arc<SchemaRegistry> {
    let registry = SchemaRegistry::from_json(&json!({
        "root": "Root",
        "sections": [
            {"name": "Root", "sub_sections": [{"name": "a", "section": "A"}]},
            {"name": "A", "sub_sections": [{"name": "b", "section": "B", "repeats": true}]},
            {"name": "B", "quantities": [{"name": "x", "type": "int"}]}
        ]
    }))
    .unwrap();
    Arc::new(registry)
}

fn navigator(document: Value) -> Navigator {
    let archive = ArchiveContext::new(abx_registry(), Arc::new(document));
    Navigator::new(Adaptor::root(archive), PaginationConfig::default())
}

#[test]
fn test_push_then_child_at_reads_the_selected_element() {
    let mut nav = navigator(json!({"a": {"b": [{"x": 1}, {"x": 2}, {"x": 3}]}}));
    nav.push("a").unwrap();
    nav.push("b:1").unwrap();
    let x = nav.focus().adaptor().child_at("x").unwrap();
    assert!(!x.is_section());
    assert_eq!(x.value(), &json!(2));
}

#[test]
fn test_unknown_property_leaves_lanes_unchanged() {
    let mut nav = navigator(json!({"a": {"b": [{"x": 1}]}}));
    nav.push("a").unwrap();
    let before: Vec<_> = nav.lanes().iter().map(|l| l.id()).collect();

    let err = nav.focus().adaptor().child_at("nonexistent").unwrap_err();
    assert!(matches!(err, NavError::UnknownProperty { .. }));
    assert!(matches!(
        nav.push("nonexistent"),
        Err(NavError::UnknownProperty { .. })
    ));

    let after: Vec<_> = nav.lanes().iter().map(|l| l.id()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_lane_parent_chain_holds_after_any_sequence() {
    let items: Vec<Value> = (0..5).map(|i| json!({"x": i})).collect();
    let mut nav = navigator(json!({"a": {"b": items}}));
    let steps: [&dyn Fn(&mut Navigator); 8] = [
        &|n| {
            let _ = n.push("a");
        },
        &|n| {
            let _ = n.push("b:3");
        },
        &|n| {
            let _ = n.push("x");
        },
        &|n| {
            let _ = n.pop();
        },
        &|n| {
            let _ = n.push("b:9");
        },
        &|n| n.reset(),
        &|n| {
            let _ = n.navigate("a/b:4/x");
        },
        &|n| {
            let _ = n.select(1, "b:0");
        },
    ];
    for round in 0..3 {
        for (i, step) in steps.iter().enumerate() {
            if (i + round) % 3 == 2 {
                continue;
            }
            step(&mut nav);
            assert!(nav.check_invariant(), "round {round} step {i}");
            assert!(nav.len() >= 1);
        }
    }
}

#[test]
fn test_long_list_initial_and_expanded_windows() {
    let mut pager = ListPager::new(30, 10, 5, 10);
    let visible: Vec<usize> = pager.visible().collect();
    let expected: Vec<usize> = (0..10).chain(25..30).collect();
    assert_eq!(visible, expected);

    pager.expand(Direction::Down);
    let visible: Vec<usize> = pager.visible().collect();
    let expected: Vec<usize> = (0..20).chain(25..30).collect();
    assert_eq!(visible, expected);
    assert!(pager.has_controls());
}

#[test]
fn test_search_decorates_shared_leaf_names() {
    let registry = SchemaRegistry::from_json(&json!({
        "root": "Root",
        "sections": [
            {"name": "Root", "sub_sections": [
                {"name": "dos", "section": "Dos"},
                {"name": "bs", "section": "BandStructure"}
            ]},
            {"name": "Dos", "quantities": [{"name": "energy", "type": "float64", "unit": "joule"}]},
            {"name": "BandStructure", "quantities": [{"name": "energy", "type": "float64", "unit": "joule"}]}
        ]
    }))
    .unwrap();
    let doc = json!({"dos": {"energy": [0.1, 0.2]}, "bs": {"energy": [0.3]}});
    let labels: Vec<String> = build_index(&registry, &doc, registry.root())
        .into_iter()
        .filter(|o| o.name == "energy")
        .map(|o| o.label)
        .collect();
    assert_eq!(labels, ["energy (dos)", "energy (bs)"]);
}

#[test]
fn test_unresolved_schema_reference_aborts_load() {
    let err = SchemaRegistry::from_json(&json!({
        "root": "Root",
        "sections": [
            {"name": "Root", "sub_sections": [{"name": "a", "section": "Missing"}]}
        ]
    }))
    .unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvedReference { .. }));
}

#[test]
fn test_child_at_is_deterministic() {
    let archive = ArchiveContext::new(
        abx_registry(),
        Arc::new(json!({"a": {"b": [{"x": 1}, {"x": 2}]}})),
    );
    let a = Adaptor::root(archive).child_at("a").unwrap();
    let flags = ViewFlags {
        show_all_defined: true,
        show_meta: true,
        ..Default::default()
    };
    let units = UnitContext::default();
    for key in ["b", "b:1"] {
        let first = a.child_at(key).unwrap().render(&flags, &units);
        let second = a.child_at(key).unwrap().render(&flags, &units);
        assert_eq!(first, second);
    }
}

#[test]
fn test_remote_pages_feed_the_navigator() {
    let full: Vec<Value> = (0..40).map(|i| json!({"x": i})).collect();
    let source = InMemorySource::new(json!({"a": {"b": full}}));
    // the browsed document carries only the first 12 elements
    let mut nav = navigator(json!({"a": {"b": (0..12).map(|i| json!({"x": i})).collect::<Vec<_>>()}}));
    nav.push("a").unwrap();

    let request = nav.page_request(1, "b", 12, 28).unwrap();
    let page = tokio_test::block_on(source.fetch_page(&request)).unwrap();
    assert!(nav.apply_page(&request, page));

    nav.push("b:39").unwrap();
    let x = nav.focus().adaptor().child_at("x").unwrap();
    assert_eq!(x.value(), &json!(39));
}

fn tree_registry() -> Arc<SchemaRegistry> {
    let registry = SchemaRegistry::from_json(&json!({
        "root": "Node",
        "sections": [{"name": "Node",
            "quantities": [{"name": "label", "type": "str"}],
            "sub_sections": [{"name": "child", "section": "Node", "repeats": true}]
        }]
    }))
    .unwrap();
    Arc::new(registry)
}

fn tree() -> Value {
    json!({"label": "root", "child": [
        {"label": "one", "child": [
            {"label": "two", "child": [{"label": "three"}]}
        ]}
    ]})
}

#[test]
fn test_recursive_schema_follows_data_depth() {
    let registry = tree_registry();
    let archive = ArchiveContext::new(registry.clone(), Arc::new(tree()));
    let mut nav = Navigator::new(Adaptor::root(archive), PaginationConfig::default());

    nav.navigate("child:0/child:0/child:0").unwrap();
    assert_eq!(nav.len(), 4);
    assert_eq!(nav.path(), "child:0/child:0/child:0");
    assert!(nav.check_invariant());
    let label = nav.focus().adaptor().child_at("label").unwrap();
    assert_eq!(label.value(), &json!("three"));
    // the deepest node has no children in the data
    assert!(matches!(
        nav.push("child:0"),
        Err(NavError::IndexOutOfRange { len: 0, .. })
    ));

    let options = build_index(&registry, &tree(), registry.root());
    let found: Vec<(&str, String)> = options
        .iter()
        .map(|o| (o.label.as_str(), o.target()))
        .collect();
    assert_eq!(
        found,
        [
            ("label (Node)", "label".to_string()),
            ("child (Node)", "child".to_string()),
            ("label (child)", "child:0/label".to_string()),
            ("child (child)", "child:0/child".to_string()),
        ]
    );
}
