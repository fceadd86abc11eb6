//! Integration tests for form_core

use form_core::path::{path_value, set_path_value};
use form_core::*;
use serde_json::json;

#[test]
fn test_path_round_trip() {
    let base = json!({"a": {"b": 1}, "list": [{"x": 1}]});
    let cases = [
        ("a.b", json!(2)),
        ("a.c.d", json!("deep")),
        ("list.0.x", json!([1, 2])),
        ("list.3", json!({"k": null})),
        ("fresh", json!(false)),
    ];

    for (path, value) in cases {
        let updated = set_path_value(&base, path, value.clone());
        assert_eq!(path_value(&updated, path, 0), Some(&value), "path {path}");
    }
}

#[test]
fn test_index_contiguity_under_mutation() {
    let mut tree: WidgetTree<u32> = WidgetTree::new();
    tree.add_widget_node("", 0, None);

    let mut next = 1u32;
    let ops: [(bool, usize); 12] = [
        (true, 0),
        (true, 0),
        (true, 1),
        (true, 5),
        (false, 1),
        (true, 2),
        (true, 0),
        (false, 0),
        (false, 2),
        (true, 1),
        (true, 3),
        (false, 1),
    ];

    for (insert, at) in ops {
        if insert {
            let path = format!("f{next}");
            tree.add_widget_node(&path, next, Some(at));
            next += 1;
        } else {
            let children = tree.root().unwrap().children.clone();
            if let Some(victim) = children.get(at.min(children.len().saturating_sub(1))) {
                let instance = tree.get(victim).unwrap().instance;
                tree.remove_widget_node(victim, &instance);
            }
        }

        for (i, child) in tree.children_of("").iter().enumerate() {
            assert_eq!(child.index, i);
        }
    }
}

#[test]
fn test_batch_append_and_remove() {
    let mut tree: WidgetTree<&str> = WidgetTree::new();
    tree.add_widget_node("", "root", None);
    tree.add_widget_node("a", "a", None);
    tree.add_widget_node("d", "d", None);

    // Children inserted structurally must still be known nodes to be renumbered
    tree.add_widget_node("b", "b", Some(1));
    tree.add_widget_node("c", "c", Some(2));
    assert_eq!(tree.root().unwrap().children, vec!["a", "b", "c", "d"]);

    tree.remove_child("", &["a".to_string(), "c".to_string()]);
    let order: Vec<(&str, usize)> = tree
        .children_of("")
        .iter()
        .map(|n| (n.id.as_str(), n.index))
        .collect();
    assert_eq!(order, vec![("b", 0), ("d", 1)]);
}

#[test]
fn test_registry_with_config_namespace() {
    let config = FormConfig::default().with_namespace("tea");
    let registry: Registry = Registry::with_namespace(config.namespace.clone());
    assert_eq!(
        registry.get_base_widget("radio"),
        WidgetRef::Conventional("tea-radio".to_string())
    );
}
