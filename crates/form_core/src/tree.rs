//! Widget tree - live field handles keyed by data path
//!
//! Nodes live in a flat arena keyed by path. A node refers to its parent and
//! children by path only, so there are no ownership cycles; the arena owns
//! every node and lookups always go through it.
//!
//! Invariant: after every structural change, `children[i]`'s node has
//! `index == i`.

use std::collections::HashMap;

use crate::path;

/// One live field or group instance
#[derive(Debug, Clone)]
pub struct WidgetNode<I> {
    /// Data path (unique within the tree)
    pub id: String,
    /// Host-defined instance handle
    pub instance: I,
    /// Parent path, `None` for the root
    pub parent: Option<String>,
    /// Position among siblings
    pub index: usize,
    /// Ordered child paths
    pub children: Vec<String>,
}

impl<I> WidgetNode<I> {
    fn new(id: impl Into<String>, instance: I, parent: Option<String>) -> Self {
        Self {
            id: id.into(),
            instance,
            parent,
            index: 0,
            children: Vec::new(),
        }
    }

    /// Whether this node is the root
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena of widget nodes rooted at the empty path
#[derive(Debug, Clone)]
pub struct WidgetTree<I> {
    nodes: HashMap<String, WidgetNode<I>>,
}

impl<I: Clone + PartialEq> WidgetTree<I> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Register a node.
    ///
    /// The parent must already be registered; otherwise the node is dropped
    /// with a warning. `index` positions the node among its siblings and
    /// defaults to the end.
    pub fn add_widget_node(&mut self, path: &str, instance: I, index: Option<usize>) -> bool {
        if self.nodes.contains_key(path) {
            log::warn!("widget node '{}' is already registered, remove it first", path);
            return false;
        }

        if path.is_empty() {
            self.nodes
                .insert(String::new(), WidgetNode::new(path::ROOT, instance, None));
            return true;
        }

        let parent = path::parent_path(path).to_string();
        if !self.nodes.contains_key(&parent) {
            log::warn!(
                "parent '{}' of widget node '{}' is not registered, skipping",
                parent,
                path
            );
            return false;
        }

        self.nodes.insert(
            path.to_string(),
            WidgetNode::new(path, instance, Some(parent.clone())),
        );
        self.append_child(&parent, vec![path.to_string()], index);
        true
    }

    /// Remove the node at `path` if it still holds `instance`.
    ///
    /// A node that changed identity under the same path belongs to a newer
    /// mount; it is left in place, arena entry and parent link alike.
    pub fn remove_widget_node(&mut self, path: &str, instance: &I) -> bool {
        let matched = self
            .nodes
            .get(path)
            .map(|node| &node.instance == instance)
            .unwrap_or(false);
        if !matched {
            log::debug!("widget node '{}' changed identity before removal", path);
            return false;
        }

        if let Some(parent) = self.nodes.get(path).and_then(|n| n.parent.clone()) {
            self.remove_child(&parent, &[path.to_string()]);
        }
        self.nodes.remove(path);
        true
    }

    /// Insert `children` under `parent` starting at `offset` (default: end).
    ///
    /// Siblings at or after the offset are renumbered contiguously.
    pub fn append_child(&mut self, parent: &str, children: Vec<String>, offset: Option<usize>) {
        let Some(node) = self.nodes.get_mut(parent) else {
            log::warn!("append_child: parent '{}' is not registered", parent);
            return;
        };

        let mut fresh: Vec<String> = Vec::with_capacity(children.len());
        for child in children {
            if node.children.contains(&child) || fresh.contains(&child) {
                log::warn!("append_child: '{}' is already a child of '{}'", child, parent);
            } else {
                fresh.push(child);
            }
        }
        if fresh.is_empty() {
            return;
        }

        let start = offset
            .unwrap_or(node.children.len())
            .min(node.children.len());
        node.children.splice(start..start, fresh);

        self.renumber(parent, start);
    }

    /// Remove `children` from `parent`, renumbering from the lowest removed index.
    pub fn remove_child(&mut self, parent: &str, children: &[String]) {
        let Some(node) = self.nodes.get_mut(parent) else {
            return;
        };

        let lowest = node
            .children
            .iter()
            .position(|c| children.contains(c));
        let Some(lowest) = lowest else {
            return;
        };

        node.children.retain(|c| !children.contains(c));
        self.renumber(parent, lowest);
    }

    fn renumber(&mut self, parent: &str, from: usize) {
        let children = match self.nodes.get(parent) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for (index, child) in children.iter().enumerate().skip(from) {
            if let Some(node) = self.nodes.get_mut(child) {
                node.index = index;
            }
        }
    }

    /// Look up a node
    pub fn get(&self, path: &str) -> Option<&WidgetNode<I>> {
        self.nodes.get(path)
    }

    /// The root node, if registered
    pub fn root(&self) -> Option<&WidgetNode<I>> {
        self.nodes.get(path::ROOT)
    }

    /// Child nodes of `path` in sibling order
    pub fn children_of(&self, path: &str) -> Vec<&WidgetNode<I>> {
        self.nodes
            .get(path)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|c| self.nodes.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ancestor chain of `path`, root first. Cost is O(depth).
    pub fn parents(&self, path: &str) -> Vec<&WidgetNode<I>> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(path).and_then(|n| n.parent.as_deref());
        while let Some(parent) = current {
            match self.nodes.get(parent) {
                Some(node) => {
                    chain.push(node);
                    current = node.parent.as_deref();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// All registered descendants of `path`, depth-first in sibling order
    pub fn descendants(&self, path: &str) -> Vec<&WidgetNode<I>> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = match self.nodes.get(path) {
            Some(node) => node.children.iter().rev().map(String::as_str).collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(next) {
                out.push(node);
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Whether `path` is registered
    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<I: Clone + PartialEq> Default for WidgetTree<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(tree: &WidgetTree<u32>, path: &str) -> Vec<usize> {
        tree.children_of(path).iter().map(|n| n.index).collect()
    }

    #[test]
    fn test_root_and_children() {
        let mut tree = WidgetTree::new();
        assert!(tree.add_widget_node("", 0u32, None));
        assert!(tree.add_widget_node("a", 1, None));
        assert!(tree.add_widget_node("b", 2, None));

        let root = tree.root().unwrap();
        assert!(root.is_root());
        assert_eq!(root.children, vec!["a", "b"]);
        assert_eq!(indices(&tree, ""), vec![0, 1]);
    }

    #[test]
    fn test_orphan_is_skipped() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        assert!(!tree.add_widget_node("a.b", 1, None));
        assert!(!tree.contains("a.b"));
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        assert!(tree.add_widget_node("a", 1, None));
        assert!(!tree.add_widget_node("a", 2, None));
        assert_eq!(tree.get("a").unwrap().instance, 1);
    }

    #[test]
    fn test_insert_at_offset_renumbers() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("c", 3, None);
        tree.add_widget_node("b", 2, Some(1));

        assert_eq!(tree.root().unwrap().children, vec!["a", "b", "c"]);
        assert_eq!(indices(&tree, ""), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_requires_matching_instance() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("b", 2, None);

        // Identity changed under the same path: tree untouched
        assert!(!tree.remove_widget_node("a", &99));
        assert_eq!(tree.get("a").unwrap().instance, 1);
        assert_eq!(tree.root().unwrap().children, vec!["a", "b"]);

        assert!(tree.remove_widget_node("b", &2));
        assert_eq!(tree.root().unwrap().children, vec!["a"]);
        assert!(!tree.contains("b"));
    }

    #[test]
    fn test_stale_remove_then_readd_keeps_indices() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("b", 2, None);

        assert!(!tree.remove_widget_node("a", &99));
        assert!(!tree.add_widget_node("a", 3, None));
        assert_eq!(tree.root().unwrap().children, vec!["a", "b"]);
        assert_eq!(indices(&tree, ""), vec![0, 1]);

        assert!(tree.remove_widget_node("a", &1));
        assert!(tree.add_widget_node("a", 3, None));
        assert_eq!(tree.root().unwrap().children, vec!["b", "a"]);
        assert_eq!(indices(&tree, ""), vec![0, 1]);
    }

    #[test]
    fn test_append_child_skips_listed_paths() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("b", 2, None);

        tree.append_child("", vec!["a".to_string(), "b".to_string()], Some(0));
        assert_eq!(tree.root().unwrap().children, vec!["a", "b"]);
        assert_eq!(indices(&tree, ""), vec![0, 1]);
    }

    #[test]
    fn test_remove_renumbers_from_lowest() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            tree.add_widget_node(name, i as u32 + 1, None);
        }
        tree.remove_child("", &["b".to_string(), "c".to_string()]);
        assert_eq!(tree.root().unwrap().children, vec!["a", "d"]);
        assert_eq!(indices(&tree, ""), vec![0, 1]);
    }

    #[test]
    fn test_parents_root_first() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("a.b", 2, None);
        tree.add_widget_node("a.b.c", 3, None);

        let chain: Vec<&str> = tree.parents("a.b.c").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(chain, vec!["", "a", "a.b"]);
        assert!(tree.parents("").is_empty());
    }

    #[test]
    fn test_descendants() {
        let mut tree = WidgetTree::new();
        tree.add_widget_node("", 0u32, None);
        tree.add_widget_node("a", 1, None);
        tree.add_widget_node("a.x", 2, None);
        tree.add_widget_node("b", 3, None);

        let ids: Vec<&str> = tree.descendants("").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a.x", "b"]);
    }
}
