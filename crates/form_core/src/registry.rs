//! Namespaced registry of renderable implementations
//!
//! Maps logical names (e.g. `"input"`, `"object"`) to host-provided
//! implementation handles. Three separate namespaces are kept: components,
//! fields and base widgets.
//!
//! Registration is first-write-wins: a later registration under an existing
//! key is rejected with a warning and the original entry is kept.

use std::collections::BTreeMap;

/// Default base-widget namespace prefix
pub const DEFAULT_NAMESPACE: &str = "bk";

/// Result of resolving a base widget name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetRef<C> {
    /// An explicitly registered implementation
    Registered(C),
    /// A conventional `<namespace>-<name>` identifier for the host toolkit
    Conventional(String),
}

impl<C> WidgetRef<C> {
    /// Whether this came from an explicit registration
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

/// Central registry of components, fields and base widgets
#[derive(Debug, Clone)]
pub struct Registry<C = String> {
    namespace: String,
    components: BTreeMap<String, C>,
    fields: BTreeMap<String, C>,
    base_widgets: BTreeMap<String, C>,
}

impl<C: Clone> Registry<C> {
    /// Create an empty registry with the default namespace
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Create an empty registry with a custom namespace prefix
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            components: BTreeMap::new(),
            fields: BTreeMap::new(),
            base_widgets: BTreeMap::new(),
        }
    }

    /// The namespace prefix used for conventional widget names
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Merge a name -> component mapping
    pub fn add_components_map<K, M>(&mut self, map: M) -> usize
    where
        K: Into<String>,
        M: IntoIterator<Item = (K, C)>,
    {
        merge_first_wins(&mut self.components, map, "component")
    }

    /// Merge a name -> field mapping
    pub fn add_fields_map<K, M>(&mut self, map: M) -> usize
    where
        K: Into<String>,
        M: IntoIterator<Item = (K, C)>,
    {
        merge_first_wins(&mut self.fields, map, "field")
    }

    /// Merge a name -> base widget mapping
    pub fn add_base_widgets<K, M>(&mut self, map: M) -> usize
    where
        K: Into<String>,
        M: IntoIterator<Item = (K, C)>,
    {
        merge_first_wins(&mut self.base_widgets, map, "base widget")
    }

    /// Get a registered component
    pub fn get_component(&self, name: &str) -> Option<&C> {
        self.components.get(name)
    }

    /// Get a registered field
    pub fn get_field(&self, name: &str) -> Option<&C> {
        self.fields.get(name)
    }

    /// Check if a component is registered
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Check if a field is registered
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Check if a base widget is registered
    pub fn has_base_widget(&self, name: &str) -> bool {
        self.base_widgets.contains_key(name)
    }

    /// Resolve a base widget.
    ///
    /// Registered names return their implementation. Anything else falls
    /// back to the host toolkit's naming scheme, `<namespace>-<name>`, unless
    /// the name already carries the prefix.
    pub fn get_base_widget(&self, name: &str) -> WidgetRef<C> {
        if let Some(widget) = self.base_widgets.get(name) {
            return WidgetRef::Registered(widget.clone());
        }
        let prefix = format!("{}-", self.namespace);
        if name.starts_with(&prefix) {
            WidgetRef::Conventional(name.to_string())
        } else {
            WidgetRef::Conventional(format!("{prefix}{name}"))
        }
    }
}

impl<C: Clone> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_first_wins<C, K, M>(target: &mut BTreeMap<String, C>, map: M, kind: &str) -> usize
where
    K: Into<String>,
    M: IntoIterator<Item = (K, C)>,
{
    let mut added = 0;
    for (key, value) in map {
        let key = key.into();
        if target.contains_key(&key) {
            log::warn!("{} '{}' is already registered, ignoring", kind, key);
            continue;
        }
        target.insert(key, value);
        added += 1;
    }
    added
}
