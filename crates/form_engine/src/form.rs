//! The per-form context
//!
//! A `Form` owns everything one rendered form needs: its registry, widget
//! tree, reaction subscriptions, rules, field instances and data. Two forms
//! never share any of it.

use std::collections::HashMap;
use std::sync::Arc;

use form_core::path::{self, cur_path, parent_path, path_last_prop, path_value, set_path_value};
use form_core::{FormConfig, Registry, WidgetRef, WidgetTree};
use form_event::{DispatchGuard, EventKind, ReactionBus, MOUNTED, UNMOUNTED};
use form_layout::Layout;
use form_schema::{
    dependent_required, get_default_widget, get_group_wrap, get_schema_default_value,
    get_schema_field, get_schema_type, get_ui_options, is_custom_array_widget, is_multi_select,
    is_present, is_required, is_tuple_array, ordered_properties, remote_config,
    resolve_default_datasource, RemoteConfig, SchemaResolver, SchemaType,
};
use form_script::{Evaluator, Interpreter};
use serde_json::{Map, Value};

use crate::context::{self, drain, Effect, EffectLog, Scope};
use crate::datasource::{DataSourceLoader, RequestConfig, ResponseParse};
use crate::error::{FormError, FormResult, RuleError};
use crate::instance::{FieldId, FieldInstance};
use crate::reaction::{parse_reactions, Operations, Reaction, ReactionHandler};
use crate::rules::{parse_rule_refs, pattern_text, Rule, RuleInput, RuleRef, RuleSet, Validator};
use crate::validator::{JsonSchemaValidator, SchemaValidator};

static NULL: Value = Value::Null;

/// Keywords describing children; dropped when the children validate themselves
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "properties",
    "required",
    "dependencies",
    "additionalProperties",
    "patternProperties",
    "items",
    "additionalItems",
];

/// One form instance
pub struct Form {
    config: FormConfig,
    resolver: SchemaResolver,
    /// Resolved root schema
    schema: Value,
    registry: Registry,
    tree: WidgetTree<FieldId>,
    /// Form items keyed by path
    fields: HashMap<String, FieldInstance>,
    bus: ReactionBus<ReactionHandler>,
    guard: DispatchGuard,
    rules: RuleSet,
    data: Value,
    /// Host supplied `$context`
    context: Value,
    validator: Box<dyn SchemaValidator>,
    /// Builtins shared by every evaluation
    interpreter: Interpreter,
    /// Paths waiting for a datasource request, in queue order
    pending_loads: Vec<String>,
    parsers: HashMap<String, ResponseParse>,
    next_id: u64,
}

impl Form {
    /// Create a form over `schema`.
    ///
    /// A `null` `data` is replaced with the schema's default value.
    pub fn new(schema: Value, data: Value, config: FormConfig) -> FormResult<Self> {
        let resolver = SchemaResolver::new(schema);
        let resolved = resolver.resolve_root()?;
        let data = if data.is_null() {
            get_schema_default_value(&resolved).unwrap_or(Value::Null)
        } else {
            data
        };

        Ok(Self {
            registry: Registry::with_namespace(config.namespace.clone()),
            guard: DispatchGuard::new(config.max_reaction_depth),
            config,
            resolver,
            schema: resolved,
            tree: WidgetTree::new(),
            fields: HashMap::new(),
            bus: ReactionBus::new(),
            rules: RuleSet::new(),
            data,
            context: Value::Null,
            validator: Box::new(JsonSchemaValidator::new()),
            interpreter: Interpreter::new(),
            pending_loads: Vec::new(),
            parsers: HashMap::new(),
            next_id: 1,
        })
    }

    /// Use a different schema validator
    pub fn with_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Use a prepared registry
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the value exposed to expressions as `$context`
    pub fn set_context(&mut self, context: Value) {
        self.context = context;
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Resolved root schema
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Root data
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Value at `path`
    pub fn value(&self, path: &str) -> Option<&Value> {
        path_value(&self.data, path, 0)
    }

    pub fn field(&self, path: &str) -> Option<&FieldInstance> {
        self.fields.get(path)
    }

    pub fn field_mut(&mut self, path: &str) -> Option<&mut FieldInstance> {
        self.fields.get_mut(path)
    }

    /// Mounted field paths, sorted
    pub fn field_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.fields.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn tree(&self) -> &WidgetTree<FieldId> {
        &self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn reactions(&self) -> &ReactionBus<ReactionHandler> {
        &self.bus
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Paths with a queued datasource load
    pub fn pending_loads(&self) -> &[String] {
        &self.pending_loads
    }

    // === Mounting ===

    /// Mount every field the schema and data describe, parents first.
    ///
    /// Object properties follow `ui:order`; tuple arrays mount one field per
    /// position; plain arrays one field per element of the current value.
    /// Multi-selects and custom array widgets are leaves.
    pub fn mount_all(&mut self) -> FormResult<usize> {
        let root = self.schema.clone();
        let mut count = 0;
        self.mount_subtree(path::ROOT, &root, None, &mut count)?;
        log::debug!("Mounted {} fields", count);
        Ok(count)
    }

    fn mount_subtree(
        &mut self,
        path: &str,
        schema: &Value,
        index: Option<usize>,
        count: &mut usize,
    ) -> FormResult<()> {
        self.mount_field(path, schema, index)?;
        *count += 1;

        let Some(resolved) = self.fields.get(path).map(|f| f.schema.clone()) else {
            return Ok(());
        };
        let children = self.child_schemas(path, &resolved);
        for (i, (child_path, child_schema)) in children.into_iter().enumerate() {
            self.mount_subtree(&child_path, &child_schema, Some(i), count)?;
        }
        Ok(())
    }

    fn child_schemas(&self, path: &str, schema: &Value) -> Vec<(String, Value)> {
        match get_schema_type(schema) {
            Some(SchemaType::Object) => ordered_properties(schema)
                .into_iter()
                .filter_map(|prop| {
                    let child = schema.get("properties")?.get(&prop)?.clone();
                    Some((cur_path(path, &prop), child))
                })
                .collect(),
            Some(SchemaType::Array) if is_tuple_array(schema) => schema
                .get("items")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (cur_path(path, &i.to_string()), item.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            Some(SchemaType::Array)
                if !is_multi_select(schema) && !is_custom_array_widget(schema) =>
            {
                let Some(items) = schema.get("items").filter(|i| i.is_object()) else {
                    return Vec::new();
                };
                let len = self.value(path).and_then(Value::as_array).map(Vec::len).unwrap_or(0);
                (0..len).map(|i| (cur_path(path, &i.to_string()), items.clone())).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Mount one field: widget tree node, form item, reactions, then the
    /// `mounted` lifetime event.
    ///
    /// The parent must be mounted first. A missing value is filled with the
    /// schema default.
    pub fn mount_field(
        &mut self,
        path: &str,
        schema: &Value,
        index: Option<usize>,
    ) -> FormResult<FieldId> {
        path::check(path)?;
        if self.fields.contains_key(path) || self.tree.contains(path) {
            log::warn!("Field '{}' is already mounted", path);
            return Err(FormError::AlreadyMounted(path.to_string()));
        }
        if !path.is_empty() && !self.tree.contains(parent_path(path)) {
            log::warn!("Parent '{}' of field '{}' is not mounted", parent_path(path), path);
            return Err(FormError::Orphan(path.to_string()));
        }

        let resolved = self.resolver.resolve_schema(schema)?;
        let reactions = parse_reactions(path, &resolved)?;
        let rules = parse_rule_refs(path, &resolved)?;

        let id = FieldId(self.next_id);
        self.next_id += 1;

        let mut field = FieldInstance::new(id, path, resolved);
        field.rules = rules;
        field.required = !path.is_empty()
            && self
                .fields
                .get(parent_path(path))
                .map(|parent| is_required(&parent.schema, path_last_prop(path)))
                .unwrap_or(false);
        field.datasource = resolve_default_datasource(&field.schema);

        if self.value(path).is_none() {
            if let Some(default) = get_schema_default_value(&field.schema) {
                self.data = set_path_value(&self.data, path, default);
            }
        }
        let has_remote = remote_config(&field.schema).is_some();

        self.tree.add_widget_node(path, id, index);
        self.fields.insert(path.to_string(), field);
        self.reaction_register(path, &reactions);
        if has_remote {
            self.load_data_source(path);
        }

        self.reaction_dispatch(path, &EventKind::Lifetime(MOUNTED.to_string()));
        Ok(id)
    }

    /// Unmount the field at `path` if it is still instance `id`.
    ///
    /// Fires the `unmounted` lifetime event first, then drops the field's
    /// reactions, tree node and form item.
    pub fn unmount_field(&mut self, path: &str, id: FieldId) -> bool {
        match self.fields.get(path) {
            Some(field) if field.id == id => {}
            _ => {
                log::debug!("Field '{}' is not mounted as {:?}, nothing to unmount", path, id);
                return false;
            }
        }

        self.reaction_dispatch(path, &EventKind::Lifetime(UNMOUNTED.to_string()));
        self.bus.unsubscribe_owner(path);
        self.tree.remove_widget_node(path, &id);
        self.fields.remove(path);
        self.pending_loads.retain(|p| p != path);
        self.parsers.remove(path);
        true
    }

    /// Unmount `path` and everything below it, deepest first
    pub fn unmount_subtree(&mut self, path: &str) -> usize {
        let mut paths: Vec<(String, FieldId)> = self
            .tree
            .descendants(path)
            .into_iter()
            .map(|node| (node.id.clone(), node.instance))
            .collect();
        if let Some(node) = self.tree.get(path) {
            paths.push((node.id.clone(), node.instance));
        }
        paths.sort_by_key(|(p, _)| std::cmp::Reverse(path::segments(p).len()));

        paths
            .into_iter()
            .filter(|(p, id)| self.unmount_field(p, *id))
            .count()
    }

    // === Presentation ===

    /// Field component for the field at `path`
    pub fn field_component(&self, path: &str) -> Option<String> {
        get_schema_field(&self.fields.get(path)?.schema, &self.registry)
    }

    /// Base widget for the field at `path`
    pub fn widget(&self, path: &str) -> Option<WidgetRef<String>> {
        get_default_widget(&self.fields.get(path)?.schema, &self.registry)
    }

    /// Presentation options for the field at `path`
    pub fn ui_options(&self, path: &str) -> Option<Map<String, Value>> {
        let field = self.fields.get(path)?;
        Some(get_ui_options(&field.schema, self.config.hidden_label_width))
    }

    /// Grid layout declared in the field's `ui:group` props
    pub fn group_layout(&self, path: &str) -> FormResult<Option<Layout>> {
        let Some(field) = self.fields.get(path) else {
            return Ok(None);
        };
        match get_group_wrap(&field.schema).props.get("layout") {
            Some(rows) => Ok(Some(Layout::from_value(rows)?)),
            None => Ok(None),
        }
    }

    // === Data and state ===

    /// User input: store the value, fire `valChange`, then validate the
    /// field when live validation is on.
    pub fn input(&mut self, path: &str, value: Value) {
        self.data = set_path_value(&self.data, path, value);
        self.reaction_dispatch(path, &EventKind::ValChange);
        if self.config.validate_on_change && self.fields.contains_key(path) {
            self.dispatch_validate(path);
        }
    }

    /// Set a reactive property; the key `value` writes the form data
    pub fn set_state(&mut self, path: &str, key: &str, value: Value) -> bool {
        if key == "value" {
            self.input(path, value);
            return true;
        }
        match self.fields.get_mut(path) {
            Some(field) => {
                field.set_state(key, value);
                true
            }
            None => {
                log::warn!("set_state: field '{}' is not mounted", path);
                false
            }
        }
    }

    /// Replace a field's error messages
    pub fn set_error_tips<I, S>(&mut self, path: &str, tips: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.fields.get_mut(path) {
            Some(field) => {
                field.set_error_tips(tips);
                true
            }
            None => false,
        }
    }

    // === Reactions ===

    /// Subscribe `reactions` declared by the field at `path`
    pub fn reaction_register(&mut self, path: &str, reactions: &[Reaction]) -> usize {
        let mut count = 0;
        for reaction in reactions {
            let reaction = Arc::new(reaction.clone());
            let kind = reaction.kind();
            let sources = reaction.sources(path);
            let target = reaction.target(path);
            for source in &sources {
                self.bus.subscribe(
                    source.clone(),
                    kind.clone(),
                    path,
                    ReactionHandler {
                        owner: path.to_string(),
                        target: target.clone(),
                        sources: sources.clone(),
                        reaction: Arc::clone(&reaction),
                    },
                );
                count += 1;
            }
        }
        count
    }

    /// Run every reaction listening on (path, kind) in registration order.
    ///
    /// Returns `false` when the dispatch guard refused the event.
    pub fn reaction_dispatch(&mut self, path: &str, kind: &EventKind) -> bool {
        if !self.bus.has_handlers(path, kind) {
            return true;
        }
        if self.guard.enter(path, kind).is_err() {
            return false;
        }

        let handlers: Vec<ReactionHandler> = self
            .bus
            .handlers(path, kind)
            .into_iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        log::debug!("Dispatching {} on '{}' to {} reactions", kind, path, handlers.len());
        for handler in &handlers {
            self.resolve_reaction(path, handler);
        }

        self.guard.exit(path, kind);
        true
    }

    /// Host-triggered effect event
    pub fn dispatch_effect(&mut self, path: &str, name: &str) -> bool {
        self.reaction_dispatch(path, &EventKind::Effect(name.to_string()))
    }

    /// Evaluate one reaction now: the condition against the triggering field,
    /// the chosen operations against the target field.
    fn resolve_reaction(&mut self, trigger: &str, handler: &ReactionHandler) {
        if !self.fields.contains_key(trigger) {
            log::debug!("Reaction trigger '{}' is not mounted", trigger);
            return;
        }
        if !self.fields.contains_key(&handler.target) {
            log::debug!(
                "Reaction target '{}' declared by '{}' is not mounted",
                handler.target,
                handler.owner
            );
            return;
        }

        let deps: Vec<Value> = handler.sources.iter().map(|p| self.field_snapshot(p)).collect();
        let reaction = &handler.reaction;

        let branch = match &reaction.condition {
            None => true,
            Some(condition) => {
                let Some((mut ev, log)) = self.evaluator_for(trigger, deps.clone()) else {
                    return;
                };
                let result = ev.eval_condition(condition);
                self.apply_effects(drain(&log));
                match result {
                    Ok(branch) => branch,
                    Err(e) => {
                        log::warn!("Reaction condition on '{}' failed: {}", handler.owner, e);
                        return;
                    }
                }
            }
        };

        let operations = if branch { &reaction.then } else { &reaction.otherwise };
        if let Some(operations) = operations {
            self.execute_operations(&handler.target, operations, &deps);
        }
    }

    /// Apply an operation block to the field at `target`
    pub fn execute_operations(&mut self, target: &str, operations: &Operations, deps: &[Value]) {
        for (key, expression) in &operations.state {
            let Some((mut ev, log)) = self.evaluator_for(target, deps.to_vec()) else {
                return;
            };
            match ev.execute_expression(expression) {
                Ok(value) => {
                    self.set_state(target, key, value);
                }
                Err(e) => log::warn!("State '{}' of '{}' failed: {}", key, target, e),
            }
            self.apply_effects(drain(&log));
        }

        for action in &operations.actions {
            let Some((mut ev, log)) = self.evaluator_for(target, deps.to_vec()) else {
                return;
            };
            if let Err(e) = ev.execute_expression(action) {
                log::warn!("Action on '{}' failed: {}", target, e);
            }
            self.apply_effects(drain(&log));
        }
    }

    fn evaluator_for(&self, path: &str, deps: Vec<Value>) -> Option<(Evaluator, EffectLog)> {
        let field = self.fields.get(path)?;
        Some(context::evaluator(
            &self.interpreter,
            Scope {
                field,
                value: self.value(path).unwrap_or(&NULL),
                root_data: &self.data,
                context: &self.context,
                rules: self.rules.to_context_value(),
                widget_node: self.tree.get(path),
                deps,
            },
        ))
    }

    fn field_snapshot(&self, path: &str) -> Value {
        let value = self.value(path).unwrap_or(&NULL);
        match self.fields.get(path) {
            Some(field) => field.snapshot(value, &self.data),
            None => serde_json::json!({ "path": path, "value": value }),
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadDataSource(path) => {
                    self.load_data_source(&path);
                }
                Effect::Validate(path) => {
                    self.dispatch_validate(&path);
                }
                Effect::SetState { path, key, value } => {
                    self.set_state(&path, &key, value);
                }
            }
        }
    }

    // === Validation ===

    /// Replace the global rules from `{"name": {"validator", "message"}}`.
    ///
    /// The whole set is swapped, including rules added with
    /// [`Form::register_rule`]; add those again afterwards if they should
    /// survive. Every rule is checked up front; on error nothing changes.
    pub fn register_global_rules(&mut self, rules: &Value) -> Result<usize, RuleError> {
        let set = RuleSet::from_json(rules).map_err(|e| {
            log::error!("Rejected global rules: {}", e);
            e
        })?;
        let count = set.len();
        self.rules = set;
        Ok(count)
    }

    /// Add or replace one global rule in the current set.
    ///
    /// The next [`Form::register_global_rules`] call drops it.
    pub fn register_rule(&mut self, name: impl Into<String>, rule: Rule) {
        self.rules.insert(name, rule);
    }

    /// Validate every mounted field. Every field is checked even after a
    /// failure so all error states are filled in.
    pub fn validate_form(&mut self) -> bool {
        let mut valid = true;
        for path in self.field_paths() {
            valid &= self.validate_form_item(&path);
        }
        valid
    }

    /// Validate one field after a change; unmounted paths are ignored
    pub fn dispatch_validate(&mut self, path: &str) -> bool {
        if !self.fields.contains_key(path) {
            log::debug!("dispatch_validate: field '{}' is not mounted", path);
            return true;
        }
        self.validate_form_item(path)
    }

    /// Validate one field and record the outcome on it.
    ///
    /// Order: required check, schema check, then custom rules where the
    /// first failing rule wins. Only a required empty value stops early;
    /// an optional one still goes through the schema and the rules.
    pub fn validate_form_item(&mut self, path: &str) -> bool {
        let Some(field) = self.fields.get(path) else {
            log::warn!("validate_form_item: field '{}' is not mounted", path);
            return true;
        };
        let value = self.value(path).cloned().unwrap_or(Value::Null);
        let required = field.required || self.is_dependent_required(path);

        if required && !is_present(&value) {
            let tips = vec![self.config.required_message.clone()];
            return self.record(path, tips);
        }

        let schema = self.validation_schema(path, &field.schema);
        if let Err(errors) = self.validator.validate(&schema, &value) {
            return self.record(path, errors);
        }

        match self.failing_rule(path, &value) {
            Some(message) => self.record(path, vec![message]),
            None => self.record(path, Vec::new()),
        }
    }

    fn record(&mut self, path: &str, tips: Vec<String>) -> bool {
        let valid = tips.is_empty();
        if let Some(field) = self.fields.get_mut(path) {
            field.set_error_tips(tips);
        }
        valid
    }

    fn is_dependent_required(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let parent = parent_path(path);
        let (Some(parent_field), Some(parent_value)) =
            (self.fields.get(parent), self.value(parent))
        else {
            return false;
        };
        let prop = path_last_prop(path);
        dependent_required(&parent_field.schema, parent_value)
            .iter()
            .any(|name| name == prop)
    }

    /// Fragment the schema validator sees: containers whose children are
    /// mounted lose their structural keywords, and root definitions are
    /// carried along so local references resolve.
    fn validation_schema(&self, path: &str, schema: &Value) -> Value {
        let Some(map) = schema.as_object() else {
            return schema.clone();
        };
        let mut map = map.clone();

        let has_children = self.tree.get(path).map(|n| !n.children.is_empty()).unwrap_or(false);
        if has_children {
            for keyword in STRUCTURAL_KEYWORDS {
                map.remove(*keyword);
            }
        }
        for key in ["definitions", "$defs"] {
            if let Some(defs) = self.resolver.root().get(key) {
                map.entry(key.to_string()).or_insert_with(|| defs.clone());
            }
        }
        Value::Object(map)
    }

    /// Message of the first custom rule that rejects `value`
    fn failing_rule(&self, path: &str, value: &Value) -> Option<String> {
        let field = self.fields.get(path)?;
        for entry in &field.rules {
            let rule = match entry {
                RuleRef::Named(name) => match self.rules.get(name) {
                    Some(rule) => rule,
                    None => {
                        log::warn!("Field '{}' uses unknown rule '{}'", path, name);
                        continue;
                    }
                },
                RuleRef::Inline(rule) => rule,
            };
            if !self.passes(field, rule, value) {
                return Some(rule.message.clone());
            }
        }
        None
    }

    fn passes(&self, field: &FieldInstance, rule: &Rule, value: &Value) -> bool {
        match &rule.validator {
            Validator::Pattern(re) => re.is_match(&pattern_text(value)),
            Validator::Native(check) => check(&RuleInput {
                field,
                value,
                root_data: &self.data,
            }),
            Validator::Expression(source) => {
                let Some((mut ev, log)) = self.evaluator_for(&field.path, Vec::new()) else {
                    return true;
                };
                let result = ev.eval_source(source);
                // Rules only judge; effects requested while validating are dropped
                let dropped = drain(&log);
                if !dropped.is_empty() {
                    log::debug!("Ignoring {} effects from rule on '{}'", dropped.len(), field.path);
                }
                match result {
                    Ok(verdict) => verdict.is_truthy(),
                    Err(e) => {
                        log::warn!("Rule on '{}' failed to evaluate: {}", field.path, e);
                        false
                    }
                }
            }
        }
    }

    // === Datasources ===

    /// Queue a datasource load for the field at `path`.
    ///
    /// Loads queued for the same path before the queue is processed collapse
    /// into one request.
    pub fn load_data_source(&mut self, path: &str) -> bool {
        let Some(field) = self.fields.get_mut(path) else {
            log::warn!("load_data_source: field '{}' is not mounted", path);
            return false;
        };
        if remote_config(&field.schema).is_none() {
            log::warn!("Field '{}' has no remoteConfig to load from", path);
            return false;
        }
        field.loading = true;
        if !self.pending_loads.iter().any(|p| p == path) {
            self.pending_loads.push(path.to_string());
        }
        true
    }

    /// Parse responses for `path` with a custom parser
    pub fn set_response_parser(&mut self, path: impl Into<String>, parse: ResponseParse) {
        self.parsers.insert(path.into(), parse);
    }

    /// Run the queued loads one at a time. Returns how many succeeded.
    ///
    /// On failure the field keeps its previous datasource; either way its
    /// loading flag is cleared.
    pub async fn process_data_sources(&mut self, loader: &dyn DataSourceLoader) -> usize {
        let queue = std::mem::take(&mut self.pending_loads);
        let mut loaded = 0;

        for path in queue {
            let Some(remote) = self.fields.get(&path).and_then(|f| remote_config(&f.schema)) else {
                continue;
            };
            let (url, config) = self.request_for(&path, &remote);
            let parse = self
                .parsers
                .get(&path)
                .cloned()
                .unwrap_or_else(|| ResponseParse::from_remote(&remote));

            log::debug!("Loading datasource for '{}' from {}", path, url);
            let result = loader
                .request(&url, &config)
                .await
                .and_then(|response| parse.parse(&response));

            if let Some(field) = self.fields.get_mut(&path) {
                field.loading = false;
                match result {
                    Ok(items) => {
                        field.datasource = items;
                        loaded += 1;
                    }
                    Err(e) => log::warn!("Failed to load datasource for '{}': {}", path, e),
                }
            }
        }
        loaded
    }

    /// URL and request settings with templates evaluated for the field
    fn request_for(&self, path: &str, remote: &RemoteConfig) -> (String, RequestConfig) {
        let mut url = remote.url.clone();
        let mut params = remote.params.clone();

        if let Some((mut ev, _)) = self.evaluator_for(path, Vec::new()) {
            match ev.execute_expression(&Value::String(remote.url.clone())) {
                Ok(Value::String(evaluated)) => url = evaluated,
                Ok(other) => log::warn!("remoteConfig.url of '{}' evaluated to {}", path, other),
                Err(e) => log::warn!("remoteConfig.url of '{}' failed: {}", path, e),
            }
            match ev.execute_expression(&Value::Object(remote.params.clone())) {
                Ok(Value::Object(evaluated)) => params = evaluated,
                Ok(_) => {}
                Err(e) => log::warn!("remoteConfig.params of '{}' failed: {}", path, e),
            }
        }

        (url, RequestConfig::from_remote(remote, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(schema: Value) -> Form {
        Form::new(schema, Value::Null, FormConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults_fill_data() {
        let form = form(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "default": "web"},
                "replicas": {"type": "integer"}
            }
        }));
        assert_eq!(form.data(), &json!({"name": "web", "replicas": 0}));
    }

    #[test]
    fn test_mount_all_order() {
        let mut form = form(json!({
            "type": "object",
            "ui:order": ["b", "*"],
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "object", "properties": {"c": {"type": "boolean"}}}
            }
        }));
        assert_eq!(form.mount_all().unwrap(), 4);

        let root_children: Vec<&str> = form
            .tree()
            .children_of("")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(root_children, vec!["b", "a"]);
        assert!(form.tree().contains("b.c"));
        assert_eq!(form.tree().get("a").map(|n| n.index), Some(1));
    }

    #[test]
    fn test_mount_errors() {
        let mut form = form(json!({"type": "object", "properties": {}}));
        assert!(matches!(
            form.mount_field("a.b", &json!({"type": "string"}), None),
            Err(FormError::Orphan(_))
        ));
        form.mount_field("", &json!({"type": "object"}), None).unwrap();
        assert!(matches!(
            form.mount_field("", &json!({"type": "object"}), None),
            Err(FormError::AlreadyMounted(_))
        ));
        assert!(matches!(
            form.mount_field("a..b", &json!({}), None),
            Err(FormError::Path(_))
        ));
    }

    #[test]
    fn test_unmount_requires_same_instance() {
        let mut form = form(json!({"type": "object", "properties": {"a": {"type": "string"}}}));
        form.mount_all().unwrap();
        let id = form.field("a").map(|f| f.id).unwrap();

        assert!(!form.unmount_field("a", FieldId(999)));
        assert!(form.field("a").is_some());
        assert!(form.unmount_field("a", id));
        assert!(form.field("a").is_none());
        assert!(!form.tree().contains("a"));
    }

    #[test]
    fn test_set_state_value_writes_data() {
        let mut form = form(json!({"type": "object", "properties": {"a": {"type": "string"}}}));
        form.mount_all().unwrap();

        assert!(form.set_state("a", "value", json!("x")));
        assert!(form.set_state("a", "disabled", json!(true)));
        assert_eq!(form.value("a"), Some(&json!("x")));
        assert_eq!(form.field("a").and_then(|f| f.get_state("disabled")), Some(&json!(true)));
        assert!(!form.set_state("missing", "disabled", json!(true)));
    }

    #[test]
    fn test_validation_schema_strips_children() {
        let mut form = form(json!({
            "type": "object",
            "definitions": {"port": {"type": "integer"}},
            "properties": {"p": {"$ref": "#/definitions/port"}}
        }));
        form.mount_all().unwrap();

        let root = form.field("").map(|f| f.schema.clone()).unwrap();
        let schema = form.validation_schema("", &root);
        assert!(schema.get("properties").is_none());
        assert!(schema.get("definitions").is_some());
    }
}
