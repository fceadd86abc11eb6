//! Expression scope for one field
//!
//! Expressions see exactly these variables:
//!
//! | name              | value                                      |
//! |-------------------|--------------------------------------------|
//! | `$self`           | snapshot of the field, plus `setState`     |
//! | `$context`        | host supplied form context                 |
//! | `$schema`         | the field's resolved schema                |
//! | `$rules`          | global rule names and messages             |
//! | `$rootData`       | the whole form data                        |
//! | `$widgetNode`     | the field's widget tree node               |
//! | `$dep`            | snapshots of the reaction's source fields  |
//! | `$loadDataSource` | queue a datasource load                    |
//! | `$validate`       | validate a field                           |
//! | `$setState`       | set a property on the field                |
//!
//! Snapshots are copies. Natives never touch the form directly; they record
//! an [`Effect`] that the form applies once evaluation returns.

use std::sync::Arc;

use form_core::WidgetNode;
use form_script::{
    json_to_script_value, script_to_json_value, Evaluator, Interpreter, NativeFunction, Value,
};
use parking_lot::Mutex;
use serde_json::Value as Json;

use crate::instance::{FieldId, FieldInstance};

/// Deferred change requested by an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadDataSource(String),
    Validate(String),
    SetState { path: String, key: String, value: Json },
}

/// Effects recorded during one evaluation
pub type EffectLog = Arc<Mutex<Vec<Effect>>>;

/// Everything an expression may read
pub struct Scope<'a> {
    pub field: &'a FieldInstance,
    pub value: &'a Json,
    pub root_data: &'a Json,
    pub context: &'a Json,
    pub rules: Json,
    pub widget_node: Option<&'a WidgetNode<FieldId>>,
    pub deps: Vec<Json>,
}

/// Widget node as JSON
pub fn node_snapshot(node: Option<&WidgetNode<FieldId>>) -> Json {
    let Some(node) = node else {
        return Json::Null;
    };
    serde_json::json!({
        "id": node.id,
        "index": node.index,
        "parent": node.parent,
        "children": node.children,
    })
}

/// Build an evaluator over `scope`. Builtins come from `base`.
pub fn evaluator(base: &Interpreter, scope: Scope<'_>) -> (Evaluator, EffectLog) {
    let log: EffectLog = Arc::new(Mutex::new(Vec::new()));
    let path = scope.field.path.clone();
    let mut ev = Evaluator::with_interpreter(base.child());

    let mut this = json_to_script_value(&scope.field.snapshot(scope.value, scope.root_data));
    if let Value::Object(map) = &mut this {
        map.insert("setState".into(), Value::Native(set_state_fn("setState", &path, &log)));
    }
    ev.define("$self", this);
    ev.define_json("$context", scope.context);
    ev.define_json("$schema", &scope.field.schema);
    ev.define_json("$rules", &scope.rules);
    ev.define_json("$rootData", scope.root_data);
    ev.define_json("$widgetNode", &node_snapshot(scope.widget_node));
    ev.define_json("$dep", &Json::Array(scope.deps));

    let (p, l) = (path.clone(), Arc::clone(&log));
    ev.register_native("$loadDataSource", -1, move |args| {
        let target = target_path(&args, &p)?;
        l.lock().push(Effect::LoadDataSource(target));
        Ok(Value::Null)
    });
    let (p, l) = (path.clone(), Arc::clone(&log));
    ev.register_native("$validate", -1, move |args| {
        let target = target_path(&args, &p)?;
        l.lock().push(Effect::Validate(target));
        Ok(Value::Null)
    });
    ev.define("$setState", Value::Native(set_state_fn("$setState", &path, &log)));

    ev.add_auto_invoke("$loadDataSource");
    ev.add_auto_invoke("$validate");

    (ev, log)
}

fn set_state_fn(name: &str, path: &str, log: &EffectLog) -> NativeFunction {
    let (path, log) = (path.to_string(), Arc::clone(log));
    NativeFunction::new(name, 2, move |args| {
        let key = match &args[0] {
            Value::String(key) => key.clone(),
            other => return Err(format!("state key must be a string, got {}", other.type_name())),
        };
        log.lock().push(Effect::SetState {
            path: path.clone(),
            key,
            value: script_to_json_value(&args[1]),
        });
        Ok(Value::Null)
    })
}

/// Optional path argument, defaulting to the field itself
fn target_path(args: &[Value], own: &str) -> Result<String, String> {
    match args.first() {
        None | Some(Value::Null) => Ok(own.to_string()),
        Some(Value::String(path)) => Ok(path.clone()),
        Some(other) => Err(format!("expected a field path, got {}", other.type_name())),
    }
}

/// Take the recorded effects
pub fn drain(log: &EffectLog) -> Vec<Effect> {
    std::mem::take(&mut *log.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field() -> FieldInstance {
        FieldInstance::new(FieldId(7), "deploy.replicas", json!({"type": "integer", "maximum": 5}))
    }

    #[test]
    fn test_scope_variables() {
        let field = field();
        let root = json!({"deploy": {"replicas": 3}});
        let (mut ev, _) = evaluator(
            &Interpreter::new(),
            Scope {
                field: &field,
                value: &json!(3),
                root_data: &root,
                context: &json!({"cluster": "prod"}),
                rules: json!({}),
                widget_node: None,
                deps: vec![json!({"value": "advanced"})],
            },
        );

        assert_eq!(ev.eval_source("$self.value + 1").unwrap(), Value::Int(4));
        assert_eq!(ev.eval_source("$schema.maximum").unwrap(), Value::Int(5));
        assert_eq!(ev.eval_source("$context.cluster").unwrap(), Value::from("prod"));
        assert_eq!(ev.eval_source("$dep[0].value").unwrap(), Value::from("advanced"));
        assert_eq!(ev.eval_source("$widgetNode").unwrap(), Value::Null);
        assert_eq!(ev.eval_source("$rootData.deploy.replicas").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_effects_are_recorded() {
        let field = field();
        let (mut ev, log) = evaluator(
            &Interpreter::new(),
            Scope {
                field: &field,
                value: &Json::Null,
                root_data: &Json::Null,
                context: &Json::Null,
                rules: json!({}),
                widget_node: None,
                deps: Vec::new(),
            },
        );

        ev.execute_expression(&json!("{{ $loadDataSource }}")).unwrap();
        ev.execute_expression(&json!("{{ $validate('deploy.image') }}")).unwrap();
        ev.execute_expression(&json!("{{ $self.setState('disabled', true) }}")).unwrap();

        assert_eq!(
            drain(&log),
            vec![
                Effect::LoadDataSource("deploy.replicas".into()),
                Effect::Validate("deploy.image".into()),
                Effect::SetState {
                    path: "deploy.replicas".into(),
                    key: "disabled".into(),
                    value: json!(true),
                },
            ]
        );
        assert!(drain(&log).is_empty());
    }
}
