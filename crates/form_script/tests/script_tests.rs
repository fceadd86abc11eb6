//! Integration tests for form_script (template expressions)

use form_script::*;
use serde_json::json;

#[test]
fn test_basic_arithmetic() {
    assert_eq!(eval("1 + 1").unwrap(), Value::Int(2));
    assert_eq!(eval("10 - 3").unwrap(), Value::Int(7));
    assert_eq!(eval("4 * 5").unwrap(), Value::Int(20));
    assert_eq!(eval("20 / 4").unwrap(), Value::Int(5));
    assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
    assert_eq!(eval("7 % 4").unwrap(), Value::Int(3));
}

#[test]
fn test_operator_precedence() {
    assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Int(14)); // Not 20
    assert_eq!(eval("(2 + 3) * 4").unwrap(), Value::Int(20));
    assert_eq!(eval("1 + 1 == 2 && 3 > 2").unwrap(), Value::Bool(true));
    assert_eq!(eval("-2 * -3").unwrap(), Value::Int(6));
}

#[test]
fn test_floating_point() {
    if let Value::Float(result) = eval("3.14 + 2.86").unwrap() {
        assert!((result - 6.0).abs() < 0.01);
    } else {
        panic!("Expected float result");
    }
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("'replicas: ' + 3").unwrap(), Value::from("replicas: 3"));
    assert_eq!(eval("upper('a') + lower('B')").unwrap(), Value::from("Ab"));
}

#[test]
fn test_context_variables() {
    let mut ev = Evaluator::new();
    ev.define_json(
        "$self",
        &json!({ "path": "deploy.replicas", "value": 3, "schema": { "type": "integer" } }),
    );
    ev.define_json("$rootData", &json!({ "deploy": { "replicas": 3, "image": "nginx" } }));
    ev.define_json("$dep", &json!([{ "value": "advanced" }]));

    assert_eq!(ev.eval_source("$self.schema.type").unwrap(), Value::from("integer"));
    assert_eq!(ev.eval_source("$rootData.deploy.image").unwrap(), Value::from("nginx"));
    assert_eq!(ev.eval_source("$dep[0].value === 'advanced'").unwrap(), Value::Bool(true));
    assert_eq!(ev.eval_source("$rootData['deploy']['replicas'] + 1").unwrap(), Value::Int(4));
}

#[test]
fn test_no_ambient_scope() {
    // Only installed variables resolve
    for source in ["window", "process", "globalThis", "require('fs')"] {
        assert!(eval(source).is_err(), "{} should not resolve", source);
    }
}

#[test]
fn test_statements_rejected() {
    assert!(eval("x = 1").is_err());
    assert!(eval("1; 2").is_err());
    assert!(eval("1 2").is_err());
}

#[test]
fn test_execute_expression_leaves_data_alone() {
    let mut ev = Evaluator::new();
    let data = json!({ "label": "Name", "size": 3, "flags": [true, null] });
    assert_eq!(ev.execute_expression(&data).unwrap(), data);
}

#[test]
fn test_execute_expression_state_block() {
    let mut ev = Evaluator::new();
    ev.define_json("$self", &json!({ "value": "" }));
    let state = json!({
        "visible": "{{ !isEmpty($self.value) }}",
        "placeholder": "{{ isEmpty($self.value) ? 'required' : '' }}"
    });
    assert_eq!(
        ev.execute_expression(&state).unwrap(),
        json!({ "visible": false, "placeholder": "required" })
    );
}

#[test]
fn test_loose_and_strict_equality() {
    assert_eq!(eval("'3' == 3").unwrap(), Value::Bool(true));
    assert_eq!(eval("'3' === 3").unwrap(), Value::Bool(false));
    assert_eq!(eval("3 === 3.0").unwrap(), Value::Bool(true));
    assert_eq!(eval("undefined == null").unwrap(), Value::Bool(true));
}

#[test]
fn test_object_and_array_literals() {
    let value = eval("{ name: 'web', 'ports': [80, 443] }").unwrap();
    assert_eq!(script_to_json_value(&value), json!({ "name": "web", "ports": [80, 443] }));
    assert_eq!(eval("[1, 2, 3].length").unwrap(), Value::Int(3));
}
