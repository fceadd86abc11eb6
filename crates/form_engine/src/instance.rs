//! Live field state

use form_schema::DataSourceItem;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::rules::RuleRef;

/// Identity of one mounted field.
///
/// A path can be unmounted and mounted again; the id tells the two apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FieldId(pub u64);

/// One mounted field
#[derive(Debug, Clone)]
pub struct FieldInstance {
    pub id: FieldId,
    /// Data path of the field's value
    pub path: String,
    /// Resolved schema fragment
    pub schema: Value,
    /// Reactive presentation properties (`visible`, `disabled`, ...)
    pub state: Map<String, Value>,
    pub error: bool,
    pub error_tips: Vec<String>,
    /// A datasource request is queued or in flight
    pub loading: bool,
    pub datasource: Vec<DataSourceItem>,
    /// Listed in the parent's `required`
    pub required: bool,
    pub(crate) rules: Vec<RuleRef>,
}

impl FieldInstance {
    pub(crate) fn new(id: FieldId, path: impl Into<String>, schema: Value) -> Self {
        Self {
            id,
            path: path.into(),
            schema,
            state: Map::new(),
            error: false,
            error_tips: Vec::new(),
            loading: false,
            datasource: Vec::new(),
            required: false,
            rules: Vec::new(),
        }
    }

    /// Set a reactive property. The value itself lives in the form data,
    /// use `Form::set_state` to change it.
    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Reactive property by name
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Replace the error messages; an empty list clears the error
    pub fn set_error_tips<I, S>(&mut self, tips: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_tips = tips.into_iter().map(Into::into).collect();
        self.error = !self.error_tips.is_empty();
    }

    /// Clear the error state
    pub fn clear_error(&mut self) {
        self.error = false;
        self.error_tips.clear();
    }

    /// JSON view handed to expressions as `$self`
    pub fn snapshot(&self, value: &Value, root_data: &Value) -> Value {
        let mut out = Map::new();
        out.insert("path".into(), Value::from(self.path.as_str()));
        out.insert("value".into(), value.clone());
        out.insert("schema".into(), self.schema.clone());
        out.insert("state".into(), Value::Object(self.state.clone()));
        out.insert("error".into(), Value::Bool(self.error));
        out.insert(
            "errorTips".into(),
            Value::Array(self.error_tips.iter().map(|t| Value::from(t.as_str())).collect()),
        );
        out.insert("loading".into(), Value::Bool(self.loading));
        out.insert(
            "datasource".into(),
            serde_json::to_value(&self.datasource).unwrap_or(Value::Array(Vec::new())),
        );
        out.insert("required".into(), Value::Bool(self.required));
        out.insert("rootData".into(), root_data.clone());
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_tips() {
        let mut field = FieldInstance::new(FieldId(1), "name", json!({"type": "string"}));
        field.set_error_tips(["too short"]);
        assert!(field.error);

        field.set_error_tips(Vec::<String>::new());
        assert!(!field.error);
    }

    #[test]
    fn test_snapshot() {
        let mut field = FieldInstance::new(FieldId(1), "deploy.name", json!({"type": "string"}));
        field.set_state("visible", json!(false));

        let snap = field.snapshot(&json!("web"), &json!({"deploy": {"name": "web"}}));
        assert_eq!(snap["path"], json!("deploy.name"));
        assert_eq!(snap["value"], json!("web"));
        assert_eq!(snap["state"]["visible"], json!(false));
        assert_eq!(snap["rootData"]["deploy"]["name"], json!("web"));
    }
}
