//! Declarative field reactions (`ui:reactions`)
//!
//! ```json
//! {
//!   "source": "deploy.mode",
//!   "if": "{{ $dep[0].value === 'advanced' }}",
//!   "then": { "state": { "visible": true } },
//!   "else": { "state": { "visible": false }, "actions": ["{{ $validate }}"] }
//! }
//! ```

use std::sync::Arc;

use form_event::EventKind;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FormError;

/// One path or several
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    One(String),
    Many(Vec<String>),
}

impl Sources {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

/// Operation block applied to the target field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Operations {
    /// Reactive properties to set; values may be templates
    pub state: Map<String, Value>,
    /// Expressions run for their effects
    pub actions: Vec<Value>,
}

impl Operations {
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.actions.is_empty()
    }
}

/// A reaction as declared in the schema
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Reaction {
    /// Paths whose events trigger the reaction; the declaring field if absent
    pub source: Option<Sources>,
    /// Field the operations apply to; the declaring field if absent
    pub target: Option<String>,
    #[serde(rename = "if")]
    pub condition: Option<String>,
    pub then: Option<Operations>,
    #[serde(rename = "else")]
    pub otherwise: Option<Operations>,
    pub lifetime: Option<String>,
    pub effect: Option<String>,
}

impl Reaction {
    /// Event category this reaction listens to
    pub fn kind(&self) -> EventKind {
        EventKind::select(self.lifetime.as_deref(), self.effect.as_deref())
    }

    /// Trigger paths, defaulting to `owner`
    pub fn sources(&self, owner: &str) -> Vec<String> {
        match &self.source {
            Some(sources) => sources.to_vec(),
            None => vec![owner.to_string()],
        }
    }

    /// Operate path, defaulting to `owner`
    pub fn target(&self, owner: &str) -> String {
        self.target.clone().unwrap_or_else(|| owner.to_string())
    }
}

/// What the reaction bus stores per subscription
#[derive(Debug, Clone)]
pub struct ReactionHandler {
    /// Field that declared the reaction
    pub owner: String,
    /// Field the operations apply to
    pub target: String,
    /// Paths handed to expressions as `$dep`
    pub sources: Vec<String>,
    pub reaction: Arc<Reaction>,
}

/// Parse a field's `ui:reactions`
pub fn parse_reactions(path: &str, schema: &Value) -> Result<Vec<Reaction>, FormError> {
    match schema.get("ui:reactions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|e| FormError::InvalidReaction {
                path: path.to_string(),
                message: e.to_string(),
            })
        }
    }
}
