//! # form_engine - Form Runtime
//!
//! Ties the form crates together into one per-form context:
//! - mounting fields from a schema into a widget tree
//! - `ui:reactions` wired through the reaction bus
//! - schema and custom-rule validation recorded on each field
//! - remote datasources for choice widgets
//!
//! ## Example
//!
//! ```
//! use form_core::FormConfig;
//! use form_engine::Form;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {
//!         "name": {
//!             "type": "string",
//!             "ui:rules": [{"validator": "^[a-z]+$", "message": "lowercase"}]
//!         },
//!         "tier": {
//!             "type": "string",
//!             "ui:reactions": [{
//!                 "source": "name",
//!                 "then": {"state": {"visible": "{{ $dep[0].value === 'admin' }}"}}
//!             }]
//!         }
//!     }
//! });
//!
//! let mut form = Form::new(schema, json!(null), FormConfig::default()).unwrap();
//! form.mount_all().unwrap();
//!
//! form.input("name", json!("Admin"));
//! assert_eq!(form.field("name").unwrap().error_tips, vec!["lowercase"]);
//!
//! form.input("name", json!("admin"));
//! assert!(!form.field("name").unwrap().error);
//! assert_eq!(form.field("tier").unwrap().get_state("visible"), Some(&json!(true)));
//! ```

pub mod context;
pub mod datasource;
pub mod error;
pub mod form;
pub mod instance;
pub mod reaction;
pub mod rules;
pub mod validator;

pub use context::{Effect, EffectLog};
pub use datasource::{DataSourceLoader, ParseFn, RequestConfig, ResponseParse};
pub use error::{FormError, FormResult, LoadError, RuleError};
pub use form::Form;
pub use instance::{FieldId, FieldInstance};
pub use reaction::{Operations, Reaction, ReactionHandler, Sources};
pub use rules::{NativeRuleFn, Rule, RuleInput, RuleRef, RuleSet, Validator};
pub use validator::{JsonSchemaValidator, SchemaValidator};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::datasource::{DataSourceLoader, RequestConfig, ResponseParse};
    pub use crate::error::{FormError, FormResult, LoadError, RuleError};
    pub use crate::form::Form;
    pub use crate::instance::{FieldId, FieldInstance};
    pub use crate::rules::{Rule, RuleInput};
    pub use form_core::FormConfig;
}
