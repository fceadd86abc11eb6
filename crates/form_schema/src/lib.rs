//! # form_schema - Schema Utilities
//!
//! Stateless helpers over JSON-Schema-like documents extended with `ui:*`
//! keywords:
//!
//! - `allOf` composition with type-aware conflict rules
//! - local `$ref` resolution
//! - initial value derivation
//! - field, widget and presentation option selection
//! - choice widget datasources
//!
//! ## Example
//!
//! ```
//! use form_schema::prelude::*;
//! use serde_json::json;
//!
//! let schema = json!({"allOf": [{"type": "integer", "maximum": 10}, {"maximum": 5}]});
//! let resolved = resolve_schema(&schema).unwrap();
//! assert_eq!(resolved["maximum"], json!(5));
//! assert_eq!(get_schema_default_value(&resolved), Some(json!(0)));
//! ```

pub mod datasource;
pub mod defaults;
pub mod deps;
pub mod error;
pub mod kind;
pub mod merge;
pub mod resolver;
pub mod ui;

pub use datasource::{
    remote_config, resolve_default_datasource, DataSourceItem, RemoteConfig, ResponseMapping,
};
pub use defaults::get_schema_default_value;
pub use deps::{dependent_required, get_dependencies, is_present, is_required, Dependency};
pub use error::{SchemaError, SchemaResult};
pub use kind::{
    get_schema_type, is_custom_array_widget, is_multi_select, is_select, is_tuple_array, SchemaType,
};
pub use merge::merge_schema_all_of;
pub use resolver::{resolve_schema, SchemaResolver};
pub use ui::{
    get_default_widget, get_group_wrap, get_schema_field, get_ui_component, get_ui_options,
    ordered_properties, GroupWrap, UiComponent,
};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::datasource::{resolve_default_datasource, DataSourceItem};
    pub use crate::defaults::get_schema_default_value;
    pub use crate::error::{SchemaError, SchemaResult};
    pub use crate::kind::{get_schema_type, SchemaType};
    pub use crate::merge::merge_schema_all_of;
    pub use crate::resolver::{resolve_schema, SchemaResolver};
    pub use crate::ui::{get_default_widget, get_schema_field, get_ui_options};
}
