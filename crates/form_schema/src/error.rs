//! Schema errors
//!
//! All of these are configuration errors: they point at a schema that can
//! never be satisfied or cannot be interpreted, and are raised eagerly.

use thiserror::Error;

/// Errors raised while resolving a schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("allOf values for '{key}' have no common element")]
    Unsatisfiable { key: String },

    #[error("allOf value {value} for '{key}' is not one of the allowed values")]
    ValueNotAllowed { key: String, value: String },

    #[error("allOf cannot merge arrays of objects under '{key}'")]
    UnsupportedArrayItems { key: String },

    #[error("Only local references are supported, got '{0}'")]
    UnsupportedRef(String),

    #[error("Reference '{0}' does not resolve inside the root schema")]
    RefNotFound(String),

    #[error("Circular reference through '{0}'")]
    CircularRef(String),

    #[error("Expected a schema object, found {0}")]
    NotAnObject(String),
}

/// Result type alias
pub type SchemaResult<T> = Result<T, SchemaError>;
