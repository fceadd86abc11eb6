//! Error types for the form engine
//!
//! Only configuration mistakes are errors. Validation failures live on the
//! field instance, and datasource failures are logged and contained.

use form_core::PathError;
use form_layout::LayoutError;
use form_schema::SchemaError;
use thiserror::Error;

/// Form-level errors
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Invalid ui:reactions on '{path}': {message}")]
    InvalidReaction { path: String, message: String },

    #[error("Field '{0}' is already mounted")]
    AlreadyMounted(String),

    #[error("Parent of '{0}' is not mounted")]
    Orphan(String),
}

/// Form result type
pub type FormResult<T> = Result<T, FormError>;

/// Malformed custom validation rules, raised when the rule is registered
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule '{0}' must be an object with a validator")]
    NotAnObject(String),

    #[error("Rule '{0}' has no validator")]
    MissingValidator(String),

    #[error("Rule '{name}' validator must be a string, got {found}")]
    InvalidValidator { name: String, found: String },

    #[error("Rule '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule '{name}' has an invalid expression: {message}")]
    InvalidExpression { name: String, message: String },

    #[error("Global rules must be a JSON object")]
    NotARuleMap,
}

/// Datasource request failures
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response: {0}")]
    Response(String),
}
