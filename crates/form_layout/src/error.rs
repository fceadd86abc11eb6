//! Layout errors

use thiserror::Error;

/// Errors raised while reading a layout declaration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Layout must be an array of rows")]
    NotArray,

    #[error("Layout row {0} is not an array")]
    RowNotArray(usize),

    #[error("Layout cell at row {row}, column {column} must be a prop name or a group object")]
    InvalidCell { row: usize, column: usize },
}

/// Result type alias
pub type LayoutResult<T> = Result<T, LayoutError>;
