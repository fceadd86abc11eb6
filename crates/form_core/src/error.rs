//! Error types for the core library

use thiserror::Error;

/// The core error type
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Path addressing error
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Message(Box<str>),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// Path-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Segment is empty (e.g. `a..b`)
    #[error("Empty segment in path '{0}'")]
    EmptySegment(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Message(s.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s.into_boxed_str())
    }
}
