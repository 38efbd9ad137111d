//! Error handling for document processing
//!
//! The engine itself has no fatal path: every recognition step is a
//! best-effort pattern match and failure means "no transformation". Errors
//! exist only at the I/O and JSON boundary of the filter binary.

use std::fmt;

/// Filter error type
#[derive(Debug, Clone)]
pub enum FilterError {
    /// Document JSON could not be parsed or written
    Json { message: String },
    /// IO error (for file operations)
    Io { message: String },
    /// Invalid input
    InvalidInput { message: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Json { message } => {
                write!(f, "JSON error: {}", message)
            }
            FilterError::Io { message } => {
                write!(f, "IO error: {}", message)
            }
            FilterError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
        }
    }
}

impl std::error::Error for FilterError {}

impl From<std::io::Error> for FilterError {
    fn from(err: std::io::Error) -> Self {
        FilterError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

// Convenience constructors for errors
impl FilterError {
    pub fn invalid(message: impl Into<String>) -> Self {
        FilterError::InvalidInput {
            message: message.into(),
        }
    }
}
