//! Errors raised while loading or saving the learning context

use std::path::PathBuf;

use thiserror::Error;

use super::types::LearningCategory;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Context file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed context file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize context: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Category {0} appears more than once")]
    DuplicateCategory(LearningCategory),

    #[error("Invalid context state: {0}")]
    InvariantViolation(String),
}

impl ContextError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContextError::Io {
            path: path.into(),
            source,
        }
    }
}
