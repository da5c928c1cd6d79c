//! Error types for annotation runs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while annotating model classes.
///
/// Everything except [`AnnotateError::ClassNotFound`] and
/// [`AnnotateError::Config`] is scoped to a single class: the runner reports
/// it and moves on to the next class.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("invalid file path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },
    #[error("data class {0:?} does not exist")]
    ClassNotFound(String),
    #[error("failed to parse {}", path.display())]
    Parse { path: PathBuf },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error generating annotations for {fqn}: {message}")]
    Unexpected { fqn: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnnotateError {
    /// Build an [`AnnotateError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnnotateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`AnnotateError::Unexpected`] attached to a class.
    pub fn unexpected(fqn: &str, message: impl Into<String>) -> Self {
        AnnotateError::Unexpected {
            fqn: fqn.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run instead of a single class.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnnotateError::ClassNotFound(_) | AnnotateError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
