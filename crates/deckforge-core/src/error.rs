//! Error types for editor operations.

use thiserror::Error;

/// Errors raised by store and configuration operations.
///
/// Pointer-gesture code does not surface these: a gesture that cannot
/// resolve its slide or component logs and returns instead.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Slide not found: {0}")]
    SlideNotFound(String),
    #[error("Component not found: {0}")]
    ComponentNotFound(String),
    #[error("An edit is already in progress on slide {0}")]
    EditInProgress(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
