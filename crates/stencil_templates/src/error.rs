//! Error types for template operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unterminated tag starting on line {line}")]
    UnterminatedTag { line: usize },

    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Unbalanced block on line {line}: {message}")]
    UnbalancedBlock { line: usize, message: String },

    #[error("Variable not defined: {0}")]
    MissingVariable(String),

    #[error("Unknown helper: {0}")]
    UnknownHelper(String),

    #[error("Cannot iterate over a {value_kind} value on line {line}")]
    NotIterable { line: usize, value_kind: &'static str },

    #[error("Invalid target directory: {0:?}")]
    InvalidTargetDir(String),

    #[error("Template not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
