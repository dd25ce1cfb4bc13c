//! Error handling for ProteusDS result processing.
//!
//! Provides typed errors with enough context (file, line index, offending
//! token) for an operator to correct the input without reading source code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProteusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file name: '{name}'")]
    UnsupportedFileName { name: String },

    #[error("Malformed header in file '{file}': {reason}")]
    MalformedHeader { file: String, reason: String },

    #[error(
        "Row width mismatch in file '{file}' at line {line}: expected at least {expected} fields, found {found}"
    )]
    RowWidthMismatch {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid numeric field '{token}' in file '{file}' at line {line}")]
    InvalidNumber {
        file: String,
        line: usize,
        token: String,
    },

    #[error("Formula error: {message}")]
    Formula { message: String },

    #[error("Aggregation error: {reason}")]
    Aggregation { reason: String },

    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ProteusError {
    /// Create a formula error with context.
    pub fn formula(message: impl Into<String>) -> Self {
        Self::Formula {
            message: message.into(),
        }
    }

    /// Create an aggregation error with context.
    pub fn aggregation(reason: impl Into<String>) -> Self {
        Self::Aggregation {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProteusError>;
