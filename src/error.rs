//! Error handling for bankfeed
//!
//! Defines the user-facing failure modes of a statement import and
//! establishes a unified Result type using anyhow for context chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a statement import
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("file is not valid {0} text")]
    Undecodable(String),

    #[error("required column '{column}' not found (expected a header named '{expected}')")]
    MissingColumn { column: String, expected: String },

    #[error("column '{0}' appears more than once after header normalization")]
    DuplicateColumn(String),

    #[error("line {line}: invalid date '{value}' in column '{column}' (format {format})")]
    InvalidDate {
        line: usize,
        column: String,
        value: String,
        format: String,
    },

    #[error("line {line}: invalid amount '{value}'")]
    InvalidAmount { line: usize, value: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for import operations
pub type Result<T, E = anyhow::Error> = anyhow::Result<T, E>;
