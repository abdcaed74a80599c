//! Fallback error types

use parsewright_domain::TableError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during fallback extraction
#[derive(Error, Debug)]
pub enum FallbackError {
    /// The rules do not compile
    #[error("Invalid layout rules: {0}")]
    InvalidRules(String),

    /// The document could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Document path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// No line matched the transaction rules
    #[error("No transaction lines found in {0}")]
    NoTransactions(PathBuf),

    /// The extracted rows do not form a well-formed table
    #[error("Extracted table is malformed: {0}")]
    Table(#[from] TableError),
}
