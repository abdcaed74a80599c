//! Validation outcomes and structural divergences

use crate::table::{Cell, ColumnType};
use std::fmt;

/// The first structural difference between a result and the ground truth
#[derive(Debug, Clone, PartialEq)]
pub enum Divergence {
    /// A ground-truth column is absent from the result
    MissingColumn {
        /// Column name
        name: String,
        /// Zero-based position in the ground truth
        position: usize,
    },

    /// The result has a column the ground truth does not
    UnexpectedColumn {
        /// Column name
        name: String,
        /// Zero-based position in the result
        position: usize,
    },

    /// Same column set, different order
    ColumnOrder {
        /// Zero-based position of the first disagreement
        position: usize,
        /// Ground-truth column at that position
        expected: String,
        /// Result column at that position
        found: String,
    },

    /// A column is declared with a different type
    ColumnType {
        /// Column name
        column: String,
        /// Ground-truth type
        expected: ColumnType,
        /// Result type
        found: ColumnType,
    },

    /// Different number of rows
    RowCount {
        /// Ground-truth row count
        expected: usize,
        /// Result row count
        found: usize,
    },

    /// A cell differs
    Value {
        /// Zero-based row index
        row: usize,
        /// Column name
        column: String,
        /// Ground-truth cell
        expected: Cell,
        /// Result cell
        found: Cell,
    },
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::MissingColumn { name, position } => write!(
                f,
                "missing column '{}' (expected at position {})",
                name, position
            ),
            Divergence::UnexpectedColumn { name, position } => write!(
                f,
                "unexpected column '{}' at position {}",
                name, position
            ),
            Divergence::ColumnOrder { position, expected, found } => write!(
                f,
                "column order differs at position {}: expected '{}', found '{}'",
                position, expected, found
            ),
            Divergence::ColumnType { column, expected, found } => write!(
                f,
                "column '{}' has type {} but {} is expected",
                column, found, expected
            ),
            Divergence::RowCount { expected, found } => {
                write!(f, "expected {} rows, found {}", expected, found)
            }
            Divergence::Value { row, column, expected, found } => write!(
                f,
                "row {}, column '{}': expected {}, found {}",
                row, column, expected, found
            ),
        }
    }
}

/// Result of comparing a table against the ground truth
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Exact structural match
    Pass,

    /// At least one divergence
    Fail {
        /// First divergence, in check order
        first: Divergence,
        /// Number of divergences found by the full comparison
        total: usize,
    },
}

impl ValidationOutcome {
    /// Whether validation passed
    pub fn is_pass(&self) -> bool {
        matches!(self, ValidationOutcome::Pass)
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationOutcome::Pass => f.write_str("pass"),
            ValidationOutcome::Fail { first, total } if *total > 1 => {
                write!(f, "{} ({} divergences in total)", first, total)
            }
            ValidationOutcome::Fail { first, .. } => write!(f, "{}", first),
        }
    }
}
