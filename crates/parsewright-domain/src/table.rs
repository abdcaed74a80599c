//! Tabular results - the value every extraction routine produces
//!
//! A [`TabularResult`] is an ordered list of named, typed columns and an
//! ordered list of rows. Construction goes through [`TabularResult::new`],
//! which rejects anything that is not well-formed, so every value of this
//! type can be compared cell by cell without further checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free text (dates are carried as text)
    Text,

    /// Finite floating point number
    Number,
}

impl ColumnType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
        }
    }

    /// Parse a type name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "string" => Some(ColumnType::Text),
            "number" | "float" | "numeric" => Some(ColumnType::Number),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column header
    pub name: String,

    /// Declared cell type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Shorthand for a text column
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Shorthand for a number column
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }
}

/// A single cell value
///
/// On the wire a cell is a bare JSON value: `null`, a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value
    Null,

    /// Numeric value
    Number(f64),

    /// Text value
    Text(String),
}

impl Cell {
    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Whether this cell is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// The type this cell carries, `None` for `Null`
    pub fn cell_type(&self) -> Option<ColumnType> {
        match self {
            Cell::Null => None,
            Cell::Number(_) => Some(ColumnType::Number),
            Cell::Text(_) => Some(ColumnType::Text),
        }
    }

    /// Render the cell for a CSV field (`Null` becomes an empty field)
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Reasons a table is not well-formed
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// The table declares no columns
    NoColumns,

    /// Two columns share a name
    DuplicateColumn(String),

    /// A row has the wrong number of cells
    RowLength {
        /// Zero-based row index
        row: usize,
        /// Declared column count
        expected: usize,
        /// Cells present in the row
        found: usize,
    },

    /// A cell does not match its column's declared type
    CellType {
        /// Zero-based row index
        row: usize,
        /// Column name
        column: String,
        /// Declared type
        expected: ColumnType,
        /// Type carried by the cell
        found: ColumnType,
    },

    /// A number cell is NaN or infinite
    NonFinite {
        /// Zero-based row index
        row: usize,
        /// Column name
        column: String,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NoColumns => write!(f, "table declares no columns"),
            TableError::DuplicateColumn(name) => write!(f, "column '{}' is declared twice", name),
            TableError::RowLength { row, expected, found } => write!(
                f,
                "row {} has {} cells but {} columns are declared",
                row, found, expected
            ),
            TableError::CellType { row, column, expected, found } => write!(
                f,
                "row {}, column '{}': {} cell in a {} column",
                row, column, found, expected
            ),
            TableError::NonFinite { row, column } => {
                write!(f, "row {}, column '{}': number is not finite", row, column)
            }
        }
    }
}

impl std::error::Error for TableError {}

/// An ordered, typed table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularResult {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl TabularResult {
    /// Build a table, checking that it is well-formed
    ///
    /// Every row must have one cell per column, every non-null cell must
    /// carry its column's type, and numbers must be finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use parsewright_domain::{Cell, Column, TabularResult};
    ///
    /// let table = TabularResult::new(
    ///     vec![Column::text("Date"), Column::number("Balance")],
    ///     vec![vec![Cell::text("01-08-2024"), Cell::Number(1200.0)]],
    /// ).unwrap();
    /// assert_eq!(table.row_count(), 1);
    ///
    /// let bad = TabularResult::new(vec![Column::number("Balance")], vec![vec![Cell::text("x")]]);
    /// assert!(bad.is_err());
    /// ```
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowLength {
                    row: row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            for (cell, column) in row.iter().zip(&columns) {
                if let Cell::Number(n) = cell {
                    if !n.is_finite() {
                        return Err(TableError::NonFinite {
                            row: row_idx,
                            column: column.name.clone(),
                        });
                    }
                }
                if let Some(found) = cell.cell_type() {
                    if found != column.column_type {
                        return Err(TableError::CellType {
                            row: row_idx,
                            column: column.name.clone(),
                            expected: column.column_type,
                            found,
                        });
                    }
                }
            }
        }

        Ok(Self { columns, rows })
    }

    /// Declared columns, in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows, in order
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names, in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// A copy holding at most the first `n` rows
    pub fn head(&self, n: usize) -> TabularResult {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for TabularResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawTable {
            columns: Vec<Column>,
            rows: Vec<Vec<Cell>>,
        }

        let raw = RawTable::deserialize(deserializer)?;
        TabularResult::new(raw.columns, raw.rows).map_err(serde::de::Error::custom)
    }
}
