//! CSV encoding of tables

use crate::StoreError;
use parsewright_domain::{Cell, Column, ColumnType, TabularResult};
use std::path::Path;

/// Read a CSV file with a header row into a table
///
/// Empty fields become `Null`. With `schema`, the header must list the
/// declared columns in order and number fields must parse. Without it, a
/// column is `number` when every non-empty field parses as a finite number.
pub fn read_table(path: &Path, schema: Option<&[Column]>) -> Result<TabularResult, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut raw: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        raw.push(record?.iter().map(str::to_string).collect());
    }

    let columns = match schema {
        Some(declared) => {
            let declared_names: Vec<&str> = declared.iter().map(|c| c.name.as_str()).collect();
            if declared_names != headers.iter().map(String::as_str).collect::<Vec<_>>() {
                return Err(StoreError::InvalidData(format!(
                    "{}: header {:?} does not match declared columns {:?}",
                    path.display(),
                    headers,
                    declared_names
                )));
            }
            declared.to_vec()
        }
        None => infer_columns(&headers, &raw),
    };

    let mut rows = Vec::with_capacity(raw.len());
    for (row_idx, fields) in raw.iter().enumerate() {
        let mut row = Vec::with_capacity(columns.len());
        for (field, column) in fields.iter().zip(&columns) {
            row.push(parse_cell(field, column).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "{}: row {}, column '{}': '{}' is not a number",
                    path.display(),
                    row_idx,
                    column.name,
                    field
                ))
            })?);
        }
        rows.push(row);
    }

    TabularResult::new(columns, rows).map_err(|e| StoreError::InvalidData(format!("{}: {}", path.display(), e)))
}

/// Write a table as CSV with a header row
pub fn write_table(path: &Path, table: &TabularResult) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(Cell::to_field))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn infer_columns(headers: &[String], rows: &[Vec<String>]) -> Vec<Column> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let numeric = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .filter(|field| !field.trim().is_empty())
                .all(|field| parse_number(field).is_some());
            let column_type = if numeric { ColumnType::Number } else { ColumnType::Text };
            Column::new(name.clone(), column_type)
        })
        .collect()
}

fn parse_cell(field: &str, column: &Column) -> Option<Cell> {
    if field.trim().is_empty() {
        return Some(Cell::Null);
    }
    match column.column_type {
        ColumnType::Text => Some(Cell::text(field)),
        ColumnType::Number => parse_number(field).map(Cell::Number),
    }
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
