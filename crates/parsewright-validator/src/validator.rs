//! Table comparison logic

use parsewright_domain::{Column, Divergence, TabularResult, ValidationOutcome};
use std::collections::HashMap;
use tracing::debug;

/// Every divergence between a result and the ground truth, in check order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    /// Divergences found (empty when the tables match)
    pub divergences: Vec<Divergence>,
}

impl ValidationReport {
    /// Collapse the report into a first-divergence outcome
    pub fn into_outcome(self) -> ValidationOutcome {
        let total = self.divergences.len();
        match self.divergences.into_iter().next() {
            None => ValidationOutcome::Pass,
            Some(first) => ValidationOutcome::Fail { first, total },
        }
    }
}

/// Validate a result against the ground truth
pub fn validate(result: &TabularResult, ground_truth: &TabularResult) -> ValidationOutcome {
    let outcome = compare(result, ground_truth).into_outcome();
    if let ValidationOutcome::Fail { first, total } = &outcome {
        debug!(total, first = %first, "validation failed");
    }
    outcome
}

/// Run the full comparison and collect every divergence
pub fn compare(result: &TabularResult, ground_truth: &TabularResult) -> ValidationReport {
    let mut divergences = Vec::new();
    let found_columns = index_by_name(result.columns());
    let expected_columns = index_by_name(ground_truth.columns());

    // 1. Columns the ground truth has but the result lacks
    for (position, column) in ground_truth.columns().iter().enumerate() {
        if !found_columns.contains_key(column.name.as_str()) {
            divergences.push(Divergence::MissingColumn {
                name: column.name.clone(),
                position,
            });
        }
    }

    // 2. Columns the result adds
    for (position, column) in result.columns().iter().enumerate() {
        if !expected_columns.contains_key(column.name.as_str()) {
            divergences.push(Divergence::UnexpectedColumn {
                name: column.name.clone(),
                position,
            });
        }
    }

    // 3. Order, only meaningful once both sides hold the same set
    if divergences.is_empty() {
        let mismatch = ground_truth
            .columns()
            .iter()
            .zip(result.columns())
            .position(|(expected, found)| expected.name != found.name);
        if let Some(position) = mismatch {
            divergences.push(Divergence::ColumnOrder {
                position,
                expected: ground_truth.columns()[position].name.clone(),
                found: result.columns()[position].name.clone(),
            });
        }
    }

    // 4. Declared types of shared columns
    let mut comparable = Vec::new();
    for (expected_idx, expected) in ground_truth.columns().iter().enumerate() {
        let Some(&found_idx) = found_columns.get(expected.name.as_str()) else {
            continue;
        };
        let found = &result.columns()[found_idx];
        if found.column_type != expected.column_type {
            divergences.push(Divergence::ColumnType {
                column: expected.name.clone(),
                expected: expected.column_type,
                found: found.column_type,
            });
        } else {
            comparable.push((expected_idx, found_idx));
        }
    }

    // 5. Row count
    if result.row_count() != ground_truth.row_count() {
        divergences.push(Divergence::RowCount {
            expected: ground_truth.row_count(),
            found: result.row_count(),
        });
    }

    // 6. Cell values over the rows and columns both sides share
    for (row_idx, (expected_row, found_row)) in ground_truth.rows().iter().zip(result.rows()).enumerate() {
        for &(expected_idx, found_idx) in &comparable {
            let expected = &expected_row[expected_idx];
            let found = &found_row[found_idx];
            if expected != found {
                divergences.push(Divergence::Value {
                    row: row_idx,
                    column: ground_truth.columns()[expected_idx].name.clone(),
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }
    }

    ValidationReport { divergences }
}

fn index_by_name(columns: &[Column]) -> HashMap<&str, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| (column.name.as_str(), idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsewright_domain::{Cell, ColumnType};

    fn statement(rows: usize) -> TabularResult {
        let columns = vec![
            Column::text("Date"),
            Column::text("Description"),
            Column::number("Amount"),
            Column::number("Balance"),
        ];
        let rows = (0..rows)
            .map(|i| {
                vec![
                    Cell::text(format!("0{}-08-2024", i + 1)),
                    Cell::text(format!("UPI payment {}", i)),
                    Cell::Number(100.0 + i as f64),
                    Cell::Number(5000.0 - i as f64 * 100.0),
                ]
            })
            .collect();
        TabularResult::new(columns, rows).unwrap()
    }

    fn drop_column(table: &TabularResult, name: &str) -> TabularResult {
        let keep: Vec<usize> = (0..table.columns().len())
            .filter(|&i| table.columns()[i].name != name)
            .collect();
        let columns = keep.iter().map(|&i| table.columns()[i].clone()).collect();
        let rows = table
            .rows()
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        TabularResult::new(columns, rows).unwrap()
    }

    #[test]
    fn test_identical_tables_pass() {
        let truth = statement(5);
        assert_eq!(validate(&truth, &truth), ValidationOutcome::Pass);
    }

    #[test]
    fn test_missing_column_reported_first() {
        let truth = statement(5);
        let result = drop_column(&truth, "Balance");

        match validate(&result, &truth) {
            ValidationOutcome::Fail { first, total } => {
                assert_eq!(
                    first,
                    Divergence::MissingColumn {
                        name: "Balance".to_string(),
                        position: 3
                    }
                );
                assert_eq!(total, 1);
            }
            ValidationOutcome::Pass => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_unexpected_column() {
        let truth = drop_column(&statement(2), "Amount");
        let result = statement(2);

        let report = compare(&result, &truth);
        assert_eq!(
            report.divergences[0],
            Divergence::UnexpectedColumn {
                name: "Amount".to_string(),
                position: 2
            }
        );
    }

    #[test]
    fn test_column_order() {
        let truth = TabularResult::new(
            vec![Column::text("Date"), Column::text("Description")],
            vec![vec![Cell::text("01-08-2024"), Cell::text("NEFT")]],
        )
        .unwrap();
        let result = TabularResult::new(
            vec![Column::text("Description"), Column::text("Date")],
            vec![vec![Cell::text("NEFT"), Cell::text("01-08-2024")]],
        )
        .unwrap();

        match validate(&result, &truth) {
            ValidationOutcome::Fail { first, total } => {
                assert!(matches!(first, Divergence::ColumnOrder { position: 0, .. }));
                // Values still line up by name
                assert_eq!(total, 1);
            }
            ValidationOutcome::Pass => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_numeric_as_text_is_a_type_mismatch() {
        let truth = TabularResult::new(vec![Column::number("Balance")], vec![vec![Cell::Number(10.0)]]).unwrap();
        let result = TabularResult::new(vec![Column::text("Balance")], vec![vec![Cell::text("10")]]).unwrap();

        match validate(&result, &truth) {
            ValidationOutcome::Fail { first, .. } => assert_eq!(
                first,
                Divergence::ColumnType {
                    column: "Balance".to_string(),
                    expected: ColumnType::Number,
                    found: ColumnType::Text,
                }
            ),
            ValidationOutcome::Pass => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_row_count_before_values() {
        let truth = statement(5);
        let result = statement(4);

        match validate(&result, &truth) {
            ValidationOutcome::Fail { first, total } => {
                assert_eq!(first, Divergence::RowCount { expected: 5, found: 4 });
                assert_eq!(total, 1);
            }
            ValidationOutcome::Pass => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_value_mismatch_counts_every_cell() {
        let truth = TabularResult::new(
            vec![Column::text("Description"), Column::number("Balance")],
            vec![
                vec![Cell::text("NEFT"), Cell::Number(1.0)],
                vec![Cell::text("IMPS"), Cell::Number(2.0)],
            ],
        )
        .unwrap();
        let result = TabularResult::new(
            vec![Column::text("Description"), Column::number("Balance")],
            vec![
                vec![Cell::text("NEFT"), Cell::Number(1.5)],
                vec![Cell::Null, Cell::Number(2.5)],
            ],
        )
        .unwrap();

        let report = compare(&result, &truth);
        assert_eq!(report.divergences.len(), 3);
        assert_eq!(
            report.divergences[0],
            Divergence::Value {
                row: 0,
                column: "Balance".to_string(),
                expected: Cell::Number(1.0),
                found: Cell::Number(1.5),
            }
        );
    }

    #[test]
    fn test_null_only_matches_null() {
        let truth = TabularResult::new(vec![Column::number("Debit")], vec![vec![Cell::Null]]).unwrap();
        let zero = TabularResult::new(vec![Column::number("Debit")], vec![vec![Cell::Number(0.0)]]).unwrap();

        assert!(validate(&truth, &truth).is_pass());
        assert!(!validate(&zero, &truth).is_pass());
    }

    #[test]
    fn test_report_into_outcome() {
        assert_eq!(ValidationReport::default().into_outcome(), ValidationOutcome::Pass);
    }
}
