//! Parsewright Validator
//!
//! Compares an extracted table against the ground truth for its profile.
//!
//! The comparison is exact:
//! - Same column names in the same order
//! - Same declared column types
//! - Same row count
//! - Cell-by-cell equality in row order, without coercion
//!
//! Every divergence is counted, but only the first one (in the order of the
//! checks above) is carried into the outcome.
//!
//! # Examples
//!
//! ```
//! use parsewright_domain::{Cell, Column, TabularResult};
//! use parsewright_validator::validate;
//!
//! let truth = TabularResult::new(
//!     vec![Column::text("Date"), Column::number("Balance")],
//!     vec![vec![Cell::text("01-08-2024"), Cell::Number(1200.0)]],
//! ).unwrap();
//!
//! assert!(validate(&truth, &truth).is_pass());
//! ```

#![warn(missing_docs)]

mod validator;

pub use validator::{compare, validate, ValidationReport};
