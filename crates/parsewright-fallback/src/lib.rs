//! Parsewright Fallback
//!
//! The fixed extraction routine used once the generation budget is spent,
//! and the document readers it (and the prompt excerpt) rely on.
//!
//! # Pipeline
//!
//! ```text
//! document → DocumentReader (pdftotext -layout) → layout text → LayoutRules → TabularResult
//! ```
//!
//! The rules are plain data. When the fallback output matches the ground
//! truth, their TOML form is persisted as the artifact source, so a later
//! run can reproduce the extraction exactly.
//!
//! # Example Usage
//!
//! ```no_run
//! use parsewright_domain::traits::FallbackExtractor;
//! use parsewright_fallback::{AutoReader, LayoutExtractor, LayoutRules, ReaderConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let reader = Arc::new(AutoReader::new(&ReaderConfig::default()));
//! let extractor = LayoutExtractor::new(LayoutRules::default(), reader).unwrap();
//! let table = extractor.extract(Path::new("data/icici/icici_sample.pdf")).unwrap();
//! println!("{} transactions", table.row_count());
//! ```

#![warn(missing_docs)]

mod error;
mod layout;
mod reader;

pub use error::FallbackError;
pub use layout::{LayoutExtractor, LayoutRules};
pub use reader::{AutoReader, PdfTextReader, PlainTextReader, ReaderConfig};
