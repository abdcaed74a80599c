//! Parsewright Domain Layer
//!
//! This crate contains the domain model shared by every other Parsewright crate.
//! It defines the values that flow through a generation run and the trait
//! boundaries behind which the infrastructure lives.
//!
//! ## Key Concepts
//!
//! - **Target profile**: one document family with its sample document and ground truth
//! - **Tabular result**: named, typed columns and ordered rows of typed cells
//! - **Attempt**: one generate/execute/validate cycle and its outcome
//! - **Feedback history**: append-only failure descriptions threaded through a run
//! - **Validation outcome**: pass, or the first structural divergence found
//! - **Parser artifact**: the accepted extraction routine and its verification output
//!
//! ## Architecture
//!
//! - Minimal dependencies (`uuid` for run identifiers, `serde` for the wire formats)
//! - No I/O, no async runtime
//! - Trait definitions for all external interactions live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod attempt;
pub mod profile;
pub mod table;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use artifact::{ArtifactOrigin, ParserArtifact, RunId};
pub use attempt::{Attempt, AttemptOutcome, ExecutionFault, FailureKind, Feedback, FeedbackHistory};
pub use profile::{ProfileId, TargetProfile};
pub use table::{Cell, Column, ColumnType, TableError, TabularResult};
pub use validation::{Divergence, ValidationOutcome};
