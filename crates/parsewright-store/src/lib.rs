//! Parsewright Storage Layer
//!
//! File-system stores for the two durable inputs and outputs of a run.
//!
//! # Architecture
//!
//! - [`GroundTruthStore`] resolves profiles under the data directory and loads
//!   their known-correct CSV. It never writes.
//! - [`ArtifactStore`] persists accepted extraction routines together with
//!   their verification output and a JSON manifest, one directory per profile.
//!
//! ```text
//! data/<id>/<id>_sample.pdf          artifacts/<id>/parser.<ext>
//! data/<id>/<id>_sample.csv          artifacts/<id>/output.csv
//! data/<id>/profile.toml (optional)  artifacts/<id>/manifest.json
//! ```
//!
//! On Unix `artifacts/<id>` is a symlink into `artifacts/.versions/<id>/`.
//!
//! # Examples
//!
//! ```no_run
//! use parsewright_domain::ProfileId;
//! use parsewright_store::GroundTruthStore;
//!
//! let store = GroundTruthStore::new("data");
//! let profile = store.profile(&ProfileId::parse("icici").unwrap()).unwrap();
//! let truth = store.load(&profile).unwrap();
//! println!("{} rows", truth.row_count());
//! ```

#![warn(missing_docs)]

mod artifact;
mod csv_table;
mod ground_truth;

pub use artifact::{
    ArtifactMeta, ArtifactStore, AttemptSummary, Manifest, PersistedArtifact, MANIFEST_FILE, OUTPUT_FILE,
};
pub use csv_table::{read_table, write_table};
pub use ground_truth::{GroundTruthStore, ProfileOverrides};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// File-system error
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Profile or artifact not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// CSV could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Manifest could not be encoded or decoded
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Invalid `profile.toml`
    #[error("Invalid profile overrides in {path}: {message}")]
    Profile {
        /// File being parsed
        path: PathBuf,
        /// Parse error
        message: String,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
