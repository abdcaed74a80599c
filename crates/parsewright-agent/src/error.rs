//! Error types for the generation loop

use parsewright_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop a run from being evaluated at all
#[derive(Error, Debug)]
pub enum AgentError {
    /// The ground truth could not be loaded
    #[error("Failed to load ground truth: {0}")]
    GroundTruth(#[source] StoreError),

    /// The accepted artifact could not be written
    #[error("Failed to persist artifact: {0}")]
    Persist(#[source] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why no candidate could be obtained for an attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The service did not answer in time
    #[error("generation request timed out after {0:?}")]
    Timeout(Duration),

    /// The service call failed
    #[error("generation request failed: {0}")]
    Service(String),
}
