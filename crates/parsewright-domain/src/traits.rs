//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the generation loop and the
//! infrastructure. Implementations live in other crates.

use crate::attempt::ExecutionFault;
use crate::table::TabularResult;
use std::fmt;
use std::future::Future;
use std::path::Path;

/// A request to a generative code-completion service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub system: String,

    /// User prompt
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Trait for generative code-completion services
///
/// Implemented by the infrastructure layer (parsewright-llm)
pub trait LlmProvider: Send + Sync {
    /// Error type for service calls
    type Error: fmt::Display + Send;

    /// Request a completion; the response is opaque, untrusted text
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Model name, for logs and manifests
    fn model_name(&self) -> &str;
}

/// Trait for isolated execution of candidate extraction routines
///
/// Implemented by the infrastructure layer (parsewright-sandbox). Every
/// failure of the candidate is returned as an [`ExecutionFault`]; nothing
/// the candidate does may escape as a panic or an unrelated error.
pub trait Sandbox: Send + Sync {
    /// Run `source` against `document` and decode its tabular output
    fn execute(
        &self,
        source: &str,
        document: &Path,
    ) -> impl Future<Output = Result<TabularResult, ExecutionFault>> + Send;

    /// File extension candidates are written with (e.g. `py`)
    fn script_extension(&self) -> &str;
}

/// Trait for turning a document into layout-preserving text
///
/// Implemented by the infrastructure layer (parsewright-fallback)
pub trait DocumentReader: Send + Sync {
    /// Read the document's text
    fn read_text(&self, document: &Path) -> std::io::Result<String>;
}

/// Trait for the fixed extraction routine used once the retry budget is spent
///
/// Implemented by parsewright-fallback. Extraction must be deterministic.
pub trait FallbackExtractor: Send + Sync {
    /// Error type for extraction
    type Error: fmt::Display + Send;

    /// Extract a table from the document
    fn extract(&self, document: &Path) -> Result<TabularResult, Self::Error>;

    /// Source text persisted when this routine is accepted
    fn source(&self) -> String;
}
