//! Parsewright Agent
//!
//! Produces a working extraction routine for a document family by generating
//! candidates with a code-completion service, running them in a sandbox and
//! checking their output against the profile's ground truth.
//!
//! # Architecture
//!
//! ```text
//! GroundTruthStore → loop { CandidateGenerator → Sandbox → Validator } → ArtifactStore
//!                          └── attempts exhausted → FallbackExtractor → Validator ┘
//! ```
//!
//! # Run lifecycle
//!
//! - Each failed attempt (service unavailable, execution fault, validation
//!   mismatch) appends one entry to the feedback history, and the next request
//!   carries the whole history.
//! - A pass stops the loop immediately. After `max_attempts` failures the
//!   fallback extractor runs once and is validated the same way.
//! - The artifact is persisted as the last action of a successful run. An
//!   aborted run writes nothing.
//!
//! # Example Usage
//!
//! ```no_run
//! use parsewright_agent::{AgentConfig, Orchestrator, RunOutcome};
//! use parsewright_domain::ProfileId;
//! use parsewright_fallback::{AutoReader, LayoutExtractor, LayoutRules, ReaderConfig};
//! use parsewright_llm::ChatProvider;
//! use parsewright_sandbox::{SandboxConfig, SubprocessSandbox};
//! use parsewright_store::{ArtifactStore, GroundTruthStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = Arc::new(AutoReader::new(&ReaderConfig::default()));
//! let ground_truth = GroundTruthStore::new("data");
//! let profile = ground_truth.profile(&ProfileId::parse("icici")?)?;
//!
//! let orchestrator = Orchestrator::new(
//!     ChatProvider::groq(std::env::var("GROQ_API_KEY")?)?,
//!     SubprocessSandbox::new(SandboxConfig::default())?,
//!     LayoutExtractor::new(LayoutRules::default(), reader.clone())?,
//!     ground_truth,
//!     ArtifactStore::new("artifacts"),
//!     AgentConfig::default(),
//! )?
//! .with_reader(reader);
//!
//! let report = orchestrator.run(&profile).await?;
//! if let RunOutcome::Aborted(reason) = &report.outcome {
//!     println!("no parser: {}", reason);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod generator;
mod orchestrator;
mod prompt;
mod response;

#[cfg(test)]
mod tests;

pub use config::AgentConfig;
pub use error::{AgentError, GenerationError};
pub use generator::CandidateGenerator;
pub use orchestrator::{AbortReason, Orchestrator, RunOutcome, RunReport};
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
pub use response::extract_source;
