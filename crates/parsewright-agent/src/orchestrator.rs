//! The generate, execute, validate loop and its fallback path

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::generator::CandidateGenerator;
use crate::prompt::truncate_chars;
use parsewright_domain::traits::{DocumentReader, FallbackExtractor, LlmProvider, Sandbox};
use parsewright_domain::{
    ArtifactOrigin, Attempt, AttemptOutcome, Divergence, FeedbackHistory, ParserArtifact, ProfileId,
    RunId, TabularResult, TargetProfile, ValidationOutcome,
};
use parsewright_store::{ArtifactMeta, ArtifactStore, AttemptSummary, GroundTruthStore};
use parsewright_validator::validate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Final outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A generated candidate passed validation
    Succeeded(ParserArtifact),

    /// Every attempt failed and the fallback's output passed validation
    SucceededViaFallback(ParserArtifact),

    /// Every attempt failed and so did the fallback
    Aborted(AbortReason),
}

impl RunOutcome {
    /// The accepted artifact, if any
    pub fn artifact(&self) -> Option<&ParserArtifact> {
        match self {
            RunOutcome::Succeeded(artifact) | RunOutcome::SucceededViaFallback(artifact) => Some(artifact),
            RunOutcome::Aborted(_) => None,
        }
    }

    /// Whether an artifact was accepted
    pub fn is_success(&self) -> bool {
        self.artifact().is_some()
    }
}

/// Why the fallback could not rescue a run
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    /// The fallback ran but its output diverged from the ground truth
    FallbackMismatch {
        /// First divergence
        first: Divergence,
        /// Total divergences
        total: usize,
    },

    /// The fallback could not produce a table
    FallbackError(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::FallbackMismatch { first, total } => write!(
                f,
                "fallback output does not match the ground truth: {} ({} divergences)",
                first, total
            ),
            AbortReason::FallbackError(msg) => write!(f, "fallback extraction failed: {}", msg),
        }
    }
}

/// Everything that happened during one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,

    /// Profile the run targeted
    pub profile: ProfileId,

    /// Every attempt, in order
    pub attempts: Vec<Attempt>,

    /// Whether the fallback extractor ran
    pub fallback_invoked: bool,

    /// Final outcome
    pub outcome: RunOutcome,

    /// Where the artifact was persisted, for successful runs
    pub artifact_dir: Option<PathBuf>,
}

impl RunReport {
    /// Whether an artifact was persisted
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

enum RunState {
    Looping { attempt: u32 },
    ExhaustedFallback,
    Succeeded(ParserArtifact),
    Aborted(AbortReason),
}

/// Drives one profile from nothing to a persisted artifact
///
/// The loop is sequential: an attempt completes before the next starts, and
/// the feedback history is the only state carried between attempts.
pub struct Orchestrator<L, S, F>
where
    L: LlmProvider,
    S: Sandbox,
    F: FallbackExtractor + 'static,
{
    generator: CandidateGenerator<L>,
    sandbox: S,
    fallback: Arc<F>,
    reader: Option<Arc<dyn DocumentReader>>,
    ground_truth: GroundTruthStore,
    artifacts: ArtifactStore,
    config: AgentConfig,
}

impl<L, S, F> Orchestrator<L, S, F>
where
    L: LlmProvider,
    S: Sandbox,
    F: FallbackExtractor + 'static,
{
    /// Create a new Orchestrator
    pub fn new(
        provider: L,
        sandbox: S,
        fallback: F,
        ground_truth: GroundTruthStore,
        artifacts: ArtifactStore,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        config.validate().map_err(AgentError::Config)?;
        Ok(Self {
            generator: CandidateGenerator::new(provider, &config),
            sandbox,
            fallback: Arc::new(fallback),
            reader: None,
            ground_truth,
            artifacts,
            config,
        })
    }

    /// Read the sample document through `reader` to show its text in prompts
    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop for one profile
    ///
    /// Returns an error only when the run cannot be evaluated at all: the
    /// ground truth is unreadable or the accepted artifact cannot be written.
    pub async fn run(&self, profile: &TargetProfile) -> Result<RunReport, AgentError> {
        let run_id = RunId::new();
        let truth = self.ground_truth.load(profile).map_err(AgentError::GroundTruth)?;
        let excerpt = self.read_excerpt(profile).await;

        info!(
            run_id = %run_id,
            profile = %profile.id(),
            columns = truth.columns().len(),
            rows = truth.row_count(),
            max_attempts = self.config.max_attempts,
            "starting run"
        );

        let mut history = FeedbackHistory::new();
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut fallback_invoked = false;
        let mut state = RunState::Looping { attempt: 1 };

        let outcome = loop {
            state = match state {
                RunState::Looping { attempt } => {
                    let (record, passing) = self
                        .attempt(attempt, profile, &truth, excerpt.as_deref(), &history)
                        .await;

                    info!(
                        run_id = %run_id,
                        attempt = record.number(),
                        outcome = record.outcome().failure_kind().map_or("passed", |k| k.as_str()),
                        elapsed_ms = record.elapsed().as_millis() as u64,
                        "attempt finished"
                    );

                    let next = match (passing, record.source()) {
                        (Some(result), Some(source)) => RunState::Succeeded(ParserArtifact {
                            run_id,
                            profile: profile.id().clone(),
                            origin: ArtifactOrigin::Generated { attempt },
                            source: source.to_string(),
                            result,
                        }),
                        _ if attempt >= self.config.max_attempts => RunState::ExhaustedFallback,
                        _ => RunState::Looping { attempt: attempt + 1 },
                    };

                    if let Some(feedback) = record.feedback() {
                        history = history.append(feedback);
                    }
                    attempts.push(record);
                    next
                }
                RunState::ExhaustedFallback => {
                    fallback_invoked = true;
                    info!(run_id = %run_id, attempts = attempts.len(), "attempts exhausted, running fallback");

                    match self.run_fallback(profile, &truth).await {
                        Ok(result) => RunState::Succeeded(ParserArtifact {
                            run_id,
                            profile: profile.id().clone(),
                            origin: ArtifactOrigin::Fallback,
                            source: self.fallback.source(),
                            result,
                        }),
                        Err(reason) => RunState::Aborted(reason),
                    }
                }
                RunState::Succeeded(artifact) => match artifact.origin {
                    ArtifactOrigin::Generated { .. } => break RunOutcome::Succeeded(artifact),
                    ArtifactOrigin::Fallback => break RunOutcome::SucceededViaFallback(artifact),
                },
                RunState::Aborted(reason) => {
                    warn!(run_id = %run_id, reason = %reason, "run aborted");
                    break RunOutcome::Aborted(reason);
                }
            };
        };

        // Persisting is the last action of a successful run
        let artifact_dir = match outcome.artifact() {
            Some(artifact) => {
                let meta = ArtifactMeta {
                    source_extension: match artifact.origin {
                        ArtifactOrigin::Generated { .. } => self.sandbox.script_extension().to_string(),
                        ArtifactOrigin::Fallback => "toml".to_string(),
                    },
                    model: match artifact.origin {
                        ArtifactOrigin::Generated { .. } => Some(self.generator.model_name().to_string()),
                        ArtifactOrigin::Fallback => None,
                    },
                    attempts: attempts.iter().map(AttemptSummary::from).collect(),
                };
                Some(self.artifacts.persist(artifact, &meta).map_err(AgentError::Persist)?)
            }
            None => None,
        };

        info!(
            run_id = %run_id,
            profile = %profile.id(),
            attempts = attempts.len(),
            fallback = fallback_invoked,
            success = outcome.is_success(),
            "run finished"
        );

        Ok(RunReport {
            run_id,
            profile: profile.id().clone(),
            attempts,
            fallback_invoked,
            outcome,
            artifact_dir,
        })
    }

    /// One generate, execute, validate cycle
    ///
    /// Returns the recorded attempt and, when it passed, the validated table.
    async fn attempt(
        &self,
        number: u32,
        profile: &TargetProfile,
        truth: &TabularResult,
        excerpt: Option<&str>,
        history: &FeedbackHistory,
    ) -> (Attempt, Option<TabularResult>) {
        let started = Instant::now();

        let source = match self.generator.generate(profile.id(), truth, excerpt, history).await {
            Ok(source) => source,
            Err(e) => {
                warn!(attempt = number, error = %e, "generation unavailable");
                let outcome = AttemptOutcome::GenerationUnavailable(e.to_string());
                return (Attempt::new(number, None, outcome, started.elapsed()), None);
            }
        };

        let (outcome, passing) = match self.sandbox.execute(&source, profile.sample_document()).await {
            Err(fault) => (AttemptOutcome::ExecutionFault(fault), None),
            Ok(result) => match validate(&result, truth) {
                ValidationOutcome::Pass => (AttemptOutcome::Passed, Some(result)),
                ValidationOutcome::Fail { first, total } => {
                    (AttemptOutcome::ValidationMismatch { first, total }, None)
                }
            },
        };

        (Attempt::new(number, Some(source), outcome, started.elapsed()), passing)
    }

    async fn run_fallback(&self, profile: &TargetProfile, truth: &TabularResult) -> Result<TabularResult, AbortReason> {
        let fallback = Arc::clone(&self.fallback);
        let document = profile.sample_document().to_path_buf();

        let extracted = tokio::task::spawn_blocking(move || fallback.extract(&document).map_err(|e| e.to_string()))
            .await
            .map_err(|e| AbortReason::FallbackError(format!("fallback task failed: {}", e)))?;
        let result = extracted.map_err(AbortReason::FallbackError)?;

        match validate(&result, truth) {
            ValidationOutcome::Pass => Ok(result),
            ValidationOutcome::Fail { first, total } => Err(AbortReason::FallbackMismatch { first, total }),
        }
    }

    /// Sample-document text for prompts; unreadable documents only drop it
    async fn read_excerpt(&self, profile: &TargetProfile) -> Option<String> {
        let reader = self.reader.as_ref().map(Arc::clone)?;
        if self.config.excerpt_chars == 0 {
            return None;
        }

        let document = profile.sample_document().to_path_buf();
        let read = tokio::task::spawn_blocking(move || reader.read_text(&document)).await;
        match read {
            Ok(Ok(text)) => Some(truncate_chars(&text, self.config.excerpt_chars).to_string()),
            Ok(Err(e)) => {
                warn!(profile = %profile.id(), error = %e, "sample document unreadable, continuing without excerpt");
                None
            }
            Err(e) => {
                warn!(profile = %profile.id(), error = %e, "excerpt task failed, continuing without excerpt");
                None
            }
        }
    }
}
