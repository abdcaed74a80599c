//! Attempts and the feedback they leave behind
//!
//! One [`Attempt`] records a single generate/execute/validate cycle. A failed
//! attempt yields a [`Feedback`] entry, and the entries of a run form a
//! [`FeedbackHistory`] that only ever grows. Appending returns a new history
//! value, so the orchestrator threads it through the loop explicitly.

use crate::validation::Divergence;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Failure category of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The generative service call failed or timed out
    GenerationUnavailable,

    /// The candidate raised an error, hung, or produced malformed output
    ExecutionFault,

    /// The candidate produced a well-formed but incorrect table
    ValidationMismatch,
}

impl FailureKind {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::GenerationUnavailable => "generation_unavailable",
            FailureKind::ExecutionFault => "execution_fault",
            FailureKind::ValidationMismatch => "validation_mismatch",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured failure from running a candidate
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionFault {
    /// The candidate source was empty
    EmptySource,

    /// The interpreter could not be started
    Spawn(String),

    /// The candidate exited unsuccessfully
    Crashed {
        /// Exit code, `None` when killed by a signal
        exit_code: Option<i32>,
        /// Last lines of stderr
        stderr_tail: String,
    },

    /// The candidate exceeded the wall-clock limit
    TimedOut {
        /// The limit that was exceeded
        limit: Duration,
    },

    /// The candidate wrote more output than allowed
    OutputTooLarge {
        /// The limit that was exceeded, in bytes
        limit_bytes: usize,
    },

    /// The candidate's output is not a well-formed table
    MalformedOutput(String),
}

impl fmt::Display for ExecutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionFault::EmptySource => write!(f, "candidate source is empty"),
            ExecutionFault::Spawn(msg) => write!(f, "could not start interpreter: {}", msg),
            ExecutionFault::Crashed { exit_code: Some(code), stderr_tail } => {
                write!(f, "candidate exited with status {}: {}", code, stderr_tail)
            }
            ExecutionFault::Crashed { exit_code: None, stderr_tail } => {
                write!(f, "candidate was terminated by a signal: {}", stderr_tail)
            }
            ExecutionFault::TimedOut { limit } => {
                write!(f, "candidate did not finish within {:?}", limit)
            }
            ExecutionFault::OutputTooLarge { limit_bytes } => {
                write!(f, "candidate wrote more than {} bytes to stdout", limit_bytes)
            }
            ExecutionFault::MalformedOutput(msg) => {
                write!(f, "candidate output is not a well-formed table: {}", msg)
            }
        }
    }
}

/// What happened in one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Output matched the ground truth
    Passed,

    /// No candidate could be obtained
    GenerationUnavailable(String),

    /// The candidate failed inside the sandbox
    ExecutionFault(ExecutionFault),

    /// The candidate ran but its output diverged from the ground truth
    ValidationMismatch {
        /// First divergence
        first: Divergence,
        /// Total divergences
        total: usize,
    },
}

impl AttemptOutcome {
    /// Failure category, `None` for a pass
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AttemptOutcome::Passed => None,
            AttemptOutcome::GenerationUnavailable(_) => Some(FailureKind::GenerationUnavailable),
            AttemptOutcome::ExecutionFault(_) => Some(FailureKind::ExecutionFault),
            AttemptOutcome::ValidationMismatch { .. } => Some(FailureKind::ValidationMismatch),
        }
    }

    /// Human-readable description of the failure, `None` for a pass
    pub fn describe(&self) -> Option<String> {
        match self {
            AttemptOutcome::Passed => None,
            AttemptOutcome::GenerationUnavailable(msg) => Some(msg.clone()),
            AttemptOutcome::ExecutionFault(fault) => Some(fault.to_string()),
            AttemptOutcome::ValidationMismatch { first, total } if *total > 1 => {
                Some(format!("{} ({} divergences in total)", first, total))
            }
            AttemptOutcome::ValidationMismatch { first, .. } => Some(first.to_string()),
        }
    }
}

/// One generate/execute/validate cycle
///
/// Created once by the orchestrator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    number: u32,
    source: Option<String>,
    outcome: AttemptOutcome,
    elapsed: Duration,
}

impl Attempt {
    /// Record an attempt
    pub fn new(number: u32, source: Option<String>, outcome: AttemptOutcome, elapsed: Duration) -> Self {
        Self {
            number,
            source,
            outcome,
            elapsed,
        }
    }

    /// Sequence number, starting at 1
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Generated source, absent when generation failed
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Outcome of the attempt
    pub fn outcome(&self) -> &AttemptOutcome {
        &self.outcome
    }

    /// Wall-clock time spent
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the attempt passed validation
    pub fn passed(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Passed)
    }

    /// Feedback for the next generation request, `None` for a pass
    pub fn feedback(&self) -> Option<Feedback> {
        let category = self.outcome.failure_kind()?;
        let message = self.outcome.describe()?;
        Some(Feedback {
            attempt: self.number,
            category,
            message,
        })
    }
}

/// A failure description fed back into the next generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    /// Attempt that produced this feedback
    pub attempt: u32,

    /// Failure category
    pub category: FailureKind,

    /// Description of what went wrong
    pub message: String,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {} [{}]: {}", self.attempt, self.category, self.message)
    }
}

/// Ordered, append-only list of feedback entries for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackHistory {
    entries: Vec<Feedback>,
}

impl FeedbackHistory {
    /// An empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// A new history with `entry` appended; `self` is left untouched
    ///
    /// # Examples
    ///
    /// ```
    /// use parsewright_domain::{Feedback, FeedbackHistory, FailureKind};
    ///
    /// let empty = FeedbackHistory::new();
    /// let one = empty.append(Feedback {
    ///     attempt: 1,
    ///     category: FailureKind::ExecutionFault,
    ///     message: "boom".to_string(),
    /// });
    /// assert!(empty.is_empty());
    /// assert_eq!(one.len(), 1);
    /// ```
    pub fn append(&self, entry: Feedback) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    /// Entries in the order they were recorded
    pub fn entries(&self) -> &[Feedback] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(attempt: u32, category: FailureKind) -> Feedback {
        Feedback {
            attempt,
            category,
            message: format!("failure {}", attempt),
        }
    }

    #[test]
    fn test_append_preserves_original() {
        let h0 = FeedbackHistory::new();
        let h1 = h0.append(feedback(1, FailureKind::GenerationUnavailable));
        let h2 = h1.append(feedback(2, FailureKind::ExecutionFault));

        assert_eq!(h0.len(), 0);
        assert_eq!(h1.len(), 1);
        assert_eq!(h2.len(), 2);
        assert_eq!(h2.entries()[0], h1.entries()[0]);
        assert_eq!(h2.entries()[1].attempt, 2);
    }

    #[test]
    fn test_passed_attempt_has_no_feedback() {
        let attempt = Attempt::new(1, Some("print()".to_string()), AttemptOutcome::Passed, Duration::ZERO);
        assert!(attempt.passed());
        assert!(attempt.feedback().is_none());
    }

    #[test]
    fn test_mismatch_feedback_carries_divergence() {
        let attempt = Attempt::new(
            2,
            Some("src".to_string()),
            AttemptOutcome::ValidationMismatch {
                first: Divergence::MissingColumn {
                    name: "Balance".to_string(),
                    position: 3,
                },
                total: 1,
            },
            Duration::from_millis(10),
        );

        let fb = attempt.feedback().unwrap();
        assert_eq!(fb.attempt, 2);
        assert_eq!(fb.category, FailureKind::ValidationMismatch);
        assert!(fb.message.contains("Balance"));
    }

    #[test]
    fn test_fault_feedback() {
        let attempt = Attempt::new(
            3,
            Some("sleep".to_string()),
            AttemptOutcome::ExecutionFault(ExecutionFault::TimedOut {
                limit: Duration::from_secs(5),
            }),
            Duration::from_secs(5),
        );

        let fb = attempt.feedback().unwrap();
        assert_eq!(fb.category, FailureKind::ExecutionFault);
        assert!(fb.message.contains("did not finish"));
        assert_eq!(fb.to_string(), format!("attempt 3 [execution_fault]: {}", fb.message));
    }

    #[test]
    fn test_generation_unavailable_has_no_source() {
        let attempt = Attempt::new(
            1,
            None,
            AttemptOutcome::GenerationUnavailable("request timed out".to_string()),
            Duration::ZERO,
        );
        assert!(attempt.source().is_none());
        assert_eq!(attempt.feedback().unwrap().category, FailureKind::GenerationUnavailable);
    }
}
