//! Parser artifacts - what a successful run leaves behind

use crate::profile::ProfileId;
use crate::table::TabularResult;
use std::fmt;

/// Unique identifier for a run based on UUIDv7
///
/// UUIDv7 keeps run ids chronologically sortable, which makes manifests from
/// successive runs of the same profile easy to order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u128);

impl RunId {
    /// Generate a new UUIDv7-based RunId
    ///
    /// # Examples
    ///
    /// ```
    /// use parsewright_domain::RunId;
    ///
    /// let id = RunId::new();
    /// assert_eq!(id.to_string().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Where an accepted extraction routine came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    /// Generated by the language model on the given attempt
    Generated {
        /// Attempt number that passed
        attempt: u32,
    },

    /// The deterministic fallback extractor
    Fallback,
}

impl ArtifactOrigin {
    /// Get the origin name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactOrigin::Generated { .. } => "generated",
            ArtifactOrigin::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactOrigin::Generated { attempt } => write!(f, "generated (attempt {})", attempt),
            ArtifactOrigin::Fallback => f.write_str("fallback"),
        }
    }
}

/// The accepted extraction routine and its verification output
#[derive(Debug, Clone, PartialEq)]
pub struct ParserArtifact {
    /// Run that produced the artifact
    pub run_id: RunId,

    /// Profile the routine was accepted for
    pub profile: ProfileId,

    /// Generated or fallback
    pub origin: ArtifactOrigin,

    /// Source text of the routine
    pub source: String,

    /// The routine's output on the sample document, which matched the ground truth
    pub result: TabularResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_ordered() {
        let a = RunId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = RunId::new();
        assert!(a < b);
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(ArtifactOrigin::Generated { attempt: 2 }.to_string(), "generated (attempt 2)");
        assert_eq!(ArtifactOrigin::Fallback.as_str(), "fallback");
    }
}
