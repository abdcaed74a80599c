//! Target profiles - one document family per profile

use crate::table::Column;
use std::fmt;
use std::path::{Path, PathBuf};

/// Longest accepted profile identifier
pub const MAX_PROFILE_ID_LEN: usize = 64;

/// Identifier of a target profile (e.g. `icici`)
///
/// Profile identifiers key file-system locations, so they are restricted to
/// lowercase ASCII letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(String);

impl ProfileId {
    /// Parse a profile identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use parsewright_domain::ProfileId;
    ///
    /// assert!(ProfileId::parse("icici").is_ok());
    /// assert!(ProfileId::parse("../etc").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("Profile id must not be empty".to_string());
        }
        if s.len() > MAX_PROFILE_ID_LEN {
            return Err(format!(
                "Profile id '{}' exceeds {} characters",
                s, MAX_PROFILE_ID_LEN
            ));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(format!(
                "Profile id '{}' may only contain a-z, 0-9, '_' and '-'",
                s
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document family: its sample document and its ground-truth dataset
///
/// Immutable once resolved; a run only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProfile {
    id: ProfileId,
    sample_document: PathBuf,
    ground_truth: PathBuf,
    schema: Option<Vec<Column>>,
}

impl TargetProfile {
    /// Create a profile from its parts
    pub fn new(
        id: ProfileId,
        sample_document: impl Into<PathBuf>,
        ground_truth: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            sample_document: sample_document.into(),
            ground_truth: ground_truth.into(),
            schema: None,
        }
    }

    /// Attach an explicitly declared column schema
    pub fn with_schema(mut self, schema: Vec<Column>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Profile identifier
    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    /// Path of the sample document
    pub fn sample_document(&self) -> &Path {
        &self.sample_document
    }

    /// Path of the ground-truth dataset
    pub fn ground_truth(&self) -> &Path {
        &self.ground_truth
    }

    /// Declared column schema, if the profile has one
    pub fn schema(&self) -> Option<&[Column]> {
        self.schema.as_deref()
    }
}
