//! Persisted extraction routines
//!
//! Every persist writes its files into a hidden staging directory, which then
//! becomes an immutable version under `.versions/<id>/<run id>`. On Unix the
//! profile path `<root>/<id>` is a symlink to the live version and is replaced
//! with a single rename, so the profile path always exists and a crash leaves
//! the previous version live. [`ArtifactStore::load`] resolves the link once
//! and reads every file from that version, so one load never mixes runs.
//! Superseded versions are pruned after the swap; a load racing that prune
//! fails with an I/O error rather than returning mixed files.
//!
//! Elsewhere the profile path is a plain directory swapped with two renames,
//! which leaves a short window where it does not exist.

use crate::csv_table::{read_table, write_table};
use crate::StoreError;
use parsewright_domain::{Attempt, ArtifactOrigin, Column, ParserArtifact, ProfileId, TabularResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Verification output file name
pub const OUTPUT_FILE: &str = "output.csv";

/// Source file stem; the extension depends on the origin
const SOURCE_STEM: &str = "parser";

/// Hidden directory holding every persisted version
#[cfg(unix)]
const VERSIONS_DIR: &str = ".versions";

/// One line of the attempts summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// Attempt number
    pub number: u32,

    /// Failure category, absent for the passing attempt
    pub category: Option<String>,

    /// Failure description, absent for the passing attempt
    pub message: Option<String>,

    /// Wall-clock time spent (milliseconds)
    pub elapsed_ms: u64,
}

impl From<&Attempt> for AttemptSummary {
    fn from(attempt: &Attempt) -> Self {
        Self {
            number: attempt.number(),
            category: attempt.outcome().failure_kind().map(|k| k.as_str().to_string()),
            message: attempt.outcome().describe(),
            elapsed_ms: attempt.elapsed().as_millis() as u64,
        }
    }
}

/// Run details recorded next to the artifact
#[derive(Debug, Clone, Default)]
pub struct ArtifactMeta {
    /// Extension for the source file (`py`, `toml`, ...)
    pub source_extension: String,

    /// Model that generated the source, if any
    pub model: Option<String>,

    /// Every attempt of the run
    pub attempts: Vec<AttemptSummary>,
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Run that produced the artifact
    pub run_id: String,

    /// Profile id
    pub profile: String,

    /// `generated` or `fallback`
    pub origin: String,

    /// Passing attempt for generated artifacts
    pub attempt: Option<u32>,

    /// Model that generated the source
    pub model: Option<String>,

    /// Unix timestamp (seconds)
    pub created_at: u64,

    /// Source file name within the artifact directory
    pub source_file: String,

    /// Verification output file name
    pub output_file: String,

    /// Declared columns of the verification output
    pub columns: Vec<Column>,

    /// Verification output row count
    pub rows: usize,

    /// Summary of every attempt
    pub attempts: Vec<AttemptSummary>,
}

impl Manifest {
    /// The artifact origin recorded in the manifest
    pub fn artifact_origin(&self) -> Option<ArtifactOrigin> {
        match (self.origin.as_str(), self.attempt) {
            ("generated", Some(attempt)) => Some(ArtifactOrigin::Generated { attempt }),
            ("fallback", _) => Some(ArtifactOrigin::Fallback),
            _ => None,
        }
    }
}

/// An artifact read back from disk
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    /// Artifact directory
    pub dir: PathBuf,

    /// Parsed manifest
    pub manifest: Manifest,

    /// Source text
    pub source: String,

    /// Verification output
    pub output: TabularResult,
}

impl PersistedArtifact {
    /// Path of the source file
    pub fn source_path(&self) -> PathBuf {
        self.dir.join(&self.manifest.source_file)
    }
}

/// Artifact directories under a root
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`; the directory is created on first persist
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The artifacts root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a profile's artifact
    pub fn profile_dir(&self, id: &ProfileId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Persist an artifact, replacing any earlier one for the same profile
    pub fn persist(&self, artifact: &ParserArtifact, meta: &ArtifactMeta) -> Result<PathBuf, StoreError> {
        if meta.source_extension.is_empty() || !meta.source_extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StoreError::InvalidData(format!(
                "invalid source extension '{}'",
                meta.source_extension
            )));
        }

        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|e| StoreError::io(&self.root, e))?;

        let source_file = format!("{}.{}", SOURCE_STEM, meta.source_extension);
        let source_path = staging.path().join(&source_file);
        std::fs::write(&source_path, &artifact.source).map_err(|e| StoreError::io(&source_path, e))?;

        write_table(&staging.path().join(OUTPUT_FILE), &artifact.result)?;

        let manifest = Manifest {
            run_id: artifact.run_id.to_string(),
            profile: artifact.profile.to_string(),
            origin: artifact.origin.as_str().to_string(),
            attempt: match artifact.origin {
                ArtifactOrigin::Generated { attempt } => Some(attempt),
                ArtifactOrigin::Fallback => None,
            },
            model: meta.model.clone(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            source_file,
            output_file: OUTPUT_FILE.to_string(),
            columns: artifact.result.columns().to_vec(),
            rows: artifact.result.row_count(),
            attempts: meta.attempts.clone(),
        };
        let manifest_path = staging.path().join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(&manifest_path, json).map_err(|e| StoreError::io(&manifest_path, e))?;

        let target = self.profile_dir(&artifact.profile);
        self.publish(staging.path(), &artifact.profile, &manifest.run_id)?;

        info!(
            profile = %artifact.profile,
            origin = %artifact.origin,
            dir = %target.display(),
            "artifact persisted"
        );
        Ok(target)
    }

    /// Read a profile's artifact back
    pub fn load(&self, id: &ProfileId) -> Result<PersistedArtifact, StoreError> {
        let link = self.profile_dir(id);
        let dir = match std::fs::canonicalize(&link) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!("no artifact for profile '{}'", id)));
            }
            Err(e) => return Err(StoreError::io(&link, e)),
        };
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(StoreError::NotFound(format!("no artifact for profile '{}'", id)));
        }

        let text = std::fs::read_to_string(&manifest_path).map_err(|e| StoreError::io(&manifest_path, e))?;
        let manifest: Manifest = serde_json::from_str(&text)?;

        let source_path = dir.join(&manifest.source_file);
        let source = std::fs::read_to_string(&source_path).map_err(|e| StoreError::io(&source_path, e))?;
        let output = read_table(&dir.join(&manifest.output_file), Some(&manifest.columns))?;

        Ok(PersistedArtifact {
            dir,
            manifest,
            source,
            output,
        })
    }

    /// Move `staged` into the versions directory and point the profile link at it
    #[cfg(unix)]
    fn publish(&self, staged: &Path, id: &ProfileId, run_id: &str) -> Result<(), StoreError> {
        let versions = self.root.join(VERSIONS_DIR).join(id.as_str());
        std::fs::create_dir_all(&versions).map_err(|e| StoreError::io(&versions, e))?;
        let version = versions.join(run_id);
        std::fs::rename(staged, &version).map_err(|e| StoreError::io(&version, e))?;

        let target = self.profile_dir(id);
        // A plain directory here predates the link layout
        if let Ok(meta) = std::fs::symlink_metadata(&target) {
            if meta.is_dir() {
                std::fs::remove_dir_all(&target).map_err(|e| StoreError::io(&target, e))?;
            }
        }

        let link = self.root.join(format!(".link-{}", run_id));
        let relative = Path::new(VERSIONS_DIR).join(id.as_str()).join(run_id);
        std::os::unix::fs::symlink(&relative, &link).map_err(|e| StoreError::io(&link, e))?;
        if let Err(e) = std::fs::rename(&link, &target) {
            if let Err(cleanup) = std::fs::remove_file(&link) {
                warn!(error = %cleanup, link = %link.display(), "failed to remove unused link");
            }
            return Err(StoreError::io(&target, e));
        }

        prune_versions(&versions, run_id);
        Ok(())
    }

    /// Replace the profile directory with `staged` using renames only
    #[cfg(not(unix))]
    fn publish(&self, staged: &Path, id: &ProfileId, run_id: &str) -> Result<(), StoreError> {
        let target = self.profile_dir(id);
        let target = target.as_path();
        if !target.exists() {
            return std::fs::rename(staged, target).map_err(|e| StoreError::io(target, e));
        }

        let retired = self.root.join(format!(".retired-{}", run_id));
        std::fs::rename(target, &retired).map_err(|e| StoreError::io(target, e))?;

        if let Err(e) = std::fs::rename(staged, target) {
            if let Err(restore) = std::fs::rename(&retired, target) {
                warn!(error = %restore, dir = %retired.display(), "failed to restore previous artifact");
            }
            return Err(StoreError::io(target, e));
        }

        if let Err(e) = std::fs::remove_dir_all(&retired) {
            warn!(error = %e, dir = %retired.display(), "failed to remove previous artifact");
        }
        Ok(())
    }
}

/// Remove every version of a profile except `keep`
#[cfg(unix)]
fn prune_versions(versions: &Path, keep: &str) {
    let entries = match std::fs::read_dir(versions) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, dir = %versions.display(), "failed to list artifact versions");
            return;
        }
    };
    for entry in entries.flatten() {
        if entry.file_name() == keep {
            continue;
        }
        if let Err(e) = std::fs::remove_dir_all(entry.path()) {
            warn!(error = %e, dir = %entry.path().display(), "failed to remove superseded artifact");
        }
    }
}
