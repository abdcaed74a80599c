//! Check command implementation.

use super::parse_target;
use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use parsewright_domain::traits::{FallbackExtractor, Sandbox};
use parsewright_domain::{ArtifactOrigin, TabularResult};
use parsewright_fallback::{AutoReader, LayoutExtractor, LayoutRules};
use parsewright_sandbox::SubprocessSandbox;
use parsewright_store::{ArtifactStore, GroundTruthStore, PersistedArtifact};
use parsewright_validator::validate;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Execute the check command.
///
/// Returns whether the persisted parser still matches the ground truth.
pub async fn execute_check(args: TargetArgs, config: &Config, formatter: &Formatter) -> Result<bool> {
    let id = parse_target(&args.target)?;

    let ground_truth = GroundTruthStore::new(&config.paths.data_dir);
    let profile = ground_truth.profile(&id)?;
    let truth = ground_truth.load(&profile)?;
    let artifact = ArtifactStore::new(&config.paths.artifacts_dir).load(&id)?;

    let origin = artifact.manifest.artifact_origin().ok_or_else(|| {
        CliError::InvalidInput(format!("unknown artifact origin '{}'", artifact.manifest.origin))
    })?;
    info!(profile = %id, origin = %origin, "re-running persisted parser");

    let outcome = match reproduce(&artifact, origin, profile.sample_document(), config).await? {
        Ok(result) => validate(&result, &truth),
        Err(message) => {
            println!("{}", formatter.error(&format!("persisted parser failed: {}", message)));
            return Ok(false);
        }
    };

    println!("{}", formatter.check(&artifact, &outcome)?);
    Ok(outcome.is_pass())
}

/// Run the persisted source again; the inner error describes a parser failure
async fn reproduce(
    artifact: &PersistedArtifact,
    origin: ArtifactOrigin,
    document: &Path,
    config: &Config,
) -> Result<std::result::Result<TabularResult, String>> {
    match origin {
        ArtifactOrigin::Generated { .. } => {
            let sandbox = SubprocessSandbox::new(config.sandbox.clone())?;
            Ok(sandbox
                .execute(&artifact.source, document)
                .await
                .map_err(|fault| fault.to_string()))
        }
        ArtifactOrigin::Fallback => {
            let rules = LayoutRules::from_toml(&artifact.source)?;
            let extractor = LayoutExtractor::new(rules, Arc::new(AutoReader::new(&config.reader)))?;
            let document = document.to_path_buf();
            let extracted = tokio::task::spawn_blocking(move || extractor.extract(&document))
                .await
                .map_err(|e| CliError::Task(e.to_string()))?;
            Ok(extracted.map_err(|e| e.to_string()))
        }
    }
}
